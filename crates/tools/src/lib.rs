//! Built-in tool implementations for aigentd.
//!
//! Tools are the capabilities an aigent can request during a turn: searching
//! the web through SearXNG and evaluating arithmetic. The registry built here
//! is closed; which of these an individual aigent may actually use is decided
//! by the tool list on its configuration.

pub mod calculator;
pub mod web_search;

pub use calculator::CalculatorTool;
pub use web_search::WebSearchTool;

use aigentd_core::ToolRegistry;

/// Create a registry holding every built-in tool.
pub fn default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(WebSearchTool::new()));
    registry.register(Box::new(CalculatorTool));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_builtins() {
        let registry = default_registry();
        assert!(registry.get("web_search").is_some());
        assert!(registry.get("calculator").is_some());
        assert!(registry.get("shell").is_none());
    }
}
