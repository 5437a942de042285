//! Prompt template rendering.
//!
//! Templates use `{placeholder}` slots with identifier-shaped names. A brace
//! that does not open an identifier-shaped slot (e.g. JSON examples embedded
//! in the template text) is emitted literally, so templates never need brace
//! escaping. A slot naming a value the context did not supply fails the
//! render with a configuration error.

use std::collections::HashMap;

use aigentd_core::{ConfigError, PromptTemplate};

/// Render a template against the supplied values in a single pass.
///
/// Duplicated placeholders render each time; supplied values the template
/// never references are ignored.
pub fn render(
    template: &PromptTemplate,
    values: &HashMap<String, String>,
) -> Result<String, ConfigError> {
    let chars: Vec<char> = template.template.chars().collect();
    let mut out = String::with_capacity(template.template.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '{' {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        // Scan an identifier-shaped slot name.
        let mut j = i + 1;
        while j < chars.len() && (chars[j].is_ascii_alphanumeric() || chars[j] == '_') {
            j += 1;
        }

        let is_slot = j > i + 1 && chars.get(j) == Some(&'}');
        if !is_slot {
            out.push('{');
            i += 1;
            continue;
        }

        let name: String = chars[i + 1..j].iter().collect();
        match values.get(&name) {
            Some(value) => out.push_str(value),
            None => {
                return Err(ConfigError::MissingPlaceholder {
                    template: template.name.clone(),
                    placeholder: name,
                });
            }
        }
        i = j + 1;
    }

    Ok(out)
}
