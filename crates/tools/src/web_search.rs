//! Web search tool backed by a SearXNG instance.
//!
//! The base URL comes from the `SEARXNG_INTERNAL_URL` environment variable
//! so the tool works unchanged inside a compose network or pointed at a
//! public instance. All failures are reported as observation strings; the
//! model is expected to relay them, not the turn to fail.

use std::time::Duration;

use aigentd_core::{Tool, ToolError};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::error;

const DEFAULT_SEARXNG_URL: &str = "http://searxng:8080";
const REQUEST_TIMEOUT_SECS: u64 = 15;
const MAX_RESULTS: usize = 5;

pub struct WebSearchTool {
    base_url: String,
    client: reqwest::Client,
}

impl WebSearchTool {
    pub fn new() -> Self {
        let base_url = std::env::var("SEARXNG_INTERNAL_URL")
            .unwrap_or_else(|_| DEFAULT_SEARXNG_URL.to_string());
        Self::with_base_url(base_url)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.into(),
            client,
        }
    }
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for current information. Returns the top results with titles, URLs, and snippets."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: &serde_json::Value) -> Result<String, ToolError> {
        let query = params["query"].as_str().unwrap_or("").trim();
        if query.is_empty() {
            return Ok("Error: No search query was provided.".to_string());
        }

        let url = format!("{}/", self.base_url.trim_end_matches('/'));
        let response = match self
            .client
            .get(&url)
            .query(&[("q", query), ("format", "json"), ("language", "en")])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                error!(error = %e, "Could not reach the search service");
                return Ok("Error: The web search service is currently unavailable.".to_string());
            }
        };

        if !response.status().is_success() {
            error!(status = %response.status(), "Search service returned an error status");
            return Ok("Error: The web search service is currently unavailable.".to_string());
        }

        let body: SearchResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                error!(error = %e, "Search service returned an unparseable body");
                return Ok(
                    "An unexpected error occurred while trying to perform a web search."
                        .to_string(),
                );
            }
        };

        if body.results.is_empty() {
            return Ok("No results found for your query.".to_string());
        }

        Ok(render_results(&body.results))
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: Option<String>,
    url: Option<String>,
    content: Option<String>,
}

fn render_results(results: &[SearchHit]) -> String {
    results
        .iter()
        .take(MAX_RESULTS)
        .map(|hit| {
            format!(
                "Title: {}\nURL: {}\nSnippet: {}",
                hit.title.as_deref().unwrap_or("No Title"),
                hit.url.as_deref().unwrap_or("#"),
                hit.content.as_deref().unwrap_or("No Snippet Available"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(title: &str, url: &str, content: &str) -> SearchHit {
        SearchHit {
            title: Some(title.into()),
            url: Some(url.into()),
            content: Some(content.into()),
        }
    }

    #[test]
    fn renders_results_with_separators() {
        let results = vec![
            hit("Rust", "https://rust-lang.org", "A systems language"),
            hit("Crates", "https://crates.io", "The package registry"),
        ];

        let text = render_results(&results);
        assert!(text.starts_with("Title: Rust\nURL: https://rust-lang.org\nSnippet: A systems language"));
        assert!(text.contains("\n\n---\n\n"));
        assert!(text.ends_with("Snippet: The package registry"));
    }

    #[test]
    fn renders_fallbacks_for_missing_fields() {
        let results = vec![SearchHit {
            title: None,
            url: None,
            content: None,
        }];

        let text = render_results(&results);
        assert_eq!(text, "Title: No Title\nURL: #\nSnippet: No Snippet Available");
    }

    #[test]
    fn caps_at_five_results() {
        let results: Vec<SearchHit> = (0..8)
            .map(|i| hit(&format!("r{i}"), "https://example.com", "s"))
            .collect();

        let text = render_results(&results);
        assert_eq!(text.matches("Title: ").count(), 5);
    }

    #[test]
    fn parses_searxng_body() {
        let body: SearchResponse = serde_json::from_str(
            r#"{"query": "rust", "results": [{"title": "t", "url": "u", "content": "c", "engine": "ddg"}]}"#,
        )
        .unwrap();
        assert_eq!(body.results.len(), 1);
        assert_eq!(body.results[0].title.as_deref(), Some("t"));
    }

    #[test]
    fn parses_body_without_results_key() {
        let body: SearchResponse = serde_json::from_str(r#"{"query": "rust"}"#).unwrap();
        assert!(body.results.is_empty());
    }

    #[tokio::test]
    async fn empty_query_is_reported_in_band() {
        let tool = WebSearchTool::with_base_url("http://localhost:1");
        let obs = tool
            .execute(&serde_json::json!({"query": "   "}))
            .await
            .unwrap();
        assert_eq!(obs, "Error: No search query was provided.");
    }

    #[tokio::test]
    async fn unreachable_service_is_reported_in_band() {
        // Port 1 refuses connections without touching the network.
        let tool = WebSearchTool::with_base_url("http://127.0.0.1:1");
        let obs = tool
            .execute(&serde_json::json!({"query": "rust"}))
            .await
            .unwrap();
        assert_eq!(obs, "Error: The web search service is currently unavailable.");
    }

    #[test]
    fn tool_spec_names_query() {
        let tool = WebSearchTool::with_base_url("http://localhost:1");
        let spec = tool.spec();
        assert_eq!(spec.name, "web_search");
        assert_eq!(spec.parameters_schema["required"][0], "query");
    }
}
