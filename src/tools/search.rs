//! Web search tool backed by the Tavily API.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::agent::sources::{today, Source};

use super::{Tool, ToolCapability, ToolOutput};

const TAVILY_ENDPOINT: &str = "https://api.tavily.com/search";
const MAX_RESULTS: u32 = 3;

/// Search the web via Tavily, capturing each result as a structured source.
pub struct TavilySearch {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl TavilySearch {
    /// Create the tool. The API key is required at construction so a
    /// missing credential fails at startup, not on the first call.
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent("search-agent/1.0")
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            api_key,
            endpoint: TAVILY_ENDPOINT.to_string(),
        })
    }

    /// Override the endpoint URL (for proxies or tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl Tool for TavilySearch {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for current information. Returns search results with titles, URLs, and page content. Use for news, recent events, or anything you are not certain about."
    }

    fn parameters_schema(&self) -> Value {
        json!({
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

    fn capability(&self) -> ToolCapability {
        ToolCapability::SourceProducing
    }

    async fn execute(&self, args: Value) -> anyhow::Result<ToolOutput> {
        let query = args["query"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'query' argument"))?;

        let body = json!({
            "api_key": self.api_key,
            "query": query,
            "max_results": MAX_RESULTS,
            "include_raw_content": true,
        });

        let response = self.client.post(&self.endpoint).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!("Search API error: {}", status));
        }

        let payload: Value = response.json().await?;

        // A payload without a parsable results array still goes back to
        // the model verbatim; it just contributes no sources this round.
        let sources = parse_sources(&payload);

        Ok(ToolOutput {
            text: payload.to_string(),
            sources,
        })
    }
}

/// Pull structured sources out of a Tavily response payload.
fn parse_sources(payload: &Value) -> Vec<Source> {
    let Some(results) = payload["results"].as_array() else {
        return Vec::new();
    };

    let date = today();

    results
        .iter()
        .filter_map(|item| {
            let url = item["url"].as_str()?;
            Some(Source {
                title: item["title"].as_str().unwrap_or("No title").to_string(),
                url: url.to_string(),
                date: date.clone(),
                content: item["content"].as_str().map(str::to_string),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_results_into_sources() {
        let payload = json!({
            "results": [
                {"title": "AI Weekly", "url": "https://news.example/ai", "content": "Latest breakthroughs"},
                {"url": "https://news.example/untitled"}
            ]
        });

        let sources = parse_sources(&payload);

        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].title, "AI Weekly");
        assert_eq!(sources[0].url, "https://news.example/ai");
        assert_eq!(sources[0].content.as_deref(), Some("Latest breakthroughs"));
        assert_eq!(sources[1].title, "No title");
        assert_eq!(sources[1].content, None);
    }

    #[test]
    fn malformed_payload_yields_no_sources() {
        assert!(parse_sources(&json!({"answer": "no results key"})).is_empty());
        assert!(parse_sources(&json!({"results": "not an array"})).is_empty());
    }

    #[test]
    fn entries_without_urls_are_skipped() {
        let payload = json!({"results": [{"title": "Missing link"}]});
        assert!(parse_sources(&payload).is_empty());
    }
}
