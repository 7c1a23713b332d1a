//! Citation sources and free-text source extraction.
//!
//! Tools that search the web yield structured sources directly. When a
//! run finishes without any, the transport layer falls back to parsing
//! citations out of the answer text with [`extract_sources`].

use chrono::Local;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A citation record backing part of an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// Title of the source
    pub title: String,

    /// URL of the source
    pub url: String,

    /// Publication date (ISO calendar date)
    pub date: String,

    /// Page content excerpt, when the producing tool had one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Today's date in the ISO format used throughout source records.
pub fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Parse citation sources out of free answer text.
///
/// Markdown-style citations (`[Title](url) - date`, date optional) take
/// precedence; bare URLs are only scanned when no markdown citation
/// matched at all. Deterministic and order-preserving for a given input.
pub fn extract_sources(text: &str) -> Vec<Source> {
    let today = today();

    let citation =
        Regex::new(r"\[([^\]]+)\]\((https?://[^)\s]+)\)(?:\s*-\s*(\d{4}-\d{2}-\d{2}))?").unwrap();

    let sources: Vec<Source> = citation
        .captures_iter(text)
        .map(|cap| Source {
            title: cap[1].to_string(),
            url: cap[2].to_string(),
            date: cap
                .get(3)
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| today.clone()),
            content: None,
        })
        .collect();

    if !sources.is_empty() {
        return sources;
    }

    let bare_url = Regex::new(r#"https?://[^\s)\]>"']+"#).unwrap();

    bare_url
        .find_iter(text)
        .enumerate()
        .map(|(i, m)| Source {
            title: format!("Source {}", i + 1),
            url: m.as_str().to_string(),
            date: today.clone(),
            content: None,
        })
        .collect()
}
