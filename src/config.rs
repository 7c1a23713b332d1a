//! Configuration management for the search agent.
//!
//! Configuration can be set via environment variables:
//! - `OPENAI_API_KEY` - Required. API key for the chat-completions provider.
//! - `TAVILY_API_KEY` - Required. API key for the Tavily search tool.
//! - `MODEL` - Optional. Chat model identifier. Defaults to `gpt-4o`.
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `3000`.
//! - `MAX_ROUNDS` - Optional. Maximum reasoning rounds per run. Defaults to `10`.
//! - `CALL_TIMEOUT_SECS` - Optional. Deadline for each LLM or tool call. Defaults to `60`.
//! - `THREAD_TTL_SECS` - Optional. Idle lifetime of conversation threads. Defaults to `3600`.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the chat-completions provider
    pub openai_api_key: String,

    /// API key for the Tavily search tool
    pub tavily_api_key: String,

    /// Chat model identifier
    pub model: String,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Maximum reasoning rounds per orchestration run
    pub max_rounds: usize,

    /// Deadline applied to each LLM call and each tool dispatch
    pub call_timeout: Duration,

    /// How long an idle conversation thread is kept before eviction
    pub thread_ttl: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `OPENAI_API_KEY` or
    /// `TAVILY_API_KEY` is not set. The keys are required up front so a
    /// misconfigured capability fails at startup rather than per call.
    pub fn from_env() -> Result<Self, ConfigError> {
        let openai_api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))?;

        let tavily_api_key = std::env::var("TAVILY_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("TAVILY_API_KEY".to_string()))?;

        let model = std::env::var("MODEL").unwrap_or_else(|_| "gpt-4o".to_string());

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), format!("{}", e)))?;

        let max_rounds = std::env::var("MAX_ROUNDS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("MAX_ROUNDS".to_string(), format!("{}", e)))?;

        let call_timeout_secs: u64 = std::env::var("CALL_TIMEOUT_SECS")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .map_err(|e| {
                ConfigError::InvalidValue("CALL_TIMEOUT_SECS".to_string(), format!("{}", e))
            })?;

        let thread_ttl_secs: u64 = std::env::var("THREAD_TTL_SECS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .map_err(|e| {
                ConfigError::InvalidValue("THREAD_TTL_SECS".to_string(), format!("{}", e))
            })?;

        Ok(Self {
            openai_api_key,
            tavily_api_key,
            model,
            host,
            port,
            max_rounds,
            call_timeout: Duration::from_secs(call_timeout_secs),
            thread_ttl: Duration::from_secs(thread_ttl_secs),
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(openai_api_key: String, tavily_api_key: String) -> Self {
        Self {
            openai_api_key,
            tavily_api_key,
            model: "gpt-4o".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            max_rounds: 10,
            call_timeout: Duration::from_secs(60),
            thread_ttl: Duration::from_secs(3600),
        }
    }
}
