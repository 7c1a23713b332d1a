//! # Search Agent
//!
//! An HTTP service that answers natural-language questions with an
//! LLM-driven reasoning/act loop and web search.
//!
//! This library provides:
//! - An HTTP API for submitting queries and resetting conversations
//! - A reasoning/tool-execution orchestrator with per-thread state
//! - Citation sources, structured from tools or recovered from answer text
//!
//! ## Architecture
//!
//! Each query runs one orchestration cycle:
//! 1. Resolve the conversation to a thread and load its persisted state
//! 2. Call the LLM with the system prompt, history, and tool descriptors
//! 3. If the model requests tool calls, execute them and feed results back
//! 4. Repeat until the model answers in plain text or the round cap hits
//!
//! ## Example
//!
//! ```rust,ignore
//! use search_agent::{api, config::Config};
//!
//! let config = Config::from_env()?;
//! api::serve(config).await?;
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod llm;
pub mod tools;

pub use config::Config;
