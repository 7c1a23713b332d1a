//! API request and response types.

use serde::{Deserialize, Serialize};

use crate::agent::Source;

/// Request to submit a query to the agent.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentRequest {
    /// The question to answer
    pub query: String,

    /// Optional correlation key; queries sharing it share a conversation
    /// thread. Absent means a one-off anonymous query.
    pub conversation_id: Option<String>,
}

/// Response carrying the agent's answer and its citation sources.
#[derive(Debug, Clone, Serialize)]
pub struct AgentResponse {
    /// The final answer text
    pub answer: String,

    /// Citation sources backing the answer
    pub sources: Vec<Source>,

    /// Thread the conversation state lives under
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

/// Response after resetting a conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ResetResponse {
    /// The freshly generated thread id now backing the conversation
    pub thread_id: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

/// Error payload for rejected requests.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
