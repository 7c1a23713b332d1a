//! Agent module - the reasoning/act orchestration core.
//!
//! One run follows the cycle:
//! 1. Load the thread's conversation state and append the user query
//! 2. Reasoning step: call the LLM with the system prompt, history, and
//!    tool descriptors
//! 3. If the reply carries tool calls, execute them and append one
//!    tool-result message per call (capturing structured sources)
//! 4. Repeat until the model answers without tool calls or the round
//!    cap is reached, then persist the state

mod agent_loop;
mod prompt;
pub mod sources;
pub mod state;
pub mod threads;

pub use agent_loop::{Agent, RunOutcome, FAILURE_ANSWER, ROUND_LIMIT_ANSWER};
pub use sources::{extract_sources, Source};
pub use state::{AgentState, InMemoryStateStore, StateStore};
pub use threads::ThreadRegistry;
