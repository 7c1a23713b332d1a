//! Core agent loop implementation.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::Config;
use crate::llm::{ChatMessage, LlmClient, LlmError, ToolCall, ToolSchema};
use crate::tools::{ToolCapability, ToolOutput, ToolRegistry};

use super::prompt::build_system_prompt;
use super::sources::Source;
use super::state::{AgentState, StateStore};
use super::threads::ThreadLocks;

/// Answer returned when a reasoning step fails mid-run.
pub const FAILURE_ANSWER: &str =
    "Sorry, something went wrong while answering your question. Please try again.";

/// Answer returned when the round cap is reached before the model settles
/// on a plain answer.
pub const ROUND_LIMIT_ANSWER: &str =
    "Sorry, I could not complete the request within the allowed number of reasoning rounds.";

/// Outcome of one orchestration run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub answer: String,
    pub sources: Vec<Source>,
}

/// The reasoning/tool-execution orchestrator.
///
/// Each run alternates reasoning (one LLM call) with tool execution
/// until the model answers without tool calls, a step fails, or the
/// round cap is hit. State is loaded from and saved to the injected
/// store, keyed by thread id.
pub struct Agent {
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    store: Arc<dyn StateStore>,
    locks: ThreadLocks,
    model: String,
    max_rounds: usize,
    call_timeout: Duration,
}

impl Agent {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        tools: ToolRegistry,
        store: Arc<dyn StateStore>,
        config: &Config,
    ) -> Self {
        Self {
            llm,
            tools,
            store,
            locks: ThreadLocks::new(),
            model: config.model.clone(),
            max_rounds: config.max_rounds,
            call_timeout: config.call_timeout,
        }
    }

    /// Run one query against a thread and return the final answer with
    /// the thread's accumulated sources.
    ///
    /// On a reasoning failure the run returns the fixed failure answer
    /// with no sources and skips the save, leaving the previous good
    /// state as the thread's state of record.
    pub async fn run(&self, query: &str, thread_id: &str) -> RunOutcome {
        // Runs against the same thread must not interleave.
        let _guard = self.locks.acquire(thread_id).await;

        let mut state = self.store.load(thread_id).await;
        state.messages.push(ChatMessage::user(query));

        let tool_schemas = self.tools.tool_schemas();

        for round in 0..self.max_rounds {
            debug!(thread_id, round, "reasoning step");

            let response = match self.reasoning_step(&state, &tool_schemas).await {
                Ok(message) => message,
                Err(e) => {
                    warn!(thread_id, error = %e, "reasoning step failed, aborting run");
                    return RunOutcome {
                        answer: FAILURE_ANSWER.to_string(),
                        sources: Vec::new(),
                    };
                }
            };

            if response.pending_tool_calls().is_empty() {
                let answer = response.content.clone().unwrap_or_default();
                state.messages.push(response);

                let sources = state.sources.clone();
                self.store.save(thread_id, state).await;
                return RunOutcome { answer, sources };
            }

            let calls = response.pending_tool_calls().to_vec();
            state.messages.push(response);

            debug!(thread_id, round, calls = calls.len(), "tool execution step");
            self.tool_execution_step(&mut state, &calls).await;
        }

        warn!(
            thread_id,
            max_rounds = self.max_rounds,
            "round cap reached without a final answer"
        );

        // Every step succeeded, so the history is consistent and worth
        // keeping even though the model never settled.
        let sources = state.sources.clone();
        self.store.save(thread_id, state).await;
        RunOutcome {
            answer: ROUND_LIMIT_ANSWER.to_string(),
            sources,
        }
    }

    /// One reasoning step: system prompt, persisted history, and (when
    /// present) an ephemeral sources-context message go to the model.
    /// Only the model's reply is appended to persisted history.
    async fn reasoning_step(
        &self,
        state: &AgentState,
        tool_schemas: &[ToolSchema],
    ) -> Result<ChatMessage, LlmError> {
        let mut input = Vec::with_capacity(state.messages.len() + 2);
        input.push(ChatMessage::system(build_system_prompt()));
        input.extend(state.messages.iter().cloned());

        if !state.sources.is_empty() {
            let rendered = serde_json::to_string(&state.sources).unwrap_or_default();
            input.push(ChatMessage::system(format!(
                "Include these sources in your response: {rendered}"
            )));
        }

        match timeout(
            self.call_timeout,
            self.llm.chat_completion(&self.model, &input, Some(tool_schemas)),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout(self.call_timeout)),
        }
    }

    /// One tool execution step: dispatch every pending call in model
    /// order, appending one tool-result message per call id. A failed
    /// dispatch becomes an error tool-result message so the next
    /// reasoning round can adapt instead of the run aborting.
    async fn tool_execution_step(&self, state: &mut AgentState, calls: &[ToolCall]) {
        let mut round_sources: Vec<Source> = Vec::new();

        for call in calls {
            let text = match self.dispatch(call).await {
                Ok(output) => {
                    round_sources.extend(output.sources);
                    output.text
                }
                Err(e) => {
                    warn!(tool = %call.function.name, error = %e, "tool call failed");
                    format!("Error: {e}")
                }
            };

            state.messages.push(ChatMessage::tool(call.id.clone(), text));
        }

        // Every source-producing tool's capture for the round is kept,
        // in call order. The store never deduplicates.
        state.sources.extend(round_sources);
    }

    async fn dispatch(&self, call: &ToolCall) -> anyhow::Result<ToolOutput> {
        let registered = self
            .tools
            .get(&call.function.name)
            .ok_or_else(|| anyhow::anyhow!("unknown tool: {}", call.function.name))?;

        let args: Value =
            serde_json::from_str(&call.function.arguments).unwrap_or(Value::Null);

        let output = timeout(self.call_timeout, registered.tool.execute(args))
            .await
            .map_err(|_| {
                anyhow::anyhow!("tool call timed out after {:?}", self.call_timeout)
            })??;

        // Sources from a tool registered as plain are dropped regardless
        // of what its output claims.
        if registered.capability == ToolCapability::Plain && !output.sources.is_empty() {
            return Ok(ToolOutput {
                text: output.text,
                sources: Vec::new(),
            });
        }

        Ok(output)
    }
}
