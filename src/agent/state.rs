//! Per-thread conversation state and its store.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::llm::ChatMessage;

use super::sources::Source;

/// Conversation state for one thread.
///
/// Messages are append-only and never reordered; sources only grow and
/// are never deduplicated. Both are mutated exclusively by the agent's
/// step functions.
#[derive(Debug, Clone, Default)]
pub struct AgentState {
    /// Messages in conversational order
    pub messages: Vec<ChatMessage>,

    /// Citation sources accumulated across tool rounds
    pub sources: Vec<Source>,
}

/// Key-value persistence for [`AgentState`], one entry per thread id.
///
/// Injected into the agent so the in-memory backing can be swapped for
/// a persistent one without touching orchestration.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the state for a thread, or an empty state if none exists.
    async fn load(&self, thread_id: &str) -> AgentState;

    /// Replace the stored state for a thread.
    async fn save(&self, thread_id: &str, state: AgentState);
}

struct StoredState {
    state: AgentState,
    touched_at: Instant,
}

/// In-memory state store (non-persistent) with TTL eviction of idle
/// threads.
pub struct InMemoryStateStore {
    states: RwLock<HashMap<String, StoredState>>,
    ttl: Duration,
}

impl InMemoryStateStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Number of live (non-evicted) thread states.
    pub async fn len(&self) -> usize {
        let mut states = self.states.write().await;
        evict_expired(&mut states, self.ttl);
        states.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn evict_expired(states: &mut HashMap<String, StoredState>, ttl: Duration) {
    states.retain(|_, stored| stored.touched_at.elapsed() <= ttl);
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn load(&self, thread_id: &str) -> AgentState {
        let mut states = self.states.write().await;
        evict_expired(&mut states, self.ttl);

        match states.get_mut(thread_id) {
            Some(stored) => {
                stored.touched_at = Instant::now();
                stored.state.clone()
            }
            None => AgentState::default(),
        }
    }

    async fn save(&self, thread_id: &str, state: AgentState) {
        let mut states = self.states.write().await;
        evict_expired(&mut states, self.ttl);
        states.insert(
            thread_id.to_string(),
            StoredState {
                state,
                touched_at: Instant::now(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn load_of_unknown_thread_is_empty() {
        let store = InMemoryStateStore::new(Duration::from_secs(60));
        let state = store.load("t-unknown").await;
        assert!(state.messages.is_empty());
        assert!(state.sources.is_empty());
    }

    #[tokio::test]
    async fn save_then_load_round_trips_per_thread() {
        let store = InMemoryStateStore::new(Duration::from_secs(60));

        let mut state = AgentState::default();
        state.messages.push(ChatMessage::user("hello"));
        store.save("t-1", state).await;

        let loaded = store.load("t-1").await;
        assert_eq!(loaded.messages.len(), 1);
        assert_eq!(loaded.messages[0].content.as_deref(), Some("hello"));

        // Distinct threads are fully independent.
        assert!(store.load("t-2").await.messages.is_empty());
    }

    #[tokio::test]
    async fn save_replaces_previous_state() {
        let store = InMemoryStateStore::new(Duration::from_secs(60));

        let mut first = AgentState::default();
        first.messages.push(ChatMessage::user("one"));
        store.save("t-1", first.clone()).await;

        first.messages.push(ChatMessage::assistant("two"));
        store.save("t-1", first).await;

        assert_eq!(store.load("t-1").await.messages.len(), 2);
    }

    #[tokio::test]
    async fn idle_states_are_evicted() {
        let store = InMemoryStateStore::new(Duration::from_millis(10));

        let mut state = AgentState::default();
        state.messages.push(ChatMessage::user("hello"));
        store.save("t-1", state).await;

        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(store.is_empty().await);
        assert!(store.load("t-1").await.messages.is_empty());
    }
}
