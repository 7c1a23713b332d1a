//! Conversation-to-thread identity mapping and per-thread run locks.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use uuid::Uuid;

struct ThreadEntry {
    thread_id: String,
    touched_at: Instant,
}

/// Maps caller-supplied conversation ids to durable thread ids.
///
/// Idle entries are evicted after the configured TTL; an evicted
/// conversation simply gets a fresh thread on its next request.
pub struct ThreadRegistry {
    threads: RwLock<HashMap<String, ThreadEntry>>,
    ttl: Duration,
}

impl ThreadRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            threads: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Resolve a conversation id to its thread id, creating the mapping
    /// on first sight. Without a conversation id the thread is
    /// ephemeral: a fresh id is returned and nothing is stored.
    pub async fn get_or_create(&self, conversation_id: Option<&str>) -> String {
        let Some(conversation_id) = conversation_id else {
            return new_thread_id();
        };

        let mut threads = self.threads.write().await;
        evict_expired(&mut threads, self.ttl);

        let entry = threads
            .entry(conversation_id.to_string())
            .or_insert_with(|| ThreadEntry {
                thread_id: new_thread_id(),
                touched_at: Instant::now(),
            });
        entry.touched_at = Instant::now();
        entry.thread_id.clone()
    }

    /// Replace the conversation's thread with a fresh one. Subsequent
    /// `get_or_create` calls for this conversation return the new id.
    pub async fn reset(&self, conversation_id: &str) -> String {
        let thread_id = new_thread_id();
        self.threads.write().await.insert(
            conversation_id.to_string(),
            ThreadEntry {
                thread_id: thread_id.clone(),
                touched_at: Instant::now(),
            },
        );
        thread_id
    }

    /// Number of live (non-evicted) conversation mappings.
    pub async fn len(&self) -> usize {
        let mut threads = self.threads.write().await;
        evict_expired(&mut threads, self.ttl);
        threads.len()
    }
}

fn new_thread_id() -> String {
    Uuid::new_v4().to_string()
}

fn evict_expired(threads: &mut HashMap<String, ThreadEntry>, ttl: Duration) {
    threads.retain(|_, entry| entry.touched_at.elapsed() <= ttl);
}

/// Per-thread run serialization. Two runs against the same thread id
/// must not interleave their state loads and saves.
#[derive(Default)]
pub struct ThreadLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ThreadLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for a thread, waiting for any in-flight run on
    /// the same thread to finish first.
    pub async fn acquire(&self, thread_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Drop map entries no run is holding or waiting on.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry(thread_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn anonymous_requests_get_distinct_ephemeral_threads() {
        let registry = ThreadRegistry::new(Duration::from_secs(60));

        let a = registry.get_or_create(None).await;
        let b = registry.get_or_create(None).await;

        assert_ne!(a, b);
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn conversation_thread_is_stable_until_reset() {
        let registry = ThreadRegistry::new(Duration::from_secs(60));

        let first = registry.get_or_create(Some("conv-1")).await;
        let second = registry.get_or_create(Some("conv-1")).await;
        assert_eq!(first, second);

        let reset = registry.reset("conv-1").await;
        assert_ne!(reset, first);
        assert_eq!(registry.get_or_create(Some("conv-1")).await, reset);
    }

    #[tokio::test]
    async fn reset_of_unknown_conversation_creates_mapping() {
        let registry = ThreadRegistry::new(Duration::from_secs(60));

        let thread_id = registry.reset("conv-new").await;
        assert_eq!(registry.get_or_create(Some("conv-new")).await, thread_id);
    }

    #[tokio::test]
    async fn idle_conversations_are_evicted() {
        let registry = ThreadRegistry::new(Duration::from_millis(10));

        let first = registry.get_or_create(Some("conv-1")).await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(registry.len().await, 0);
        // The conversation comes back with a fresh thread.
        assert_ne!(registry.get_or_create(Some("conv-1")).await, first);
    }

    #[tokio::test]
    async fn thread_locks_serialize_same_key() {
        let locks = Arc::new(ThreadLocks::new());

        let guard = locks.acquire("t-1").await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire("t-1").await;
            })
        };

        // The contender cannot finish while the guard is held.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.expect("contender completes");
    }

    #[tokio::test]
    async fn thread_locks_do_not_block_distinct_keys() {
        let locks = ThreadLocks::new();

        let _one = locks.acquire("t-1").await;
        let _two = locks.acquire("t-2").await;
    }
}
