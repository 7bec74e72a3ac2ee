//! # Idempotency Guard
//!
//! Inbound replies arrive through a polling transport that can observe the
//! same message twice (overlapping polling windows). The guard compares the
//! message timestamp against the thread's `last_applied_at` watermark:
//! anything at or before the watermark was already applied and must be
//! treated as a no-op success by the caller, because the message still has
//! to be consumed at the transport layer.
//!
//! The check and the subsequent `mark_applied` run under a per-thread async
//! mutex held by the caller, so two concurrent deliveries of the same
//! logical message cannot both pass. The watermark only advances after the
//! downstream transition succeeds; a failed transition leaves it untouched
//! so a genuine retry can still land.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::models::{ConversationThread, ThreadPatch};
use crate::store::{ContentStore, StoreResult};

/// At-most-once gate for inbound thread messages.
pub struct IdempotencyGuard {
    store: Arc<dyn ContentStore>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl IdempotencyGuard {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self {
            store,
            locks: DashMap::new(),
        }
    }

    /// Take the thread's lock. The caller holds the guard across the check,
    /// the transition, and `mark_applied`.
    pub async fn acquire(&self, thread_id: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(thread_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Whether a message with this timestamp still needs to be applied.
    pub fn should_apply(thread: &ConversationThread, message_timestamp: DateTime<Utc>) -> bool {
        match thread.last_applied_at {
            Some(watermark) => message_timestamp > watermark,
            None => true,
        }
    }

    /// Advance the thread's watermark after a successful transition.
    pub async fn mark_applied(
        &self,
        thread_id: &str,
        message_timestamp: DateTime<Utc>,
    ) -> StoreResult<ConversationThread> {
        self.store
            .update_thread(thread_id, ThreadPatch::applied_at(message_timestamp))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ThreadStatus;
    use chrono::Duration;
    use uuid::Uuid;

    fn thread(last_applied_at: Option<DateTime<Utc>>) -> ConversationThread {
        ConversationThread {
            id: "thread-1".to_string(),
            content_id: Uuid::new_v4(),
            status: ThreadStatus::PendingApproval,
            last_applied_at,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_fresh_thread_applies() {
        assert!(IdempotencyGuard::should_apply(&thread(None), Utc::now()));
    }

    #[test]
    fn test_old_and_equal_timestamps_skip() {
        let watermark = Utc::now();
        let t = thread(Some(watermark));
        assert!(!IdempotencyGuard::should_apply(&t, watermark));
        assert!(!IdempotencyGuard::should_apply(
            &t,
            watermark - Duration::seconds(30)
        ));
    }

    #[test]
    fn test_newer_timestamp_applies() {
        let watermark = Utc::now();
        let t = thread(Some(watermark));
        assert!(IdempotencyGuard::should_apply(
            &t,
            watermark + Duration::seconds(1)
        ));
    }
}
