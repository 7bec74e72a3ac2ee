//! Keyed async locks for queue partitions.
//!
//! One mutex per content category: operations inside a category are
//! serialized, categories never contend with each other. The registry is
//! cheaply cloneable so the queue engine and the publish driver share the
//! same locks.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::models::ContentCategory;

/// Registry of per-category mutexes.
#[derive(Clone, Default)]
pub struct CategoryLocks {
    locks: Arc<DashMap<ContentCategory, Arc<Mutex<()>>>>,
}

impl CategoryLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the category's lock, creating it on first use.
    pub async fn acquire(&self, category: ContentCategory) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(category)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }
}
