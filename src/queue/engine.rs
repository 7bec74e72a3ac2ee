//! # Queue Engine
//!
//! Owner of all queue position arithmetic. Positions inside a category are
//! 1-based and gapless: whatever sits at position 1 publishes next, and the
//! queue depth is the highest occupied position. Reordering is swap-based
//! (pairwise and displacement moves), which keeps each reorder O(1); depth
//! is small and reordering is a rare, human-triggered action.
//!
//! Every mutating operation takes the category's lock, re-reads the item
//! under it, and lands its writes through a single atomic store batch, so
//! the contiguity invariant holds at every operation boundary.

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::errors::{QueueError, QueueResult};
use super::locks::CategoryLocks;
use crate::models::{ContentCategory, ContentItem, ContentItemPatch};
use crate::state_machine::{ContentEvent, ContentState, ContentStateMachine};
use crate::store::ContentStore;

/// Snapshot of a category queue's readiness, for upstream schedulers.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QueueHealth {
    pub category: ContentCategory,
    /// Items that are queued and holding a position
    pub ready: usize,
    /// Configured depth the category wants to keep on hand
    pub target: usize,
    /// True when more content should be generated for this category
    pub needs_content: bool,
}

/// Queue engine over a content store.
pub struct QueueEngine {
    store: Arc<dyn ContentStore>,
    machine: Arc<ContentStateMachine>,
    locks: CategoryLocks,
}

impl QueueEngine {
    pub fn new(
        store: Arc<dyn ContentStore>,
        machine: Arc<ContentStateMachine>,
        locks: CategoryLocks,
    ) -> Self {
        Self {
            store,
            machine,
            locks,
        }
    }

    /// The shared per-category lock registry, for callers that need to hold
    /// a category slot across a compound operation (the publish tick).
    pub fn locks(&self) -> &CategoryLocks {
        &self.locks
    }

    /// Append an approved item to the tail of its category queue.
    ///
    /// Drives the `approved -> queued` transition as part of the same
    /// critical section; returns the assigned position.
    pub async fn enqueue(&self, id: Uuid, category: ContentCategory) -> QueueResult<i32> {
        let _slot = self.locks.acquire(category).await;

        let item = self.load(id).await?;
        Self::ensure_category(&item, category)?;
        if let Some(position) = item.queue_position {
            return Err(QueueError::AlreadyQueued { id, position });
        }

        let position = self.store.max_position(category).await?.unwrap_or(0) + 1;
        self.machine
            .apply(id, ContentEvent::MarkQueued { position })
            .await?;

        info!(
            target: "queue_engine",
            content_id = %id,
            category = %category,
            position,
            "Enqueued content at tail"
        );

        Ok(position)
    }

    /// The item that publishes next, or `QueueEmpty`.
    pub async fn publish_head(&self, category: ContentCategory) -> QueueResult<ContentItem> {
        let _slot = self.locks.acquire(category).await;
        self.head_unlocked(category).await
    }

    pub(crate) async fn head_unlocked(&self, category: ContentCategory) -> QueueResult<ContentItem> {
        self.store
            .find_by_position(category, 1)
            .await?
            .ok_or(QueueError::QueueEmpty { category })
    }

    /// Free an item's slot and close the gap it leaves behind.
    ///
    /// Every position above the released one shifts down by exactly one, in
    /// a single atomic batch.
    pub async fn release(&self, id: Uuid) -> QueueResult<ContentItem> {
        let category = self.load(id).await?.category;
        let _slot = self.locks.acquire(category).await;

        let item = self.load(id).await?;
        let position = item.queue_position.ok_or(QueueError::NotQueued { id })?;

        let released = self
            .store
            .release_and_compact(id, position, ContentItemPatch::default().with_queue_position(None))
            .await?;

        info!(
            target: "queue_engine",
            content_id = %id,
            category = %category,
            position,
            "Released queue slot"
        );

        Ok(released)
    }

    /// Exchange an item's position with its immediate successor.
    pub async fn swap_with_next(&self, id: Uuid, category: ContentCategory) -> QueueResult<i32> {
        let _slot = self.locks.acquire(category).await;

        let item = self.load(id).await?;
        Self::ensure_category(&item, category)?;
        let position = item.queue_position.ok_or(QueueError::NotQueued { id })?;

        let next = self
            .store
            .find_by_position(category, position + 1)
            .await?
            .ok_or(QueueError::NoNextItem {
                position: position + 1,
            })?;

        self.store
            .reassign_positions(&[(id, position + 1), (next.id, position)])
            .await?;

        info!(
            target: "queue_engine",
            content_id = %id,
            category = %category,
            from = position,
            to = position + 1,
            "Swapped with next queued item"
        );

        Ok(position + 1)
    }

    /// Move an item to a specific position.
    ///
    /// An occupied target is a displacement swap: the occupant takes the
    /// mover's old slot and nothing in between shifts. Moving to the current
    /// position is a no-op success. A target beyond the tail is clamped to
    /// the tail so the occupied set stays gapless.
    pub async fn move_to(
        &self,
        id: Uuid,
        category: ContentCategory,
        target_position: i32,
    ) -> QueueResult<i32> {
        if target_position < 1 {
            return Err(QueueError::InvalidPosition {
                position: target_position,
            });
        }

        let _slot = self.locks.acquire(category).await;

        let item = self.load(id).await?;
        Self::ensure_category(&item, category)?;
        let current = item.queue_position.ok_or(QueueError::NotQueued { id })?;

        // The occupied set is {1..=max}, so anything past the tail means the
        // tail itself; a gap must never open up.
        let max = self.store.max_position(category).await?.unwrap_or(0);
        let target = target_position.min(max);

        if target == current {
            return Ok(current);
        }

        match self.store.find_by_position(category, target).await? {
            Some(occupant) => {
                self.store
                    .reassign_positions(&[(id, target), (occupant.id, current)])
                    .await?;
            }
            None => {
                self.store.reassign_positions(&[(id, target)]).await?;
            }
        }

        info!(
            target: "queue_engine",
            content_id = %id,
            category = %category,
            from = current,
            to = target,
            "Moved queued item"
        );

        Ok(target)
    }

    /// Queue readiness for a category: how many approved pieces are queued
    /// and whether more should be generated. Pure read, no mutation.
    pub async fn health(&self, category: ContentCategory, target: usize) -> QueueResult<QueueHealth> {
        let ready = self
            .store
            .find_by_category_and_state(category, ContentState::Queued)
            .await?
            .into_iter()
            .filter(|item| item.queue_position.is_some())
            .count();

        Ok(QueueHealth {
            category,
            ready,
            target,
            needs_content: ready < target,
        })
    }

    /// Ordered snapshot of the first `depth` queued items.
    pub async fn upcoming(
        &self,
        category: ContentCategory,
        depth: i64,
    ) -> QueueResult<Vec<ContentItem>> {
        Ok(self.store.queued_in_order(category, depth).await?)
    }

    fn ensure_category(item: &ContentItem, category: ContentCategory) -> QueueResult<()> {
        if item.category != category {
            return Err(QueueError::CategoryMismatch {
                id: item.id,
                expected: category,
                actual: item.category,
            });
        }
        Ok(())
    }

    async fn load(&self, id: Uuid) -> QueueResult<ContentItem> {
        self.store
            .get(id)
            .await?
            .ok_or(QueueError::ContentNotFound { id })
    }
}
