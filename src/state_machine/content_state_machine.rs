//! # Content State Machine
//!
//! Sole writer of a content item's `state`. Every other component requests
//! transitions through [`ContentStateMachine::apply`]; nothing else touches
//! the field. Transition legality is a single `(state, event)` match, so an
//! unlisted pair fails with
//! [`StateMachineError::InvalidTransition`] before anything is written.
//!
//! Each applied event collapses into exactly one atomic store write: the
//! revision event replaces the body and bumps the version in the same patch
//! that moves the state, and the posted event clears the queue slot, stamps
//! `published_at` and compacts the category's positions in one batch.

use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::errors::{StateMachineError, StateMachineResult};
use super::events::ContentEvent;
use super::states::ContentState;
use crate::models::{ContentItem, ContentItemPatch};
use crate::store::ContentStore;

/// State machine for the content item lifecycle.
pub struct ContentStateMachine {
    store: Arc<dyn ContentStore>,
}

impl ContentStateMachine {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Current lifecycle state of an item
    pub async fn current_state(&self, id: Uuid) -> StateMachineResult<ContentState> {
        let item = self.load(id).await?;
        Ok(item.state)
    }

    /// Attempt to apply `event` to the item.
    ///
    /// Returns the updated item on success. On any failure the item is left
    /// exactly as it was; multi-field side effects land in a single store
    /// write.
    pub async fn apply(&self, id: Uuid, event: ContentEvent) -> StateMachineResult<ContentItem> {
        let item = self.load(id).await?;
        let target = Self::determine_target_state(item.state, &event)?;
        self.check_guards(&item, &event).await?;

        let updated = match &event {
            ContentEvent::MarkPosted => {
                // Slot release and position compaction must be one batch
                let released = item.queue_position.unwrap_or(0);
                self.store
                    .release_and_compact(
                        id,
                        released,
                        ContentItemPatch::state(target)
                            .with_queue_position(None)
                            .with_published_at(chrono::Utc::now()),
                    )
                    .await?
            }
            ContentEvent::RevisionReady { body } => {
                self.store
                    .update_fields(
                        id,
                        ContentItemPatch::state(target)
                            .with_body(body.clone())
                            .with_version(item.version + 1),
                    )
                    .await?
            }
            ContentEvent::MarkQueued { position } => {
                self.store
                    .update_fields(
                        id,
                        ContentItemPatch::state(target).with_queue_position(Some(*position)),
                    )
                    .await?
            }
            _ => {
                self.store
                    .update_fields(id, ContentItemPatch::state(target))
                    .await?
            }
        };

        info!(
            target: "lifecycle",
            content_id = %id,
            from = %item.state,
            to = %target,
            event = event.event_type(),
            "Content transition applied"
        );

        Ok(updated)
    }

    /// Determine the target state for an event, or reject it.
    pub fn determine_target_state(
        current: ContentState,
        event: &ContentEvent,
    ) -> StateMachineResult<ContentState> {
        let target = match (current, event) {
            (ContentState::Draft, ContentEvent::SendForReview { .. }) => {
                ContentState::PendingApproval
            }
            (ContentState::PendingApproval, ContentEvent::Approve) => ContentState::Approved,
            (ContentState::PendingApproval, ContentEvent::RequestRevision { .. }) => {
                ContentState::Revision
            }
            (ContentState::Revision, ContentEvent::RevisionReady { .. }) => {
                ContentState::PendingApproval
            }
            (ContentState::Approved, ContentEvent::MarkQueued { .. }) => ContentState::Queued,
            (ContentState::Queued, ContentEvent::MarkPosted) => ContentState::Posted,

            (from, event) => {
                return Err(StateMachineError::invalid_transition(
                    from,
                    event.event_type(),
                ))
            }
        };

        Ok(target)
    }

    async fn check_guards(&self, item: &ContentItem, event: &ContentEvent) -> StateMachineResult<()> {
        match event {
            // Review requires a thread already bound to this item
            ContentEvent::SendForReview { thread_id } => {
                let thread = self
                    .store
                    .thread(thread_id)
                    .await?
                    .ok_or_else(|| {
                        StateMachineError::guard_failed(format!(
                            "review thread {thread_id} does not exist"
                        ))
                    })?;
                if thread.content_id != item.id {
                    return Err(StateMachineError::guard_failed(format!(
                        "review thread {thread_id} governs a different item"
                    )));
                }
                if !thread.is_open() {
                    return Err(StateMachineError::guard_failed(format!(
                        "review thread {thread_id} is already resolved"
                    )));
                }
            }

            ContentEvent::MarkQueued { position } => {
                if *position < 1 {
                    return Err(StateMachineError::guard_failed(format!(
                        "queue position must be positive, got {position}"
                    )));
                }
                if item.queue_position.is_some() {
                    return Err(StateMachineError::guard_failed(format!(
                        "item {} already holds a queue position",
                        item.id
                    )));
                }
            }

            ContentEvent::MarkPosted => {
                if item.queue_position.is_none() {
                    return Err(StateMachineError::guard_failed(format!(
                        "item {} is not holding a queue slot",
                        item.id
                    )));
                }
            }

            _ => {}
        }

        Ok(())
    }

    /// Compensation for a failed approve-and-enqueue step: put an `approved`
    /// item back to `pending_approval` so approval and enqueue stay
    /// all-or-nothing.
    pub async fn roll_back_approval(&self, id: Uuid) -> StateMachineResult<ContentItem> {
        let item = self.load(id).await?;
        if item.state != ContentState::Approved {
            return Err(StateMachineError::guard_failed(format!(
                "cannot roll back approval from {}",
                item.state
            )));
        }
        warn!(
            target: "lifecycle",
            content_id = %id,
            "Rolling approval back after enqueue failure"
        );
        Ok(self
            .store
            .update_fields(id, ContentItemPatch::state(ContentState::PendingApproval))
            .await?)
    }

    async fn load(&self, id: Uuid) -> StateMachineResult<ContentItem> {
        self.store
            .get(id)
            .await?
            .ok_or(StateMachineError::ContentNotFound { id })
    }
}
