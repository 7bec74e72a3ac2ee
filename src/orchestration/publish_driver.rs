//! # Publish Driver
//!
//! Drives the periodic publish tick for one category: look at the head of
//! the queue, hand it to that category's publishing target, and only after
//! the target confirms delivery move the item to `posted` (which stamps
//! `published_at` and compacts the queue in one batch).
//!
//! The driver holds the category's lock for the whole tick, so two ticks
//! firing close together serialize: the second one sees either the next
//! head or an empty queue, never the item the first tick is mid-publishing.
//! A failed publish leaves the item queued at position 1 for a later tick;
//! the failure surfaces to the caller and is never retried here.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::ContentCategory;
use crate::queue::{QueueEngine, QueueError};
use crate::services::Publisher;
use crate::state_machine::{ContentEvent, ContentStateMachine, StateMachineError};

/// What a publish tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The head item was delivered and moved to `posted`
    Published {
        content_id: Uuid,
        external_id: String,
    },
    /// Nothing queued; the tick was a no-op
    QueueEmpty,
}

/// Errors raised by a publish tick.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The external target rejected or failed the delivery; the item stays
    /// queued at position 1 for a later tick
    #[error("Publishing {content_id} to {category} failed: {message}")]
    PublishFailed {
        category: ContentCategory,
        content_id: Uuid,
        message: String,
    },

    #[error("No publisher registered for {category}")]
    NoPublisher { category: ContentCategory },

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Transition(#[from] StateMachineError),
}

impl PublishError {
    /// True for transient store failures the caller may retry
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Queue(err) => err.is_transient(),
            Self::Transition(err) => err.is_transient(),
            _ => false,
        }
    }
}

/// Periodic publish driver over the queue engine.
pub struct PublishDriver {
    queue: Arc<QueueEngine>,
    machine: Arc<ContentStateMachine>,
    publishers: HashMap<ContentCategory, Arc<dyn Publisher>>,
}

impl PublishDriver {
    pub fn new(queue: Arc<QueueEngine>, machine: Arc<ContentStateMachine>) -> Self {
        Self {
            queue,
            machine,
            publishers: HashMap::new(),
        }
    }

    /// Register the publishing target for a category
    pub fn with_publisher(
        mut self,
        category: ContentCategory,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        self.publishers.insert(category, publisher);
        self
    }

    /// Run one publish tick for a category.
    pub async fn run_tick(&self, category: ContentCategory) -> Result<TickOutcome, PublishError> {
        let publisher = self
            .publishers
            .get(&category)
            .ok_or(PublishError::NoPublisher { category })?;

        // Hold the category slot for the whole tick; overlapping ticks
        // serialize here instead of double-publishing the same head.
        let _slot = self.queue.locks().acquire(category).await;

        let head = match self.queue.head_unlocked(category).await {
            Ok(item) => item,
            Err(QueueError::QueueEmpty { .. }) => {
                info!(target: "publish_driver", category = %category, "Queue empty, nothing to publish");
                return Ok(TickOutcome::QueueEmpty);
            }
            Err(err) => return Err(err.into()),
        };

        let receipt = match publisher.publish(&head).await {
            Ok(receipt) => receipt,
            Err(err) => {
                warn!(
                    target: "publish_driver",
                    category = %category,
                    content_id = %head.id,
                    error = %err,
                    "Publish failed, item stays queued at head"
                );
                return Err(PublishError::PublishFailed {
                    category,
                    content_id: head.id,
                    message: err.to_string(),
                });
            }
        };

        let posted = self.machine.apply(head.id, ContentEvent::MarkPosted).await?;

        info!(
            target: "publish_driver",
            category = %category,
            content_id = %posted.id,
            external_id = %receipt.external_id,
            "Published queue head"
        );

        Ok(TickOutcome::Published {
            content_id: posted.id,
            external_id: receipt.external_id,
        })
    }
}
