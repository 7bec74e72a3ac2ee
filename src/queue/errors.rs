//! Error types for queue operations.

use thiserror::Error;
use uuid::Uuid;

use crate::models::ContentCategory;
use crate::state_machine::StateMachineError;
use crate::store::StoreError;

/// Errors raised by the queue engine.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Content item {id} is already queued at position {position}")]
    AlreadyQueued { id: Uuid, position: i32 },

    /// Nothing occupies position 1; not a fault, the caller simply has
    /// nothing to publish this tick
    #[error("Queue for {category} is empty")]
    QueueEmpty { category: ContentCategory },

    #[error("No item occupies position {position}")]
    NoNextItem { position: i32 },

    #[error("Queue positions must be positive, got {position}")]
    InvalidPosition { position: i32 },

    #[error("Content item {id} is not in the queue")]
    NotQueued { id: Uuid },

    #[error("Content item {id} belongs to {actual}, not {expected}")]
    CategoryMismatch {
        id: Uuid,
        expected: ContentCategory,
        actual: ContentCategory,
    },

    #[error("Content item not found: {id}")]
    ContentNotFound { id: Uuid },

    #[error(transparent)]
    Transition(#[from] StateMachineError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl QueueError {
    /// True for transient store failures the caller may retry
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Store(err) => err.is_transient(),
            Self::Transition(err) => err.is_transient(),
            _ => false,
        }
    }
}

pub type QueueResult<T> = Result<T, QueueError>;
