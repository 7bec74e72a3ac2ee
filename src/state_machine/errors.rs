//! Error types for the content lifecycle state machine.

use thiserror::Error;
use uuid::Uuid;

use super::states::ContentState;
use crate::store::StoreError;

/// Errors raised while resolving or applying a lifecycle transition.
#[derive(Debug, Error)]
pub enum StateMachineError {
    /// The `(state, event)` pair is not in the transition table. The item is
    /// left untouched.
    #[error("Invalid transition: {event} is not legal from {from}")]
    InvalidTransition {
        from: ContentState,
        event: &'static str,
    },

    #[error("Content item not found: {id}")]
    ContentNotFound { id: Uuid },

    /// A guard condition rejected an otherwise-listed transition
    #[error("Transition guard failed: {reason}")]
    GuardFailed { reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl StateMachineError {
    pub fn invalid_transition(from: ContentState, event: &'static str) -> Self {
        Self::InvalidTransition { from, event }
    }

    pub fn guard_failed(reason: impl Into<String>) -> Self {
        Self::GuardFailed {
            reason: reason.into(),
        }
    }

    /// True for transient store failures the caller may retry
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Store(err) if err.is_transient())
    }
}

pub type StateMachineResult<T> = Result<T, StateMachineError>;
