//! Crate-level error type.
//!
//! Each module owns its own error enum; this wrapper exists for callers
//! that drive several components and want one error surface. Only
//! [`StoreError::Unavailable`](crate::store::StoreError::Unavailable)-rooted
//! failures are transient and worth retrying; everything else needs new
//! input before a retry can succeed.

use thiserror::Error;

use crate::approval::ApprovalError;
use crate::orchestration::{IntakeError, LineupError, PublishError};
use crate::queue::QueueError;
use crate::state_machine::StateMachineError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum LineupCoreError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Transition(#[from] StateMachineError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Approval(#[from] ApprovalError),

    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error(transparent)]
    Lineup(#[from] LineupError),

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl LineupCoreError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// True for transient failures the caller may retry on a later tick
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Store(err) => err.is_transient(),
            Self::Transition(err) => err.is_transient(),
            Self::Queue(err) => err.is_transient(),
            Self::Approval(err) => err.is_transient(),
            Self::Intake(err) => err.is_transient(),
            Self::Publish(err) => err.is_transient(),
            Self::Lineup(_) | Self::Configuration { .. } => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, LineupCoreError>;
