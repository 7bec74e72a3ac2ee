//! # Approval Resolution
//!
//! Maps a classified reviewer reply onto exactly one lifecycle transition.
//! Intent is a closed tagged enum, so the approve/revise branch is an
//! exhaustive match rather than string comparison scattered through call
//! sites; anything the classifier produces outside the closed set fails as
//! [`ApprovalError::UnknownIntent`] and the thread is left untouched for
//! the reviewer to retry with clearer wording.
//!
//! Approval and enqueue are one all-or-nothing step: when the enqueue half
//! fails, the state change is rolled back before the error surfaces.

use std::sync::Arc;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use crate::models::ConversationThread;
use crate::queue::{QueueEngine, QueueError};
use crate::services::ClassifiedReply;
use crate::state_machine::{ContentEvent, ContentStateMachine, StateMachineError};

/// The classified meaning of a reviewer's reply.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum ReplyIntent {
    /// Queue the content as-is
    Approve,
    /// Rework the content with the reviewer's feedback
    Revise { feedback: String },
}

impl TryFrom<ClassifiedReply> for ReplyIntent {
    type Error = ApprovalError;

    fn try_from(reply: ClassifiedReply) -> Result<Self, Self::Error> {
        match reply.intent.as_str() {
            "approve" => Ok(Self::Approve),
            "revise" => Ok(Self::Revise {
                feedback: reply.feedback.unwrap_or_default(),
            }),
            _ => Err(ApprovalError::UnknownIntent {
                intent: reply.intent,
            }),
        }
    }
}

/// What a successfully applied reply did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// Item approved and enqueued at `position`
    Approved { content_id: Uuid, position: i32 },
    /// Item moved to revision; the caller owns producing the new text
    RevisionRequested { content_id: Uuid, feedback: String },
}

/// Errors raised while resolving a reply.
#[derive(Debug, Error)]
pub enum ApprovalError {
    /// The classifier produced something outside the closed intent set
    #[error("Unknown reply intent: {intent}")]
    UnknownIntent { intent: String },

    #[error(transparent)]
    Transition(#[from] StateMachineError),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

impl ApprovalError {
    /// True for transient store failures the caller may retry
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transition(err) => err.is_transient(),
            Self::Queue(err) => err.is_transient(),
            Self::UnknownIntent { .. } => false,
        }
    }
}

pub type ApprovalResult<T> = Result<T, ApprovalError>;

/// Dispatch table from reply intent to lifecycle transition.
pub struct ApprovalResolution {
    machine: Arc<ContentStateMachine>,
    queue: Arc<QueueEngine>,
}

impl ApprovalResolution {
    pub fn new(machine: Arc<ContentStateMachine>, queue: Arc<QueueEngine>) -> Self {
        Self { machine, queue }
    }

    /// Apply a classified reply against the item the thread governs.
    pub async fn apply(
        &self,
        thread: &ConversationThread,
        reply: ClassifiedReply,
    ) -> ApprovalResult<ResolutionOutcome> {
        let content_id = thread.content_id;

        match ReplyIntent::try_from(reply)? {
            ReplyIntent::Approve => {
                let item = self.machine.apply(content_id, ContentEvent::Approve).await?;
                match self.queue.enqueue(content_id, item.category).await {
                    Ok(position) => Ok(ResolutionOutcome::Approved {
                        content_id,
                        position,
                    }),
                    Err(enqueue_err) => {
                        if let Err(rollback_err) =
                            self.machine.roll_back_approval(content_id).await
                        {
                            error!(
                                target: "approval",
                                content_id = %content_id,
                                error = %rollback_err,
                                "Approval rollback failed; item left approved but unqueued"
                            );
                        }
                        Err(enqueue_err.into())
                    }
                }
            }
            ReplyIntent::Revise { feedback } => {
                self.machine
                    .apply(
                        content_id,
                        ContentEvent::RequestRevision {
                            feedback: feedback.clone(),
                        },
                    )
                    .await?;
                Ok(ResolutionOutcome::RevisionRequested {
                    content_id,
                    feedback,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_parsing() {
        let approve = ClassifiedReply {
            intent: "approve".to_string(),
            feedback: None,
        };
        assert_eq!(ReplyIntent::try_from(approve).unwrap(), ReplyIntent::Approve);

        let revise = ClassifiedReply {
            intent: "revise".to_string(),
            feedback: Some("shorten it".to_string()),
        };
        assert_eq!(
            ReplyIntent::try_from(revise).unwrap(),
            ReplyIntent::Revise {
                feedback: "shorten it".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_intents_rejected() {
        for raw in ["swap", "skip", "maybe", ""] {
            let reply = ClassifiedReply {
                intent: raw.to_string(),
                feedback: None,
            };
            let err = ReplyIntent::try_from(reply).unwrap_err();
            assert!(matches!(err, ApprovalError::UnknownIntent { .. }));
        }
    }

    #[test]
    fn test_revise_without_feedback_gets_empty_string() {
        let reply = ClassifiedReply {
            intent: "revise".to_string(),
            feedback: None,
        };
        assert_eq!(
            ReplyIntent::try_from(reply).unwrap(),
            ReplyIntent::Revise {
                feedback: String::new()
            }
        );
    }
}
