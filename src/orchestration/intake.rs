//! # Intake Processor
//!
//! Entry point for inbound triggers. A trigger is one message observed on a
//! conversation thread: either a brand-new idea (no thread on record) or a
//! reviewer's reply to an open review cycle.
//!
//! New ideas fan out through the generator, land as `draft` items, and the
//! first item goes out for review on a fresh thread. Replies pass the
//! idempotency gate, get classified, and resolve into exactly one lifecycle
//! transition. The thread's watermark only advances after the transition
//! committed, so a trigger that fails downstream can be retried; a trigger
//! that was already applied reports success without touching anything.

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::approval::{ApprovalError, ApprovalResolution, ResolutionOutcome};
use crate::idempotency::IdempotencyGuard;
use crate::models::{NewContentItem, NewConversationThread, ThreadPatch};
use crate::services::{CollaboratorError, ContentGenerator, GeneratedBundle, IntentClassifier, ReviewTransport};
use crate::state_machine::{ContentEvent, ContentStateMachine, StateMachineError};
use crate::store::{ContentStore, StoreError};

/// One inbound message, already pulled off the transport.
#[derive(Debug, Clone)]
pub struct InboundTrigger {
    /// Conversation thread the message arrived on
    pub thread_id: String,
    /// Transport timestamp of the message; drives the idempotency gate
    pub received_at: DateTime<Utc>,
    /// Raw message text
    pub body: String,
}

/// What processing an inbound trigger did.
#[derive(Debug, Clone)]
pub enum IntakeOutcome {
    /// A new idea was expanded into draft content; the first item is out
    /// for review
    ContentGenerated {
        review_thread_id: String,
        content_ids: Vec<Uuid>,
        assessment: String,
    },
    /// A reply was classified and applied
    Applied(ResolutionOutcome),
    /// The message was at or behind the thread's watermark; nothing done.
    /// Still a success: the transport should consume the message.
    AlreadyApplied { thread_id: String },
    /// The thread's review cycle is over; the reply governs nothing
    ThreadResolved { thread_id: String },
}

/// Errors raised while processing an inbound trigger.
#[derive(Debug, Error)]
pub enum IntakeError {
    /// The generator returned no items or an empty body; nothing persisted
    #[error("Generator returned no usable content")]
    EmptyGeneration,

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    #[error(transparent)]
    Approval(#[from] ApprovalError),

    #[error(transparent)]
    Transition(#[from] StateMachineError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntakeError {
    /// True for transient store failures the caller may retry
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Store(err) => err.is_transient(),
            Self::Approval(err) => err.is_transient(),
            Self::Transition(err) => err.is_transient(),
            _ => false,
        }
    }
}

pub type IntakeResult<T> = Result<T, IntakeError>;

/// Drives an inbound trigger end to end.
pub struct IntakeProcessor {
    store: Arc<dyn ContentStore>,
    machine: Arc<ContentStateMachine>,
    resolution: ApprovalResolution,
    guard: IdempotencyGuard,
    generator: Arc<dyn ContentGenerator>,
    classifier: Arc<dyn IntentClassifier>,
    transport: Arc<dyn ReviewTransport>,
}

impl IntakeProcessor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn ContentStore>,
        machine: Arc<ContentStateMachine>,
        resolution: ApprovalResolution,
        guard: IdempotencyGuard,
        generator: Arc<dyn ContentGenerator>,
        classifier: Arc<dyn IntentClassifier>,
        transport: Arc<dyn ReviewTransport>,
    ) -> Self {
        Self {
            store,
            machine,
            resolution,
            guard,
            generator,
            classifier,
            transport,
        }
    }

    /// Process one inbound trigger: a new idea or a reply to an open thread.
    pub async fn process_inbound(&self, trigger: InboundTrigger) -> IntakeResult<IntakeOutcome> {
        match self.store.thread(&trigger.thread_id).await? {
            Some(_) => self.process_reply(trigger).await,
            None => self.process_new_idea(trigger).await,
        }
    }

    async fn process_new_idea(&self, trigger: InboundTrigger) -> IntakeResult<IntakeOutcome> {
        let bundle = self.generator.generate(&trigger.body).await?;
        Self::validate_bundle(&bundle)?;

        let items = try_join_all(bundle.items.iter().map(|generated| {
            self.store.insert(NewContentItem::new(
                generated.category,
                generated.title.clone(),
                generated.body.clone(),
            ))
        }))
        .await?;

        // The first piece goes out for review; the rest wait as drafts until
        // their own review cycle starts.
        let review_thread_id = self.transport.notify_for_review(&items).await?;
        let first = &items[0];
        self.store
            .insert_thread(NewConversationThread::new(
                review_thread_id.clone(),
                first.id,
            ))
            .await?;
        self.machine
            .apply(
                first.id,
                ContentEvent::SendForReview {
                    thread_id: review_thread_id.clone(),
                },
            )
            .await?;

        info!(
            target: "intake",
            review_thread_id = %review_thread_id,
            generated = items.len(),
            "New idea expanded into draft content"
        );

        Ok(IntakeOutcome::ContentGenerated {
            review_thread_id,
            content_ids: items.iter().map(|item| item.id).collect(),
            assessment: bundle.assessment,
        })
    }

    async fn process_reply(&self, trigger: InboundTrigger) -> IntakeResult<IntakeOutcome> {
        // Serialize per thread: two deliveries of the same message cannot
        // both pass the watermark check.
        let _permit = self.guard.acquire(&trigger.thread_id).await;

        let thread = self
            .store
            .thread(&trigger.thread_id)
            .await?
            .ok_or_else(|| StoreError::ThreadNotFound {
                thread_id: trigger.thread_id.clone(),
            })?;

        if !IdempotencyGuard::should_apply(&thread, trigger.received_at) {
            info!(
                target: "intake",
                thread_id = %thread.id,
                "Message at or behind watermark, skipping"
            );
            return Ok(IntakeOutcome::AlreadyApplied { thread_id: thread.id });
        }

        if !thread.is_open() {
            warn!(
                target: "intake",
                thread_id = %thread.id,
                "Reply on a resolved thread, nothing to govern"
            );
            return Ok(IntakeOutcome::ThreadResolved { thread_id: thread.id });
        }

        let classified = self.classifier.classify(&trigger.body).await?;
        let outcome = self.resolution.apply(&thread, classified).await?;

        match &outcome {
            ResolutionOutcome::Approved { .. } => {
                self.store
                    .update_thread(&thread.id, ThreadPatch::resolved())
                    .await?;
                self.guard
                    .mark_applied(&thread.id, trigger.received_at)
                    .await?;
                self.transport.notify_confirmation(&thread.id).await?;
            }
            ResolutionOutcome::RevisionRequested {
                content_id,
                feedback,
            } => {
                let item = self.store.get(*content_id).await?.ok_or(
                    StateMachineError::ContentNotFound { id: *content_id },
                )?;
                let revised_body = self.generator.revise(&item.body, feedback).await?;
                if revised_body.trim().is_empty() {
                    return Err(IntakeError::EmptyGeneration);
                }
                let revised = self
                    .machine
                    .apply(
                        *content_id,
                        ContentEvent::RevisionReady { body: revised_body },
                    )
                    .await?;
                self.guard
                    .mark_applied(&thread.id, trigger.received_at)
                    .await?;
                self.transport.notify_revised(&revised, &thread.id).await?;
            }
        }

        info!(
            target: "intake",
            thread_id = %thread.id,
            "Reply applied"
        );

        Ok(IntakeOutcome::Applied(outcome))
    }

    fn validate_bundle(bundle: &GeneratedBundle) -> IntakeResult<()> {
        if bundle.items.is_empty() {
            return Err(IntakeError::EmptyGeneration);
        }
        if bundle.items.iter().any(|item| item.body.trim().is_empty()) {
            return Err(IntakeError::EmptyGeneration);
        }
        Ok(())
    }
}
