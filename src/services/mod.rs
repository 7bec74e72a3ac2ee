//! # Collaborator Interfaces
//!
//! Abstract contracts for everything the engine delegates: text generation,
//! reply classification, reaching the human reviewer, and the per-category
//! publishing targets. The engine never knows how these are implemented;
//! production wires in vendor SDK adapters, tests wire in fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{ContentCategory, ContentItem};
use crate::orchestration::lineup::LineupReport;

/// Errors reported by collaborator implementations.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("Content generation failed: {message}")]
    Generation { message: String },

    #[error("Reply classification failed: {message}")]
    Classification { message: String },

    #[error("Review transport failed: {message}")]
    Transport { message: String },

    #[error("Publishing failed: {message}")]
    Publish { message: String },
}

impl CollaboratorError {
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }

    pub fn classification(message: impl Into<String>) -> Self {
        Self::Classification {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn publish(message: impl Into<String>) -> Self {
        Self::Publish {
            message: message.into(),
        }
    }
}

pub type CollaboratorResult<T> = Result<T, CollaboratorError>;

/// One generated piece of content, not yet persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedItem {
    pub category: ContentCategory,
    pub title: Option<String>,
    pub body: String,
}

/// Everything the generator produced from one raw idea.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedBundle {
    /// The generator's note on what it decided to make and why
    pub assessment: String,
    pub items: Vec<GeneratedItem>,
}

/// Raw classifier output for a reviewer reply. Parsing into the closed
/// [`ReplyIntent`](crate::approval::ReplyIntent) set happens in the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedReply {
    pub intent: String,
    pub feedback: Option<String>,
}

/// Receipt from a publishing target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishReceipt {
    pub external_id: String,
}

/// Turns raw idea text into content, and reworks content from feedback.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Generate a bundle of content items from one raw idea
    async fn generate(&self, raw_idea: &str) -> CollaboratorResult<GeneratedBundle>;

    /// Produce a revised body from the original text and reviewer feedback
    async fn revise(&self, original: &str, feedback: &str) -> CollaboratorResult<String>;
}

/// Classifies a free-text reviewer reply.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, reply: &str) -> CollaboratorResult<ClassifiedReply>;
}

/// Reaches the human reviewer, however that happens.
#[async_trait]
pub trait ReviewTransport: Send + Sync {
    /// Send freshly generated items out for review; returns the id of the
    /// conversation thread the replies will arrive on
    async fn notify_for_review(&self, items: &[ContentItem]) -> CollaboratorResult<String>;

    /// Send a revised item back out on the existing thread
    async fn notify_revised(&self, item: &ContentItem, thread_id: &str) -> CollaboratorResult<()>;

    /// Confirm to the reviewer that their approval was applied
    async fn notify_confirmation(&self, thread_id: &str) -> CollaboratorResult<()>;

    /// Deliver the upcoming-schedule report
    async fn send_lineup(&self, report: &LineupReport) -> CollaboratorResult<()>;
}

/// A publishing target for one content category.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, item: &ContentItem) -> CollaboratorResult<PublishReceipt>;
}
