#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Lineup Core
//!
//! Content lifecycle and publishing queue engine: the part of the Lineup
//! content assistant that has to be right. Everything around it — reading
//! mail, calling a generative model, posting to publishing APIs — is a
//! single request/response to a vendor SDK and lives behind the
//! collaborator traits in [`services`].
//!
//! ## What the core guarantees
//!
//! - Every content item moves through a fixed lifecycle
//!   (`draft -> pending_approval -> {approved, revision}`,
//!   `approved -> queued -> posted`), and only the
//!   [`state_machine`] writes the state field.
//! - Each category's publishing queue is 1-based and gapless at every
//!   operation boundary: position 1 publishes next, the tail is the depth.
//! - Ambiguous human replies resolve into exactly one deterministic
//!   transition, and no reply is ever applied twice — even when the
//!   polling transport observes the same message in overlapping windows.
//!
//! ## Module Organization
//!
//! - [`models`] - Content items and conversation threads
//! - [`store`] - Storage seam with Postgres and in-memory implementations
//! - [`state_machine`] - Lifecycle states, events, and transitions
//! - [`queue`] - Position arithmetic and per-category serialization
//! - [`approval`] - Classified reply intent to transition dispatch
//! - [`idempotency`] - At-most-once application of inbound messages
//! - [`services`] - Collaborator traits (generator, classifier, transport,
//!   publishers)
//! - [`orchestration`] - Intake, publish tick, and lineup drivers
//! - [`config`] - Configuration management
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lineup_core::models::ContentCategory;
//! use lineup_core::queue::{CategoryLocks, QueueEngine};
//! use lineup_core::state_machine::ContentStateMachine;
//! use lineup_core::store::{ContentStore, InMemoryContentStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store: Arc<dyn ContentStore> = Arc::new(InMemoryContentStore::new());
//! let machine = Arc::new(ContentStateMachine::new(store.clone()));
//! let locks = CategoryLocks::new();
//! let queue = QueueEngine::new(store, machine, locks);
//!
//! let health = queue.health(ContentCategory::Blog, 2).await?;
//! println!("blog queue holds {} of {} wanted", health.ready, health.target);
//! # Ok(())
//! # }
//! ```

pub mod approval;
pub mod config;
pub mod error;
pub mod idempotency;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod queue;
pub mod services;
pub mod state_machine;
pub mod store;

pub use approval::{ApprovalError, ApprovalResolution, ReplyIntent, ResolutionOutcome};
pub use config::LineupConfig;
pub use error::{LineupCoreError, Result};
pub use idempotency::IdempotencyGuard;
pub use models::{ContentCategory, ContentItem, ConversationThread, ThreadStatus};
pub use orchestration::{
    InboundTrigger, IntakeOutcome, IntakeProcessor, LineupReporter, PublishDriver, TickOutcome,
};
pub use queue::{CategoryLocks, QueueEngine, QueueError, QueueHealth};
pub use state_machine::{ContentEvent, ContentState, ContentStateMachine, StateMachineError};
pub use store::{ContentStore, InMemoryContentStore, PostgresContentStore, StoreError};
