//! # Content Store
//!
//! Durable storage seam for content items and conversation threads. The
//! engine only ever talks to the [`ContentStore`] trait; every method is a
//! single atomic operation from the caller's point of view, and
//! [`release_and_compact`](ContentStore::release_and_compact) additionally
//! guarantees that the slot-clearing patch and the position shift land as
//! one batch so no reader can observe a gap in a category's positions.
//!
//! Two implementations ship with the crate:
//! [`PostgresContentStore`](postgres::PostgresContentStore) for production
//! and [`InMemoryContentStore`](memory::InMemoryContentStore) for tests and
//! local runs.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    ContentCategory, ContentItem, ContentItemPatch, ConversationThread, NewContentItem,
    NewConversationThread, ThreadPatch,
};
use crate::state_machine::ContentState;

pub use memory::InMemoryContentStore;
pub use postgres::PostgresContentStore;

/// Errors surfaced by a content store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Content item not found: {id}")]
    ContentNotFound { id: Uuid },

    #[error("Conversation thread not found: {thread_id}")]
    ThreadNotFound { thread_id: String },

    #[error("Conversation thread already exists: {thread_id}")]
    ThreadExists { thread_id: String },

    /// Transient store failure; safe for the caller to retry on a later tick
    #[error("Store unavailable: {message}")]
    Unavailable { message: String },
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// True for transient failures the caller may retry
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unavailable {
            message: err.to_string(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage contract for content items and conversation threads.
///
/// Implementations must make each method atomic; multi-row effects
/// (`release_and_compact`) must be a single batch. Timeouts are the
/// implementation's job and surface as [`StoreError::Unavailable`].
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Fetch a content item by id
    async fn get(&self, id: Uuid) -> StoreResult<Option<ContentItem>>;

    /// Insert a new content item in `draft` state with version 1
    async fn insert(&self, item: NewContentItem) -> StoreResult<ContentItem>;

    /// Apply a partial update to one item; all fields land or none do
    async fn update_fields(&self, id: Uuid, patch: ContentItemPatch) -> StoreResult<ContentItem>;

    /// All items in a category with the given state
    async fn find_by_category_and_state(
        &self,
        category: ContentCategory,
        state: ContentState,
    ) -> StoreResult<Vec<ContentItem>>;

    /// The item holding `position` in the category queue, if any
    async fn find_by_position(
        &self,
        category: ContentCategory,
        position: i32,
    ) -> StoreResult<Option<ContentItem>>;

    /// Queued items of a category ordered by position, up to `limit`
    async fn queued_in_order(
        &self,
        category: ContentCategory,
        limit: i64,
    ) -> StoreResult<Vec<ContentItem>>;

    /// Highest occupied position in the category queue, `None` when empty
    async fn max_position(&self, category: ContentCategory) -> StoreResult<Option<i32>>;

    /// Atomically apply `patch` to the item (which must clear its queue slot)
    /// and decrement every higher position in the same category by one.
    ///
    /// Returns the updated item. The caller passes the released position so
    /// the shift boundary does not depend on re-reading the row.
    async fn release_and_compact(
        &self,
        id: Uuid,
        released_position: i32,
        patch: ContentItemPatch,
    ) -> StoreResult<ContentItem>;

    /// Atomically reassign queue positions for a small set of items (the
    /// pairwise swap and displacement moves). All reassignments land
    /// together or not at all; implementations must tolerate transiently
    /// colliding positions inside the batch.
    async fn reassign_positions(&self, moves: &[(Uuid, i32)]) -> StoreResult<()>;

    /// Fetch a conversation thread by external id
    async fn thread(&self, thread_id: &str) -> StoreResult<Option<ConversationThread>>;

    /// Insert a new thread in `pending_approval` status
    async fn insert_thread(
        &self,
        thread: NewConversationThread,
    ) -> StoreResult<ConversationThread>;

    /// Apply a partial update to one thread
    async fn update_thread(
        &self,
        thread_id: &str,
        patch: ThreadPatch,
    ) -> StoreResult<ConversationThread>;
}
