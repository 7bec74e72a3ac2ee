//! PostgreSQL content store.
//!
//! Production implementation over `sqlx`. Column layout:
//!
//! ```sql
//! CREATE TABLE content_items (
//!   id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!   category TEXT NOT NULL,
//!   state TEXT NOT NULL DEFAULT 'draft',
//!   version INTEGER NOT NULL DEFAULT 1,
//!   queue_position INTEGER,
//!   title TEXT,
//!   body TEXT NOT NULL,
//!   published_at TIMESTAMPTZ,
//!   created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!   updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!   UNIQUE (category, queue_position)
//! );
//!
//! CREATE TABLE conversation_threads (
//!   id TEXT PRIMARY KEY,
//!   content_id UUID NOT NULL REFERENCES content_items (id),
//!   status TEXT NOT NULL DEFAULT 'pending_approval',
//!   last_applied_at TIMESTAMPTZ,
//!   created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```
//!
//! Every call is bounded by the configured timeout; an elapsed timeout maps
//! to [`StoreError::Unavailable`], which is the only error class callers are
//! expected to retry. The release-and-compact pair runs inside one
//! transaction so the contiguity invariant is never visible mid-shift.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::future::Future;
use std::time::Duration;
use uuid::Uuid;

use super::{ContentStore, StoreError, StoreResult};
use crate::models::{
    ContentCategory, ContentItem, ContentItemPatch, ConversationThread, NewContentItem,
    NewConversationThread, ThreadPatch,
};
use crate::state_machine::ContentState;

const ITEM_COLUMNS: &str =
    "id, category, state, version, queue_position, title, body, published_at, created_at, updated_at";
const THREAD_COLUMNS: &str = "id, content_id, status, last_applied_at, created_at";

/// Content store backed by PostgreSQL.
pub struct PostgresContentStore {
    pool: PgPool,
    timeout: Duration,
}

impl PostgresContentStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Run a store operation under the configured deadline
    async fn bounded<T, F>(&self, operation: &str, fut: F) -> StoreResult<T>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::unavailable(format!(
                "{operation} timed out after {}ms",
                self.timeout.as_millis()
            ))),
        }
    }

    fn push_patch(builder: &mut QueryBuilder<'_, Postgres>, patch: &ContentItemPatch) {
        if let Some(state) = patch.state {
            builder.push(", state = ");
            builder.push_bind(state.to_string());
        }
        if let Some(ref body) = patch.body {
            builder.push(", body = ");
            builder.push_bind(body.clone());
        }
        if let Some(version) = patch.version {
            builder.push(", version = ");
            builder.push_bind(version);
        }
        if let Some(position) = patch.queue_position {
            builder.push(", queue_position = ");
            builder.push_bind(position);
        }
        if let Some(published_at) = patch.published_at {
            builder.push(", published_at = ");
            builder.push_bind(published_at);
        }
    }
}

#[async_trait]
impl ContentStore for PostgresContentStore {
    async fn get(&self, id: Uuid) -> StoreResult<Option<ContentItem>> {
        self.bounded("get", async {
            let item = sqlx::query_as::<_, ContentItem>(&format!(
                "SELECT {ITEM_COLUMNS} FROM content_items WHERE id = $1"
            ))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
            Ok(item)
        })
        .await
    }

    async fn insert(&self, item: NewContentItem) -> StoreResult<ContentItem> {
        self.bounded("insert", async {
            let stored = sqlx::query_as::<_, ContentItem>(&format!(
                r#"
                INSERT INTO content_items (category, state, version, title, body)
                VALUES ($1, 'draft', 1, $2, $3)
                RETURNING {ITEM_COLUMNS}
                "#
            ))
            .bind(item.category.to_string())
            .bind(item.title)
            .bind(item.body)
            .fetch_one(&self.pool)
            .await?;
            Ok(stored)
        })
        .await
    }

    async fn update_fields(&self, id: Uuid, patch: ContentItemPatch) -> StoreResult<ContentItem> {
        self.bounded("update_fields", async {
            let mut builder =
                QueryBuilder::<Postgres>::new("UPDATE content_items SET updated_at = NOW()");
            Self::push_patch(&mut builder, &patch);
            builder.push(" WHERE id = ");
            builder.push_bind(id);
            builder.push(format!(" RETURNING {ITEM_COLUMNS}"));

            builder
                .build_query_as::<ContentItem>()
                .fetch_optional(&self.pool)
                .await?
                .ok_or(StoreError::ContentNotFound { id })
        })
        .await
    }

    async fn find_by_category_and_state(
        &self,
        category: ContentCategory,
        state: ContentState,
    ) -> StoreResult<Vec<ContentItem>> {
        self.bounded("find_by_category_and_state", async {
            let items = sqlx::query_as::<_, ContentItem>(&format!(
                r#"
                SELECT {ITEM_COLUMNS} FROM content_items
                WHERE category = $1 AND state = $2
                ORDER BY created_at
                "#
            ))
            .bind(category.to_string())
            .bind(state.to_string())
            .fetch_all(&self.pool)
            .await?;
            Ok(items)
        })
        .await
    }

    async fn find_by_position(
        &self,
        category: ContentCategory,
        position: i32,
    ) -> StoreResult<Option<ContentItem>> {
        self.bounded("find_by_position", async {
            let item = sqlx::query_as::<_, ContentItem>(&format!(
                r#"
                SELECT {ITEM_COLUMNS} FROM content_items
                WHERE category = $1 AND queue_position = $2
                "#
            ))
            .bind(category.to_string())
            .bind(position)
            .fetch_optional(&self.pool)
            .await?;
            Ok(item)
        })
        .await
    }

    async fn queued_in_order(
        &self,
        category: ContentCategory,
        limit: i64,
    ) -> StoreResult<Vec<ContentItem>> {
        self.bounded("queued_in_order", async {
            let items = sqlx::query_as::<_, ContentItem>(&format!(
                r#"
                SELECT {ITEM_COLUMNS} FROM content_items
                WHERE category = $1 AND queue_position IS NOT NULL
                ORDER BY queue_position
                LIMIT $2
                "#
            ))
            .bind(category.to_string())
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
            Ok(items)
        })
        .await
    }

    async fn max_position(&self, category: ContentCategory) -> StoreResult<Option<i32>> {
        self.bounded("max_position", async {
            let max: Option<i32> = sqlx::query_scalar(
                "SELECT MAX(queue_position) FROM content_items WHERE category = $1",
            )
            .bind(category.to_string())
            .fetch_one(&self.pool)
            .await?;
            Ok(max)
        })
        .await
    }

    async fn release_and_compact(
        &self,
        id: Uuid,
        released_position: i32,
        patch: ContentItemPatch,
    ) -> StoreResult<ContentItem> {
        self.bounded("release_and_compact", async {
            let mut tx = self.pool.begin().await?;

            let mut builder =
                QueryBuilder::<Postgres>::new("UPDATE content_items SET updated_at = NOW()");
            Self::push_patch(&mut builder, &patch);
            builder.push(" WHERE id = ");
            builder.push_bind(id);
            builder.push(format!(" RETURNING {ITEM_COLUMNS}"));

            let item = builder
                .build_query_as::<ContentItem>()
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(StoreError::ContentNotFound { id })?;

            sqlx::query(
                r#"
                UPDATE content_items
                SET queue_position = queue_position - 1, updated_at = NOW()
                WHERE category = $1 AND queue_position > $2
                "#,
            )
            .bind(item.category.to_string())
            .bind(released_position)
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
            Ok(item)
        })
        .await
    }

    async fn reassign_positions(&self, moves: &[(Uuid, i32)]) -> StoreResult<()> {
        self.bounded("reassign_positions", async {
            let mut tx = self.pool.begin().await?;

            // Park every moved row first so the (category, queue_position)
            // unique constraint never sees a transient collision.
            for (id, _) in moves {
                let parked = sqlx::query(
                    "UPDATE content_items SET queue_position = NULL, updated_at = NOW() WHERE id = $1",
                )
                .bind(id)
                .execute(&mut *tx)
                .await?;
                if parked.rows_affected() == 0 {
                    return Err(StoreError::ContentNotFound { id: *id });
                }
            }

            for (id, position) in moves {
                sqlx::query(
                    "UPDATE content_items SET queue_position = $2, updated_at = NOW() WHERE id = $1",
                )
                .bind(id)
                .bind(position)
                .execute(&mut *tx)
                .await?;
            }

            tx.commit().await?;
            Ok(())
        })
        .await
    }

    async fn thread(&self, thread_id: &str) -> StoreResult<Option<ConversationThread>> {
        self.bounded("thread", async {
            let thread = sqlx::query_as::<_, ConversationThread>(&format!(
                "SELECT {THREAD_COLUMNS} FROM conversation_threads WHERE id = $1"
            ))
            .bind(thread_id)
            .fetch_optional(&self.pool)
            .await?;
            Ok(thread)
        })
        .await
    }

    async fn insert_thread(
        &self,
        thread: NewConversationThread,
    ) -> StoreResult<ConversationThread> {
        self.bounded("insert_thread", async {
            let stored = sqlx::query_as::<_, ConversationThread>(&format!(
                r#"
                INSERT INTO conversation_threads (id, content_id, status)
                VALUES ($1, $2, 'pending_approval')
                ON CONFLICT (id) DO NOTHING
                RETURNING {THREAD_COLUMNS}
                "#
            ))
            .bind(thread.id.clone())
            .bind(thread.content_id)
            .fetch_optional(&self.pool)
            .await?;

            stored.ok_or(StoreError::ThreadExists {
                thread_id: thread.id,
            })
        })
        .await
    }

    async fn update_thread(
        &self,
        thread_id: &str,
        patch: ThreadPatch,
    ) -> StoreResult<ConversationThread> {
        self.bounded("update_thread", async {
            let mut builder =
                QueryBuilder::<Postgres>::new("UPDATE conversation_threads SET id = id");
            if let Some(status) = patch.status {
                builder.push(", status = ");
                builder.push_bind(status.to_string());
            }
            if let Some(content_id) = patch.content_id {
                builder.push(", content_id = ");
                builder.push_bind(content_id);
            }
            if let Some(applied_at) = patch.last_applied_at {
                builder.push(", last_applied_at = ");
                builder.push_bind(applied_at);
            }
            builder.push(" WHERE id = ");
            builder.push_bind(thread_id.to_string());
            builder.push(format!(" RETURNING {THREAD_COLUMNS}"));

            builder
                .build_query_as::<ConversationThread>()
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| StoreError::ThreadNotFound {
                    thread_id: thread_id.to_string(),
                })
        })
        .await
    }
}
