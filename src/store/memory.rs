//! In-memory content store.
//!
//! Backs tests and local runs. A single `RwLock` over both tables makes every
//! trait method trivially atomic, including the release-and-compact batch.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use super::{ContentStore, StoreError, StoreResult};
use crate::models::{
    ContentCategory, ContentItem, ContentItemPatch, ConversationThread, NewContentItem,
    NewConversationThread, ThreadPatch, ThreadStatus,
};
use crate::state_machine::ContentState;

#[derive(Default)]
struct Tables {
    items: HashMap<Uuid, ContentItem>,
    threads: HashMap<String, ConversationThread>,
}

/// Content store backed by process memory.
#[derive(Default)]
pub struct InMemoryContentStore {
    tables: RwLock<Tables>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn apply_patch(item: &mut ContentItem, patch: ContentItemPatch) {
        if let Some(state) = patch.state {
            item.state = state;
        }
        if let Some(body) = patch.body {
            item.body = body;
        }
        if let Some(version) = patch.version {
            item.version = version;
        }
        if let Some(position) = patch.queue_position {
            item.queue_position = position;
        }
        if let Some(published_at) = patch.published_at {
            item.published_at = Some(published_at);
        }
        item.updated_at = Utc::now();
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn get(&self, id: Uuid) -> StoreResult<Option<ContentItem>> {
        Ok(self.tables.read().items.get(&id).cloned())
    }

    async fn insert(&self, item: NewContentItem) -> StoreResult<ContentItem> {
        let now = Utc::now();
        let stored = ContentItem {
            id: Uuid::new_v4(),
            category: item.category,
            state: ContentState::Draft,
            version: 1,
            queue_position: None,
            title: item.title,
            body: item.body,
            published_at: None,
            created_at: now,
            updated_at: now,
        };
        self.tables
            .write()
            .items
            .insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_fields(&self, id: Uuid, patch: ContentItemPatch) -> StoreResult<ContentItem> {
        let mut tables = self.tables.write();
        let item = tables
            .items
            .get_mut(&id)
            .ok_or(StoreError::ContentNotFound { id })?;
        Self::apply_patch(item, patch);
        Ok(item.clone())
    }

    async fn find_by_category_and_state(
        &self,
        category: ContentCategory,
        state: ContentState,
    ) -> StoreResult<Vec<ContentItem>> {
        let tables = self.tables.read();
        let mut items: Vec<ContentItem> = tables
            .items
            .values()
            .filter(|i| i.category == category && i.state == state)
            .cloned()
            .collect();
        items.sort_by_key(|i| i.created_at);
        Ok(items)
    }

    async fn find_by_position(
        &self,
        category: ContentCategory,
        position: i32,
    ) -> StoreResult<Option<ContentItem>> {
        let tables = self.tables.read();
        Ok(tables
            .items
            .values()
            .find(|i| i.category == category && i.queue_position == Some(position))
            .cloned())
    }

    async fn queued_in_order(
        &self,
        category: ContentCategory,
        limit: i64,
    ) -> StoreResult<Vec<ContentItem>> {
        let tables = self.tables.read();
        let mut items: Vec<ContentItem> = tables
            .items
            .values()
            .filter(|i| i.category == category && i.queue_position.is_some())
            .cloned()
            .collect();
        items.sort_by_key(|i| i.queue_position);
        items.truncate(limit.max(0) as usize);
        Ok(items)
    }

    async fn max_position(&self, category: ContentCategory) -> StoreResult<Option<i32>> {
        let tables = self.tables.read();
        Ok(tables
            .items
            .values()
            .filter(|i| i.category == category)
            .filter_map(|i| i.queue_position)
            .max())
    }

    async fn release_and_compact(
        &self,
        id: Uuid,
        released_position: i32,
        patch: ContentItemPatch,
    ) -> StoreResult<ContentItem> {
        let mut tables = self.tables.write();
        let updated = {
            let item = tables
                .items
                .get_mut(&id)
                .ok_or(StoreError::ContentNotFound { id })?;
            Self::apply_patch(item, patch);
            item.clone()
        };
        for other in tables.items.values_mut() {
            if other.id == id || other.category != updated.category {
                continue;
            }
            if let Some(pos) = other.queue_position {
                if pos > released_position {
                    other.queue_position = Some(pos - 1);
                    other.updated_at = Utc::now();
                }
            }
        }
        Ok(updated)
    }

    async fn reassign_positions(&self, moves: &[(Uuid, i32)]) -> StoreResult<()> {
        let mut tables = self.tables.write();
        for (id, _) in moves {
            if !tables.items.contains_key(id) {
                return Err(StoreError::ContentNotFound { id: *id });
            }
        }
        for (id, position) in moves {
            let item = tables
                .items
                .get_mut(id)
                .ok_or(StoreError::ContentNotFound { id: *id })?;
            item.queue_position = Some(*position);
            item.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn thread(&self, thread_id: &str) -> StoreResult<Option<ConversationThread>> {
        Ok(self.tables.read().threads.get(thread_id).cloned())
    }

    async fn insert_thread(
        &self,
        thread: NewConversationThread,
    ) -> StoreResult<ConversationThread> {
        let mut tables = self.tables.write();
        if tables.threads.contains_key(&thread.id) {
            return Err(StoreError::ThreadExists {
                thread_id: thread.id,
            });
        }
        let stored = ConversationThread {
            id: thread.id.clone(),
            content_id: thread.content_id,
            status: ThreadStatus::PendingApproval,
            last_applied_at: None,
            created_at: Utc::now(),
        };
        tables.threads.insert(thread.id, stored.clone());
        Ok(stored)
    }

    async fn update_thread(
        &self,
        thread_id: &str,
        patch: ThreadPatch,
    ) -> StoreResult<ConversationThread> {
        let mut tables = self.tables.write();
        let thread = tables
            .threads
            .get_mut(thread_id)
            .ok_or_else(|| StoreError::ThreadNotFound {
                thread_id: thread_id.to_string(),
            })?;
        if let Some(status) = patch.status {
            thread.status = status;
        }
        if let Some(content_id) = patch.content_id {
            thread.content_id = content_id;
        }
        if let Some(applied_at) = patch.last_applied_at {
            thread.last_applied_at = Some(applied_at);
        }
        Ok(thread.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_starts_in_draft() {
        let store = InMemoryContentStore::new();
        let item = store
            .insert(NewContentItem::new(
                ContentCategory::Blog,
                Some("Title".to_string()),
                "Body",
            ))
            .await
            .unwrap();
        assert_eq!(item.state, ContentState::Draft);
        assert_eq!(item.version, 1);
        assert!(item.queue_position.is_none());
        assert!(item.published_at.is_none());
    }

    #[tokio::test]
    async fn test_update_missing_item_errors() {
        let store = InMemoryContentStore::new();
        let err = store
            .update_fields(Uuid::new_v4(), ContentItemPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ContentNotFound { .. }));
    }

    #[tokio::test]
    async fn test_release_and_compact_shifts_higher_positions() {
        let store = InMemoryContentStore::new();
        let mut ids = Vec::new();
        for n in 1..=3 {
            let item = store
                .insert(NewContentItem::new(ContentCategory::Linkedin, None, "post"))
                .await
                .unwrap();
            store
                .update_fields(
                    item.id,
                    ContentItemPatch::default().with_queue_position(Some(n)),
                )
                .await
                .unwrap();
            ids.push(item.id);
        }

        store
            .release_and_compact(
                ids[0],
                1,
                ContentItemPatch::default().with_queue_position(None),
            )
            .await
            .unwrap();

        assert_eq!(store.get(ids[0]).await.unwrap().unwrap().queue_position, None);
        assert_eq!(
            store.get(ids[1]).await.unwrap().unwrap().queue_position,
            Some(1)
        );
        assert_eq!(
            store.get(ids[2]).await.unwrap().unwrap().queue_position,
            Some(2)
        );
    }

    #[tokio::test]
    async fn test_duplicate_thread_rejected() {
        let store = InMemoryContentStore::new();
        let content_id = Uuid::new_v4();
        store
            .insert_thread(NewConversationThread::new("t-1", content_id))
            .await
            .unwrap();
        let err = store
            .insert_thread(NewConversationThread::new("t-1", content_id))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ThreadExists { .. }));
    }
}
