//! # Conversation Thread Model
//!
//! A conversation thread binds a reviewer's replies to the one content item
//! whose review cycle the thread currently governs. Threads are created when
//! content is first sent out for review, updated on every applied reply, and
//! marked resolved after approval; they are never deleted.
//!
//! `last_applied_at` is the timestamp gate the
//! [`IdempotencyGuard`](crate::idempotency::IdempotencyGuard) compares
//! inbound message timestamps against.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use std::fmt;
use uuid::Uuid;

/// Review status of a conversation thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadStatus {
    /// Waiting on the reviewer's reply
    PendingApproval,
    /// Review cycle finished; replies no longer govern anything
    Resolved,
}

impl fmt::Display for ThreadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PendingApproval => write!(f, "pending_approval"),
            Self::Resolved => write!(f, "resolved"),
        }
    }
}

impl std::str::FromStr for ThreadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending_approval" => Ok(Self::PendingApproval),
            "resolved" => Ok(Self::Resolved),
            _ => Err(format!("Invalid thread status: {s}")),
        }
    }
}

/// A persisted conversation thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationThread {
    /// External thread identifier (e.g. the mail thread id)
    pub id: String,
    /// The content item this thread governs approval for
    pub content_id: Uuid,
    pub status: ThreadStatus,
    /// Timestamp of the most recent inbound message successfully applied
    pub last_applied_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ConversationThread {
    /// Check whether replies on this thread still drive transitions
    pub fn is_open(&self) -> bool {
        matches!(self.status, ThreadStatus::PendingApproval)
    }
}

impl FromRow<'_, PgRow> for ConversationThread {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        Ok(ConversationThread {
            id: row.try_get("id")?,
            content_id: row.try_get("content_id")?,
            status: status.parse().map_err(|e: String| sqlx::Error::ColumnDecode {
                index: "status".into(),
                source: e.into(),
            })?,
            last_applied_at: row.try_get("last_applied_at")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// A conversation thread waiting to be inserted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewConversationThread {
    pub id: String,
    pub content_id: Uuid,
}

impl NewConversationThread {
    pub fn new(id: impl Into<String>, content_id: Uuid) -> Self {
        Self {
            id: id.into(),
            content_id,
        }
    }
}

/// Partial update to a conversation thread.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreadPatch {
    pub status: Option<ThreadStatus>,
    pub content_id: Option<Uuid>,
    pub last_applied_at: Option<DateTime<Utc>>,
}

impl ThreadPatch {
    pub fn resolved() -> Self {
        Self {
            status: Some(ThreadStatus::Resolved),
            ..Default::default()
        }
    }

    pub fn applied_at(at: DateTime<Utc>) -> Self {
        Self {
            last_applied_at: Some(at),
            ..Default::default()
        }
    }
}
