//! # Content Item Model
//!
//! A content item is the unit the whole engine revolves around: one piece of
//! generated content (a blog article or a short social post) moving through
//! review, the publishing queue, and finally out the door.
//!
//! The queue contiguity invariant lives here as data: for any category, the
//! set of non-null `queue_position` values is exactly `{1..=k}`. The
//! [`QueueEngine`](crate::queue::QueueEngine) is the only component that
//! assigns positions, and the
//! [`ContentStateMachine`](crate::state_machine::ContentStateMachine) is the
//! only writer of `state`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use std::fmt;
use uuid::Uuid;

use crate::state_machine::ContentState;

/// Content category, partitioning the publishing queue.
///
/// Each category owns an independent 1-based position sequence and its own
/// publishing target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentCategory {
    /// Long-form article published to the website
    Blog,
    /// Short-form post published to LinkedIn
    Linkedin,
}

impl ContentCategory {
    /// All known categories, in a stable order
    pub const ALL: [ContentCategory; 2] = [ContentCategory::Blog, ContentCategory::Linkedin];
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blog => write!(f, "blog"),
            Self::Linkedin => write!(f, "linkedin"),
        }
    }
}

impl std::str::FromStr for ContentCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blog" => Ok(Self::Blog),
            "linkedin" => Ok(Self::Linkedin),
            _ => Err(format!("Invalid content category: {s}")),
        }
    }
}

/// A persisted content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: Uuid,
    pub category: ContentCategory,
    pub state: ContentState,
    /// Revision counter, starts at 1 and increments on every body rewrite
    pub version: i32,
    /// 1-based rank inside the category queue; `None` means not queued
    pub queue_position: Option<i32>,
    pub title: Option<String>,
    pub body: String,
    /// Stamped exactly once, on the `queued -> posted` transition
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentItem {
    /// Short preview of the body for notifications and reports
    pub fn preview(&self, max_chars: usize) -> String {
        if self.body.chars().count() <= max_chars {
            self.body.clone()
        } else {
            let truncated: String = self.body.chars().take(max_chars).collect();
            format!("{truncated}...")
        }
    }

    /// Display title, falling back for untitled short-form posts
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled")
    }
}

impl FromRow<'_, PgRow> for ContentItem {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let category: String = row.try_get("category")?;
        let state: String = row.try_get("state")?;
        Ok(ContentItem {
            id: row.try_get("id")?,
            category: category.parse().map_err(|e: String| sqlx::Error::ColumnDecode {
                index: "category".into(),
                source: e.into(),
            })?,
            state: state.parse().map_err(|e: String| sqlx::Error::ColumnDecode {
                index: "state".into(),
                source: e.into(),
            })?,
            version: row.try_get("version")?,
            queue_position: row.try_get("queue_position")?,
            title: row.try_get("title")?,
            body: row.try_get("body")?,
            published_at: row.try_get("published_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// A content item waiting to be inserted (no generated fields yet).
///
/// New items always enter the lifecycle as `draft` with `version` 1 and no
/// queue position, so those fields are not part of the input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewContentItem {
    pub category: ContentCategory,
    pub title: Option<String>,
    pub body: String,
}

impl NewContentItem {
    pub fn new(category: ContentCategory, title: Option<String>, body: impl Into<String>) -> Self {
        Self {
            category,
            title,
            body: body.into(),
        }
    }
}

/// Partial update to a content item.
///
/// `None` leaves a field untouched. `queue_position` is doubly optional so a
/// patch can distinguish "leave as is" (`None`) from "clear the slot"
/// (`Some(None)`). Every patch is applied as a single atomic store write.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentItemPatch {
    pub state: Option<ContentState>,
    pub body: Option<String>,
    pub version: Option<i32>,
    pub queue_position: Option<Option<i32>>,
    pub published_at: Option<DateTime<Utc>>,
}

impl ContentItemPatch {
    pub fn state(state: ContentState) -> Self {
        Self {
            state: Some(state),
            ..Default::default()
        }
    }

    pub fn with_queue_position(mut self, position: Option<i32>) -> Self {
        self.queue_position = Some(position);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_version(mut self, version: i32) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_published_at(mut self, at: DateTime<Utc>) -> Self {
        self.published_at = Some(at);
        self
    }

    /// True when the patch would not change anything
    pub fn is_empty(&self) -> bool {
        self.state.is_none()
            && self.body.is_none()
            && self.version.is_none()
            && self.queue_position.is_none()
            && self.published_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip() {
        for category in ContentCategory::ALL {
            let parsed: ContentCategory = category.to_string().parse().unwrap();
            assert_eq!(parsed, category);
        }
        assert!("twitter".parse::<ContentCategory>().is_err());
    }

    #[test]
    fn test_preview_truncation() {
        let item = ContentItem {
            id: Uuid::new_v4(),
            category: ContentCategory::Linkedin,
            state: ContentState::Draft,
            version: 1,
            queue_position: None,
            title: None,
            body: "abcdefghij".to_string(),
            published_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(item.preview(4), "abcd...");
        assert_eq!(item.preview(20), "abcdefghij");
        assert_eq!(item.display_title(), "Untitled");
    }

    #[test]
    fn test_patch_builders() {
        let patch = ContentItemPatch::state(ContentState::Queued).with_queue_position(Some(3));
        assert_eq!(patch.state, Some(ContentState::Queued));
        assert_eq!(patch.queue_position, Some(Some(3)));
        assert!(patch.body.is_none());
        assert!(!patch.is_empty());
        assert!(ContentItemPatch::default().is_empty());
    }
}
