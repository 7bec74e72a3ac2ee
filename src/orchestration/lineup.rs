//! # Lineup Reporter
//!
//! Read-only snapshot of what publishes next in each category: the head and
//! the next few queued items, handed to the review transport for the
//! periodic schedule report. Nothing here mutates the queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::models::ContentCategory;
use crate::queue::{QueueEngine, QueueError};
use crate::services::{CollaboratorError, ReviewTransport};

/// One queued item in the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineupEntry {
    pub content_id: Uuid,
    pub position: i32,
    pub title: Option<String>,
    pub preview: String,
}

/// The upcoming schedule for one category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryLineup {
    pub category: ContentCategory,
    pub entries: Vec<LineupEntry>,
}

impl CategoryLineup {
    /// The item publishing next, if the queue has one
    pub fn head(&self) -> Option<&LineupEntry> {
        self.entries.first()
    }
}

/// Cross-category schedule report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineupReport {
    pub categories: Vec<CategoryLineup>,
    pub generated_at: DateTime<Utc>,
}

/// Errors raised while building or delivering a lineup.
#[derive(Debug, Error)]
pub enum LineupError {
    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Transport(#[from] CollaboratorError),
}

const PREVIEW_CHARS: usize = 200;

/// Builds and delivers the upcoming-schedule report.
pub struct LineupReporter {
    queue: Arc<QueueEngine>,
    transport: Arc<dyn ReviewTransport>,
}

impl LineupReporter {
    pub fn new(queue: Arc<QueueEngine>, transport: Arc<dyn ReviewTransport>) -> Self {
        Self { queue, transport }
    }

    /// Snapshot the first `depth` queued items for each requested category.
    pub async fn snapshot(
        &self,
        depths: &[(ContentCategory, i64)],
    ) -> Result<LineupReport, LineupError> {
        let mut categories = Vec::with_capacity(depths.len());
        for (category, depth) in depths {
            let entries = self
                .queue
                .upcoming(*category, *depth)
                .await?
                .into_iter()
                .filter_map(|item| {
                    item.queue_position.map(|position| LineupEntry {
                        content_id: item.id,
                        position,
                        title: item.title.clone(),
                        preview: item.preview(PREVIEW_CHARS),
                    })
                })
                .collect();
            categories.push(CategoryLineup {
                category: *category,
                entries,
            });
        }

        Ok(LineupReport {
            categories,
            generated_at: Utc::now(),
        })
    }

    /// Build the report and hand it to the review transport.
    pub async fn send(&self, depths: &[(ContentCategory, i64)]) -> Result<LineupReport, LineupError> {
        let report = self.snapshot(depths).await?;
        self.transport.send_lineup(&report).await?;

        info!(
            target: "lineup",
            categories = report.categories.len(),
            "Lineup report sent"
        );

        Ok(report)
    }
}
