use serde::{Deserialize, Serialize};

/// Events that can trigger content lifecycle transitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ContentEvent {
    /// Generated content goes out for human review; the thread must already
    /// exist and be bound to this item
    SendForReview { thread_id: String },
    /// Reviewer approved the piece
    Approve,
    /// Reviewer asked for changes; feedback passes through to the revision
    /// collaborator untouched
    RequestRevision { feedback: String },
    /// A revised body is ready; replaces the text and bumps the version
    RevisionReady { body: String },
    /// The queue engine assigned a position
    MarkQueued { position: i32 },
    /// External delivery confirmed; stamps `published_at` and frees the slot
    MarkPosted,
}

impl ContentEvent {
    /// String representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::SendForReview { .. } => "send_for_review",
            Self::Approve => "approve",
            Self::RequestRevision { .. } => "request_revision",
            Self::RevisionReady { .. } => "revision_ready",
            Self::MarkQueued { .. } => "mark_queued",
            Self::MarkPosted => "mark_posted",
        }
    }

    /// Check if this event represents a terminal transition
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::MarkPosted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_types() {
        assert_eq!(
            ContentEvent::SendForReview {
                thread_id: "t".into()
            }
            .event_type(),
            "send_for_review"
        );
        assert_eq!(ContentEvent::Approve.event_type(), "approve");
        assert_eq!(ContentEvent::MarkPosted.event_type(), "mark_posted");
        assert!(ContentEvent::MarkPosted.is_terminal());
        assert!(!ContentEvent::Approve.is_terminal());
    }

    #[test]
    fn test_event_serde_tagging() {
        let event = ContentEvent::RequestRevision {
            feedback: "shorten it".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"request_revision\""));
        let parsed: ContentEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.event_type(), "request_revision");
    }
}
