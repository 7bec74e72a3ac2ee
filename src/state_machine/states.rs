use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle states for a content item.
///
/// The legal paths are `draft -> pending_approval -> {approved, revision}`,
/// `approved -> queued -> posted` and `revision -> pending_approval` once a
/// revised body is ready. `posted` is terminal; `abandoned` is reserved and
/// currently unreachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentState {
    /// Initial state when generated content is persisted
    Draft,
    /// Sent out for human review, waiting on a reply
    PendingApproval,
    /// Reviewer approved the piece; must be enqueued in the same step
    Approved,
    /// Reviewer asked for changes; a revised body is being produced
    Revision,
    /// Holds a queue position and is eligible for publishing
    Queued,
    /// Published to the external target
    Posted,
    /// Reserved terminal state, not reachable through any current event
    Abandoned,
}

impl ContentState {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Posted | Self::Abandoned)
    }

    /// Check if this state is waiting on human input
    pub fn is_awaiting_review(&self) -> bool {
        matches!(self, Self::PendingApproval)
    }

    /// Check if this state may legally hold a queue position
    pub fn is_queueable(&self) -> bool {
        matches!(self, Self::Queued)
    }
}

impl fmt::Display for ContentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::PendingApproval => write!(f, "pending_approval"),
            Self::Approved => write!(f, "approved"),
            Self::Revision => write!(f, "revision"),
            Self::Queued => write!(f, "queued"),
            Self::Posted => write!(f, "posted"),
            Self::Abandoned => write!(f, "abandoned"),
        }
    }
}

impl std::str::FromStr for ContentState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "pending_approval" => Ok(Self::PendingApproval),
            "approved" => Ok(Self::Approved),
            "revision" => Ok(Self::Revision),
            "queued" => Ok(Self::Queued),
            "posted" => Ok(Self::Posted),
            "abandoned" => Ok(Self::Abandoned),
            _ => Err(format!("Invalid content state: {s}")),
        }
    }
}

impl Default for ContentState {
    fn default() -> Self {
        Self::Draft
    }
}
