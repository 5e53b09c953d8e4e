use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{Level, SessionStatus, Stack};

/// Notifications emitted by the orchestrator after each confirmed state change.
///
/// Subscribers never see an event for a change that did not reach the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A new session was created and installed
    Started {
        session_id: String,
        level: Level,
        stack: Stack,
    },

    /// The question set was installed
    QuestionsLoaded {
        session_id: String,
        total: usize,
        required: usize,
        status: SessionStatus,
    },

    /// An answer was confirmed by the platform and mirrored locally
    AnswerSaved {
        question_id: String,
        saved_at: DateTime<Utc>,
        progress: f64,
        can_submit: bool,
    },

    /// A confirmed answer was discarded because a newer one already landed
    AnswerSuperseded { question_id: String },

    /// The cursor changed
    CursorMoved { index: usize, total: usize },

    /// The session was finalized
    Submitted {
        session_id: String,
        submitted_at: DateTime<Utc>,
    },

    /// Grading finished
    Evaluated {
        session_id: String,
        overall_score: f64,
    },

    /// An operation failed; local state is unchanged
    Failed { operation: String, message: String },
}
