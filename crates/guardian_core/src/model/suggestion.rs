//! Daily workload suggestions.
//!
//! # Invariants
//! - A suggestion list is never empty; a clean day yields one `Success`.

use serde::{Deserialize, Serialize};

/// Tone of a suggestion, used by clients for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    Warning,
    Info,
    Alert,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub message: String,
}

impl Suggestion {
    pub fn new(kind: SuggestionKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Workload facts for one user and day that the suggestion rules read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DayOutlook {
    /// Worked hours of the day's attendance record; 0 while still open.
    pub worked_hours: Option<f64>,
    /// `Assigned` plus `InProgress`.
    pub pending_tasks: u32,
    pub rejected_tasks: u32,
    pub meetings_today: usize,
}
