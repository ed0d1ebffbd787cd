//! Task lifecycle model and its pure state machine.
//!
//! # Responsibility
//! - Define task and submission records.
//! - Decide which status transitions are legal, independent of storage.
//!
//! # Invariants
//! - `Approved` is terminal.
//! - Only `Submitted` tasks can be approved or rejected.
//! - `Rejected -> Submitted` is the only way back into review.

use crate::model::user::UserId;
use crate::model::{ensure_non_negative, ensure_not_blank, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable task identifier.
pub type TaskId = Uuid;

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Assigned,
    InProgress,
    Submitted,
    Approved,
    Rejected,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Approved)
    }

    /// Applies one transition, returning the next status.
    pub fn apply(self, transition: TaskTransition) -> Result<TaskStatus, InvalidTransition> {
        let next = match (self, transition) {
            (Self::Assigned, TaskTransition::Start) => Self::InProgress,
            (Self::Assigned | Self::InProgress | Self::Rejected, TaskTransition::Submit) => {
                Self::Submitted
            }
            (Self::Submitted, TaskTransition::Approve) => Self::Approved,
            (Self::Submitted, TaskTransition::Reject) => Self::Rejected,
            (current, transition) => {
                return Err(InvalidTransition {
                    transition,
                    current,
                })
            }
        };
        Ok(next)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Submitted => "submitted",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "assigned" => Some(Self::Assigned),
            "in_progress" => Some(Self::InProgress),
            "submitted" => Some(Self::Submitted),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// Action requested on a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskTransition {
    Start,
    Submit,
    Approve,
    Reject,
}

impl TaskTransition {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Submit => "submit",
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }
}

/// Transition not allowed from the task's current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub transition: TaskTransition,
    pub current: TaskStatus,
}

impl Display for InvalidTransition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cannot {} a task in status `{}`",
            self.transition.as_str(),
            self.current.as_str()
        )
    }
}

impl Error for InvalidTransition {}

/// Task urgency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl TaskPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

/// Work item assigned by one user to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub assignee: UserId,
    pub assigner: UserId,
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub deadline: Option<NaiveDate>,
    pub estimated_hours: Option<f64>,
    pub status: TaskStatus,
    /// Epoch milliseconds, set by storage.
    pub created_at: i64,
}

/// Request model for assigning a new task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub assignee: UserId,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub priority: TaskPriority,
    pub deadline: Option<NaiveDate>,
    pub estimated_hours: Option<f64>,
}

impl NewTask {
    pub fn new(assignee: UserId, title: impl Into<String>) -> Self {
        Self {
            assignee,
            title: title.into(),
            description: None,
            priority: TaskPriority::default(),
            deadline: None,
            estimated_hours: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_not_blank("title", &self.title)?;
        if let Some(hours) = self.estimated_hours {
            ensure_non_negative("estimated_hours", hours)?;
        }
        Ok(())
    }

    /// Builds the persisted task with a fresh id in `Assigned` status.
    pub fn into_task(self, assigner: UserId) -> Task {
        Task {
            id: Uuid::new_v4(),
            assignee: self.assignee,
            assigner,
            title: self.title.trim().to_string(),
            description: self.description,
            priority: self.priority,
            deadline: self.deadline,
            estimated_hours: self.estimated_hours,
            status: TaskStatus::Assigned,
            created_at: 0,
        }
    }
}

/// Assignee-reported completion level of a submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    #[default]
    Completed,
    Partial,
    Blocked,
}

impl CompletionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Partial => "partial",
            Self::Blocked => "blocked",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "completed" => Some(Self::Completed),
            "partial" => Some(Self::Partial),
            "blocked" => Some(Self::Blocked),
            _ => None,
        }
    }
}

/// Payload of one submit action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    #[serde(default)]
    pub completion_status: CompletionStatus,
    pub work_summary: String,
    pub hours_spent: f64,
}

impl SubmissionPayload {
    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_not_blank("work_summary", &self.work_summary)?;
        ensure_non_negative("hours_spent", self.hours_spent)
    }
}

/// One submit attempt on a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSubmission {
    /// Storage sequence; higher is more recent.
    pub id: i64,
    pub task_id: TaskId,
    pub user_id: UserId,
    pub completion_status: CompletionStatus,
    pub work_summary: String,
    pub hours_spent: f64,
    pub rejection_reason: Option<String>,
    /// Epoch milliseconds, set by storage.
    pub submitted_at: i64,
}

/// Per-assignee task counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub total: u32,
    /// `Assigned` plus `InProgress`.
    pub pending: u32,
    pub submitted: u32,
    pub approved: u32,
    pub rejected: u32,
    /// `round(approved / total * 100)`, 0 when there are no tasks.
    pub completion_percentage: u32,
}

impl TaskSummary {
    /// Folds a list of statuses into counts.
    pub fn from_statuses(statuses: impl IntoIterator<Item = TaskStatus>) -> Self {
        let mut summary = Self::default();
        for status in statuses {
            summary.total += 1;
            match status {
                TaskStatus::Assigned | TaskStatus::InProgress => summary.pending += 1,
                TaskStatus::Submitted => summary.submitted += 1,
                TaskStatus::Approved => summary.approved += 1,
                TaskStatus::Rejected => summary.rejected += 1,
            }
        }
        if summary.total > 0 {
            summary.completion_percentage =
                (f64::from(summary.approved) / f64::from(summary.total) * 100.0).round() as u32;
        }
        summary
    }
}
