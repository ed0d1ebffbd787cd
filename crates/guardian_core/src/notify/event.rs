//! Events emitted by committed transitions.

use crate::model::meeting::MeetingId;
use crate::model::task::TaskId;
use crate::model::user::UserId;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// One committed transition, as seen by the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    AttendanceCheckedIn {
        user_id: UserId,
        date: NaiveDate,
        time: NaiveTime,
    },
    AttendanceCheckedOut {
        user_id: UserId,
        date: NaiveDate,
        time: NaiveTime,
        total_hours: f64,
    },
    /// Morning wellness self-report.
    DailyCheckIn {
        user_id: UserId,
        mood: u8,
        sleep_hours: f64,
    },
    TaskAssigned {
        task_id: TaskId,
        assignee: UserId,
        title: String,
    },
    TaskSubmitted {
        task_id: TaskId,
        assignee: UserId,
        assigner: UserId,
        title: String,
    },
    TaskApproved {
        task_id: TaskId,
        assignee: UserId,
        title: String,
    },
    TaskRejected {
        task_id: TaskId,
        assignee: UserId,
        title: String,
        reason: String,
    },
    MeetingAssigned {
        meeting_id: MeetingId,
        attendee: UserId,
        title: String,
        date: NaiveDate,
    },
    /// A user's latest sample entered the collapse-risk phase.
    CollapseRiskDetected {
        user_id: UserId,
        date: NaiveDate,
        hour: u8,
        neural_load: f64,
    },
}

impl DomainEvent {
    /// Stable name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AttendanceCheckedIn { .. } => "attendance_checked_in",
            Self::AttendanceCheckedOut { .. } => "attendance_checked_out",
            Self::DailyCheckIn { .. } => "daily_check_in",
            Self::TaskAssigned { .. } => "task_assigned",
            Self::TaskSubmitted { .. } => "task_submitted",
            Self::TaskApproved { .. } => "task_approved",
            Self::TaskRejected { .. } => "task_rejected",
            Self::MeetingAssigned { .. } => "meeting_assigned",
            Self::CollapseRiskDetected { .. } => "collapse_risk_detected",
        }
    }
}
