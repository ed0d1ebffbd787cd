//! Notification feed records.
//!
//! # Invariants
//! - Notifications are append-only; only `is_read` ever changes.

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

/// Category of a notification, used by the feed for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Info,
    Insight,
    Alert,
    TaskAssigned,
    TaskSubmitted,
    TaskApproved,
    TaskRejected,
    MeetingAssigned,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Insight => "insight",
            Self::Alert => "alert",
            Self::TaskAssigned => "task_assigned",
            Self::TaskSubmitted => "task_submitted",
            Self::TaskApproved => "task_approved",
            Self::TaskRejected => "task_rejected",
            Self::MeetingAssigned => "meeting_assigned",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "info" => Some(Self::Info),
            "insight" => Some(Self::Insight),
            "alert" => Some(Self::Alert),
            "task_assigned" => Some(Self::TaskAssigned),
            "task_submitted" => Some(Self::TaskSubmitted),
            "task_approved" => Some(Self::TaskApproved),
            "task_rejected" => Some(Self::TaskRejected),
            "meeting_assigned" => Some(Self::MeetingAssigned),
            _ => None,
        }
    }
}

/// Message addressed to one recipient, before persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingNotification {
    pub recipient_id: UserId,
    pub message: String,
    pub kind: NotificationKind,
}

/// Persisted notification row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub recipient_id: UserId,
    pub message: String,
    pub kind: NotificationKind,
    /// Epoch milliseconds, set by storage.
    pub created_at: i64,
    pub is_read: bool,
}

/// One page of a recipient's feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationFeedPage {
    /// Newest first.
    pub items: Vec<Notification>,
    /// Unread rows across the whole feed, not just this page.
    pub unread_count: u32,
}
