//! Meeting schedule model.

use crate::model::user::UserId;
use crate::model::{whole_seconds, ValidationError};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type MeetingId = Uuid;

/// Title used when the requester leaves it blank.
pub const DEFAULT_MEETING_TITLE: &str = "Meeting";

/// Meeting booked for one attendee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: MeetingId,
    pub attendee: UserId,
    pub assigned_by: UserId,
    pub title: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub description: Option<String>,
    pub duration_minutes: i64,
}

/// Request model for booking a meeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMeeting {
    pub attendee: UserId,
    pub title: Option<String>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub description: Option<String>,
}

impl NewMeeting {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.end_time < self.start_time {
            return Err(ValidationError::EndBeforeStart);
        }
        Ok(())
    }

    /// Builds the persisted meeting with a fresh id and derived duration.
    ///
    /// Start and end are truncated to whole seconds, the stored precision.
    pub fn into_meeting(self, assigned_by: UserId) -> Meeting {
        let start_time = whole_seconds(self.start_time);
        let end_time = whole_seconds(self.end_time);
        let title = self
            .title
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_MEETING_TITLE.to_string());
        Meeting {
            id: Uuid::new_v4(),
            attendee: self.attendee,
            assigned_by,
            title,
            date: self.date,
            start_time,
            end_time,
            description: self.description,
            duration_minutes: (end_time - start_time).num_minutes(),
        }
    }
}

/// One attendee's meetings for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingDay {
    /// Sorted by `start_time ASC`.
    pub meetings: Vec<Meeting>,
    pub total_minutes: i64,
    /// More meetings than the configured daily threshold.
    pub meeting_heavy: bool,
}

impl MeetingDay {
    pub fn from_meetings(meetings: Vec<Meeting>, heavy_threshold: usize) -> Self {
        let total_minutes = meetings.iter().map(|m| m.duration_minutes).sum();
        let meeting_heavy = meetings.len() > heavy_threshold;
        Self {
            meetings,
            total_minutes,
            meeting_heavy,
        }
    }
}
