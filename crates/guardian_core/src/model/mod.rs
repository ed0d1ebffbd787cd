//! Domain model for telemetry, attendance, task, meeting, notification and
//! wellness records.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Own input validation shared by services and repositories.
//! - Own the pure task lifecycle state machine.
//!
//! # Invariants
//! - Every person is identified by the `UserId` issued by the identity layer.
//! - Models are plain data; persistence lives in `repo`, orchestration in
//!   `service`.

pub mod attendance;
pub mod meeting;
pub mod notification;
pub mod suggestion;
pub mod task;
pub mod telemetry;
pub mod user;
pub mod wellness;

use chrono::{NaiveTime, Timelike};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Malformed or missing input rejected before any write happens.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Sample hour outside `0..=23`.
    HourOutOfRange(u8),
    /// A numeric field is NaN or infinite.
    NonFiniteValue(&'static str),
    /// A numeric field must not be negative.
    NegativeValue(&'static str),
    /// A text field is blank after trim.
    BlankField(&'static str),
    /// Check-out time precedes the recorded check-in time.
    CheckOutBeforeCheckIn,
    /// Meeting end time precedes its start time.
    EndBeforeStart,
    /// Range query with `from` after `to`.
    InvalidDateRange,
    /// Mood score outside `1..=5`.
    MoodOutOfRange(u8),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HourOutOfRange(hour) => write!(f, "hour must be within 0..=23, got {hour}"),
            Self::NonFiniteValue(field) => write!(f, "`{field}` must be a finite number"),
            Self::NegativeValue(field) => write!(f, "`{field}` must not be negative"),
            Self::BlankField(field) => write!(f, "`{field}` must not be blank"),
            Self::CheckOutBeforeCheckIn => write!(f, "check-out must not precede check-in"),
            Self::EndBeforeStart => write!(f, "end time must not precede start time"),
            Self::InvalidDateRange => write!(f, "date range start must not be after its end"),
            Self::MoodOutOfRange(mood) => write!(f, "mood must be within 1..=5, got {mood}"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn ensure_finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonFiniteValue(field))
    }
}

pub(crate) fn ensure_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    ensure_finite(field, value)?;
    if value < 0.0 {
        return Err(ValidationError::NegativeValue(field));
    }
    Ok(())
}

pub(crate) fn ensure_not_blank(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    Ok(())
}

/// Drops sub-second precision; clock times are stored as `HH:MM:SS`.
pub fn whole_seconds(time: NaiveTime) -> NaiveTime {
    time.with_nanosecond(0).unwrap_or(time)
}
