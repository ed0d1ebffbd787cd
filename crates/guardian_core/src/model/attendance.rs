//! Attendance ledger record.
//!
//! # Invariants
//! - One record per `(user_id, date)`.
//! - `check_out >= check_in` once closed.
//! - Clock times carry whole seconds only, matching the stored form.
//! - `total_hours` is the closed interval in hours rounded to 2 decimals.
//! - `overtime` is `total_hours > threshold` (9 hours by default).

use crate::model::user::UserId;
use crate::model::{whole_seconds, ValidationError};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Overtime starts strictly above this many hours.
pub const DEFAULT_OVERTIME_THRESHOLD_HOURS: f64 = 9.0;

/// One user's attendance for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub user_id: UserId,
    pub date: NaiveDate,
    pub check_in: NaiveTime,
    pub check_out: Option<NaiveTime>,
    pub total_hours: f64,
    pub overtime: bool,
}

impl AttendanceRecord {
    /// Opens a record at check-in time.
    pub fn open(user_id: UserId, date: NaiveDate, check_in: NaiveTime) -> Self {
        Self {
            user_id,
            date,
            check_in: whole_seconds(check_in),
            check_out: None,
            total_hours: 0.0,
            overtime: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.check_out.is_some()
    }

    /// Returns the closed form of this record.
    ///
    /// The caller must have checked `is_closed()` first; closing twice is a
    /// state conflict handled at the service layer.
    pub fn closed_at(
        &self,
        check_out: NaiveTime,
        overtime_threshold_hours: f64,
    ) -> Result<Self, ValidationError> {
        let check_out = whole_seconds(check_out);
        if check_out < self.check_in {
            return Err(ValidationError::CheckOutBeforeCheckIn);
        }
        let total_hours = worked_hours(self.check_in, check_out);
        Ok(Self {
            check_out: Some(check_out),
            total_hours,
            overtime: total_hours > overtime_threshold_hours,
            ..self.clone()
        })
    }
}

/// Hours between two times of one day, rounded to 2 decimals.
pub fn worked_hours(check_in: NaiveTime, check_out: NaiveTime) -> f64 {
    let seconds = (check_out - check_in).num_seconds() as f64;
    (seconds / 3600.0 * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::{worked_hours, AttendanceRecord, DEFAULT_OVERTIME_THRESHOLD_HOURS};
    use crate::model::ValidationError;
    use chrono::{NaiveDate, NaiveTime};

    fn hm(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time")
    }

    fn record(check_in: NaiveTime) -> AttendanceRecord {
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).expect("valid date");
        AttendanceRecord::open(7, date, check_in)
    }

    #[test]
    fn nine_thirty_hours_is_overtime() {
        let closed = record(hm(9, 0))
            .closed_at(hm(18, 30), DEFAULT_OVERTIME_THRESHOLD_HOURS)
            .expect("valid checkout");
        assert_eq!(closed.total_hours, 9.5);
        assert!(closed.overtime);
        assert_eq!(closed.check_out, Some(hm(18, 30)));
    }

    #[test]
    fn exactly_nine_hours_is_not_overtime() {
        let closed = record(hm(8, 0))
            .closed_at(hm(17, 0), DEFAULT_OVERTIME_THRESHOLD_HOURS)
            .expect("valid checkout");
        assert_eq!(closed.total_hours, 9.0);
        assert!(!closed.overtime);
    }

    #[test]
    fn rounding_keeps_two_decimals() {
        assert_eq!(worked_hours(hm(9, 0), hm(9, 20)), 0.33);
        assert_eq!(worked_hours(hm(9, 0), hm(9, 0)), 0.0);
    }

    #[test]
    fn checkout_before_checkin_is_rejected() {
        let err = record(hm(10, 0))
            .closed_at(hm(9, 59), DEFAULT_OVERTIME_THRESHOLD_HOURS)
            .unwrap_err();
        assert_eq!(err, ValidationError::CheckOutBeforeCheckIn);
    }

    #[test]
    fn sub_second_times_are_truncated() {
        let opened = record(NaiveTime::from_hms_milli_opt(9, 0, 0, 750).expect("valid time"));
        assert_eq!(opened.check_in, hm(9, 0));

        let closed = opened
            .closed_at(
                NaiveTime::from_hms_milli_opt(17, 0, 0, 200).expect("valid time"),
                DEFAULT_OVERTIME_THRESHOLD_HOURS,
            )
            .expect("valid checkout");
        assert_eq!(closed.check_out, Some(hm(17, 0)));
        assert_eq!(closed.total_hours, 8.0);
    }
}
