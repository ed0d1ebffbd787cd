//! Attendance ledger repository.
//!
//! # Responsibility
//! - Persist one attendance row per `(user_id, date)`.
//!
//! # Invariants
//! - Opening a second record for the same day fails with `Duplicate`.
//! - Closing is conditional on `check_out IS NULL`; a lost race fails with
//!   `Conflict` instead of overwriting the first check-out.

use super::codec::{bool_to_int, date_to_db, parse_bool, parse_date, parse_time, time_to_db};
use super::schema::{ensure_connection_ready, TableSpec};
use super::{map_unique_violation, RepoError, RepoResult};
use crate::model::attendance::AttendanceRecord;
use crate::model::user::UserId;
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};

const ATTENDANCE_SELECT_SQL: &str = "SELECT
    user_id,
    date,
    check_in,
    check_out,
    total_hours,
    overtime
FROM attendance";

const REQUIRED_TABLES: &[TableSpec] = &[(
    "attendance",
    &[
        "user_id",
        "date",
        "check_in",
        "check_out",
        "total_hours",
        "overtime",
    ],
)];

/// Persistence port for the attendance ledger.
pub trait AttendanceRepository {
    /// Inserts an open record; `Duplicate` if the day already has one.
    fn insert_open(&self, record: &AttendanceRecord) -> RepoResult<()>;
    /// Writes check-out fields; `Conflict` if already closed, `NotFound` if
    /// the day has no record.
    fn close(&self, record: &AttendanceRecord) -> RepoResult<()>;
    fn get(&self, user_id: UserId, date: NaiveDate) -> RepoResult<Option<AttendanceRecord>>;
    /// Newest first.
    fn list_recent(&self, user_id: UserId, limit: u32) -> RepoResult<Vec<AttendanceRecord>>;
}

/// SQLite-backed attendance ledger.
pub struct SqliteAttendanceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAttendanceRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }
}

impl AttendanceRepository for SqliteAttendanceRepository<'_> {
    fn insert_open(&self, record: &AttendanceRecord) -> RepoResult<()> {
        let date = date_to_db(record.date);
        self.conn
            .execute(
                "INSERT INTO attendance (user_id, date, check_in, check_out, total_hours, overtime)
                 VALUES (?1, ?2, ?3, NULL, 0, 0);",
                params![record.user_id, date.as_str(), time_to_db(record.check_in)],
            )
            .map_err(|err| {
                map_unique_violation(err, "attendance record", || {
                    format!("{}/{}", record.user_id, date)
                })
            })?;
        Ok(())
    }

    fn close(&self, record: &AttendanceRecord) -> RepoResult<()> {
        let check_out = record.check_out.ok_or_else(|| {
            RepoError::InvalidData("close requires a check_out time".to_string())
        })?;
        let date = date_to_db(record.date);
        let changed = self.conn.execute(
            "UPDATE attendance
             SET check_out = ?3,
                 total_hours = ?4,
                 overtime = ?5
             WHERE user_id = ?1
               AND date = ?2
               AND check_out IS NULL;",
            params![
                record.user_id,
                date.as_str(),
                time_to_db(check_out),
                record.total_hours,
                bool_to_int(record.overtime),
            ],
        )?;

        if changed == 1 {
            return Ok(());
        }

        let key = format!("{}/{}", record.user_id, date);
        if self.get(record.user_id, record.date)?.is_some() {
            Err(RepoError::Conflict {
                entity: "attendance record",
                key,
            })
        } else {
            Err(RepoError::NotFound {
                entity: "attendance record",
                key,
            })
        }
    }

    fn get(&self, user_id: UserId, date: NaiveDate) -> RepoResult<Option<AttendanceRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ATTENDANCE_SELECT_SQL} WHERE user_id = ?1 AND date = ?2;"
        ))?;
        let mut rows = stmt.query(params![user_id, date_to_db(date)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_attendance_row(row)?));
        }
        Ok(None)
    }

    fn list_recent(&self, user_id: UserId, limit: u32) -> RepoResult<Vec<AttendanceRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ATTENDANCE_SELECT_SQL} WHERE user_id = ?1 ORDER BY date DESC LIMIT ?2;"
        ))?;
        let mut rows = stmt.query(params![user_id, i64::from(limit)])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_attendance_row(row)?);
        }
        Ok(records)
    }
}

fn parse_attendance_row(row: &Row<'_>) -> RepoResult<AttendanceRecord> {
    let date_text: String = row.get("date")?;
    let check_in_text: String = row.get("check_in")?;
    let check_out = match row.get::<_, Option<String>>("check_out")? {
        Some(value) => Some(parse_time("attendance.check_out", &value)?),
        None => None,
    };

    Ok(AttendanceRecord {
        user_id: row.get("user_id")?,
        date: parse_date("attendance.date", &date_text)?,
        check_in: parse_time("attendance.check_in", &check_in_text)?,
        check_out,
        total_hours: row.get("total_hours")?,
        overtime: parse_bool("attendance.overtime", row.get("overtime")?)?,
    })
}
