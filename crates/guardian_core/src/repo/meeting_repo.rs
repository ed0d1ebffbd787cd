//! Meeting schedule repository.

use super::codec::{date_to_db, parse_date, parse_time, parse_uuid, time_to_db};
use super::schema::{ensure_connection_ready, TableSpec};
use super::{map_unique_violation, RepoResult};
use crate::model::meeting::Meeting;
use crate::model::user::UserId;
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};

const MEETING_SELECT_SQL: &str = "SELECT
    id,
    attendee,
    assigned_by,
    title,
    date,
    start_time,
    end_time,
    description,
    duration_minutes
FROM meetings";

const REQUIRED_TABLES: &[TableSpec] = &[(
    "meetings",
    &[
        "id",
        "attendee",
        "assigned_by",
        "title",
        "date",
        "start_time",
        "end_time",
        "description",
        "duration_minutes",
    ],
)];

/// Persistence port for meetings.
pub trait MeetingRepository {
    fn insert_meeting(&self, meeting: &Meeting) -> RepoResult<()>;
    /// One day, by `start_time ASC`.
    fn list_for_day(&self, attendee: UserId, date: NaiveDate) -> RepoResult<Vec<Meeting>>;
    /// All meetings, `date DESC, start_time ASC`.
    fn list_for_attendee(&self, attendee: UserId) -> RepoResult<Vec<Meeting>>;
}

/// SQLite-backed meeting schedule.
pub struct SqliteMeetingRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMeetingRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }

    fn query_meetings(
        &self,
        sql: &str,
        bind: &[&dyn rusqlite::ToSql],
    ) -> RepoResult<Vec<Meeting>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(bind)?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_meeting_row(row)?);
        }
        Ok(items)
    }
}

impl MeetingRepository for SqliteMeetingRepository<'_> {
    fn insert_meeting(&self, meeting: &Meeting) -> RepoResult<()> {
        self.conn
            .execute(
                "INSERT INTO meetings (
                    id,
                    attendee,
                    assigned_by,
                    title,
                    date,
                    start_time,
                    end_time,
                    description,
                    duration_minutes
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
                params![
                    meeting.id.to_string(),
                    meeting.attendee,
                    meeting.assigned_by,
                    meeting.title.as_str(),
                    date_to_db(meeting.date),
                    time_to_db(meeting.start_time),
                    time_to_db(meeting.end_time),
                    meeting.description.as_deref(),
                    meeting.duration_minutes,
                ],
            )
            .map_err(|err| map_unique_violation(err, "meeting", || meeting.id.to_string()))?;
        Ok(())
    }

    fn list_for_day(&self, attendee: UserId, date: NaiveDate) -> RepoResult<Vec<Meeting>> {
        let date = date_to_db(date);
        self.query_meetings(
            &format!(
                "{MEETING_SELECT_SQL}
                 WHERE attendee = ?1 AND date = ?2
                 ORDER BY start_time ASC, id ASC;"
            ),
            &[&attendee, &date],
        )
    }

    fn list_for_attendee(&self, attendee: UserId) -> RepoResult<Vec<Meeting>> {
        self.query_meetings(
            &format!(
                "{MEETING_SELECT_SQL}
                 WHERE attendee = ?1
                 ORDER BY date DESC, start_time ASC, id ASC;"
            ),
            &[&attendee],
        )
    }
}

fn parse_meeting_row(row: &Row<'_>) -> RepoResult<Meeting> {
    let id_text: String = row.get("id")?;
    let date_text: String = row.get("date")?;
    let start_text: String = row.get("start_time")?;
    let end_text: String = row.get("end_time")?;

    Ok(Meeting {
        id: parse_uuid("meetings.id", &id_text)?,
        attendee: row.get("attendee")?,
        assigned_by: row.get("assigned_by")?,
        title: row.get("title")?,
        date: parse_date("meetings.date", &date_text)?,
        start_time: parse_time("meetings.start_time", &start_text)?,
        end_time: parse_time("meetings.end_time", &end_text)?,
        description: row.get("description")?,
        duration_minutes: row.get("duration_minutes")?,
    })
}
