//! Telemetry time-series repository.
//!
//! # Responsibility
//! - Append hourly samples together with their cached indices.
//! - Serve latest-value and windowed-history reads.
//!
//! # Invariants
//! - `(user_id, date, hour)` is unique; inserts never upsert.
//! - Sample and cached indices are written in one transaction, which also
//!   reads the latest row the insert displaces.
//! - History rows are returned ascending by `(date, hour)`; the limit keeps
//!   the earliest rows of the window.

use super::codec::{date_to_db, parse_date};
use super::schema::{ensure_connection_ready, TableSpec};
use super::{map_unique_violation, RepoError, RepoResult};
use crate::model::telemetry::{CognitiveIndices, TelemetrySample};
use crate::model::user::UserId;
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use serde::{Deserialize, Serialize};

const SCORED_SELECT_SQL: &str = "SELECT
    s.user_id AS user_id,
    s.date AS date,
    s.hour AS hour,
    s.keys_per_minute AS keys_per_minute,
    s.mouse_distance AS mouse_distance,
    s.idle_minutes AS idle_minutes,
    s.backspace_rate AS backspace_rate,
    s.task_switch_rate AS task_switch_rate,
    c.fragmentation AS fragmentation,
    c.latent_stress AS latent_stress,
    c.adaptive_capacity AS adaptive_capacity,
    c.neural_load AS neural_load
FROM telemetry_samples s
INNER JOIN cognitive_indices c
    ON c.user_id = s.user_id AND c.date = s.date AND c.hour = s.hour";

const REQUIRED_TABLES: &[TableSpec] = &[
    (
        "telemetry_samples",
        &[
            "user_id",
            "date",
            "hour",
            "keys_per_minute",
            "mouse_distance",
            "idle_minutes",
            "backspace_rate",
            "task_switch_rate",
        ],
    ),
    (
        "cognitive_indices",
        &[
            "user_id",
            "date",
            "hour",
            "fragmentation",
            "latent_stress",
            "adaptive_capacity",
            "neural_load",
        ],
    ),
];

/// Sample plus the indices cached when it was recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSample {
    pub sample: TelemetrySample,
    pub indices: CognitiveIndices,
}

/// Inclusive date window for history reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryQuery {
    pub user_id: UserId,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    /// Earliest rows kept when the window holds more.
    pub limit: u32,
}

/// Average neural load across every user for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyLoad {
    pub date: NaiveDate,
    pub average_neural_load: f64,
    pub samples: u32,
}

/// Persistence port for the telemetry time series.
pub trait TelemetryRepository {
    /// Appends one sample and its indices; `Duplicate` if the slot is taken.
    ///
    /// Returns the user's latest row as it was right before the insert, read
    /// under the same write lock.
    fn insert_scored(
        &self,
        sample: &TelemetrySample,
        indices: &CognitiveIndices,
    ) -> RepoResult<Option<ScoredSample>>;
    /// Most recent row by `(date DESC, hour DESC)`.
    fn latest(&self, user_id: UserId) -> RepoResult<Option<ScoredSample>>;
    /// Rows inside the window, ascending by `(date, hour)`.
    fn history(&self, query: &HistoryQuery) -> RepoResult<Vec<ScoredSample>>;
    /// Per-day averages for the `days` most recent dates holding any
    /// sample, ascending by date.
    fn daily_neural_load(&self, days: u32) -> RepoResult<Vec<DailyLoad>>;
}

/// SQLite-backed telemetry store.
pub struct SqliteTelemetryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTelemetryRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }
}

impl TelemetryRepository for SqliteTelemetryRepository<'_> {
    fn insert_scored(
        &self,
        sample: &TelemetrySample,
        indices: &CognitiveIndices,
    ) -> RepoResult<Option<ScoredSample>> {
        sample.validate()?;
        let date = date_to_db(sample.date);
        let slot_key = || format!("{}/{}/{}", sample.user_id, date, sample.hour);

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let previous = latest_scored(&tx, sample.user_id)?;
        tx.execute(
            "INSERT INTO telemetry_samples (
                user_id,
                date,
                hour,
                keys_per_minute,
                mouse_distance,
                idle_minutes,
                backspace_rate,
                task_switch_rate
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                sample.user_id,
                date.as_str(),
                sample.hour,
                sample.keys_per_minute,
                sample.mouse_distance,
                sample.idle_minutes,
                sample.backspace_rate,
                sample.task_switch_rate,
            ],
        )
        .map_err(|err| map_unique_violation(err, "telemetry sample", slot_key))?;

        tx.execute(
            "INSERT INTO cognitive_indices (
                user_id,
                date,
                hour,
                fragmentation,
                latent_stress,
                adaptive_capacity,
                neural_load
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                sample.user_id,
                date.as_str(),
                sample.hour,
                indices.fragmentation,
                indices.latent_stress,
                indices.adaptive_capacity,
                indices.neural_load,
            ],
        )?;

        tx.commit()?;
        Ok(previous)
    }

    fn latest(&self, user_id: UserId) -> RepoResult<Option<ScoredSample>> {
        latest_scored(self.conn, user_id)
    }

    fn history(&self, query: &HistoryQuery) -> RepoResult<Vec<ScoredSample>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SCORED_SELECT_SQL}
             WHERE s.user_id = ?1
               AND s.date BETWEEN ?2 AND ?3
             ORDER BY s.date ASC, s.hour ASC
             LIMIT ?4;"
        ))?;
        let mut rows = stmt.query(params![
            query.user_id,
            date_to_db(query.date_from),
            date_to_db(query.date_to),
            i64::from(query.limit),
        ])?;

        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_scored_row(row)?);
        }
        Ok(items)
    }

    fn daily_neural_load(&self, days: u32) -> RepoResult<Vec<DailyLoad>> {
        let mut stmt = self.conn.prepare(
            "SELECT date, AVG(neural_load) AS average_neural_load, COUNT(*) AS samples
             FROM cognitive_indices
             GROUP BY date
             ORDER BY date DESC
             LIMIT ?1;",
        )?;
        let mut rows = stmt.query([i64::from(days)])?;

        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            let date_text: String = row.get("date")?;
            let samples: i64 = row.get("samples")?;
            items.push(DailyLoad {
                date: parse_date("cognitive_indices.date", &date_text)?,
                average_neural_load: row.get("average_neural_load")?,
                samples: u32::try_from(samples).map_err(|_| {
                    RepoError::InvalidData(format!("invalid sample count `{samples}`"))
                })?,
            });
        }
        items.reverse();
        Ok(items)
    }
}

fn latest_scored(conn: &Connection, user_id: UserId) -> RepoResult<Option<ScoredSample>> {
    let mut stmt = conn.prepare(&format!(
        "{SCORED_SELECT_SQL}
         WHERE s.user_id = ?1
         ORDER BY s.date DESC, s.hour DESC
         LIMIT 1;"
    ))?;
    let mut rows = stmt.query([user_id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_scored_row(row)?));
    }
    Ok(None)
}

fn parse_scored_row(row: &Row<'_>) -> RepoResult<ScoredSample> {
    let date_text: String = row.get("date")?;
    let hour: i64 = row.get("hour")?;
    let hour = u8::try_from(hour)
        .ok()
        .filter(|value| *value <= 23)
        .ok_or_else(|| {
            RepoError::InvalidData(format!("invalid hour `{hour}` in telemetry_samples.hour"))
        })?;

    let sample = TelemetrySample {
        user_id: row.get("user_id")?,
        date: parse_date("telemetry_samples.date", &date_text)?,
        hour,
        keys_per_minute: row.get("keys_per_minute")?,
        mouse_distance: row.get("mouse_distance")?,
        idle_minutes: row.get("idle_minutes")?,
        backspace_rate: row.get("backspace_rate")?,
        task_switch_rate: row.get("task_switch_rate")?,
    };
    let indices = CognitiveIndices {
        fragmentation: row.get("fragmentation")?,
        latent_stress: row.get("latent_stress")?,
        adaptive_capacity: row.get("adaptive_capacity")?,
        neural_load: row.get("neural_load")?,
    };
    Ok(ScoredSample { sample, indices })
}
