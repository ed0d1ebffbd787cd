//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define one persistence port (trait) per owned entity.
//! - Isolate SQL details from service/business orchestration.
//!
//! # Invariants
//! - Unique keys are enforced by the store and surface as
//!   `RepoError::Duplicate`, never as silent overwrites.
//! - Guarded updates are conditional (`WHERE <expected state>`); a miss
//!   surfaces as `RepoError::Conflict`.
//! - Read paths reject invalid persisted state instead of masking it.

pub mod attendance_repo;
pub mod directory_repo;
pub mod meeting_repo;
pub mod notification_repo;
mod schema;
pub mod task_repo;
pub mod telemetry_repo;

use crate::db::DbError;
use crate::model::ValidationError;
use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    /// No row for the given key.
    NotFound { entity: &'static str, key: String },
    /// Insert hit an existing unique key.
    Duplicate { entity: &'static str, key: String },
    /// Conditional update matched no row in the expected state.
    Conflict { entity: &'static str, key: String },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, key } => write!(f, "{entity} not found: {key}"),
            Self::Duplicate { entity, key } => write!(f, "{entity} already exists: {key}"),
            Self::Conflict { entity, key } => {
                write!(f, "{entity} changed concurrently or is not in the expected state: {key}")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Maps a unique/primary-key violation on insert to `RepoError::Duplicate`.
pub(crate) fn map_unique_violation(
    err: rusqlite::Error,
    entity: &'static str,
    key: impl FnOnce() -> String,
) -> RepoError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
                && matches!(
                    failure.extended_code,
                    rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                        | rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                ) =>
        {
            RepoError::Duplicate { entity, key: key() }
        }
        _ => err.into(),
    }
}

pub(crate) mod codec {
    //! Text encodings for calendar values stored in SQLite.

    use super::{RepoError, RepoResult};
    use chrono::{NaiveDate, NaiveTime};

    const DATE_FORMAT: &str = "%Y-%m-%d";
    const TIME_FORMAT: &str = "%H:%M:%S";

    pub fn date_to_db(value: NaiveDate) -> String {
        value.format(DATE_FORMAT).to_string()
    }

    pub fn time_to_db(value: NaiveTime) -> String {
        value.format(TIME_FORMAT).to_string()
    }

    pub fn parse_date(column: &str, value: &str) -> RepoResult<NaiveDate> {
        NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| {
            RepoError::InvalidData(format!("invalid date `{value}` in {column}"))
        })
    }

    pub fn parse_time(column: &str, value: &str) -> RepoResult<NaiveTime> {
        NaiveTime::parse_from_str(value, TIME_FORMAT).map_err(|_| {
            RepoError::InvalidData(format!("invalid time `{value}` in {column}"))
        })
    }

    pub fn parse_uuid(column: &str, value: &str) -> RepoResult<uuid::Uuid> {
        uuid::Uuid::parse_str(value)
            .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
    }

    pub fn bool_to_int(value: bool) -> i64 {
        if value {
            1
        } else {
            0
        }
    }

    pub fn parse_bool(column: &str, value: i64) -> RepoResult<bool> {
        match value {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(RepoError::InvalidData(format!(
                "invalid boolean `{other}` in {column}"
            ))),
        }
    }
}
