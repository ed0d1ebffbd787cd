//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Publish domain events after the triggering write commits.
//!
//! # Invariants
//! - `Err(ServiceError)` means nothing was written and nothing was sent.
//! - `Ok(Committed)` means the write is durable; notification problems are
//!   carried in `Committed::warnings`.

pub mod attendance_service;
pub mod meeting_service;
pub mod notification_service;
pub mod suggestion_service;
pub mod task_service;
pub mod telemetry_service;
pub mod wellness_service;

use crate::model::task::{InvalidTransition, TaskId};
use crate::model::user::{Role, UserId};
use crate::model::ValidationError;
use crate::notify::{DispatchReport, NotificationDispatchError};
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Request is well-formed but the stored state does not allow it.
#[derive(Debug, Clone, PartialEq)]
pub enum StateConflict {
    AlreadyCheckedIn,
    AlreadyCheckedOut,
    NotCheckedIn,
    InvalidTransition(InvalidTransition),
    /// A sample already exists for the `(user, date, hour)` slot.
    DuplicateSample,
}

impl Display for StateConflict {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyCheckedIn => write!(f, "already checked in today"),
            Self::AlreadyCheckedOut => write!(f, "already checked out today"),
            Self::NotCheckedIn => write!(f, "not checked in today"),
            Self::InvalidTransition(err) => write!(f, "{err}"),
            Self::DuplicateSample => write!(f, "a sample already exists for this hour"),
        }
    }
}

impl Error for StateConflict {}

/// Actor is not allowed to perform the operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    RoleNotPermitted { role: Role, action: &'static str },
    NotAssignee { task_id: TaskId, user_id: UserId },
    NotAssigner { task_id: TaskId, user_id: UserId },
}

impl Display for AuthorizationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RoleNotPermitted { role, action } => {
                write!(f, "role {role:?} may not {action}")
            }
            Self::NotAssignee { task_id, user_id } => {
                write!(f, "user {user_id} is not the assignee of task {task_id}")
            }
            Self::NotAssigner { task_id, user_id } => {
                write!(f, "user {user_id} did not assign task {task_id}")
            }
        }
    }
}

impl Error for AuthorizationError {}

/// Service error for all use-cases.
#[derive(Debug)]
pub enum ServiceError {
    Validation(ValidationError),
    Conflict(StateConflict),
    Unauthorized(AuthorizationError),
    NotFound { entity: &'static str, key: String },
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Conflict(err) => write!(f, "{err}"),
            Self::Unauthorized(err) => write!(f, "{err}"),
            Self::NotFound { entity, key } => write!(f, "{entity} not found: {key}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Conflict(err) => Some(err),
            Self::Unauthorized(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::NotFound { .. } => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StateConflict> for ServiceError {
    fn from(value: StateConflict) -> Self {
        Self::Conflict(value)
    }
}

impl From<AuthorizationError> for ServiceError {
    fn from(value: AuthorizationError) -> Self {
        Self::Unauthorized(value)
    }
}

impl From<InvalidTransition> for ServiceError {
    fn from(value: InvalidTransition) -> Self {
        Self::Conflict(StateConflict::InvalidTransition(value))
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::NotFound { entity, key } => Self::NotFound { entity, key },
            other => Self::Repo(other),
        }
    }
}

/// Result of a committed transition plus notification warnings.
#[derive(Debug)]
pub struct Committed<T> {
    pub value: T,
    pub warnings: Vec<NotificationDispatchError>,
}

impl<T> Committed<T> {
    pub fn new(value: T, report: DispatchReport) -> Self {
        Self {
            value,
            warnings: report.failures,
        }
    }

    /// Committed without any event to publish.
    pub fn quiet(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn is_fully_notified(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

pub(crate) fn require_assigning_role(
    role: Role,
    action: &'static str,
) -> Result<(), AuthorizationError> {
    if role.can_assign_work() {
        Ok(())
    } else {
        Err(AuthorizationError::RoleNotPermitted { role, action })
    }
}
