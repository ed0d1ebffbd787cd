//! Core domain logic for the cognitive telemetry and workflow engine.
//! This crate is the single source of truth for scoring and workflow
//! invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod scoring;
pub mod service;

pub use config::{ConfigError, EngineConfig, LoggingConfig, WorkflowLimits};
pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::telemetry::{
    BurnoutPhase, CognitiveIndices, ScoringContext, TelemetryPoint, TelemetrySample,
};
pub use model::user::{Actor, Role, UserId, UserRecord};
pub use model::ValidationError;
pub use notify::{
    DispatchReport, DomainEvent, EventSink, NotificationDispatchError, NotificationDispatcher,
};
pub use repo::{RepoError, RepoResult};
pub use scoring::{classify_phase, compute_indices};
pub use service::attendance_service::AttendanceService;
pub use service::meeting_service::MeetingService;
pub use service::notification_service::NotificationFeed;
pub use service::suggestion_service::SuggestionService;
pub use service::task_service::TaskService;
pub use service::telemetry_service::{
    OrgIntelligence, TeamStability, TelemetryHistory, TelemetryService,
};
pub use service::wellness_service::WellnessService;
pub use service::{AuthorizationError, Committed, ServiceError, ServiceResult, StateConflict};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
