//! Attendance ledger use-cases.
//!
//! # Responsibility
//! - Run the daily `NoRecord -> CheckedIn -> CheckedOut` state machine.
//! - Notify the supervisory chain after each committed step.
//!
//! # Invariants
//! - At most one record per `(user, date)`; the store decides races.
//! - `CheckedOut` is terminal for the day.

use crate::config::WorkflowLimits;
use crate::model::attendance::AttendanceRecord;
use crate::model::user::{Actor, UserId};
use crate::notify::{DomainEvent, EventSink};
use crate::repo::attendance_repo::AttendanceRepository;
use crate::repo::RepoError;
use crate::service::{Committed, ServiceError, ServiceResult, StateConflict};
use chrono::{NaiveDate, NaiveTime};
use log::info;

/// Attendance service facade over repository and event sink.
pub struct AttendanceService<R: AttendanceRepository, E: EventSink> {
    repo: R,
    events: E,
    limits: WorkflowLimits,
}

impl<R: AttendanceRepository, E: EventSink> AttendanceService<R, E> {
    pub fn new(repo: R, events: E) -> Self {
        Self {
            repo,
            events,
            limits: WorkflowLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: WorkflowLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Opens today's record for the actor.
    pub fn check_in(
        &self,
        actor: &Actor,
        date: NaiveDate,
        time: NaiveTime,
    ) -> ServiceResult<Committed<AttendanceRecord>> {
        let record = AttendanceRecord::open(actor.user_id, date, time);
        self.repo.insert_open(&record).map_err(|err| match err {
            RepoError::Duplicate { .. } => StateConflict::AlreadyCheckedIn.into(),
            other => ServiceError::from(other),
        })?;

        info!(
            "event=attendance_check_in module=attendance status=ok user_id={}",
            actor.user_id
        );
        let report = self.events.publish(&DomainEvent::AttendanceCheckedIn {
            user_id: actor.user_id,
            date,
            time: record.check_in,
        });
        Ok(Committed::new(record, report))
    }

    /// Closes today's record and computes worked hours and overtime.
    pub fn check_out(
        &self,
        actor: &Actor,
        date: NaiveDate,
        time: NaiveTime,
    ) -> ServiceResult<Committed<AttendanceRecord>> {
        let existing = self
            .repo
            .get(actor.user_id, date)?
            .ok_or(StateConflict::NotCheckedIn)?;
        if existing.is_closed() {
            return Err(StateConflict::AlreadyCheckedOut.into());
        }

        let closed = existing.closed_at(time, self.limits.overtime_threshold_hours)?;
        self.repo.close(&closed).map_err(|err| match err {
            RepoError::Conflict { .. } => StateConflict::AlreadyCheckedOut.into(),
            RepoError::NotFound { .. } => StateConflict::NotCheckedIn.into(),
            other => ServiceError::from(other),
        })?;

        info!(
            "event=attendance_check_out module=attendance status=ok user_id={} total_hours={} overtime={}",
            actor.user_id, closed.total_hours, closed.overtime
        );
        let report = self.events.publish(&DomainEvent::AttendanceCheckedOut {
            user_id: actor.user_id,
            date,
            time: closed.check_out.unwrap_or(time),
            total_hours: closed.total_hours,
        });
        Ok(Committed::new(closed, report))
    }

    /// Record for one day, if any.
    pub fn today(&self, user_id: UserId, date: NaiveDate) -> ServiceResult<Option<AttendanceRecord>> {
        Ok(self.repo.get(user_id, date)?)
    }

    /// Most recent records, newest first.
    pub fn recent(&self, user_id: UserId) -> ServiceResult<Vec<AttendanceRecord>> {
        Ok(self
            .repo
            .list_recent(user_id, self.limits.attendance_history_limit)?)
    }
}
