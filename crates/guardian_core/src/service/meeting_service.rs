//! Meeting schedule use-cases.
//!
//! # Invariants
//! - `duration_minutes = end_time - start_time`, never negative.
//! - A day is meeting-heavy when it holds more meetings than the configured
//!   threshold.

use crate::config::WorkflowLimits;
use crate::model::meeting::{Meeting, MeetingDay, NewMeeting};
use crate::model::user::{Actor, UserId};
use crate::notify::{DomainEvent, EventSink};
use crate::repo::meeting_repo::MeetingRepository;
use crate::service::{require_assigning_role, Committed, ServiceResult};
use chrono::NaiveDate;
use log::info;

/// Meeting service facade over repository and event sink.
pub struct MeetingService<R: MeetingRepository, E: EventSink> {
    repo: R,
    events: E,
    limits: WorkflowLimits,
}

impl<R: MeetingRepository, E: EventSink> MeetingService<R, E> {
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

    /// Books a meeting for the attendee. Managers and admins only.
    pub fn assign(&self, actor: &Actor, request: NewMeeting) -> ServiceResult<Committed<Meeting>> {
        require_assigning_role(actor.role, "assign meetings")?;
        request.validate()?;

        let meeting = request.into_meeting(actor.user_id);
        self.repo.insert_meeting(&meeting)?;
        info!(
            "event=meeting_assign module=meeting status=ok meeting_id={} attendee={} duration_minutes={}",
            meeting.id, meeting.attendee, meeting.duration_minutes
        );

        let report = self.events.publish(&DomainEvent::MeetingAssigned {
            meeting_id: meeting.id,
            attendee: meeting.attendee,
            title: meeting.title.clone(),
            date: meeting.date,
        });
        Ok(Committed::new(meeting, report))
    }

    pub fn day(&self, attendee: UserId, date: NaiveDate) -> ServiceResult<MeetingDay> {
        let meetings = self.repo.list_for_day(attendee, date)?;
        Ok(MeetingDay::from_meetings(
            meetings,
            self.limits.meeting_heavy_threshold,
        ))
    }

    /// Every meeting of the attendee, latest day first.
    pub fn upcoming(&self, attendee: UserId) -> ServiceResult<Vec<Meeting>> {
        Ok(self.repo.list_for_attendee(attendee)?)
    }
}
