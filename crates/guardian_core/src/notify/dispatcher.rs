//! Event-to-notification fan-out.
//!
//! # Responsibility
//! - Resolve the recipient set of each `DomainEvent` through the directory.
//! - Persist one notification per recipient and report what happened.
//!
//! # Invariants
//! - A recipient appears at most once per event. The first matching rule
//!   wins, so a manager who is also an admin gets the manager message.
//! - `publish` never returns `Err`; failures land in `DispatchReport`.

use crate::model::notification::{NotificationKind, OutgoingNotification};
use crate::model::user::{UserId, UserRecord};
use crate::notify::event::DomainEvent;
use crate::repo::directory_repo::DirectoryRepository;
use crate::repo::notification_repo::NotificationRepository;
use crate::repo::RepoError;
use log::{info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Notification that could not be planned or stored.
#[derive(Debug)]
pub enum NotificationDispatchError {
    /// Event subject or recipient is missing from the directory.
    UnknownUser(UserId),
    /// Directory lookup or notification insert failed.
    Store {
        recipient_id: Option<UserId>,
        source: RepoError,
    },
}

impl Display for NotificationDispatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownUser(user_id) => write!(f, "unknown user: {user_id}"),
            Self::Store {
                recipient_id: Some(recipient_id),
                source,
            } => write!(f, "failed to notify user {recipient_id}: {source}"),
            Self::Store {
                recipient_id: None,
                source,
            } => write!(f, "failed to resolve recipients: {source}"),
        }
    }
}

impl Error for NotificationDispatchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store { source, .. } => Some(source),
            Self::UnknownUser(_) => None,
        }
    }
}

impl From<RepoError> for NotificationDispatchError {
    fn from(value: RepoError) -> Self {
        Self::Store {
            recipient_id: None,
            source: value,
        }
    }
}

impl NotificationDispatchError {
    fn kind(&self) -> &'static str {
        match self {
            Self::UnknownUser(_) => "unknown_user",
            Self::Store { .. } => "store",
        }
    }
}

/// One stored notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveredNotification {
    pub recipient_id: UserId,
    pub notification_id: i64,
}

/// Outcome of publishing one event.
#[derive(Debug)]
pub struct DispatchReport {
    pub event: &'static str,
    pub delivered: Vec<DeliveredNotification>,
    pub failures: Vec<NotificationDispatchError>,
}

impl DispatchReport {
    pub fn empty(event: &'static str) -> Self {
        Self {
            event,
            delivered: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// True when every planned recipient was notified.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn recipients(&self) -> Vec<UserId> {
        self.delivered.iter().map(|item| item.recipient_id).collect()
    }
}

/// Port through which services publish committed transitions.
pub trait EventSink {
    fn publish(&self, event: &DomainEvent) -> DispatchReport;
}

impl<T: EventSink + ?Sized> EventSink for &T {
    fn publish(&self, event: &DomainEvent) -> DispatchReport {
        (**self).publish(event)
    }
}

/// Directory-driven dispatcher persisting into the notification feed.
pub struct NotificationDispatcher<D: DirectoryRepository, N: NotificationRepository> {
    directory: D,
    notifications: N,
}

impl<D: DirectoryRepository, N: NotificationRepository> NotificationDispatcher<D, N> {
    pub fn new(directory: D, notifications: N) -> Self {
        Self {
            directory,
            notifications,
        }
    }

    /// Resolves recipients and messages without writing anything.
    pub fn plan(
        &self,
        event: &DomainEvent,
    ) -> Result<Vec<OutgoingNotification>, NotificationDispatchError> {
        let mut plan = RecipientPlan::default();
        match event {
            DomainEvent::AttendanceCheckedIn { user_id, time, .. } => {
                let subject = self.subject(*user_id)?;
                let clock = time.format("%H:%M");
                self.supervisors(
                    &mut plan,
                    &subject,
                    NotificationKind::Info,
                    format!("Attendance: {} has checked in at {clock}.", subject.name),
                    format!("Attendance: {} just clocked in.", subject.name),
                )?;
            }
            DomainEvent::AttendanceCheckedOut {
                user_id,
                time,
                total_hours,
                ..
            } => {
                let subject = self.subject(*user_id)?;
                let clock = time.format("%H:%M");
                self.supervisors(
                    &mut plan,
                    &subject,
                    NotificationKind::Info,
                    format!(
                        "Attendance: {} has checked out at {clock} after {total_hours}h.",
                        subject.name
                    ),
                    format!("Attendance: {} just clocked out.", subject.name),
                )?;
            }
            DomainEvent::DailyCheckIn {
                user_id,
                mood,
                sleep_hours,
            } => {
                let subject = self.subject(*user_id)?;
                if let Some(manager_id) = subject.manager_id {
                    plan.push(
                        manager_id,
                        NotificationKind::Insight,
                        format!(
                            "Wellness: {} checked in with mood {mood}/5 after {sleep_hours}h of sleep.",
                            subject.name
                        ),
                    );
                }
                for admin in self.directory.list_admins()? {
                    plan.push(
                        admin.id,
                        NotificationKind::Info,
                        format!("Wellness: {} completed the daily check-in.", subject.name),
                    );
                }
            }
            DomainEvent::CollapseRiskDetected {
                user_id,
                neural_load,
                ..
            } => {
                let subject = self.subject(*user_id)?;
                let message = format!(
                    "Alert: {} has entered Collapse Risk (neural load {neural_load:.0}).",
                    subject.name
                );
                self.supervisors(
                    &mut plan,
                    &subject,
                    NotificationKind::Alert,
                    message.clone(),
                    message,
                )?;
            }
            DomainEvent::TaskAssigned {
                assignee, title, ..
            } => plan.push(
                *assignee,
                NotificationKind::TaskAssigned,
                format!("New task assigned: \"{title}\"."),
            ),
            DomainEvent::TaskSubmitted {
                assignee,
                assigner,
                title,
                ..
            } => {
                let subject = self.subject(*assignee)?;
                plan.push(
                    *assigner,
                    NotificationKind::TaskSubmitted,
                    format!("{} submitted \"{title}\" for review.", subject.name),
                );
            }
            DomainEvent::TaskApproved {
                assignee, title, ..
            } => plan.push(
                *assignee,
                NotificationKind::TaskApproved,
                format!("Your task \"{title}\" has been approved."),
            ),
            DomainEvent::TaskRejected {
                assignee,
                title,
                reason,
                ..
            } => plan.push(
                *assignee,
                NotificationKind::TaskRejected,
                format!("Your task \"{title}\" was rejected: {reason}"),
            ),
            DomainEvent::MeetingAssigned {
                attendee,
                title,
                date,
                ..
            } => plan.push(
                *attendee,
                NotificationKind::MeetingAssigned,
                format!("New meeting scheduled: \"{title}\" on {date}."),
            ),
        }
        Ok(plan.items)
    }

    fn subject(&self, user_id: UserId) -> Result<UserRecord, NotificationDispatchError> {
        self.directory
            .get_user(user_id)?
            .ok_or(NotificationDispatchError::UnknownUser(user_id))
    }

    fn supervisors(
        &self,
        plan: &mut RecipientPlan,
        subject: &UserRecord,
        kind: NotificationKind,
        manager_message: String,
        admin_message: String,
    ) -> Result<(), NotificationDispatchError> {
        if let Some(manager_id) = subject.manager_id {
            plan.push(manager_id, kind, manager_message);
        }
        for admin in self.directory.list_admins()? {
            plan.push(admin.id, kind, admin_message.clone());
        }
        Ok(())
    }
}

impl<D: DirectoryRepository, N: NotificationRepository> EventSink
    for NotificationDispatcher<D, N>
{
    fn publish(&self, event: &DomainEvent) -> DispatchReport {
        let mut report = DispatchReport::empty(event.name());

        let planned = match self.plan(event) {
            Ok(planned) => planned,
            Err(err) => {
                warn!(
                    "event=notify_dispatch module=notify status=error event_type={} stage=plan error_kind={}",
                    report.event,
                    err.kind()
                );
                report.failures.push(err);
                return report;
            }
        };

        for notification in planned {
            match self.notifications.insert(&notification) {
                Ok(notification_id) => report.delivered.push(DeliveredNotification {
                    recipient_id: notification.recipient_id,
                    notification_id,
                }),
                Err(source) => {
                    warn!(
                        "event=notify_dispatch module=notify status=error event_type={} stage=store recipient_id={}",
                        report.event, notification.recipient_id
                    );
                    report.failures.push(NotificationDispatchError::Store {
                        recipient_id: Some(notification.recipient_id),
                        source,
                    });
                }
            }
        }

        info!(
            "event=notify_dispatch module=notify status={} event_type={} delivered={} failed={}",
            if report.is_clean() { "ok" } else { "partial" },
            report.event,
            report.delivered.len(),
            report.failures.len()
        );
        report
    }
}

#[derive(Default)]
struct RecipientPlan {
    seen: HashSet<UserId>,
    items: Vec<OutgoingNotification>,
}

impl RecipientPlan {
    fn push(&mut self, recipient_id: UserId, kind: NotificationKind, message: String) {
        if self.seen.insert(recipient_id) {
            self.items.push(OutgoingNotification {
                recipient_id,
                message,
                kind,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{NotificationDispatchError, RecipientPlan};
    use crate::model::notification::NotificationKind;
    use crate::repo::RepoError;
    use std::error::Error;

    #[test]
    fn plan_keeps_first_message_per_recipient() {
        let mut plan = RecipientPlan::default();
        plan.push(2, NotificationKind::Insight, "manager".to_string());
        plan.push(2, NotificationKind::Info, "admin".to_string());
        plan.push(3, NotificationKind::Info, "admin".to_string());

        assert_eq!(plan.items.len(), 2);
        assert_eq!(plan.items[0].message, "manager");
        assert_eq!(plan.items[0].kind, NotificationKind::Insight);
        assert_eq!(plan.items[1].recipient_id, 3);
    }

    #[test]
    fn store_error_keeps_source_chain() {
        let err = NotificationDispatchError::Store {
            recipient_id: Some(7),
            source: RepoError::InvalidData("broken".to_string()),
        };
        assert!(err.to_string().starts_with("failed to notify user 7"));
        assert!(err.source().is_some());
        assert!(NotificationDispatchError::UnknownUser(9).source().is_none());
    }
}
