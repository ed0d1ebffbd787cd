//! Rule-based daily suggestions.
//!
//! # Responsibility
//! - Gather one user's attendance, task and meeting state for a day.
//! - Turn it into ordered, human-readable suggestions.
//!
//! # Invariants
//! - Rules are evaluated in a fixed order: overtime, pending tasks,
//!   rejections, meeting load.
//! - Read-only; nothing is written and no event is published.

use crate::config::WorkflowLimits;
use crate::model::suggestion::{DayOutlook, Suggestion, SuggestionKind};
use crate::model::task::TaskSummary;
use crate::model::user::UserId;
use crate::repo::attendance_repo::AttendanceRepository;
use crate::repo::meeting_repo::MeetingRepository;
use crate::repo::task_repo::TaskRepository;
use crate::service::ServiceResult;
use chrono::NaiveDate;
use log::debug;

/// Suggestion facade over the attendance, task and meeting stores.
pub struct SuggestionService<A: AttendanceRepository, T: TaskRepository, M: MeetingRepository> {
    attendance: A,
    tasks: T,
    meetings: M,
    limits: WorkflowLimits,
}

impl<A: AttendanceRepository, T: TaskRepository, M: MeetingRepository> SuggestionService<A, T, M> {
    pub fn new(attendance: A, tasks: T, meetings: M) -> Self {
        Self {
            attendance,
            tasks,
            meetings,
            limits: WorkflowLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: WorkflowLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Workload facts for `user_id` on `date`.
    pub fn outlook(&self, user_id: UserId, date: NaiveDate) -> ServiceResult<DayOutlook> {
        let worked_hours = self
            .attendance
            .get(user_id, date)?
            .map(|record| record.total_hours);
        let summary = TaskSummary::from_statuses(
            self.tasks
                .list_for_assignee(user_id)?
                .into_iter()
                .map(|task| task.status),
        );
        let meetings_today = self.meetings.list_for_day(user_id, date)?.len();
        Ok(DayOutlook {
            worked_hours,
            pending_tasks: summary.pending,
            rejected_tasks: summary.rejected,
            meetings_today,
        })
    }

    /// Suggestions for `user_id` on `date`; never empty.
    pub fn daily(&self, user_id: UserId, date: NaiveDate) -> ServiceResult<Vec<Suggestion>> {
        let outlook = self.outlook(user_id, date)?;
        let suggestions = suggest(&outlook, &self.limits);
        debug!(
            "event=suggestions module=suggestion status=ok user_id={user_id} count={}",
            suggestions.len()
        );
        Ok(suggestions)
    }
}

fn suggest(outlook: &DayOutlook, limits: &WorkflowLimits) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();
    if outlook
        .worked_hours
        .is_some_and(|hours| hours > limits.overtime_threshold_hours)
    {
        suggestions.push(Suggestion::new(
            SuggestionKind::Warning,
            "You have been working overtime today. Take a break!",
        ));
    }
    if outlook.pending_tasks > limits.pending_task_threshold {
        suggestions.push(Suggestion::new(
            SuggestionKind::Info,
            format!(
                "You have {} pending tasks. Prioritize the high-priority ones.",
                outlook.pending_tasks
            ),
        ));
    }
    if outlook.rejected_tasks > 0 {
        suggestions.push(Suggestion::new(
            SuggestionKind::Alert,
            format!(
                "{} task(s) were rejected. Review feedback and resubmit.",
                outlook.rejected_tasks
            ),
        ));
    }
    if outlook.meetings_today > limits.meeting_heavy_threshold {
        suggestions.push(Suggestion::new(
            SuggestionKind::Warning,
            "Meeting-heavy day! Block focus time for deep work.",
        ));
    }
    if suggestions.is_empty() {
        suggestions.push(Suggestion::new(
            SuggestionKind::Success,
            "Great job! You're on track today. Keep it up!",
        ));
    }
    suggestions
}

#[cfg(test)]
mod tests {
    use super::suggest;
    use crate::config::WorkflowLimits;
    use crate::model::suggestion::{DayOutlook, SuggestionKind};

    fn kinds(outlook: &DayOutlook) -> Vec<SuggestionKind> {
        suggest(outlook, &WorkflowLimits::default())
            .into_iter()
            .map(|suggestion| suggestion.kind)
            .collect()
    }

    #[test]
    fn quiet_day_is_on_track() {
        assert_eq!(kinds(&DayOutlook::default()), vec![SuggestionKind::Success]);
    }

    #[test]
    fn thresholds_are_strict() {
        let at_limits = DayOutlook {
            worked_hours: Some(9.0),
            pending_tasks: 5,
            rejected_tasks: 0,
            meetings_today: 4,
        };
        assert_eq!(kinds(&at_limits), vec![SuggestionKind::Success]);
    }

    #[test]
    fn every_rule_fires_in_order() {
        let overloaded = DayOutlook {
            worked_hours: Some(10.5),
            pending_tasks: 7,
            rejected_tasks: 2,
            meetings_today: 5,
        };
        let suggestions = suggest(&overloaded, &WorkflowLimits::default());
        assert_eq!(
            suggestions.iter().map(|s| s.kind).collect::<Vec<_>>(),
            vec![
                SuggestionKind::Warning,
                SuggestionKind::Info,
                SuggestionKind::Alert,
                SuggestionKind::Warning,
            ]
        );
        assert_eq!(
            suggestions[1].message,
            "You have 7 pending tasks. Prioritize the high-priority ones."
        );
        assert!(suggestions[2].message.starts_with("2 task(s)"));
    }
}
