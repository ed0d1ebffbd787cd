//! Task workflow use-cases.
//!
//! # Responsibility
//! - Authorize actors and drive `TaskStatus` through its state machine.
//! - Publish one event per committed transition (except `start`).
//!
//! # Invariants
//! - Only the assignee starts or submits; only the assigner reviews.
//! - Status writes are compare-and-set; a lost race surfaces as
//!   `InvalidTransition` carrying the status that won.

use crate::model::ensure_not_blank;
use crate::model::task::{
    InvalidTransition, NewTask, SubmissionPayload, Task, TaskId, TaskStatus, TaskSubmission,
    TaskSummary, TaskTransition,
};
use crate::model::user::{Actor, UserId};
use crate::notify::{DomainEvent, EventSink};
use crate::repo::task_repo::{ReviewItem, TaskRepository};
use crate::repo::RepoError;
use crate::service::{
    require_assigning_role, AuthorizationError, Committed, ServiceError, ServiceResult,
};
use log::info;

/// Task workflow facade over repository and event sink.
pub struct TaskService<R: TaskRepository, E: EventSink> {
    repo: R,
    events: E,
}

impl<R: TaskRepository, E: EventSink> TaskService<R, E> {
    pub fn new(repo: R, events: E) -> Self {
        Self { repo, events }
    }

    /// Creates a task in `Assigned` status. Managers and admins only.
    pub fn assign(&self, actor: &Actor, request: NewTask) -> ServiceResult<Committed<Task>> {
        require_assigning_role(actor.role, "assign tasks")?;
        request.validate()?;

        let task = self.repo.insert_task(&request.into_task(actor.user_id))?;
        info!(
            "event=task_assign module=task status=ok task_id={} assignee={} assigner={}",
            task.id, task.assignee, task.assigner
        );
        let report = self.events.publish(&DomainEvent::TaskAssigned {
            task_id: task.id,
            assignee: task.assignee,
            title: task.title.clone(),
        });
        Ok(Committed::new(task, report))
    }

    pub fn get(&self, task_id: TaskId) -> ServiceResult<Task> {
        self.load(task_id)
    }

    /// `Assigned -> InProgress`. Publishes nothing.
    pub fn start(&self, task_id: TaskId, actor: &Actor) -> ServiceResult<Committed<Task>> {
        let task = self.load(task_id)?;
        ensure_assignee(&task, actor)?;
        let next = task.status.apply(TaskTransition::Start)?;

        self.repo
            .update_status(task_id, task.status, next)
            .map_err(|err| self.lost_race(task_id, TaskTransition::Start, err))?;
        self.log_transition(&task, next);
        Ok(Committed::quiet(Task {
            status: next,
            ..task
        }))
    }

    /// Records a submission and moves the task to `Submitted`.
    pub fn submit(
        &self,
        task_id: TaskId,
        actor: &Actor,
        payload: SubmissionPayload,
    ) -> ServiceResult<Committed<Task>> {
        let task = self.load(task_id)?;
        ensure_assignee(&task, actor)?;
        payload.validate()?;
        let next = task.status.apply(TaskTransition::Submit)?;

        self.repo
            .insert_submission(task_id, task.status, actor.user_id, &payload)
            .map_err(|err| self.lost_race(task_id, TaskTransition::Submit, err))?;
        self.log_transition(&task, next);

        let report = self.events.publish(&DomainEvent::TaskSubmitted {
            task_id,
            assignee: task.assignee,
            assigner: task.assigner,
            title: task.title.clone(),
        });
        Ok(Committed::new(
            Task {
                status: next,
                ..task
            },
            report,
        ))
    }

    /// `Submitted -> Approved`, terminal.
    pub fn approve(&self, task_id: TaskId, actor: &Actor) -> ServiceResult<Committed<Task>> {
        let task = self.load(task_id)?;
        ensure_assigner(&task, actor)?;
        let next = task.status.apply(TaskTransition::Approve)?;

        self.repo
            .record_review(task_id, next, None)
            .map_err(|err| self.lost_race(task_id, TaskTransition::Approve, err))?;
        self.log_transition(&task, next);

        let report = self.events.publish(&DomainEvent::TaskApproved {
            task_id,
            assignee: task.assignee,
            title: task.title.clone(),
        });
        Ok(Committed::new(
            Task {
                status: next,
                ..task
            },
            report,
        ))
    }

    /// `Submitted -> Rejected`; the reason lands on the latest submission.
    pub fn reject(
        &self,
        task_id: TaskId,
        actor: &Actor,
        reason: &str,
    ) -> ServiceResult<Committed<Task>> {
        ensure_not_blank("reason", reason)?;
        let reason = reason.trim();
        let task = self.load(task_id)?;
        ensure_assigner(&task, actor)?;
        let next = task.status.apply(TaskTransition::Reject)?;

        self.repo
            .record_review(task_id, next, Some(reason))
            .map_err(|err| self.lost_race(task_id, TaskTransition::Reject, err))?;
        self.log_transition(&task, next);

        let report = self.events.publish(&DomainEvent::TaskRejected {
            task_id,
            assignee: task.assignee,
            title: task.title.clone(),
            reason: reason.to_string(),
        });
        Ok(Committed::new(
            Task {
                status: next,
                ..task
            },
            report,
        ))
    }

    /// Submission history, newest first.
    pub fn submissions(&self, task_id: TaskId) -> ServiceResult<Vec<TaskSubmission>> {
        self.load(task_id)?;
        Ok(self.repo.list_submissions(task_id)?)
    }

    /// Submitted tasks awaiting review by `assigner`.
    pub fn pending_reviews(&self, assigner: UserId) -> ServiceResult<Vec<ReviewItem>> {
        Ok(self.repo.list_pending_review(assigner)?)
    }

    pub fn tasks_for(&self, assignee: UserId) -> ServiceResult<Vec<Task>> {
        Ok(self.repo.list_for_assignee(assignee)?)
    }

    pub fn summary(&self, assignee: UserId) -> ServiceResult<TaskSummary> {
        let tasks = self.repo.list_for_assignee(assignee)?;
        Ok(TaskSummary::from_statuses(
            tasks.into_iter().map(|task| task.status),
        ))
    }

    fn load(&self, task_id: TaskId) -> ServiceResult<Task> {
        self.repo
            .get_task(task_id)?
            .ok_or_else(|| ServiceError::NotFound {
                entity: "task",
                key: task_id.to_string(),
            })
    }

    fn lost_race(
        &self,
        task_id: TaskId,
        transition: TaskTransition,
        err: RepoError,
    ) -> ServiceError {
        if !matches!(err, RepoError::Conflict { .. }) {
            return err.into();
        }
        match self.load(task_id) {
            Ok(current) => InvalidTransition {
                transition,
                current: current.status,
            }
            .into(),
            Err(reload_err) => reload_err,
        }
    }

    fn log_transition(&self, task: &Task, next: TaskStatus) {
        info!(
            "event=task_transition module=task status=ok task_id={} from={} to={}",
            task.id,
            task.status.as_str(),
            next.as_str()
        );
    }
}

fn ensure_assignee(task: &Task, actor: &Actor) -> Result<(), AuthorizationError> {
    if task.assignee == actor.user_id {
        Ok(())
    } else {
        Err(AuthorizationError::NotAssignee {
            task_id: task.id,
            user_id: actor.user_id,
        })
    }
}

fn ensure_assigner(task: &Task, actor: &Actor) -> Result<(), AuthorizationError> {
    if task.assigner == actor.user_id {
        Ok(())
    } else {
        Err(AuthorizationError::NotAssigner {
            task_id: task.id,
            user_id: actor.user_id,
        })
    }
}
