use guardian_core::db::open_db_in_memory;
use guardian_core::model::notification::NotificationKind;
use guardian_core::model::task::{
    CompletionStatus, NewTask, SubmissionPayload, TaskPriority, TaskStatus, TaskTransition,
};
use guardian_core::repo::directory_repo::{DirectoryRepository, SqliteDirectoryRepository};
use guardian_core::repo::notification_repo::{
    NotificationRepository, SqliteNotificationRepository,
};
use guardian_core::repo::task_repo::{SqliteTaskRepository, TaskRepository};
use guardian_core::{
    Actor, AuthorizationError, NotificationDispatcher, Role, ServiceError, StateConflict,
    TaskService, UserRecord, ValidationError,
};
use rusqlite::Connection;
use uuid::Uuid;

const ADMIN: i64 = 1;
const MANAGER: i64 = 2;
const EMPLOYEE: i64 = 3;
const PEER: i64 = 4;

fn seed_org(conn: &Connection) {
    let directory = SqliteDirectoryRepository::try_new(conn).unwrap();
    for (id, name, role, manager_id) in [
        (ADMIN, "Ada", Role::Admin, None),
        (MANAGER, "Mina", Role::Manager, None),
        (EMPLOYEE, "Eli", Role::Employee, Some(MANAGER)),
        (PEER, "Noor", Role::Employee, Some(MANAGER)),
    ] {
        directory
            .insert_user(&UserRecord {
                id,
                name: name.to_string(),
                role,
                manager_id,
            })
            .unwrap();
    }
}

fn manager() -> Actor {
    Actor::new(MANAGER, Role::Manager, "Mina")
}

fn employee() -> Actor {
    Actor::new(EMPLOYEE, Role::Employee, "Eli")
}

fn payload(summary: &str) -> SubmissionPayload {
    SubmissionPayload {
        completion_status: CompletionStatus::Completed,
        work_summary: summary.to_string(),
        hours_spent: 3.5,
    }
}

fn report_task() -> NewTask {
    NewTask {
        priority: TaskPriority::High,
        estimated_hours: Some(4.0),
        ..NewTask::new(EMPLOYEE, "  Quarterly report  ")
    }
}

type Dispatcher<'c> =
    NotificationDispatcher<SqliteDirectoryRepository<'c>, SqliteNotificationRepository<'c>>;

fn dispatcher(conn: &Connection) -> Dispatcher<'_> {
    NotificationDispatcher::new(
        SqliteDirectoryRepository::try_new(conn).unwrap(),
        SqliteNotificationRepository::try_new(conn).unwrap(),
    )
}

#[test]
fn assign_requires_manager_or_admin() {
    let conn = open_db_in_memory().unwrap();
    seed_org(&conn);
    let service = TaskService::new(SqliteTaskRepository::try_new(&conn).unwrap(), dispatcher(&conn));

    let err = service.assign(&employee(), report_task()).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Unauthorized(AuthorizationError::RoleNotPermitted {
            role: Role::Employee,
            ..
        })
    ));

    let err = service
        .assign(&manager(), NewTask::new(EMPLOYEE, "   "))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::BlankField("title"))
    ));
}

#[test]
fn assigned_task_is_stored_trimmed_and_assignee_notified() {
    let conn = open_db_in_memory().unwrap();
    seed_org(&conn);
    let service = TaskService::new(SqliteTaskRepository::try_new(&conn).unwrap(), dispatcher(&conn));

    let task = service.assign(&manager(), report_task()).unwrap().value;
    assert_eq!(task.title, "Quarterly report");
    assert_eq!(task.status, TaskStatus::Assigned);
    assert_eq!(task.assigner, MANAGER);
    assert!(task.created_at > 0);
    assert_eq!(service.get(task.id).unwrap(), task);

    let feed = SqliteNotificationRepository::try_new(&conn).unwrap();
    let items = feed.list_for(EMPLOYEE, 50).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].kind, NotificationKind::TaskAssigned);
    assert!(items[0].message.contains("Quarterly report"));
}

#[test]
fn full_review_cycle_with_rejection_and_resubmission() {
    let conn = open_db_in_memory().unwrap();
    seed_org(&conn);
    let service = TaskService::new(SqliteTaskRepository::try_new(&conn).unwrap(), dispatcher(&conn));
    let feed = SqliteNotificationRepository::try_new(&conn).unwrap();

    let task = service.assign(&manager(), report_task()).unwrap().value;
    let started = service.start(task.id, &employee()).unwrap();
    assert_eq!(started.value.status, TaskStatus::InProgress);

    let submitted = service
        .submit(task.id, &employee(), payload("first draft"))
        .unwrap();
    assert_eq!(submitted.value.status, TaskStatus::Submitted);

    let pending = service.pending_reviews(MANAGER).unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].task.id, task.id);
    assert_eq!(pending[0].submission.work_summary, "first draft");

    let rejected = service
        .reject(task.id, &manager(), "  missing appendix ")
        .unwrap();
    assert_eq!(rejected.value.status, TaskStatus::Rejected);
    assert!(service.pending_reviews(MANAGER).unwrap().is_empty());

    service
        .submit(task.id, &employee(), payload("second draft"))
        .unwrap();
    let approved = service.approve(task.id, &manager()).unwrap();
    assert_eq!(approved.value.status, TaskStatus::Approved);
    assert_eq!(service.get(task.id).unwrap().status, TaskStatus::Approved);

    let submissions = service.submissions(task.id).unwrap();
    assert_eq!(submissions.len(), 2);
    assert_eq!(submissions[0].work_summary, "second draft");
    assert_eq!(submissions[0].rejection_reason, None);
    assert_eq!(submissions[1].work_summary, "first draft");
    assert_eq!(
        submissions[1].rejection_reason.as_deref(),
        Some("missing appendix")
    );

    let assigner_kinds: Vec<_> = feed
        .list_for(MANAGER, 50)
        .unwrap()
        .into_iter()
        .map(|item| item.kind)
        .collect();
    assert_eq!(
        assigner_kinds,
        vec![NotificationKind::TaskSubmitted, NotificationKind::TaskSubmitted]
    );

    let assignee_kinds: Vec<_> = feed
        .list_for(EMPLOYEE, 50)
        .unwrap()
        .into_iter()
        .map(|item| item.kind)
        .collect();
    assert_eq!(
        assignee_kinds,
        vec![
            NotificationKind::TaskApproved,
            NotificationKind::TaskRejected,
            NotificationKind::TaskAssigned,
        ]
    );
}

#[test]
fn approving_unsubmitted_task_is_invalid_transition() {
    let conn = open_db_in_memory().unwrap();
    seed_org(&conn);
    let service = TaskService::new(SqliteTaskRepository::try_new(&conn).unwrap(), dispatcher(&conn));

    let task = service.assign(&manager(), report_task()).unwrap().value;
    let err = service.approve(task.id, &manager()).unwrap_err();
    match err {
        ServiceError::Conflict(StateConflict::InvalidTransition(invalid)) => {
            assert_eq!(invalid.transition, TaskTransition::Approve);
            assert_eq!(invalid.current, TaskStatus::Assigned);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn approving_twice_fails_and_sends_one_notification() {
    let conn = open_db_in_memory().unwrap();
    seed_org(&conn);
    let service = TaskService::new(SqliteTaskRepository::try_new(&conn).unwrap(), dispatcher(&conn));
    let feed = SqliteNotificationRepository::try_new(&conn).unwrap();

    let task = service.assign(&manager(), report_task()).unwrap().value;
    service
        .submit(task.id, &employee(), payload("done"))
        .unwrap();
    service.approve(task.id, &manager()).unwrap();

    let err = service.approve(task.id, &manager()).unwrap_err();
    match err {
        ServiceError::Conflict(StateConflict::InvalidTransition(invalid)) => {
            assert_eq!(invalid.current, TaskStatus::Approved);
        }
        other => panic!("unexpected error: {other}"),
    }
    let approvals = feed
        .list_for(EMPLOYEE, 50)
        .unwrap()
        .into_iter()
        .filter(|item| item.kind == NotificationKind::TaskApproved)
        .count();
    assert_eq!(approvals, 1);
}

#[test]
fn stale_status_write_surfaces_as_invalid_transition() {
    let conn = open_db_in_memory().unwrap();
    seed_org(&conn);
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let service = TaskService::new(SqliteTaskRepository::try_new(&conn).unwrap(), dispatcher(&conn));

    let task = service.assign(&manager(), report_task()).unwrap().value;
    repo.update_status(task.id, TaskStatus::Assigned, TaskStatus::InProgress)
        .unwrap();

    let err = repo
        .update_status(task.id, TaskStatus::Assigned, TaskStatus::InProgress)
        .unwrap_err();
    assert!(matches!(err, guardian_core::RepoError::Conflict { .. }));

    let err = service.start(task.id, &employee()).unwrap_err();
    match err {
        ServiceError::Conflict(StateConflict::InvalidTransition(invalid)) => {
            assert_eq!(invalid.current, TaskStatus::InProgress);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn wrong_actor_is_unauthorized() {
    let conn = open_db_in_memory().unwrap();
    seed_org(&conn);
    let service = TaskService::new(SqliteTaskRepository::try_new(&conn).unwrap(), dispatcher(&conn));
    let peer = Actor::new(PEER, Role::Employee, "Noor");
    let admin = Actor::new(ADMIN, Role::Admin, "Ada");

    let task = service.assign(&manager(), report_task()).unwrap().value;
    let err = service
        .submit(task.id, &peer, payload("not mine"))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Unauthorized(AuthorizationError::NotAssignee { user_id: PEER, .. })
    ));

    service
        .submit(task.id, &employee(), payload("done"))
        .unwrap();
    let err = service.approve(task.id, &admin).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Unauthorized(AuthorizationError::NotAssigner { user_id: ADMIN, .. })
    ));
    assert_eq!(service.get(task.id).unwrap().status, TaskStatus::Submitted);
}

#[test]
fn reject_requires_reason() {
    let conn = open_db_in_memory().unwrap();
    seed_org(&conn);
    let service = TaskService::new(SqliteTaskRepository::try_new(&conn).unwrap(), dispatcher(&conn));

    let task = service.assign(&manager(), report_task()).unwrap().value;
    service
        .submit(task.id, &employee(), payload("done"))
        .unwrap();
    let err = service.reject(task.id, &manager(), " ").unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::BlankField("reason"))
    ));
    assert_eq!(service.get(task.id).unwrap().status, TaskStatus::Submitted);
}

#[test]
fn unknown_task_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    seed_org(&conn);
    let service = TaskService::new(SqliteTaskRepository::try_new(&conn).unwrap(), dispatcher(&conn));

    let err = service.start(Uuid::new_v4(), &employee()).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { entity: "task", .. }));
}

#[test]
fn summary_counts_statuses() {
    let conn = open_db_in_memory().unwrap();
    seed_org(&conn);
    let service = TaskService::new(SqliteTaskRepository::try_new(&conn).unwrap(), dispatcher(&conn));

    let first = service.assign(&manager(), report_task()).unwrap().value;
    let second = service.assign(&manager(), report_task()).unwrap().value;
    service.assign(&manager(), report_task()).unwrap();

    service
        .submit(first.id, &employee(), payload("done"))
        .unwrap();
    service.approve(first.id, &manager()).unwrap();
    service
        .submit(second.id, &employee(), payload("done"))
        .unwrap();

    let summary = service.summary(EMPLOYEE).unwrap();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.approved, 1);
    assert_eq!(summary.submitted, 1);
    assert_eq!(summary.pending, 1);
    assert_eq!(summary.completion_percentage, 33);

    assert_eq!(service.summary(PEER).unwrap().total, 0);
}
