use chrono::{NaiveDate, NaiveTime};
use guardian_core::db::{open_db, open_db_in_memory};
use guardian_core::model::notification::NotificationKind;
use guardian_core::repo::attendance_repo::SqliteAttendanceRepository;
use guardian_core::repo::directory_repo::{DirectoryRepository, SqliteDirectoryRepository};
use guardian_core::repo::notification_repo::{
    NotificationRepository, SqliteNotificationRepository,
};
use guardian_core::{
    Actor, AttendanceService, DispatchReport, DomainEvent, EventSink, NotificationDispatcher,
    Role, ServiceError, StateConflict, UserRecord, ValidationError, WorkflowLimits,
};
use rusqlite::Connection;
use std::sync::{Arc, Barrier};
use std::thread;

const ADMIN: i64 = 1;
const MANAGER: i64 = 2;
const EMPLOYEE: i64 = 3;

struct Silent;

impl EventSink for Silent {
    fn publish(&self, event: &DomainEvent) -> DispatchReport {
        DispatchReport::empty(event.name())
    }
}

fn seed_org(conn: &Connection) {
    let directory = SqliteDirectoryRepository::try_new(conn).unwrap();
    for (id, name, role, manager_id) in [
        (ADMIN, "Ada", Role::Admin, None),
        (MANAGER, "Mina", Role::Manager, None),
        (EMPLOYEE, "Eli", Role::Employee, Some(MANAGER)),
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

fn employee() -> Actor {
    Actor::new(EMPLOYEE, Role::Employee, "Eli")
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

#[test]
fn full_day_computes_hours_overtime_and_notifies_supervisors() {
    let conn = open_db_in_memory().unwrap();
    seed_org(&conn);
    let dispatcher = NotificationDispatcher::new(
        SqliteDirectoryRepository::try_new(&conn).unwrap(),
        SqliteNotificationRepository::try_new(&conn).unwrap(),
    );
    let service = AttendanceService::new(
        SqliteAttendanceRepository::try_new(&conn).unwrap(),
        &dispatcher,
    );

    let opened = service.check_in(&employee(), day(2), hm(9, 0)).unwrap();
    assert!(opened.is_fully_notified());
    assert!(!opened.value.is_closed());

    let closed = service.check_out(&employee(), day(2), hm(18, 30)).unwrap();
    assert_eq!(closed.value.total_hours, 9.5);
    assert!(closed.value.overtime);

    let stored = service.today(EMPLOYEE, day(2)).unwrap().unwrap();
    assert_eq!(stored, closed.value);

    let feed = SqliteNotificationRepository::try_new(&conn).unwrap();
    for recipient in [MANAGER, ADMIN] {
        let items = feed.list_for(recipient, 50).unwrap();
        assert_eq!(items.len(), 2, "recipient {recipient}");
        assert!(items.iter().all(|item| item.kind == NotificationKind::Info));
    }
    let manager_items = feed.list_for(MANAGER, 50).unwrap();
    assert!(manager_items[0].message.contains("9.5h"));
    assert!(manager_items[1].message.contains("09:00"));
    assert!(feed.list_for(EMPLOYEE, 50).unwrap().is_empty());
}

#[test]
fn second_check_in_fails_and_keeps_record() {
    let conn = open_db_in_memory().unwrap();
    seed_org(&conn);
    let service =
        AttendanceService::new(SqliteAttendanceRepository::try_new(&conn).unwrap(), Silent);

    service.check_in(&employee(), day(2), hm(9, 0)).unwrap();
    let err = service
        .check_in(&employee(), day(2), hm(10, 0))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Conflict(StateConflict::AlreadyCheckedIn)
    ));

    let stored = service.today(EMPLOYEE, day(2)).unwrap().unwrap();
    assert_eq!(stored.check_in, hm(9, 0));
    assert!(!stored.is_closed());
}

#[test]
fn check_out_requires_open_record() {
    let conn = open_db_in_memory().unwrap();
    seed_org(&conn);
    let service =
        AttendanceService::new(SqliteAttendanceRepository::try_new(&conn).unwrap(), Silent);

    let err = service
        .check_out(&employee(), day(2), hm(17, 0))
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(StateConflict::NotCheckedIn)));

    service.check_in(&employee(), day(2), hm(9, 0)).unwrap();
    service.check_out(&employee(), day(2), hm(17, 0)).unwrap();
    let err = service
        .check_out(&employee(), day(2), hm(18, 0))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Conflict(StateConflict::AlreadyCheckedOut)
    ));

    let stored = service.today(EMPLOYEE, day(2)).unwrap().unwrap();
    assert_eq!(stored.check_out, Some(hm(17, 0)));
    assert_eq!(stored.total_hours, 8.0);
    assert!(!stored.overtime);
}

#[test]
fn check_out_before_check_in_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    seed_org(&conn);
    let service =
        AttendanceService::new(SqliteAttendanceRepository::try_new(&conn).unwrap(), Silent);

    service.check_in(&employee(), day(2), hm(9, 0)).unwrap();
    let err = service
        .check_out(&employee(), day(2), hm(8, 0))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::CheckOutBeforeCheckIn)
    ));
    assert!(!service.today(EMPLOYEE, day(2)).unwrap().unwrap().is_closed());
}

#[test]
fn returned_record_matches_stored_precision() {
    let conn = open_db_in_memory().unwrap();
    seed_org(&conn);
    let service =
        AttendanceService::new(SqliteAttendanceRepository::try_new(&conn).unwrap(), Silent);
    let precise = |millis| NaiveTime::from_hms_milli_opt(9, 0, 0, millis).unwrap();

    let opened = service.check_in(&employee(), day(2), precise(750)).unwrap();
    assert_eq!(opened.value.check_in, hm(9, 0));
    assert_eq!(Some(opened.value), service.today(EMPLOYEE, day(2)).unwrap());

    let closed = service.check_out(&employee(), day(2), precise(200)).unwrap();
    assert_eq!(closed.value.check_out, Some(hm(9, 0)));
    assert!(closed.value.check_out >= Some(closed.value.check_in));
    assert_eq!(Some(closed.value), service.today(EMPLOYEE, day(2)).unwrap());
}

#[test]
fn overtime_threshold_comes_from_limits() {
    let conn = open_db_in_memory().unwrap();
    seed_org(&conn);
    let limits = WorkflowLimits {
        overtime_threshold_hours: 8.0,
        ..WorkflowLimits::default()
    };
    let service =
        AttendanceService::new(SqliteAttendanceRepository::try_new(&conn).unwrap(), Silent)
            .with_limits(limits);

    service.check_in(&employee(), day(2), hm(9, 0)).unwrap();
    let closed = service.check_out(&employee(), day(2), hm(17, 30)).unwrap();
    assert!(closed.value.overtime);
}

#[test]
fn recent_is_newest_first_and_capped() {
    let conn = open_db_in_memory().unwrap();
    seed_org(&conn);
    let limits = WorkflowLimits {
        attendance_history_limit: 3,
        ..WorkflowLimits::default()
    };
    let service =
        AttendanceService::new(SqliteAttendanceRepository::try_new(&conn).unwrap(), Silent)
            .with_limits(limits);

    for d in 1..=5 {
        service.check_in(&employee(), day(d), hm(9, 0)).unwrap();
    }

    let dates: Vec<_> = service
        .recent(EMPLOYEE)
        .unwrap()
        .into_iter()
        .map(|record| record.date)
        .collect();
    assert_eq!(dates, vec![day(5), day(4), day(3)]);
}

#[test]
fn concurrent_check_ins_from_two_connections_commit_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("attendance.db");
    {
        let conn = open_db(&path).unwrap();
        seed_org(&conn);
    }

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = [hm(9, 0), hm(9, 1)]
        .into_iter()
        .map(|time| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let conn = open_db(&path).unwrap();
                let service = AttendanceService::new(
                    SqliteAttendanceRepository::try_new(&conn).unwrap(),
                    Silent,
                );
                barrier.wait();
                service
                    .check_in(&employee(), day(2), time)
                    .map(|committed| committed.value)
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();
    let successes = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(successes, 1);
    assert!(results.iter().any(|result| matches!(
        result,
        Err(ServiceError::Conflict(StateConflict::AlreadyCheckedIn))
    )));

    let conn = open_db(&path).unwrap();
    let rows: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM attendance WHERE user_id = ?1;",
            [EMPLOYEE],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(rows, 1);
}
