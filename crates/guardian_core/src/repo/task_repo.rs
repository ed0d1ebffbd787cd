//! Task and submission repository.
//!
//! # Responsibility
//! - Persist tasks and the submissions attached to them.
//! - Apply status changes as compare-and-set updates.
//!
//! # Invariants
//! - A status change only lands if the row is still in the expected status.
//! - Submit writes the status change and the submission row atomically.
//! - Reject writes the status change and the reason on the most recent
//!   submission atomically.
//! - Submissions list newest first (`id DESC`).

use super::codec::{date_to_db, parse_date, parse_uuid};
use super::schema::{ensure_connection_ready, TableSpec};
use super::{map_unique_violation, RepoError, RepoResult};
use crate::model::task::{
    CompletionStatus, SubmissionPayload, Task, TaskId, TaskPriority, TaskStatus, TaskSubmission,
};
use crate::model::user::UserId;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

const TASK_SELECT_SQL: &str = "SELECT
    id,
    assignee,
    assigner,
    title,
    description,
    priority,
    deadline,
    estimated_hours,
    status,
    created_at
FROM tasks";

const SUBMISSION_SELECT_SQL: &str = "SELECT
    id,
    task_id,
    user_id,
    completion_status,
    work_summary,
    hours_spent,
    rejection_reason,
    submitted_at
FROM task_submissions";

const REQUIRED_TABLES: &[TableSpec] = &[
    (
        "tasks",
        &[
            "id",
            "assignee",
            "assigner",
            "title",
            "description",
            "priority",
            "deadline",
            "estimated_hours",
            "status",
            "created_at",
            "updated_at",
        ],
    ),
    (
        "task_submissions",
        &[
            "id",
            "task_id",
            "user_id",
            "completion_status",
            "work_summary",
            "hours_spent",
            "rejection_reason",
            "submitted_at",
        ],
    ),
];

/// Submitted task paired with the submission awaiting review.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewItem {
    pub task: Task,
    pub submission: TaskSubmission,
}

/// Persistence port for tasks and submissions.
pub trait TaskRepository {
    /// Inserts a new task and returns it as stored.
    fn insert_task(&self, task: &Task) -> RepoResult<Task>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    /// Compare-and-set status change.
    fn update_status(&self, id: TaskId, from: TaskStatus, to: TaskStatus) -> RepoResult<()>;
    /// Moves `from -> Submitted` and appends a submission in one transaction.
    fn insert_submission(
        &self,
        id: TaskId,
        from: TaskStatus,
        user_id: UserId,
        payload: &SubmissionPayload,
    ) -> RepoResult<TaskSubmission>;
    /// Moves `Submitted -> to`; attaches `rejection_reason` to the latest
    /// submission when given.
    fn record_review(
        &self,
        id: TaskId,
        to: TaskStatus,
        rejection_reason: Option<&str>,
    ) -> RepoResult<()>;
    /// Newest first.
    fn list_submissions(&self, id: TaskId) -> RepoResult<Vec<TaskSubmission>>;
    /// Newest first.
    fn list_for_assignee(&self, assignee: UserId) -> RepoResult<Vec<Task>>;
    /// Tasks in `Submitted` assigned by `assigner`, with their latest
    /// submission, newest submission first.
    fn list_pending_review(&self, assigner: UserId) -> RepoResult<Vec<ReviewItem>>;
}

/// SQLite-backed task store.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn insert_task(&self, task: &Task) -> RepoResult<Task> {
        self.conn
            .execute(
                "INSERT INTO tasks (
                    id,
                    assignee,
                    assigner,
                    title,
                    description,
                    priority,
                    deadline,
                    estimated_hours,
                    status
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
                params![
                    task.id.to_string(),
                    task.assignee,
                    task.assigner,
                    task.title.as_str(),
                    task.description.as_deref(),
                    task.priority.as_str(),
                    task.deadline.map(date_to_db),
                    task.estimated_hours,
                    task.status.as_str(),
                ],
            )
            .map_err(|err| map_unique_violation(err, "task", || task.id.to_string()))?;

        self.get_task(task.id)?.ok_or_else(|| RepoError::NotFound {
            entity: "task",
            key: task.id.to_string(),
        })
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }
        Ok(None)
    }

    fn update_status(&self, id: TaskId, from: TaskStatus, to: TaskStatus) -> RepoResult<()> {
        compare_and_set_status(self.conn, id, from, to)
    }

    fn insert_submission(
        &self,
        id: TaskId,
        from: TaskStatus,
        user_id: UserId,
        payload: &SubmissionPayload,
    ) -> RepoResult<TaskSubmission> {
        payload.validate()?;
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        compare_and_set_status(&tx, id, from, TaskStatus::Submitted)?;
        tx.execute(
            "INSERT INTO task_submissions (
                task_id,
                user_id,
                completion_status,
                work_summary,
                hours_spent
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                id.to_string(),
                user_id,
                payload.completion_status.as_str(),
                payload.work_summary.as_str(),
                payload.hours_spent,
            ],
        )?;
        let submission_id = tx.last_insert_rowid();
        let submission = tx.query_row(
            &format!("{SUBMISSION_SELECT_SQL} WHERE id = ?1;"),
            [submission_id],
            RawSubmission::from_row,
        )?;
        tx.commit()?;
        submission.into_submission()
    }

    fn record_review(
        &self,
        id: TaskId,
        to: TaskStatus,
        rejection_reason: Option<&str>,
    ) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        compare_and_set_status(&tx, id, TaskStatus::Submitted, to)?;
        if let Some(reason) = rejection_reason {
            tx.execute(
                "UPDATE task_submissions
                 SET rejection_reason = ?2
                 WHERE id = (
                    SELECT MAX(id) FROM task_submissions WHERE task_id = ?1
                 );",
                params![id.to_string(), reason],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn list_submissions(&self, id: TaskId) -> RepoResult<Vec<TaskSubmission>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SUBMISSION_SELECT_SQL} WHERE task_id = ?1 ORDER BY id DESC;"
        ))?;
        let mut rows = stmt.query([id.to_string()])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(RawSubmission::from_row(row)?.into_submission()?);
        }
        Ok(items)
    }

    fn list_for_assignee(&self, assignee: UserId) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL} WHERE assignee = ?1 ORDER BY created_at DESC, id ASC;"
        ))?;
        let mut rows = stmt.query([assignee])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_task_row(row)?);
        }
        Ok(items)
    }

    fn list_pending_review(&self, assigner: UserId) -> RepoResult<Vec<ReviewItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                t.id AS id,
                t.assignee AS assignee,
                t.assigner AS assigner,
                t.title AS title,
                t.description AS description,
                t.priority AS priority,
                t.deadline AS deadline,
                t.estimated_hours AS estimated_hours,
                t.status AS status,
                t.created_at AS created_at,
                s.id AS submission_id
             FROM tasks t
             INNER JOIN task_submissions s
                ON s.id = (SELECT MAX(id) FROM task_submissions WHERE task_id = t.id)
             WHERE t.assigner = ?1
               AND t.status = 'submitted'
             ORDER BY s.id DESC;",
        )?;
        let mut rows = stmt.query([assigner])?;
        let mut pending = Vec::new();
        while let Some(row) = rows.next()? {
            let task = parse_task_row(row)?;
            let submission_id: i64 = row.get("submission_id")?;
            pending.push((task, submission_id));
        }
        drop(rows);

        let mut items = Vec::with_capacity(pending.len());
        for (task, submission_id) in pending {
            let submission = self
                .conn
                .query_row(
                    &format!("{SUBMISSION_SELECT_SQL} WHERE id = ?1;"),
                    [submission_id],
                    RawSubmission::from_row,
                )?
                .into_submission()?;
            items.push(ReviewItem { task, submission });
        }
        Ok(items)
    }
}

fn compare_and_set_status(
    conn: &Connection,
    id: TaskId,
    from: TaskStatus,
    to: TaskStatus,
) -> RepoResult<()> {
    let changed = conn.execute(
        "UPDATE tasks
         SET status = ?3,
             updated_at = (strftime('%s', 'now') * 1000)
         WHERE id = ?1
           AND status = ?2;",
        params![id.to_string(), from.as_str(), to.as_str()],
    )?;
    if changed == 1 {
        return Ok(());
    }

    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM tasks WHERE id = ?1);",
        [id.to_string()],
        |row| row.get(0),
    )?;
    if exists == 1 {
        Err(RepoError::Conflict {
            entity: "task",
            key: id.to_string(),
        })
    } else {
        Err(RepoError::NotFound {
            entity: "task",
            key: id.to_string(),
        })
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let id_text: String = row.get("id")?;
    let priority_text: String = row.get("priority")?;
    let status_text: String = row.get("status")?;
    let deadline = match row.get::<_, Option<String>>("deadline")? {
        Some(value) => Some(parse_date("tasks.deadline", &value)?),
        None => None,
    };

    Ok(Task {
        id: parse_uuid("tasks.id", &id_text)?,
        assignee: row.get("assignee")?,
        assigner: row.get("assigner")?,
        title: row.get("title")?,
        description: row.get("description")?,
        priority: TaskPriority::parse(&priority_text).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid priority `{priority_text}` in tasks.priority"))
        })?,
        deadline,
        estimated_hours: row.get("estimated_hours")?,
        status: TaskStatus::parse(&status_text).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid status `{status_text}` in tasks.status"))
        })?,
        created_at: row.get("created_at")?,
    })
}

struct RawSubmission {
    id: i64,
    task_id: String,
    user_id: UserId,
    completion_status: String,
    work_summary: String,
    hours_spent: f64,
    rejection_reason: Option<String>,
    submitted_at: i64,
}

impl RawSubmission {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            task_id: row.get("task_id")?,
            user_id: row.get("user_id")?,
            completion_status: row.get("completion_status")?,
            work_summary: row.get("work_summary")?,
            hours_spent: row.get("hours_spent")?,
            rejection_reason: row.get("rejection_reason")?,
            submitted_at: row.get("submitted_at")?,
        })
    }

    fn into_submission(self) -> RepoResult<TaskSubmission> {
        let completion_status =
            CompletionStatus::parse(&self.completion_status).ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "invalid completion status `{}` in task_submissions.completion_status",
                    self.completion_status
                ))
            })?;
        Ok(TaskSubmission {
            id: self.id,
            task_id: parse_uuid("task_submissions.task_id", &self.task_id)?,
            user_id: self.user_id,
            completion_status,
            work_summary: self.work_summary,
            hours_spent: self.hours_spent,
            rejection_reason: self.rejection_reason,
            submitted_at: self.submitted_at,
        })
    }
}
