//! User directory repository.
//!
//! # Responsibility
//! - Resolve managers, admins and direct reports for fan-out and team views.
//!
//! # Invariants
//! - The core never edits directory rows after creation; `insert_user` exists
//!   for the directory collaborator and for seeding.

use super::schema::{ensure_connection_ready, TableSpec};
use super::{map_unique_violation, RepoError, RepoResult};
use crate::model::user::{Role, UserId, UserRecord};
use rusqlite::{params, Connection, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT id, name, role, manager_id FROM users";

const REQUIRED_TABLES: &[TableSpec] = &[("users", &["id", "name", "role", "manager_id"])];

/// Read access to users, roles and reporting lines.
pub trait DirectoryRepository {
    fn insert_user(&self, user: &UserRecord) -> RepoResult<()>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<UserRecord>>;
    /// All users with `Role::Admin`, by id.
    fn list_admins(&self) -> RepoResult<Vec<UserRecord>>;
    /// All users holding `role`, by id.
    fn list_by_role(&self, role: Role) -> RepoResult<Vec<UserRecord>>;
    /// Users whose `manager_id` is `manager_id`, by id.
    fn list_reports(&self, manager_id: UserId) -> RepoResult<Vec<UserRecord>>;
}

/// SQLite-backed directory.
pub struct SqliteDirectoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDirectoryRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }
}

impl DirectoryRepository for SqliteDirectoryRepository<'_> {
    fn insert_user(&self, user: &UserRecord) -> RepoResult<()> {
        self.conn
            .execute(
                "INSERT INTO users (id, name, role, manager_id) VALUES (?1, ?2, ?3, ?4);",
                params![user.id, user.name.as_str(), role_to_db(user.role), user.manager_id],
            )
            .map_err(|err| map_unique_violation(err, "user", || user.id.to_string()))?;
        Ok(())
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<UserRecord>> {
        let raw = self
            .conn
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE id = ?1;"),
                [id],
                RawUser::from_row,
            )
            .optional()?;
        raw.map(RawUser::into_record).transpose()
    }

    fn list_admins(&self) -> RepoResult<Vec<UserRecord>> {
        self.list_by_role(Role::Admin)
    }

    fn list_by_role(&self, role: Role) -> RepoResult<Vec<UserRecord>> {
        self.query_users(
            &format!("{USER_SELECT_SQL} WHERE role = ?1 ORDER BY id ASC;"),
            &[&role_to_db(role)],
        )
    }

    fn list_reports(&self, manager_id: UserId) -> RepoResult<Vec<UserRecord>> {
        self.query_users(
            &format!("{USER_SELECT_SQL} WHERE manager_id = ?1 ORDER BY id ASC;"),
            &[&manager_id],
        )
    }
}

impl SqliteDirectoryRepository<'_> {
    fn query_users(
        &self,
        sql: &str,
        bind: &[&dyn rusqlite::ToSql],
    ) -> RepoResult<Vec<UserRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(bind)?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(RawUser::from_row(row)?.into_record()?);
        }
        Ok(users)
    }
}

struct RawUser {
    id: UserId,
    name: String,
    role: String,
    manager_id: Option<UserId>,
}

impl RawUser {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            role: row.get("role")?,
            manager_id: row.get("manager_id")?,
        })
    }

    fn into_record(self) -> RepoResult<UserRecord> {
        let role = parse_role(&self.role).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid role `{}` in users.role", self.role))
        })?;
        Ok(UserRecord {
            id: self.id,
            name: self.name,
            role,
            manager_id: self.manager_id,
        })
    }
}

fn role_to_db(role: Role) -> &'static str {
    match role {
        Role::Admin => "admin",
        Role::Manager => "manager",
        Role::Employee => "employee",
    }
}

fn parse_role(value: &str) -> Option<Role> {
    match value {
        "admin" => Some(Role::Admin),
        "manager" => Some(Role::Manager),
        "employee" => Some(Role::Employee),
        _ => None,
    }
}
