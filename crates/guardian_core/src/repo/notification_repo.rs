//! Notification feed repository.
//!
//! # Invariants
//! - Rows are append-only; the only mutation is the bulk read flag.
//! - Feed order is `created_at DESC, id DESC`.

use super::codec::parse_bool;
use super::schema::{ensure_connection_ready, TableSpec};
use super::{RepoError, RepoResult};
use crate::model::notification::{Notification, NotificationKind, OutgoingNotification};
use crate::model::user::UserId;
use rusqlite::{params, Connection, Row};

const REQUIRED_TABLES: &[TableSpec] = &[(
    "notifications",
    &["id", "recipient_id", "message", "kind", "is_read", "created_at"],
)];

/// Persistence port for notifications.
pub trait NotificationRepository {
    /// Appends one row and returns its id.
    fn insert(&self, notification: &OutgoingNotification) -> RepoResult<i64>;
    /// Newest first, at most `limit` rows.
    fn list_for(&self, recipient_id: UserId, limit: u32) -> RepoResult<Vec<Notification>>;
    fn unread_count(&self, recipient_id: UserId) -> RepoResult<u32>;
    /// Marks every unread row of the recipient as read; returns rows changed.
    fn mark_all_read(&self, recipient_id: UserId) -> RepoResult<u32>;
}

/// SQLite-backed notification feed.
pub struct SqliteNotificationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNotificationRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }
}

impl NotificationRepository for SqliteNotificationRepository<'_> {
    fn insert(&self, notification: &OutgoingNotification) -> RepoResult<i64> {
        self.conn.execute(
            "INSERT INTO notifications (recipient_id, message, kind) VALUES (?1, ?2, ?3);",
            params![
                notification.recipient_id,
                notification.message.as_str(),
                notification.kind.as_str(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn list_for(&self, recipient_id: UserId, limit: u32) -> RepoResult<Vec<Notification>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, recipient_id, message, kind, is_read, created_at
             FROM notifications
             WHERE recipient_id = ?1
             ORDER BY created_at DESC, id DESC
             LIMIT ?2;",
        )?;
        let mut rows = stmt.query(params![recipient_id, i64::from(limit)])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_notification_row(row)?);
        }
        Ok(items)
    }

    fn unread_count(&self, recipient_id: UserId) -> RepoResult<u32> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = ?1 AND is_read = 0;",
            [recipient_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn mark_all_read(&self, recipient_id: UserId) -> RepoResult<u32> {
        let changed = self.conn.execute(
            "UPDATE notifications SET is_read = 1 WHERE recipient_id = ?1 AND is_read = 0;",
            [recipient_id],
        )?;
        u32::try_from(changed)
            .map_err(|_| RepoError::InvalidData(format!("row count {changed} exceeds u32")))
    }
}

fn parse_notification_row(row: &Row<'_>) -> RepoResult<Notification> {
    let kind_text: String = row.get("kind")?;
    let kind = NotificationKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid kind `{kind_text}` in notifications.kind"))
    })?;

    Ok(Notification {
        id: row.get("id")?,
        recipient_id: row.get("recipient_id")?,
        message: row.get("message")?,
        kind,
        created_at: row.get("created_at")?,
        is_read: parse_bool("notifications.is_read", row.get("is_read")?)?,
    })
}
