//! User registry used by the identity-provider integration.
//!
//! Users are never renamed or deleted here; the only write is the
//! idempotent insert performed on first sign-in.

use crate::model::user::UserId;
use crate::repo::todo_repo::RepoResult;
use log::info;
use rusqlite::Connection;

/// Repository interface for user identity rows.
pub trait UserRepository {
    /// Inserts the user when missing. Repeated calls are no-ops.
    fn ensure_user(&self, user_id: &UserId) -> RepoResult<()>;
    /// Returns whether a user row exists.
    fn user_exists(&self, user_id: &UserId) -> RepoResult<bool>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn ensure_user(&self, user_id: &UserId) -> RepoResult<()> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO users (id) VALUES (?1);",
            [user_id.as_str()],
        )?;
        if inserted > 0 {
            info!("event=user_register module=repo status=ok");
        }
        Ok(())
    }

    fn user_exists(&self, user_id: &UserId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1);",
            [user_id.as_str()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}
