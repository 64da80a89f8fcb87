//! User registration and lookup

use rusqlite::{params, OptionalExtension};
use tracing::info;

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::User;

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let created_at_str: String = row.get(3)?;
    Ok(User {
        id: row.get(0)?,
        login: row.get(1)?,
        password_hash: row.get(2)?,
        created_at: parse_datetime(&created_at_str),
    })
}

impl Database {
    /// Register a user with an already-hashed password
    pub fn create_user(&self, login: &str, password_hash: &str) -> Result<User> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO users (login, password_hash) VALUES (?, ?)",
            params![login, password_hash],
        )
        .map_err(|e| Error::on_conflict(e, "User", login))?;

        let id = conn.last_insert_rowid();
        info!(user_id = id, login, "Registered user");

        conn.query_row(
            "SELECT id, login, password_hash, created_at FROM users WHERE id = ?",
            params![id],
            row_to_user,
        )
        .map_err(Error::from)
    }

    /// Get a user by ID
    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT id, login, password_hash, created_at FROM users WHERE id = ?",
                params![id],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Get a user by login
    pub fn get_user_by_login(&self, login: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT id, login, password_hash, created_at FROM users WHERE login = ?",
                params![login],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// List all users
    pub fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT id, login, password_hash, created_at FROM users ORDER BY login")?;

        let users = stmt
            .query_map([], row_to_user)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(users)
    }
}
