//! User model and operations.

use crate::core::{now_timestamp, parse_timestamp, require_text};
use crate::db::schema::{UserRow, USER_COLUMNS};
use crate::db::Connection;
use crate::error::{is_unique_violation, Error, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection as SqliteConnection, OptionalExtension};
use serde::{Deserialize, Serialize};

/// A user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Convert a UserRow to a User.
    pub fn from_row(row: UserRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            username: row.username,
            email: row.email,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

/// Create a user. Fails with [`Error::Conflict`] if the username or email is
/// already taken.
pub fn create(conn: &mut Connection, username: &str, email: &str) -> Result<i64> {
    require_text("username", username)?;
    require_text("email", email)?;

    let tx = conn.transaction()?;
    let (username_taken, email_taken): (bool, bool) = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1),
                EXISTS(SELECT 1 FROM users WHERE email = ?2)",
        params![username, email],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    if username_taken {
        return Err(Error::Conflict(format!(
            "username '{username}' is already taken"
        )));
    }
    if email_taken {
        return Err(Error::Conflict(format!("email '{email}' is already taken")));
    }

    let id = insert(&tx, username, email)?;
    tx.commit()?;

    tracing::debug!(user_id = id, username, "Created user");
    Ok(id)
}

/// Insert a user row. A UNIQUE violation from a concurrent writer that got
/// past the lookup in [`create`] surfaces as [`Error::Conflict`].
fn insert(conn: &SqliteConnection, username: &str, email: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO users (username, email, created_at) VALUES (?1, ?2, ?3)",
        params![username, email, now_timestamp()],
    )
    .map_err(|e| {
        if is_unique_violation(&e) {
            Error::Conflict(format!("user '{username}' or email '{email}' already exists"))
        } else {
            Error::from(e)
        }
    })?;
    Ok(conn.last_insert_rowid())
}

/// Get a user by id.
pub fn get(conn: &Connection, id: i64) -> Result<Option<User>> {
    let row = conn
        .as_conn()
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            [id],
            UserRow::from_row,
        )
        .optional()?;

    row.map(User::from_row).transpose()
}

/// Get a user by exact username.
pub fn get_by_username(conn: &Connection, username: &str) -> Result<Option<User>> {
    let row = conn
        .as_conn()
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
            [username],
            UserRow::from_row,
        )
        .optional()?;

    row.map(User::from_row).transpose()
}

/// Delete a user who owns no todos.
///
/// Returns `false` if the user does not exist. Fails with
/// [`Error::Conflict`] while any todo still references the user.
pub fn delete(conn: &mut Connection, id: i64) -> Result<bool> {
    let tx = conn.transaction()?;
    let owned: i64 = tx.query_row(
        "SELECT COUNT(*) FROM todos WHERE user_id = ?1",
        [id],
        |row| row.get(0),
    )?;
    if owned > 0 {
        return Err(Error::Conflict(format!(
            "user #{id} still owns {owned} todo(s)"
        )));
    }

    let affected = tx.execute("DELETE FROM users WHERE id = ?1", [id])?;
    tx.commit()?;

    tracing::debug!(user_id = id, affected, "Deleted user");
    Ok(affected > 0)
}
