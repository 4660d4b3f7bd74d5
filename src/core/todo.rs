//! Todo model and operations.
//!
//! The unscoped and user-scoped surfaces share one implementation: every
//! query takes a [`Scope`], and `Scope::Owner` adds an ownership predicate so
//! a foreign todo is indistinguishable from a missing one.

use crate::core::{now_timestamp, parse_timestamp, require_text};
use crate::db::schema::{TodoRow, TODO_COLUMNS};
use crate::db::Connection;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

/// Which todos an operation may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every todo, regardless of owner.
    All,
    /// Only todos owned by this user id.
    Owner(i64),
}

impl Scope {
    /// Owner id bound into the `(?N IS NULL OR user_id = ?N)` predicate.
    fn owner(self) -> Option<i64> {
        match self {
            Scope::All => None,
            Scope::Owner(id) => Some(id),
        }
    }
}

/// A todo item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: Option<i64>,
}

impl Todo {
    /// Convert a TodoRow to a Todo.
    pub fn from_row(row: TodoRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            title: row.title,
            description: row.description.unwrap_or_default(),
            completed: row.completed,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
            user_id: row.user_id,
        })
    }

    /// Get the status character for display.
    pub fn status_char(&self) -> char {
        if self.completed {
            '✓'
        } else {
            '○'
        }
    }
}

/// Partial update of a todo. Fields left as `None` are not touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

impl TodoUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    /// True if no field would change.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.completed.is_none()
    }
}

/// Create a todo, owned by `owner` when given. Returns the new id.
pub fn create(
    conn: &mut Connection,
    owner: Option<i64>,
    title: &str,
    description: &str,
) -> Result<i64> {
    require_text("title", title)?;

    let tx = conn.transaction()?;
    if let Some(user_id) = owner {
        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
            [user_id],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(Error::Validation(format!("user #{user_id} does not exist")));
        }
    }

    let now = now_timestamp();
    tx.execute(
        "INSERT INTO todos (title, description, completed, created_at, updated_at, user_id)
         VALUES (?1, ?2, 0, ?3, ?3, ?4)",
        params![title, description, now, owner],
    )?;
    let id = tx.last_insert_rowid();
    tx.commit()?;

    tracing::debug!(todo_id = id, owner_id = ?owner, "Created todo");
    Ok(id)
}

/// Get a todo visible in `scope`.
pub fn get(conn: &Connection, scope: Scope, id: i64) -> Result<Option<Todo>> {
    let row = conn
        .as_conn()
        .query_row(
            &format!(
                "SELECT {TODO_COLUMNS} FROM todos
                 WHERE id = ?1 AND (?2 IS NULL OR user_id = ?2)"
            ),
            params![id, scope.owner()],
            TodoRow::from_row,
        )
        .optional()?;

    row.map(Todo::from_row).transpose()
}

/// Apply `changes` to a todo visible in `scope`.
///
/// Returns `false` when no such todo exists. An empty update writes nothing
/// and reports whether the todo exists.
pub fn update(conn: &mut Connection, scope: Scope, id: i64, changes: &TodoUpdate) -> Result<bool> {
    if let Some(title) = &changes.title {
        require_text("title", title)?;
    }

    if changes.is_empty() {
        return exists(conn, scope, id);
    }

    let tx = conn.transaction()?;
    let affected = tx.execute(
        "UPDATE todos
         SET title = COALESCE(?1, title),
             description = COALESCE(?2, description),
             completed = COALESCE(?3, completed),
             updated_at = ?4
         WHERE id = ?5 AND (?6 IS NULL OR user_id = ?6)",
        params![
            changes.title,
            changes.description,
            changes.completed,
            now_timestamp(),
            id,
            scope.owner(),
        ],
    )?;
    tx.commit()?;

    tracing::debug!(todo_id = id, owner_id = ?scope.owner(), affected, "Updated todo");
    Ok(affected > 0)
}

/// Delete a todo visible in `scope`. Returns `false` when none matched.
pub fn delete(conn: &mut Connection, scope: Scope, id: i64) -> Result<bool> {
    let tx = conn.transaction()?;
    let affected = tx.execute(
        "DELETE FROM todos WHERE id = ?1 AND (?2 IS NULL OR user_id = ?2)",
        params![id, scope.owner()],
    )?;
    tx.commit()?;

    tracing::debug!(todo_id = id, owner_id = ?scope.owner(), affected, "Deleted todo");
    Ok(affected > 0)
}

/// List todos visible in `scope` in insertion order, optionally filtered by
/// completion state.
pub fn list(conn: &Connection, scope: Scope, completed: Option<bool>) -> Result<Vec<Todo>> {
    let mut stmt = conn.as_conn().prepare(&format!(
        "SELECT {TODO_COLUMNS} FROM todos
         WHERE (?1 IS NULL OR user_id = ?1) AND (?2 IS NULL OR completed = ?2)
         ORDER BY id"
    ))?;
    let rows = stmt
        .query_map(params![scope.owner(), completed], TodoRow::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter().map(Todo::from_row).collect()
}

fn exists(conn: &Connection, scope: Scope, id: i64) -> Result<bool> {
    let exists = conn.as_conn().query_row(
        "SELECT EXISTS(SELECT 1 FROM todos WHERE id = ?1 AND (?2 IS NULL OR user_id = ?2))",
        params![id, scope.owner()],
        |row| row.get(0),
    )?;
    Ok(exists)
}
