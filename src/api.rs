//! Location-based accessors.
//!
//! Each function opens the database at `location`, performs one operation
//! and closes the connection when it returns. Only [`init_schema`] may create
//! the file; everything else requires an initialized, current database.

use crate::core::{todo, user, Scope, Todo, TodoUpdate, User};
use crate::db::{Connection, Schema};
use crate::error::Result;
use std::path::Path;

/// Create the database at `location` if needed and bring its schema up to
/// date. Repeated calls are no-ops.
pub fn init_schema(location: impl AsRef<Path>) -> Result<()> {
    let location = location.as_ref();
    let mut conn = Connection::create(location)?;
    let applied = Schema::init(&mut conn)?;
    tracing::debug!(path = %location.display(), applied, "Schema initialized");
    Ok(())
}

/// Create an unowned todo. Returns its id.
pub fn create_todo(location: impl AsRef<Path>, title: &str, description: &str) -> Result<i64> {
    let mut conn = Connection::open(location)?;
    todo::create(&mut conn, None, title, description)
}

/// Get any todo by id.
pub fn get_todo(location: impl AsRef<Path>, id: i64) -> Result<Option<Todo>> {
    let conn = Connection::open(location)?;
    todo::get(&conn, Scope::All, id)
}

/// Update any todo by id. Returns `false` if it does not exist.
pub fn update_todo(location: impl AsRef<Path>, id: i64, changes: &TodoUpdate) -> Result<bool> {
    let mut conn = Connection::open(location)?;
    todo::update(&mut conn, Scope::All, id, changes)
}

/// Delete any todo by id. Returns `false` if it does not exist.
pub fn delete_todo(location: impl AsRef<Path>, id: i64) -> Result<bool> {
    let mut conn = Connection::open(location)?;
    todo::delete(&mut conn, Scope::All, id)
}

/// List all todos, optionally only completed or only pending ones.
pub fn list_todos(location: impl AsRef<Path>, completed: Option<bool>) -> Result<Vec<Todo>> {
    let conn = Connection::open(location)?;
    todo::list(&conn, Scope::All, completed)
}

/// Create a user. Returns its id.
pub fn create_user(location: impl AsRef<Path>, username: &str, email: &str) -> Result<i64> {
    let mut conn = Connection::open(location)?;
    user::create(&mut conn, username, email)
}

pub fn get_user(location: impl AsRef<Path>, id: i64) -> Result<Option<User>> {
    let conn = Connection::open(location)?;
    user::get(&conn, id)
}

pub fn get_user_by_username(location: impl AsRef<Path>, username: &str) -> Result<Option<User>> {
    let conn = Connection::open(location)?;
    user::get_by_username(&conn, username)
}

/// Delete a user that owns no todos. Returns `false` if it does not exist.
pub fn delete_user(location: impl AsRef<Path>, id: i64) -> Result<bool> {
    let mut conn = Connection::open(location)?;
    user::delete(&mut conn, id)
}

/// Create a todo owned by `owner_id`. Returns its id.
pub fn create_user_todo(
    location: impl AsRef<Path>,
    owner_id: i64,
    title: &str,
    description: &str,
) -> Result<i64> {
    let mut conn = Connection::open(location)?;
    todo::create(&mut conn, Some(owner_id), title, description)
}

/// Get a todo only if `owner_id` owns it.
pub fn get_user_todo(location: impl AsRef<Path>, owner_id: i64, todo_id: i64) -> Result<Option<Todo>> {
    let conn = Connection::open(location)?;
    todo::get(&conn, Scope::Owner(owner_id), todo_id)
}

/// Update a todo only if `owner_id` owns it.
pub fn update_user_todo(
    location: impl AsRef<Path>,
    owner_id: i64,
    todo_id: i64,
    changes: &TodoUpdate,
) -> Result<bool> {
    let mut conn = Connection::open(location)?;
    todo::update(&mut conn, Scope::Owner(owner_id), todo_id, changes)
}

/// Delete a todo only if `owner_id` owns it.
pub fn delete_user_todo(location: impl AsRef<Path>, owner_id: i64, todo_id: i64) -> Result<bool> {
    let mut conn = Connection::open(location)?;
    todo::delete(&mut conn, Scope::Owner(owner_id), todo_id)
}

/// List the todos `owner_id` owns.
pub fn list_user_todos(
    location: impl AsRef<Path>,
    owner_id: i64,
    completed: Option<bool>,
) -> Result<Vec<Todo>> {
    let conn = Connection::open(location)?;
    todo::list(&conn, Scope::Owner(owner_id), completed)
}
