//! # todo - SQLite-backed todo store
//!
//! CRUD accessors for todo items stored in SQLite, with user accounts and
//! per-user ownership. Every accessor takes the database location and opens
//! its own connection; a user-scoped call treats another user's todo exactly
//! like a missing one.

pub mod api;
pub mod cli;
pub mod core;
pub mod db;
pub mod error;

// Re-export commonly used types
pub use api::{
    create_todo, create_user, create_user_todo, delete_todo, delete_user, delete_user_todo,
    get_todo, get_user, get_user_by_username, get_user_todo, init_schema, list_todos,
    list_user_todos, update_todo, update_user_todo,
};
pub use crate::core::{Scope, Todo, TodoUpdate, User};
pub use error::{Error, ErrorKind, Result};

pub use db::{Connection, DbPath};
