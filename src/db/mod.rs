//! Database layer for the todo store.
//!
//! Handles SQLite connections, schema creation and migration, and row types.

mod connection;
pub mod schema;

pub use connection::{Connection, DbPath};
pub use schema::{Schema, TodoRow, UserRow};
