//! Database schema, migrations and row types.
//!
//! The schema version lives in `PRAGMA user_version`. Each migration is
//! additive, and all pending migrations run in a single transaction so a
//! failure leaves the file untouched.

use crate::db::connection::{column_exists, Connection as DbConnection};
use crate::error::{Error, Result};
use rusqlite::{Row, Transaction};

/// Columns selected whenever a full todo record is read.
pub const TODO_COLUMNS: &str =
    "id, title, description, completed, created_at, updated_at, user_id";

/// Columns selected whenever a full user record is read.
pub const USER_COLUMNS: &str = "id, username, email, created_at";

/// One step of schema evolution.
struct Migration {
    version: i32,
    name: &'static str,
    apply: fn(&Transaction<'_>) -> Result<()>,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create todos",
        apply: create_todos,
    },
    Migration {
        version: 2,
        name: "add users and todo ownership",
        apply: add_users,
    },
];

fn create_todos(tx: &Transaction<'_>) -> Result<()> {
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS todos (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL CHECK (length(trim(title)) > 0),
            description TEXT NOT NULL DEFAULT '',
            completed INTEGER NOT NULL DEFAULT 0 CHECK (completed IN (0, 1)),
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
            updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        );
        CREATE INDEX IF NOT EXISTS idx_todos_completed ON todos(completed);",
    )?;
    Ok(())
}

fn add_users(tx: &Transaction<'_>) -> Result<()> {
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        );",
    )?;

    // ALTER TABLE has no IF NOT EXISTS form.
    if !column_exists(tx, "todos", "user_id")? {
        tx.execute_batch("ALTER TABLE todos ADD COLUMN user_id INTEGER REFERENCES users(id);")?;
    }

    tx.execute_batch("CREATE INDEX IF NOT EXISTS idx_todos_user_id ON todos(user_id);")?;
    Ok(())
}

/// Schema version and management.
pub struct Schema;

impl Schema {
    /// Current schema version.
    pub const VERSION: i32 = 2;

    /// Bring the database up to [`Schema::VERSION`].
    ///
    /// Safe to call repeatedly: a database already at the current version is
    /// left alone. Returns the number of migrations applied.
    pub fn init(conn: &mut DbConnection) -> Result<usize> {
        let current = conn.schema_version()?;

        tracing::info!(
            current_version = current,
            target_version = Self::VERSION,
            "Checking database migrations"
        );

        if current > Self::VERSION {
            tracing::warn!(
                found = current,
                supported = Self::VERSION,
                "Refusing to migrate a newer schema"
            );
            return Err(Error::UnsupportedSchema {
                found: current,
                supported: Self::VERSION,
            });
        }

        let tx = conn.transaction()?;
        let mut applied = 0;
        for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
            tracing::info!(
                version = migration.version,
                name = migration.name,
                "Running migration"
            );
            (migration.apply)(&tx)?;
            applied += 1;
        }

        if applied > 0 {
            tx.pragma_update(None, "user_version", Self::VERSION)?;
            tx.commit()?;
            tracing::info!(
                from = current,
                to = Self::VERSION,
                "Migrations complete"
            );
        } else {
            drop(tx);
        }

        // Only after a successful migration; journal_mode cannot change
        // inside a transaction.
        let _journal: String = conn.as_conn().pragma_update_and_check(
            None,
            "journal_mode",
            "WAL",
            |row| row.get(0),
        )?;

        Ok(applied)
    }
}

/// Row representation of a todo from the database.
#[derive(Debug, Clone)]
pub struct TodoRow {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub created_at: String,
    pub updated_at: String,
    pub user_id: Option<i64>,
}

impl TodoRow {
    /// Create a TodoRow from a SQLite row selected with [`TODO_COLUMNS`].
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            completed: row.get("completed")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            user_id: row.get("user_id")?,
        })
    }
}

/// Row representation of a user from the database.
#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: String,
}

impl UserRow {
    /// Create a UserRow from a SQLite row selected with [`USER_COLUMNS`].
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            username: row.get("username")?,
            email: row.get("email")?,
            created_at: row.get("created_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_temp_db() -> DbConnection {
        DbConnection::open_in_memory().unwrap()
    }

    /// Lay down the pre-ownership schema the way version 1 left it.
    fn create_v1_db() -> DbConnection {
        let mut conn = create_temp_db();
        {
            let tx = conn.transaction().unwrap();
            create_todos(&tx).unwrap();
            tx.pragma_update(None, "user_version", 1).unwrap();
            tx.commit().unwrap();
        }
        conn
    }

    #[test]
    fn test_schema_init_creates_tables() {
        let mut conn = create_temp_db();
        assert_eq!(Schema::init(&mut conn).unwrap(), 2);

        assert!(conn.table_exists("todos").unwrap());
        assert!(conn.table_exists("users").unwrap());
        assert!(conn.column_exists("todos", "user_id").unwrap());
        assert_eq!(conn.schema_version().unwrap(), Schema::VERSION);
    }

    #[test]
    fn test_schema_init_is_idempotent() {
        let mut conn = create_temp_db();
        Schema::init(&mut conn).unwrap();
        assert_eq!(Schema::init(&mut conn).unwrap(), 0);

        let tables: i64 = conn
            .as_conn()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('todos', 'users')",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(tables, 2);
    }

    #[test]
    fn test_upgrade_from_v1_keeps_rows() {
        let mut conn = create_v1_db();
        conn.as_conn()
            .execute(
                "INSERT INTO todos (title, description) VALUES ('Legacy', 'old row')",
                [],
            )
            .unwrap();
        assert!(!conn.column_exists("todos", "user_id").unwrap());

        assert_eq!(Schema::init(&mut conn).unwrap(), 1);

        let row = conn
            .as_conn()
            .query_row(
                &format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = 1"),
                [],
                TodoRow::from_row,
            )
            .unwrap();
        assert_eq!(row.title, "Legacy");
        assert_eq!(row.description.as_deref(), Some("old row"));
        assert_eq!(row.user_id, None);
        assert_eq!(conn.schema_version().unwrap(), Schema::VERSION);
    }

    #[test]
    fn test_upgrade_skips_existing_owner_column() {
        let mut conn = create_temp_db();
        conn.as_conn()
            .execute_batch(
                "CREATE TABLE users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    username TEXT NOT NULL UNIQUE,
                    email TEXT NOT NULL UNIQUE,
                    created_at TEXT NOT NULL
                 );
                 CREATE TABLE todos (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    title TEXT NOT NULL,
                    description TEXT NOT NULL DEFAULT '',
                    completed INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    user_id INTEGER REFERENCES users(id)
                 );",
            )
            .unwrap();

        Schema::init(&mut conn).unwrap();
        assert_eq!(conn.schema_version().unwrap(), Schema::VERSION);
    }

    #[test]
    fn test_newer_schema_is_rejected_untouched() {
        let mut conn = create_temp_db();
        conn.as_conn()
            .pragma_update(None, "user_version", Schema::VERSION + 1)
            .unwrap();

        let err = Schema::init(&mut conn).unwrap_err();
        assert!(matches!(err, Error::UnsupportedSchema { found: 3, .. }));
        assert!(!conn.table_exists("todos").unwrap());
    }

    #[test]
    fn test_failed_migration_leaves_file_untouched() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.db");

        // Claims version 1 but has no todos table, so migration 2 fails.
        let mut conn = DbConnection::create(&path).unwrap();
        conn.as_conn()
            .pragma_update(None, "user_version", 1)
            .unwrap();

        let err = Schema::init(&mut conn).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Storage);

        assert_eq!(conn.schema_version().unwrap(), 1);
        assert!(!conn.table_exists("users").unwrap());
        let journal: String = conn
            .as_conn()
            .query_row("PRAGMA journal_mode", [], |r| r.get(0))
            .unwrap();
        assert_ne!(journal.to_lowercase(), "wal");
    }

    #[test]
    fn test_successful_init_switches_to_wal() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("todo.db");

        let mut conn = DbConnection::create(&path).unwrap();
        Schema::init(&mut conn).unwrap();

        let journal: String = conn
            .as_conn()
            .query_row("PRAGMA journal_mode", [], |r| r.get(0))
            .unwrap();
        assert_eq!(journal.to_lowercase(), "wal");
    }

    #[test]
    fn test_title_check_constraint() {
        let mut conn = create_temp_db();
        Schema::init(&mut conn).unwrap();

        let result = conn
            .as_conn()
            .execute("INSERT INTO todos (title) VALUES ('   ')", []);
        assert!(result.is_err());
    }

    #[test]
    fn test_username_unique_constraint() {
        let mut conn = create_temp_db();
        Schema::init(&mut conn).unwrap();

        conn.as_conn()
            .execute(
                "INSERT INTO users (username, email) VALUES ('alice', 'a@x.com')",
                [],
            )
            .unwrap();
        let err = conn
            .as_conn()
            .execute(
                "INSERT INTO users (username, email) VALUES ('alice', 'b@y.com')",
                [],
            )
            .unwrap_err();
        assert!(crate::error::is_unique_violation(&err));
    }

    #[test]
    fn test_user_row_from_row() {
        let mut conn = create_temp_db();
        Schema::init(&mut conn).unwrap();

        conn.as_conn()
            .execute(
                "INSERT INTO users (username, email) VALUES ('bob', 'bob@example.com')",
                [],
            )
            .unwrap();

        let row = conn
            .as_conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = 1"),
                [],
                UserRow::from_row,
            )
            .unwrap();
        assert_eq!(row.id, 1);
        assert_eq!(row.username, "bob");
        assert_eq!(row.email, "bob@example.com");
        assert!(!row.created_at.is_empty());
    }
}
