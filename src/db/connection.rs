//! Database connection management.

use crate::db::schema::Schema;
use crate::error::{Error, Result};
use rusqlite::{Connection as SqliteConnection, OpenFlags, Transaction};
use std::path::{Path, PathBuf};

/// Environment variable that overrides the default database location.
const DB_ENV_VAR: &str = "TODO_DB";

/// Default database filename, relative to the working directory.
const DEFAULT_DB_FILE: &str = "todo.db";

/// Path to a todo database file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbPath {
    path: PathBuf,
}

impl DbPath {
    /// Create a new DbPath with the default filename "todo.db".
    pub fn default_path() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DB_FILE),
        }
    }

    /// Create a DbPath from a string path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Resolve the location: explicit path, then `$TODO_DB`, then "todo.db".
    pub fn resolve(explicit: Option<&Path>) -> Self {
        if let Some(path) = explicit {
            return Self::new(path);
        }
        match std::env::var_os(DB_ENV_VAR) {
            Some(value) if !value.is_empty() => Self::new(value),
            _ => Self::default_path(),
        }
    }

    /// Get the path as a reference.
    pub fn as_path(&self) -> &Path {
        &self.path
    }
}

impl Default for DbPath {
    fn default() -> Self {
        Self::default_path()
    }
}

impl AsRef<Path> for DbPath {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

/// Database connection wrapper.
///
/// Dropping it closes the underlying SQLite handle.
pub struct Connection {
    conn: SqliteConnection,
}

impl Connection {
    /// Open the database at `path`, creating the file if needed.
    ///
    /// Only schema initialization goes through here; the schema is not
    /// checked.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = SqliteConnection::open(path)?;
        Self::configure(conn)
    }

    /// Open an existing, initialized database at `path`.
    ///
    /// Never creates the file. Fails with [`Error::NotInitialized`] if the
    /// schema is missing or older than [`Schema::VERSION`].
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Self::configure(SqliteConnection::open_with_flags(path, flags)?)?;

        let version = conn.schema_version()?;
        if version > Schema::VERSION {
            tracing::warn!(
                path = %path.display(),
                found = version,
                supported = Schema::VERSION,
                "Database schema is newer than supported"
            );
            return Err(Error::UnsupportedSchema {
                found: version,
                supported: Schema::VERSION,
            });
        }
        if version < Schema::VERSION {
            return Err(Error::NotInitialized(path.to_path_buf()));
        }
        Ok(conn)
    }

    /// Open an in-memory database for testing.
    pub fn open_in_memory() -> Result<Self> {
        Self::configure(SqliteConnection::open_in_memory()?)
    }

    fn configure(conn: SqliteConnection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self { conn })
    }

    /// Begin a new transaction. It rolls back on drop unless committed.
    pub fn transaction(&mut self) -> Result<Transaction<'_>> {
        self.conn.transaction().map_err(Error::from)
    }

    /// Get a reference to the underlying SqliteConnection.
    pub fn as_conn(&self) -> &SqliteConnection {
        &self.conn
    }

    /// Current `PRAGMA user_version`.
    pub fn schema_version(&self) -> Result<i32> {
        let version = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;
        Ok(version)
    }

    /// Check if a table exists.
    #[cfg(test)]
    pub(crate) fn table_exists(&self, table_name: &str) -> Result<bool> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
            [table_name],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Check if `table` has a column called `column`.
    #[cfg(test)]
    pub(crate) fn column_exists(&self, table: &str, column: &str) -> Result<bool> {
        column_exists(&self.conn, table, column)
    }
}

/// Column lookup shared with migrations, which run on a transaction.
pub(crate) fn column_exists(conn: &SqliteConnection, table: &str, column: &str) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM pragma_table_info(?1) WHERE name = ?2)",
        [table, column],
        |row| row.get(0),
    )?;
    Ok(exists)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::TempDir;

    #[test]
    fn test_db_path_default() {
        let path = DbPath::default_path();
        assert_eq!(path.as_path(), Path::new("todo.db"));
    }

    #[test]
    fn test_db_path_explicit_wins() {
        let path = DbPath::resolve(Some(Path::new("custom.db")));
        assert_eq!(path.as_path(), Path::new("custom.db"));
    }

    #[test]
    fn test_open_in_memory_enables_foreign_keys() {
        let conn = Connection::open_in_memory().unwrap();
        let fk: i64 = conn
            .as_conn()
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }

    #[test]
    fn test_open_missing_file_does_not_create_it() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.db");

        let err = Connection::open(&path).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(!path.exists());
    }

    #[test]
    fn test_open_uninitialized_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        let err = Connection::open(temp.path()).err().unwrap();
        assert!(matches!(err, Error::NotInitialized(_)));
    }

    #[test]
    fn test_open_after_init() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("todo.db");

        let mut conn = Connection::create(&path).unwrap();
        Schema::init(&mut conn).unwrap();
        drop(conn);

        let conn = Connection::open(&path).unwrap();
        assert_eq!(conn.schema_version().unwrap(), Schema::VERSION);
        assert!(conn.table_exists("todos").unwrap());
        assert!(conn.table_exists("users").unwrap());
        assert!(conn.column_exists("todos", "user_id").unwrap());
    }

    #[test]
    fn test_open_rejects_newer_schema() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("future.db");

        let conn = Connection::create(&path).unwrap();
        conn.as_conn()
            .pragma_update(None, "user_version", Schema::VERSION + 1)
            .unwrap();
        drop(conn);

        let err = Connection::open(&path).err().unwrap();
        assert!(matches!(err, Error::UnsupportedSchema { .. }));
    }

    #[test]
    fn test_transaction_rollback() {
        let mut conn = Connection::open_in_memory().unwrap();
        Schema::init(&mut conn).unwrap();

        {
            let tx = conn.transaction().unwrap();
            tx.execute(
                "INSERT INTO todos (title, created_at, updated_at) VALUES ('x', 'now', 'now')",
                [],
            )
            .unwrap();
            drop(tx);
        }

        let count: i64 = conn
            .as_conn()
            .query_row("SELECT COUNT(*) FROM todos", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
