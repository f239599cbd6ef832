use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::{error, info};
use rusqlite::Connection;

use super::error::{StoreError, StoreResult};
use super::schema::ensure_schema;

/// How long a statement waits on a locked database file before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the catalog lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    File(PathBuf),
    /// Private in-memory database, discarded on release. Used by tests.
    Memory,
}

impl fmt::Display for DbLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbLocation::File(path) => write!(f, "{}", path.display()),
            DbLocation::Memory => write!(f, ":memory:"),
        }
    }
}

/// Owner of the single catalog connection.
///
/// The connection is opened lazily by the first [`Database::acquire`] call,
/// which also enables foreign keys and bootstraps the schema. Later calls
/// hand back the same handle. [`Database::release`] closes it so the next
/// `acquire` starts from a fresh connection.
///
/// `acquire` takes `&mut self`, so at most one caller holds the handle at a
/// time. Sharing it across threads would need a pool or a mutex.
pub struct Database {
    location: DbLocation,
    conn: Option<Connection>,
}

impl Database {
    /// Prepare a file-backed catalog. Nothing touches the disk until
    /// `acquire`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            location: DbLocation::File(path.into()),
            conn: None,
        }
    }

    pub fn in_memory() -> Self {
        Self {
            location: DbLocation::Memory,
            conn: None,
        }
    }

    pub fn location(&self) -> &DbLocation {
        &self.location
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Return the live connection, opening and bootstrapping it on first use.
    pub fn acquire(&mut self) -> StoreResult<&Connection> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => self.connect()?,
        };
        Ok(&*self.conn.insert(conn))
    }

    /// Close the connection and forget it. Close failures are logged and
    /// otherwise ignored.
    pub fn release(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };

        match conn.close() {
            Ok(()) => info!(
                "event=db_close module=db status=ok location={}",
                self.location
            ),
            Err((_conn, err)) => error!(
                "event=db_close module=db status=error location={} error={}",
                self.location, err
            ),
        }
    }

    fn connect(&self) -> StoreResult<Connection> {
        let started_at = Instant::now();
        info!(
            "event=db_open module=db status=start location={}",
            self.location
        );

        if let DbLocation::File(path) = &self.location {
            create_parent_dir(path)?;
        }

        let opened = match &self.location {
            DbLocation::File(path) => Connection::open(path),
            DbLocation::Memory => Connection::open_in_memory(),
        };

        match opened.and_then(|conn| bootstrap_connection(&conn).map(|()| conn)) {
            Ok(conn) => {
                info!(
                    "event=db_open module=db status=ok location={} duration_ms={}",
                    self.location,
                    started_at.elapsed().as_millis()
                );
                Ok(conn)
            }
            Err(source) => {
                error!(
                    "event=db_open module=db status=error location={} duration_ms={} error={}",
                    self.location,
                    started_at.elapsed().as_millis(),
                    source
                );
                Err(StoreError::Open {
                    location: self.location.to_string(),
                    source,
                })
            }
        }
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        self.release();
    }
}

fn create_parent_dir(path: &Path) -> StoreResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|source| StoreError::DataDir {
                path: parent.display().to_string(),
                source,
            })
        }
        _ => Ok(()),
    }
}

fn bootstrap_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    ensure_schema(conn)
}
