use std::fmt;

use log::error;
use rusqlite::{ffi, Error as SqlError, ErrorCode};
use thiserror::Error;

use crate::models::ValidationError;

pub type StoreResult<T> = Result<T, StoreError>;

/// Everything that can go wrong between the catalog and SQLite. Reads return
/// `Ok(None)` / `Ok(vec![])` for "nothing matched", so an `Err` always means
/// the store itself refused or failed.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database file could not be opened or bootstrapped.
    #[error("failed to open catalog database at {location}")]
    Open {
        location: String,
        #[source]
        source: SqlError,
    },
    #[error("failed to create data directory {path}")]
    DataDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("ISBN {0} is already used by another book.")]
    DuplicateIsbn(String),
    /// Foreign key rejected a book write.
    #[error("No author exists with ID {0}.")]
    UnknownAuthor(i64),
    /// Foreign key rejected an author delete.
    #[error("Author {0} is still referenced by at least one book.")]
    AuthorInUse(i64),
    #[error("Record already has ID {0}; use update instead of save.")]
    AlreadySaved(i64),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Sqlite(#[from] SqlError),
}

/// Constraint families the catalog maps to dedicated errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Constraint {
    Unique,
    ForeignKey,
}

/// Read SQLite's extended result code to tell unique violations apart from
/// foreign key violations. Other failures return `None`.
pub(crate) fn constraint_violation(err: &SqlError) -> Option<Constraint> {
    match err {
        SqlError::SqliteFailure(inner, _) if inner.code == ErrorCode::ConstraintViolation => {
            match inner.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    Some(Constraint::Unique)
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Some(Constraint::ForeignKey),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Build a `map_err` adapter that logs the failure with the repository,
/// operation and key before handing the error to the caller.
pub(crate) fn log_failure<E, K>(
    module: &'static str,
    op: &'static str,
    key: K,
) -> impl FnOnce(E) -> StoreError
where
    E: Into<StoreError>,
    K: fmt::Display,
{
    move |err| {
        let err = err.into();
        error!("event=store_call module={module} op={op} key={key} status=error error={err}");
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn classifies_unique_and_foreign_key_failures() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             CREATE TABLE parent (id INTEGER PRIMARY KEY);
             CREATE TABLE child (
                 code TEXT UNIQUE,
                 parent_id INTEGER REFERENCES parent(id)
             );
             INSERT INTO parent (id) VALUES (1);
             INSERT INTO child (code, parent_id) VALUES ('a', 1);",
        )
        .unwrap();

        let duplicate = conn
            .execute("INSERT INTO child (code, parent_id) VALUES ('a', 1)", [])
            .unwrap_err();
        assert_eq!(constraint_violation(&duplicate), Some(Constraint::Unique));

        let orphan = conn
            .execute("INSERT INTO child (code, parent_id) VALUES ('b', 42)", [])
            .unwrap_err();
        assert_eq!(constraint_violation(&orphan), Some(Constraint::ForeignKey));

        let syntax = conn.execute("INSERT INTO nowhere VALUES (1)", []).unwrap_err();
        assert_eq!(constraint_violation(&syntax), None);
    }

    #[test]
    fn log_failure_passes_the_error_through() {
        let err = log_failure::<_, i64>("test_repo", "probe", 7)(StoreError::UnknownAuthor(7));
        assert!(matches!(err, StoreError::UnknownAuthor(7)));
    }
}
