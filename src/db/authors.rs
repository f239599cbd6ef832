use log::info;
use rusqlite::{params, Connection, OptionalExtension, Params, Row};

use super::error::{constraint_violation, log_failure, Constraint, StoreError, StoreResult};
use crate::models::Author;

const MODULE: &str = "author_repo";

const AUTHOR_SELECT_SQL: &str = "SELECT id, name, nationality FROM authors";

/// Data access contract for authors. Single-item lookups return `Ok(None)`
/// when nothing matches; `Err` is reserved for store failures.
pub trait AuthorRepository {
    fn find_by_id(&self, id: i64) -> StoreResult<Option<Author>>;
    fn find_all(&self) -> StoreResult<Vec<Author>>;
    /// Exact match, not a substring search.
    fn find_by_nationality(&self, nationality: &str) -> StoreResult<Vec<Author>>;
    /// Insert `author`, write the generated id back onto it and return a copy.
    fn save(&self, author: &mut Author) -> StoreResult<Author>;
    /// Overwrite name and nationality. `Ok(false)` when no row has that id.
    fn update(&self, author: &Author) -> StoreResult<bool>;
    /// Remove the row. `Ok(false)` when no row has that id.
    ///
    /// Does not check for books by this author; callers go through
    /// `Catalog::delete_author` for that.
    fn delete(&self, id: i64) -> StoreResult<bool>;
}

/// SQLite-backed author repository borrowing the catalog connection.
pub struct SqliteAuthorRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAuthorRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_authors<P: Params>(&self, sql: &str, params: P) -> rusqlite::Result<Vec<Author>> {
        let mut stmt = self.conn.prepare(sql)?;
        let authors = stmt
            .query_map(params, author_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(authors)
    }
}

impl AuthorRepository for SqliteAuthorRepository<'_> {
    fn find_by_id(&self, id: i64) -> StoreResult<Option<Author>> {
        self.conn
            .query_row(
                &format!("{AUTHOR_SELECT_SQL} WHERE id = ?1"),
                [id],
                author_from_row,
            )
            .optional()
            .map_err(log_failure(MODULE, "find_by_id", id))
    }

    fn find_all(&self) -> StoreResult<Vec<Author>> {
        self.query_authors(&format!("{AUTHOR_SELECT_SQL} ORDER BY id"), [])
            .map_err(log_failure(MODULE, "find_all", "*"))
    }

    fn find_by_nationality(&self, nationality: &str) -> StoreResult<Vec<Author>> {
        self.query_authors(
            &format!("{AUTHOR_SELECT_SQL} WHERE nationality = ?1 ORDER BY id"),
            [nationality],
        )
        .map_err(log_failure(MODULE, "find_by_nationality", nationality))
    }

    fn save(&self, author: &mut Author) -> StoreResult<Author> {
        if let Some(id) = author.id {
            return Err(StoreError::AlreadySaved(id));
        }
        author.validate()?;

        self.conn
            .execute(
                "INSERT INTO authors (name, nationality) VALUES (?1, ?2)",
                params![author.name, author.nationality],
            )
            .map_err(log_failure(MODULE, "save", &author.name))?;

        let id = self.conn.last_insert_rowid();
        author.id = Some(id);
        info!("event=store_call module={MODULE} op=save key={id} status=ok");
        Ok(author.clone())
    }

    fn update(&self, author: &Author) -> StoreResult<bool> {
        let Some(id) = author.id else {
            return Ok(false);
        };
        author.validate()?;

        let updated = self
            .conn
            .execute(
                "UPDATE authors SET name = ?1, nationality = ?2 WHERE id = ?3",
                params![author.name, author.nationality, id],
            )
            .map_err(log_failure(MODULE, "update", id))?;

        info!("event=store_call module={MODULE} op=update key={id} status=ok rows={updated}");
        Ok(updated > 0)
    }

    fn delete(&self, id: i64) -> StoreResult<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM authors WHERE id = ?1", [id])
            .map_err(|err| match constraint_violation(&err) {
                Some(Constraint::ForeignKey) => StoreError::AuthorInUse(id),
                _ => err.into(),
            })
            .map_err(log_failure(MODULE, "delete", id))?;

        info!("event=store_call module={MODULE} op=delete key={id} status=ok rows={deleted}");
        Ok(deleted > 0)
    }
}

fn author_from_row(row: &Row<'_>) -> rusqlite::Result<Author> {
    Ok(Author {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        nationality: row.get(2)?,
    })
}
