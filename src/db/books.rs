use chrono::NaiveDate;
use log::{info, warn};
use rusqlite::{params, Connection, Error as SqlError, OptionalExtension, Params, Row};

use super::error::{constraint_violation, log_failure, Constraint, StoreError, StoreResult};
use crate::models::Book;

const MODULE: &str = "book_repo";

const BOOK_SELECT_SQL: &str =
    "SELECT id, title, isbn, publication_date, author_id FROM books";

/// Data access contract for books.
///
/// `save` and `update` expect `author_id` to name an existing author. Callers
/// check that first (see `Catalog::add_book`); if they skip it the foreign
/// key still rejects the write, reported as [`StoreError::UnknownAuthor`].
pub trait BookRepository {
    fn find_by_id(&self, id: i64) -> StoreResult<Option<Book>>;
    fn find_all(&self) -> StoreResult<Vec<Book>>;
    /// Substring match on the title, using SQLite's default `LIKE` casing.
    fn find_by_title(&self, needle: &str) -> StoreResult<Vec<Book>>;
    fn find_by_author_id(&self, author_id: i64) -> StoreResult<Vec<Book>>;
    /// Books published strictly after `date`. Undated books never match.
    fn find_by_publication_date_after(&self, date: NaiveDate) -> StoreResult<Vec<Book>>;
    fn save(&self, book: &mut Book) -> StoreResult<Book>;
    /// `Ok(false)` when no row has the book's id.
    fn update(&self, book: &Book) -> StoreResult<bool>;
    /// `Ok(false)` when no row has that id.
    fn delete(&self, id: i64) -> StoreResult<bool>;
}

/// SQLite-backed book repository borrowing the catalog connection.
pub struct SqliteBookRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBookRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_books<P: Params>(&self, sql: &str, params: P) -> rusqlite::Result<Vec<Book>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, book_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows.into_iter().flatten().collect())
    }
}

impl BookRepository for SqliteBookRepository<'_> {
    fn find_by_id(&self, id: i64) -> StoreResult<Option<Book>> {
        self.conn
            .query_row(
                &format!("{BOOK_SELECT_SQL} WHERE id = ?1"),
                [id],
                book_from_row,
            )
            .optional()
            .map(Option::flatten)
            .map_err(log_failure(MODULE, "find_by_id", id))
    }

    fn find_all(&self) -> StoreResult<Vec<Book>> {
        self.query_books(&format!("{BOOK_SELECT_SQL} ORDER BY id"), [])
            .map_err(log_failure(MODULE, "find_all", "*"))
    }

    fn find_by_title(&self, needle: &str) -> StoreResult<Vec<Book>> {
        self.query_books(
            &format!("{BOOK_SELECT_SQL} WHERE title LIKE ?1 ESCAPE '\\' ORDER BY id"),
            [like_pattern(needle)],
        )
        .map_err(log_failure(MODULE, "find_by_title", needle))
    }

    fn find_by_author_id(&self, author_id: i64) -> StoreResult<Vec<Book>> {
        self.query_books(
            &format!("{BOOK_SELECT_SQL} WHERE author_id = ?1 ORDER BY id"),
            [author_id],
        )
        .map_err(log_failure(MODULE, "find_by_author_id", author_id))
    }

    fn find_by_publication_date_after(&self, date: NaiveDate) -> StoreResult<Vec<Book>> {
        self.query_books(
            &format!(
                "{BOOK_SELECT_SQL}
                 WHERE publication_date IS NOT NULL AND publication_date > ?1
                 ORDER BY publication_date, id"
            ),
            [date],
        )
        .map_err(log_failure(MODULE, "find_by_publication_date_after", date))
    }

    fn save(&self, book: &mut Book) -> StoreResult<Book> {
        if let Some(id) = book.id {
            return Err(StoreError::AlreadySaved(id));
        }
        book.validate()?;

        self.conn
            .execute(
                "INSERT INTO books (title, isbn, publication_date, author_id)
                 VALUES (?1, ?2, ?3, ?4)",
                params![book.title, book.isbn, book.publication_date, book.author_id],
            )
            .map_err(|err| classify_write_error(err, book))
            .map_err(log_failure(MODULE, "save", &book.title))?;

        let id = self.conn.last_insert_rowid();
        book.id = Some(id);
        info!("event=store_call module={MODULE} op=save key={id} status=ok");
        Ok(book.clone())
    }

    fn update(&self, book: &Book) -> StoreResult<bool> {
        let Some(id) = book.id else {
            return Ok(false);
        };
        book.validate()?;

        let updated = self
            .conn
            .execute(
                "UPDATE books
                 SET title = ?1, isbn = ?2, publication_date = ?3, author_id = ?4
                 WHERE id = ?5",
                params![
                    book.title,
                    book.isbn,
                    book.publication_date,
                    book.author_id,
                    id
                ],
            )
            .map_err(|err| classify_write_error(err, book))
            .map_err(log_failure(MODULE, "update", id))?;

        info!("event=store_call module={MODULE} op=update key={id} status=ok rows={updated}");
        Ok(updated > 0)
    }

    fn delete(&self, id: i64) -> StoreResult<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM books WHERE id = ?1", [id])
            .map_err(log_failure(MODULE, "delete", id))?;

        info!("event=store_call module={MODULE} op=delete key={id} status=ok rows={deleted}");
        Ok(deleted > 0)
    }
}

/// Map one row, skipping books whose `author_id` is NULL. The column allows
/// it, but a book without an author cannot be shown or edited.
fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Option<Book>> {
    let id: i64 = row.get(0)?;
    let Some(author_id) = row.get::<_, Option<i64>>(4)? else {
        warn!(
            "event=store_call module={MODULE} op=read_row key={id} status=skipped \
             reason=null_author_id"
        );
        return Ok(None);
    };

    Ok(Some(Book {
        id: Some(id),
        title: row.get(1)?,
        isbn: row.get(2)?,
        publication_date: row.get(3)?,
        author_id,
    }))
}

/// Turn constraint failures on `books` into the errors the catalog reports.
/// `isbn` is the only unique column besides the key.
fn classify_write_error(err: SqlError, book: &Book) -> StoreError {
    match constraint_violation(&err) {
        Some(Constraint::Unique) => {
            StoreError::DuplicateIsbn(book.isbn.clone().unwrap_or_default())
        }
        Some(Constraint::ForeignKey) => StoreError::UnknownAuthor(book.author_id),
        None => err.into(),
    }
}

/// Wrap `needle` in `%` wildcards, escaping the characters `LIKE` would
/// otherwise interpret.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
