//! Catalog use cases layered over the two repositories.
//!
//! Business rules that span tables live here rather than in the repositories:
//! a book may only point at an existing author, and an author with books
//! cannot be deleted. Both checks run before any write.

use chrono::{Months, NaiveDate};
use log::{info, warn};
use rusqlite::Connection;
use thiserror::Error;

use crate::db::{
    AuthorRepository, BookRepository, SqliteAuthorRepository, SqliteBookRepository, StoreError,
};
use crate::models::{Author, Book};

pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("No author found with ID {0}.")]
    AuthorNotFound(i64),
    #[error("No book found with ID {0}.")]
    BookNotFound(i64),
    /// A book referenced an author id that does not exist.
    #[error("No author exists with ID {0}.")]
    UnknownAuthor(i64),
    #[error("Cannot delete {author}: {} book(s) still reference this author.", .books.len())]
    AuthorHasBooks { author: Author, books: Vec<Book> },
    #[error("This record has not been saved yet.")]
    Unsaved,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Catalog over any pair of repositories.
pub struct Catalog<A, B> {
    authors: A,
    books: B,
}

/// The catalog as the application uses it: both repositories on one SQLite
/// connection.
pub type SqliteCatalog<'conn> =
    Catalog<SqliteAuthorRepository<'conn>, SqliteBookRepository<'conn>>;

impl<'conn> Catalog<SqliteAuthorRepository<'conn>, SqliteBookRepository<'conn>> {
    pub fn from_connection(conn: &'conn Connection) -> Self {
        Self::new(
            SqliteAuthorRepository::new(conn),
            SqliteBookRepository::new(conn),
        )
    }
}

impl<A: AuthorRepository, B: BookRepository> Catalog<A, B> {
    pub fn new(authors: A, books: B) -> Self {
        Self { authors, books }
    }

    pub fn authors(&self) -> CatalogResult<Vec<Author>> {
        Ok(self.authors.find_all()?)
    }

    pub fn author(&self, id: i64) -> CatalogResult<Option<Author>> {
        Ok(self.authors.find_by_id(id)?)
    }

    pub fn authors_by_nationality(&self, nationality: &str) -> CatalogResult<Vec<Author>> {
        Ok(self.authors.find_by_nationality(nationality.trim())?)
    }

    /// Create an author. Surrounding whitespace is trimmed and a blank
    /// nationality is stored as unknown.
    pub fn add_author(&self, name: &str, nationality: Option<&str>) -> CatalogResult<Author> {
        let mut author = Author::new(name.trim(), optional_text(nationality));
        Ok(self.authors.save(&mut author)?)
    }

    pub fn update_author(&self, author: &Author) -> CatalogResult<()> {
        let id = author.id.ok_or(CatalogError::Unsaved)?;
        if self.authors.update(author)? {
            Ok(())
        } else {
            Err(CatalogError::AuthorNotFound(id))
        }
    }

    /// Delete an author that no book references, returning the removed
    /// record. With books attached the delete is refused and the blocking
    /// books are returned inside the error.
    pub fn delete_author(&self, id: i64) -> CatalogResult<Author> {
        let author = self
            .authors
            .find_by_id(id)?
            .ok_or(CatalogError::AuthorNotFound(id))?;

        let books = self.books.find_by_author_id(id)?;
        if !books.is_empty() {
            warn!(
                "event=catalog op=delete_author key={id} status=refused books={}",
                books.len()
            );
            return Err(CatalogError::AuthorHasBooks { author, books });
        }

        if !self.authors.delete(id)? {
            return Err(CatalogError::AuthorNotFound(id));
        }
        info!("event=catalog op=delete_author key={id} status=ok");
        Ok(author)
    }

    pub fn books(&self) -> CatalogResult<Vec<Book>> {
        Ok(self.books.find_all()?)
    }

    pub fn book(&self, id: i64) -> CatalogResult<Option<Book>> {
        Ok(self.books.find_by_id(id)?)
    }

    pub fn books_by_title(&self, needle: &str) -> CatalogResult<Vec<Book>> {
        Ok(self.books.find_by_title(needle)?)
    }

    pub fn books_by_author(&self, author_id: i64) -> CatalogResult<Vec<Book>> {
        Ok(self.books.find_by_author_id(author_id)?)
    }

    pub fn books_published_after(&self, date: NaiveDate) -> CatalogResult<Vec<Book>> {
        Ok(self.books.find_by_publication_date_after(date)?)
    }

    /// Books published within the last `years` years, counted back from
    /// `today`. Returns the cut-off date alongside the matches.
    pub fn recent_books(
        &self,
        years: u32,
        today: NaiveDate,
    ) -> CatalogResult<(NaiveDate, Vec<Book>)> {
        let cutoff = years_before(today, years);
        Ok((cutoff, self.books.find_by_publication_date_after(cutoff)?))
    }

    /// Create a book after confirming its author exists.
    pub fn add_book(
        &self,
        title: &str,
        isbn: Option<&str>,
        publication_date: Option<NaiveDate>,
        author_id: i64,
    ) -> CatalogResult<Book> {
        self.ensure_author_exists(author_id)?;
        let mut book = Book::new(title.trim(), optional_text(isbn), publication_date, author_id);
        Ok(self.books.save(&mut book)?)
    }

    /// Overwrite a saved book. The author reference may change, but only to
    /// an existing author.
    pub fn update_book(&self, book: &Book) -> CatalogResult<()> {
        let id = book.id.ok_or(CatalogError::Unsaved)?;
        if self.books.find_by_id(id)?.is_none() {
            return Err(CatalogError::BookNotFound(id));
        }
        self.ensure_author_exists(book.author_id)?;

        if self.books.update(book)? {
            Ok(())
        } else {
            Err(CatalogError::BookNotFound(id))
        }
    }

    pub fn delete_book(&self, id: i64) -> CatalogResult<Book> {
        let book = self
            .books
            .find_by_id(id)?
            .ok_or(CatalogError::BookNotFound(id))?;
        if !self.books.delete(id)? {
            return Err(CatalogError::BookNotFound(id));
        }
        Ok(book)
    }

    fn ensure_author_exists(&self, author_id: i64) -> CatalogResult<()> {
        if self.authors.find_by_id(author_id)?.is_none() {
            warn!("event=catalog op=author_check key={author_id} status=refused");
            return Err(CatalogError::UnknownAuthor(author_id));
        }
        Ok(())
    }
}

/// Trim user text and treat blanks as "not provided".
fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn years_before(today: NaiveDate, years: u32) -> NaiveDate {
    today
        .checked_sub_months(Months::new(years.saturating_mul(12)))
        .unwrap_or(NaiveDate::MIN)
}
