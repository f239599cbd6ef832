//! Domain models that mirror the SQLite schema and get passed throughout the
//! catalog. These stay light-weight data holders; persistence lives in `db`
//! and business rules in `catalog`.
//!
//! Identity is the only equality key: two authors (or two books) compare
//! equal when their store-assigned ids match, regardless of the other fields.

use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;
use thiserror::Error;

/// Field-level problems caught before a record reaches the database.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Author name is required.")]
    EmptyName,
    #[error("Book title is required.")]
    EmptyTitle,
}

#[derive(Debug, Clone)]
/// A person credited with one or more books.
pub struct Author {
    /// Primary key assigned by the store. `None` until the author is saved.
    pub id: Option<i64>,
    pub name: String,
    pub nationality: Option<String>,
}

impl Author {
    /// Build an unsaved author.
    pub fn new(name: impl Into<String>, nationality: Option<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            nationality,
        }
    }

    /// Reject records the `authors` table would accept but the catalog should
    /// not, such as whitespace-only names.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(())
    }
}

impl PartialEq for Author {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Author {}

impl Hash for Author {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_id(f, self.id)?;
        write!(f, "{}", self.name)?;
        match self.nationality.as_deref() {
            Some(nationality) if !nationality.is_empty() => write!(f, " ({nationality})"),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone)]
/// A catalogued book. `author_id` must point at a saved author whenever the
/// book is written.
pub struct Book {
    /// Primary key assigned by the store. `None` until the book is saved.
    pub id: Option<i64>,
    pub title: String,
    /// Unique across all books when present.
    pub isbn: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub author_id: i64,
}

impl Book {
    /// Build an unsaved book.
    pub fn new(
        title: impl Into<String>,
        isbn: Option<String>,
        publication_date: Option<NaiveDate>,
        author_id: i64,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            isbn,
            publication_date,
            author_id,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        Ok(())
    }
}

impl PartialEq for Book {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Book {}

impl Hash for Book {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Book {
    /// Compact one-line form used by list views and refusal messages.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_id(f, self.id)?;
        write!(f, "{}", self.title)?;
        if let Some(isbn) = self.isbn.as_deref() {
            write!(f, " [{isbn}]")?;
        }
        if let Some(date) = self.publication_date {
            write!(f, " {}", date.format("%Y-%m-%d"))?;
        }
        write!(f, " · author #{}", self.author_id)
    }
}

fn write_id(f: &mut fmt::Formatter<'_>, id: Option<i64>) -> fmt::Result {
    match id {
        Some(id) => write!(f, "#{id} "),
        None => write!(f, "#- "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn equality_only_looks_at_identity() {
        let mut first = Author::new("Mario Vargas Llosa", Some("Peruvian".into()));
        let mut second = Author::new("Someone Else", None);
        first.id = Some(4);
        second.id = Some(4);
        assert_eq!(first, second);

        second.id = Some(5);
        assert_ne!(first, second);
    }

    #[test]
    fn books_hash_by_identity() {
        let mut a = Book::new("Rayuela", None, None, 1);
        let mut b = Book::new("Rayuela (2nd ed.)", Some("978-2".into()), None, 1);
        a.id = Some(9);
        b.id = Some(9);

        let set: HashSet<Book> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn blank_names_and_titles_are_rejected() {
        assert_eq!(
            Author::new("   ", None).validate(),
            Err(ValidationError::EmptyName)
        );
        assert_eq!(
            Book::new("", None, None, 1).validate(),
            Err(ValidationError::EmptyTitle)
        );
        assert!(Author::new("Borges", None).validate().is_ok());
    }

    #[test]
    fn display_includes_optional_fields_only_when_set() {
        let mut author = Author::new("Gabriel García Márquez", Some("Colombian".into()));
        author.id = Some(1);
        assert_eq!(author.to_string(), "#1 Gabriel García Márquez (Colombian)");

        let book = Book::new(
            "Cien años de soledad",
            Some("978-1".into()),
            NaiveDate::from_ymd_opt(1967, 6, 5),
            1,
        );
        assert_eq!(
            book.to_string(),
            "#- Cien años de soledad [978-1] 1967-06-05 · author #1"
        );
    }
}
