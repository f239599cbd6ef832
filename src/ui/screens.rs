use std::collections::HashMap;

use chrono::NaiveDate;

use crate::catalog::{CatalogResult, SqliteCatalog};
use crate::models::{Author, Book};

use super::forms::DATE_FORMAT;

/// Move a list cursor by `offset`, clamping to the list bounds.
pub(crate) fn step_selection(selected: usize, len: usize, offset: isize) -> usize {
    if len == 0 {
        return 0;
    }
    let target = selected as isize + offset;
    target.clamp(0, len as isize - 1) as usize
}

/// Pick the index of `focus_id` if present, otherwise keep `selected` in
/// bounds.
fn refocus<T>(
    items: &[T],
    id_of: impl Fn(&T) -> Option<i64>,
    focus_id: Option<i64>,
    selected: usize,
) -> usize {
    let focused = focus_id.and_then(|id| items.iter().position(|item| id_of(item) == Some(id)));
    if let Some(idx) = focused {
        return idx;
    }
    selected.min(items.len().saturating_sub(1))
}

/// Author list, optionally narrowed to one nationality.
pub(crate) struct AuthorScreen {
    pub(crate) authors: Vec<Author>,
    pub(crate) nationality: Option<String>,
    pub(crate) selected: usize,
}

impl AuthorScreen {
    pub(crate) fn load(
        catalog: &SqliteCatalog<'_>,
        nationality: Option<String>,
    ) -> CatalogResult<Self> {
        let mut screen = Self {
            authors: Vec::new(),
            nationality,
            selected: 0,
        };
        screen.reload(catalog, None)?;
        Ok(screen)
    }

    /// Re-run the current query, keeping the cursor on `focus_id` when it is
    /// still listed.
    pub(crate) fn reload(
        &mut self,
        catalog: &SqliteCatalog<'_>,
        focus_id: Option<i64>,
    ) -> CatalogResult<()> {
        self.authors = match &self.nationality {
            Some(nationality) => catalog.authors_by_nationality(nationality)?,
            None => catalog.authors()?,
        };
        self.selected = refocus(&self.authors, |author| author.id, focus_id, self.selected);
        Ok(())
    }

    pub(crate) fn title(&self) -> String {
        match &self.nationality {
            Some(nationality) => format!("Authors · nationality = {nationality}"),
            None => "Authors".to_string(),
        }
    }

    pub(crate) fn empty_message(&self) -> String {
        match &self.nationality {
            Some(nationality) => format!(
                "No authors with nationality '{nationality}'. Press 'c' to clear the filter."
            ),
            None => "No authors yet. Press '+' to add one.".to_string(),
        }
    }

    pub(crate) fn current(&self) -> Option<&Author> {
        self.authors.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = step_selection(self.selected, self.authors.len(), offset);
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.authors.len().saturating_sub(1);
    }
}

/// Which books the book screen is showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BookFilter {
    All,
    TitleContains(String),
    ByAuthor { id: i64, name: String },
    PublishedAfter(NaiveDate),
}

impl BookFilter {
    fn fetch(&self, catalog: &SqliteCatalog<'_>) -> CatalogResult<Vec<Book>> {
        match self {
            BookFilter::All => catalog.books(),
            BookFilter::TitleContains(needle) => catalog.books_by_title(needle),
            BookFilter::ByAuthor { id, .. } => catalog.books_by_author(*id),
            BookFilter::PublishedAfter(date) => catalog.books_published_after(*date),
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            BookFilter::All => "all books".to_string(),
            BookFilter::TitleContains(needle) => format!("title contains '{needle}'"),
            BookFilter::ByAuthor { name, .. } => format!("by {name}"),
            BookFilter::PublishedAfter(date) => {
                format!("published after {}", date.format(DATE_FORMAT))
            }
        }
    }
}

/// Book list plus the author names needed to render it.
pub(crate) struct BookScreen {
    pub(crate) books: Vec<Book>,
    pub(crate) filter: BookFilter,
    pub(crate) author_names: HashMap<i64, String>,
    pub(crate) selected: usize,
}

impl BookScreen {
    pub(crate) fn load(catalog: &SqliteCatalog<'_>, filter: BookFilter) -> CatalogResult<Self> {
        let books = filter.fetch(catalog)?;
        Self::with_books(catalog, filter, books)
    }

    /// Build the screen from books the caller already fetched for `filter`.
    pub(crate) fn with_books(
        catalog: &SqliteCatalog<'_>,
        filter: BookFilter,
        books: Vec<Book>,
    ) -> CatalogResult<Self> {
        Ok(Self {
            books,
            filter,
            author_names: author_names(catalog)?,
            selected: 0,
        })
    }

    pub(crate) fn reload(
        &mut self,
        catalog: &SqliteCatalog<'_>,
        focus_id: Option<i64>,
    ) -> CatalogResult<()> {
        self.books = self.filter.fetch(catalog)?;
        self.author_names = author_names(catalog)?;
        self.selected = refocus(&self.books, |book| book.id, focus_id, self.selected);
        Ok(())
    }

    pub(crate) fn title(&self) -> String {
        match self.filter {
            BookFilter::All => "Books".to_string(),
            _ => format!("Books · {}", self.filter.describe()),
        }
    }

    pub(crate) fn empty_message(&self) -> String {
        match self.filter {
            BookFilter::All => "No books yet. Press '+' to add one.".to_string(),
            _ => format!(
                "No books {}. Press 'c' to show all books.",
                self.filter.describe()
            ),
        }
    }

    pub(crate) fn author_name(&self, author_id: i64) -> &str {
        self.author_names
            .get(&author_id)
            .map(String::as_str)
            .unwrap_or("unknown author")
    }

    /// One list row: id, title, ISBN, date and author.
    pub(crate) fn row(&self, book: &Book) -> String {
        format!(
            "#{:<4} {}  [{}]  {}  · {}",
            book.id.unwrap_or_default(),
            book.title,
            book.isbn.as_deref().unwrap_or("no ISBN"),
            book.publication_date
                .map(|date| date.format(DATE_FORMAT).to_string())
                .unwrap_or_else(|| "undated".to_string()),
            self.author_name(book.author_id)
        )
    }

    pub(crate) fn current(&self) -> Option<&Book> {
        self.books.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = step_selection(self.selected, self.books.len(), offset);
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.books.len().saturating_sub(1);
    }
}

fn author_names(catalog: &SqliteCatalog<'_>) -> CatalogResult<HashMap<i64, String>> {
    Ok(catalog
        .authors()?
        .into_iter()
        .filter_map(|author| author.id.map(|id| (id, author.name)))
        .collect())
}
