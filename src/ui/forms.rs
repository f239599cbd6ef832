use anyhow::{anyhow, Result};
use chrono::{Datelike, NaiveDate};
use ratatui::text::Line;

use crate::models::{Author, Book};

use super::helpers::form_line;

/// Date format accepted and displayed by the book form.
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

/// Internal representation of the "author" form fields.
#[derive(Default, Clone)]
pub(crate) struct AuthorForm {
    pub(crate) name: String,
    pub(crate) nationality: String,
    pub(crate) active: AuthorField,
    pub(crate) error: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub(crate) enum AuthorField {
    #[default]
    Name,
    Nationality,
}

impl AuthorForm {
    /// Populate the form from an existing author when editing.
    pub(crate) fn from_author(author: &Author) -> Self {
        Self {
            name: author.name.clone(),
            nationality: author.nationality.clone().unwrap_or_default(),
            active: AuthorField::Name,
            error: None,
        }
    }

    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            AuthorField::Name => AuthorField::Nationality,
            AuthorField::Nationality => AuthorField::Name,
        };
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.active_value_mut().push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.active_value_mut().pop();
    }

    /// Validate the inputs and return `(name, nationality)` ready for the
    /// catalog. A blank nationality means "unknown".
    pub(crate) fn parse_inputs(&self) -> Result<(String, Option<String>)> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(anyhow!("Author name is required."));
        }
        Ok((name.to_string(), optional(&self.nationality)))
    }

    pub(crate) fn lines(&self) -> Vec<Line<'static>> {
        vec![
            form_line(
                "Name",
                &self.name,
                self.active == AuthorField::Name,
                true,
            ),
            form_line(
                "Nationality",
                &self.nationality,
                self.active == AuthorField::Nationality,
                false,
            ),
        ]
    }

    /// Row index, label and value of the focused field, for cursor placement.
    pub(crate) fn cursor(&self) -> (u16, &'static str, &str) {
        match self.active {
            AuthorField::Name => (0, "Name", &self.name),
            AuthorField::Nationality => (1, "Nationality", &self.nationality),
        }
    }

    fn active_value_mut(&mut self) -> &mut String {
        match self.active {
            AuthorField::Name => &mut self.name,
            AuthorField::Nationality => &mut self.nationality,
        }
    }
}

/// Typed values produced by a valid book form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BookInput {
    pub(crate) title: String,
    pub(crate) isbn: Option<String>,
    pub(crate) publication_date: Option<NaiveDate>,
    pub(crate) author_id: i64,
}

/// Form state for book creation/editing. Carries the author list so the
/// dialog can show which ids are valid.
#[derive(Default, Clone)]
pub(crate) struct BookForm {
    pub(crate) title: String,
    pub(crate) isbn: String,
    pub(crate) publication_date: String,
    pub(crate) author_id: String,
    pub(crate) active: BookField,
    pub(crate) error: Option<String>,
    pub(crate) authors: Vec<Author>,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub(crate) enum BookField {
    #[default]
    Title,
    Isbn,
    PublicationDate,
    AuthorId,
}

impl BookField {
    fn next(self) -> Self {
        match self {
            BookField::Title => BookField::Isbn,
            BookField::Isbn => BookField::PublicationDate,
            BookField::PublicationDate => BookField::AuthorId,
            BookField::AuthorId => BookField::Title,
        }
    }

    fn previous(self) -> Self {
        match self {
            BookField::Title => BookField::AuthorId,
            BookField::Isbn => BookField::Title,
            BookField::PublicationDate => BookField::Isbn,
            BookField::AuthorId => BookField::PublicationDate,
        }
    }
}

impl BookForm {
    /// Empty form, pre-filling the author id when there is only one choice
    /// or the caller already knows it.
    pub(crate) fn new(authors: Vec<Author>, author_id: Option<i64>) -> Self {
        let author_id = author_id
            .or_else(|| match authors.as_slice() {
                [only] => only.id,
                _ => None,
            })
            .map(|id| id.to_string())
            .unwrap_or_default();
        Self {
            author_id,
            authors,
            ..Self::default()
        }
    }

    /// Populate the form from an existing book when editing.
    pub(crate) fn from_book(book: &Book, authors: Vec<Author>) -> Self {
        Self {
            title: book.title.clone(),
            isbn: book.isbn.clone().unwrap_or_default(),
            publication_date: book
                .publication_date
                .map(|date| date.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
            author_id: book.author_id.to_string(),
            active: BookField::Title,
            error: None,
            authors,
        }
    }

    pub(crate) fn next_field(&mut self) {
        self.active = self.active.next();
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = self.active.previous();
    }

    /// Append a character to the active field, validating allowed input.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        let allowed = match self.active {
            BookField::Title | BookField::Isbn => !ch.is_control(),
            BookField::PublicationDate => ch.is_ascii_digit() || ch == '-',
            BookField::AuthorId => ch.is_ascii_digit(),
        };
        if allowed {
            self.active_value_mut().push(ch);
        }
        allowed
    }

    pub(crate) fn backspace(&mut self) {
        self.active_value_mut().pop();
    }

    /// Validate the inputs and return typed values ready for persistence.
    /// Whether the author actually exists is checked by the catalog.
    pub(crate) fn parse_inputs(&self) -> Result<BookInput> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(anyhow!("Book title is required."));
        }

        let date_raw = self.publication_date.trim();
        let publication_date = if date_raw.is_empty() {
            None
        } else {
            let date = NaiveDate::parse_from_str(date_raw, DATE_FORMAT)
                .map_err(|_| anyhow!("Publication date must use YYYY-MM-DD."))?;
            // Dates are compared as `YYYY-MM-DD` text, which only sorts
            // correctly for four-digit positive years.
            if !(1..=9999).contains(&date.year()) {
                return Err(anyhow!("Publication year must be between 1 and 9999."));
            }
            Some(date)
        };

        let author_raw = self.author_id.trim();
        if author_raw.is_empty() {
            return Err(anyhow!("Author ID is required."));
        }
        let author_id = author_raw
            .parse::<i64>()
            .map_err(|_| anyhow!("Author ID must be an integer."))?;

        Ok(BookInput {
            title: title.to_string(),
            isbn: optional(&self.isbn),
            publication_date,
            author_id,
        })
    }

    pub(crate) fn lines(&self) -> Vec<Line<'static>> {
        vec![
            form_line("Title", &self.title, self.active == BookField::Title, true),
            form_line("ISBN", &self.isbn, self.active == BookField::Isbn, false),
            form_line(
                "Published",
                &self.publication_date,
                self.active == BookField::PublicationDate,
                false,
            ),
            form_line(
                "Author ID",
                &self.author_id,
                self.active == BookField::AuthorId,
                true,
            ),
        ]
    }

    /// Row index, label and value of the focused field, for cursor placement.
    pub(crate) fn cursor(&self) -> (u16, &'static str, &str) {
        match self.active {
            BookField::Title => (0, "Title", &self.title),
            BookField::Isbn => (1, "ISBN", &self.isbn),
            BookField::PublicationDate => (2, "Published", &self.publication_date),
            BookField::AuthorId => (3, "Author ID", &self.author_id),
        }
    }

    fn active_value_mut(&mut self) -> &mut String {
        match self.active {
            BookField::Title => &mut self.title,
            BookField::Isbn => &mut self.isbn,
            BookField::PublicationDate => &mut self.publication_date,
            BookField::AuthorId => &mut self.author_id,
        }
    }
}

/// Single-line inputs opened from the list screens.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum PromptKind {
    Nationality,
    TitleSearch,
    RecentYears,
    FindAuthor,
    FindBook,
}

impl PromptKind {
    pub(crate) fn title(self) -> &'static str {
        match self {
            PromptKind::Nationality => "Authors by Nationality",
            PromptKind::TitleSearch => "Search Books by Title",
            PromptKind::RecentYears => "Recent Books",
            PromptKind::FindAuthor => "Find Author",
            PromptKind::FindBook => "Find Book",
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            PromptKind::Nationality => "Nationality",
            PromptKind::TitleSearch => "Title contains",
            PromptKind::RecentYears => "Years back",
            PromptKind::FindAuthor => "Author ID",
            PromptKind::FindBook => "Book ID",
        }
    }

    fn numeric(self) -> bool {
        matches!(
            self,
            PromptKind::RecentYears | PromptKind::FindAuthor | PromptKind::FindBook
        )
    }
}

#[derive(Clone)]
pub(crate) struct Prompt {
    pub(crate) kind: PromptKind,
    pub(crate) input: String,
    pub(crate) error: Option<String>,
}

impl Prompt {
    pub(crate) fn new(kind: PromptKind) -> Self {
        Self {
            kind,
            input: String::new(),
            error: None,
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        let allowed = if self.kind.numeric() {
            ch.is_ascii_digit()
        } else {
            !ch.is_control()
        };
        if allowed {
            self.input.push(ch);
            self.error = None;
        }
        allowed
    }

    pub(crate) fn backspace(&mut self) {
        self.input.pop();
    }

    /// The trimmed text, rejecting an empty answer.
    pub(crate) fn text(&self) -> Result<&str> {
        let value = self.input.trim();
        if value.is_empty() {
            return Err(anyhow!("{} is required.", self.kind.label()));
        }
        Ok(value)
    }

    pub(crate) fn number<T: std::str::FromStr>(&self) -> Result<T> {
        self.text()?
            .parse::<T>()
            .map_err(|_| anyhow!("{} must be a whole number.", self.kind.label()))
    }
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::helpers::surface_error;

    fn type_text(form: &mut BookForm, text: &str) {
        for ch in text.chars() {
            form.push_char(ch);
        }
    }

    #[test]
    fn author_form_requires_a_name_and_drops_blank_nationality() {
        let mut form = AuthorForm::default();
        assert!(form.parse_inputs().is_err());

        for ch in "  Isabel Allende ".chars() {
            form.push_char(ch);
        }
        form.toggle_field();
        form.push_char(' ');

        let (name, nationality) = form.parse_inputs().unwrap();
        assert_eq!(name, "Isabel Allende");
        assert_eq!(nationality, None);
    }

    #[test]
    fn book_form_parses_all_fields() {
        let mut form = BookForm::new(Vec::new(), Some(7));
        type_text(&mut form, "Cien años de soledad");
        form.next_field();
        type_text(&mut form, "978-1");
        form.next_field();
        type_text(&mut form, "1967-06-05");

        let input = form.parse_inputs().unwrap();
        assert_eq!(
            input,
            BookInput {
                title: "Cien años de soledad".into(),
                isbn: Some("978-1".into()),
                publication_date: NaiveDate::from_ymd_opt(1967, 6, 5),
                author_id: 7,
            }
        );
    }

    #[test]
    fn book_form_rejects_bad_dates_and_filters_keystrokes() {
        let mut form = BookForm::new(Vec::new(), None);
        type_text(&mut form, "Rayuela");
        form.previous_field();
        assert_eq!(form.active, BookField::AuthorId);
        assert!(!form.push_char('x'));
        type_text(&mut form, "3");
        form.previous_field();
        type_text(&mut form, "1963-13-01");

        let err = form.parse_inputs().unwrap_err();
        assert_eq!(surface_error(&err), "Publication date must use YYYY-MM-DD.");
    }

    #[test]
    fn forms_start_on_their_first_field() {
        assert_eq!(AuthorForm::default().active, AuthorField::Name);
        assert_eq!(BookForm::default().active, BookField::Title);
    }

    #[test]
    fn book_form_rejects_years_outside_four_digits() {
        let mut form = BookForm::new(Vec::new(), Some(1));
        type_text(&mut form, "Anabasis");
        form.next_field();
        form.next_field();
        type_text(&mut form, "-0500-01-01");

        let err = form.parse_inputs().unwrap_err();
        assert_eq!(
            surface_error(&err),
            "Publication year must be between 1 and 9999."
        );

        form.publication_date = "0001-01-01".to_string();
        assert_eq!(
            form.parse_inputs().unwrap().publication_date,
            NaiveDate::from_ymd_opt(1, 1, 1)
        );
    }

    #[test]
    fn book_form_prefills_the_only_author() {
        let mut author = Author::new("Juan Rulfo", Some("Mexican".into()));
        author.id = Some(12);
        let form = BookForm::new(vec![author], None);
        assert_eq!(form.author_id, "12");
    }

    #[test]
    fn numeric_prompts_only_take_digits() {
        let mut prompt = Prompt::new(PromptKind::RecentYears);
        assert!(!prompt.push_char('a'));
        assert!(prompt.number::<u32>().is_err());
        prompt.push_char('1');
        prompt.push_char('0');
        assert_eq!(prompt.number::<u32>().unwrap(), 10);

        let mut text = Prompt::new(PromptKind::TitleSearch);
        text.push_char('S');
        assert_eq!(text.text().unwrap(), "S");
    }
}
