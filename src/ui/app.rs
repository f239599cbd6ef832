use std::mem;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use crossterm::event::KeyCode;
use log::info;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use rusqlite::Connection;

use crate::catalog::{CatalogError, SqliteCatalog};
use crate::models::{Author, Book};

use super::forms::{AuthorForm, BookForm, BookInput, Prompt, PromptKind, DATE_FORMAT};
use super::helpers::{centered_rect, form_cursor_x, key_hints, surface_error};
use super::screens::{AuthorScreen, BookFilter, BookScreen};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Rows skipped by PageUp/PageDown.
const PAGE_STEP: isize = 10;

/// The two list screens. Each owns the rows it is currently showing.
enum Screen {
    Authors(AuthorScreen),
    Books(BookScreen),
}

/// Fine-grained modes layered over the current screen.
enum Mode {
    Normal,
    AddingAuthor(AuthorForm),
    EditingAuthor { author: Author, form: AuthorForm },
    ConfirmAuthorDelete(Author),
    DeleteBlocked { author: Author, books: Vec<Book> },
    AddingBook(BookForm),
    EditingBook { book: Book, form: BookForm },
    ConfirmBookDelete(Book),
    Prompting(Prompt),
    Viewing(RecordView),
}

/// Read-only detail popup opened by a find-by-id lookup.
struct RecordView {
    title: String,
    lines: Vec<String>,
}

impl RecordView {
    fn author(author: &Author, books: &[Book]) -> Self {
        let mut lines = vec![
            format!("ID: {}", author.id.unwrap_or_default()),
            format!("Name: {}", author.name),
            format!(
                "Nationality: {}",
                author.nationality.as_deref().unwrap_or("unknown")
            ),
            String::new(),
            format!("Books: {}", books.len()),
        ];
        lines.extend(books.iter().map(|book| format!("  {book}")));
        Self {
            title: "Author".to_string(),
            lines,
        }
    }

    fn book(book: &Book, author: Option<&Author>) -> Self {
        let author_line = match author {
            Some(author) => format!("Author: {} (#{})", author.name, book.author_id),
            None => format!("Author: #{} (missing)", book.author_id),
        };
        Self {
            title: "Book".to_string(),
            lines: vec![
                format!("ID: {}", book.id.unwrap_or_default()),
                format!("Title: {}", book.title),
                format!("ISBN: {}", book.isbn.as_deref().unwrap_or("none")),
                format!(
                    "Published: {}",
                    book.publication_date
                        .map(|date| date.format(DATE_FORMAT).to_string())
                        .unwrap_or_else(|| "unknown".to_string())
                ),
                author_line,
            ],
        }
    }
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App<'conn> {
    catalog: SqliteCatalog<'conn>,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
    today: NaiveDate,
}

impl<'conn> App<'conn> {
    /// Build the app over an open connection and load the author list.
    pub fn new(conn: &'conn Connection) -> Result<Self> {
        let catalog = SqliteCatalog::from_connection(conn);
        let screen = Screen::Authors(AuthorScreen::load(&catalog, None)?);
        Ok(Self {
            catalog,
            screen,
            mode: Mode::Normal,
            status: None,
            today: Local::now().date_naive(),
        })
    }

    /// Replace the date the recent-books lookup counts back from.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Apply one key press. Returns `true` once the user asked to quit.
    /// Catalog failures never escape: they end up in the footer.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        let next = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::AddingAuthor(form) => self.handle_author_form(code, None, form),
            Mode::EditingAuthor { author, form } => {
                self.handle_author_form(code, Some(author), form)
            }
            Mode::ConfirmAuthorDelete(author) => self.handle_confirm_author_delete(code, author),
            Mode::DeleteBlocked { author, books } => {
                self.handle_delete_blocked(code, author, books)
            }
            Mode::AddingBook(form) => self.handle_book_form(code, None, form),
            Mode::EditingBook { book, form } => self.handle_book_form(code, Some(book), form),
            Mode::ConfirmBookDelete(book) => self.handle_confirm_book_delete(code, book),
            Mode::Prompting(prompt) => self.handle_prompt(code, prompt),
            Mode::Viewing(view) => Ok(Self::handle_view(code, view)),
        };

        self.mode = match next {
            Ok(mode) => mode,
            Err(err) => {
                self.set_status(surface_error(&err), StatusKind::Error);
                Mode::Normal
            }
        };
        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        if code == KeyCode::Char('q') {
            *exit = true;
            return Ok(Mode::Normal);
        }
        match self.screen {
            Screen::Authors(_) => self.handle_authors_key(code, exit),
            Screen::Books(_) => self.handle_books_key(code),
        }
    }

    fn handle_authors_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        let Screen::Authors(screen) = &mut self.screen else {
            return Ok(Mode::Normal);
        };
        let selected = screen.current().cloned();

        match code {
            KeyCode::Esc => *exit = true,
            KeyCode::Up => screen.move_selection(-1),
            KeyCode::Down => screen.move_selection(1),
            KeyCode::PageUp => screen.move_selection(-PAGE_STEP),
            KeyCode::PageDown => screen.move_selection(PAGE_STEP),
            KeyCode::Home => screen.select_first(),
            KeyCode::End => screen.select_last(),
            KeyCode::Char('c') => {
                if screen.nationality.take().is_some() {
                    screen.reload(&self.catalog, selected.and_then(|author| author.id))?;
                    self.set_status("Showing all authors.", StatusKind::Info);
                }
            }
            KeyCode::Char('+') => return Ok(Mode::AddingAuthor(AuthorForm::default())),
            KeyCode::Char('n') => return Ok(Mode::Prompting(Prompt::new(PromptKind::Nationality))),
            KeyCode::Char('g') => return Ok(Mode::Prompting(Prompt::new(PromptKind::FindAuthor))),
            KeyCode::Char('b') | KeyCode::Tab => self.open_books(BookFilter::All)?,
            KeyCode::Enter | KeyCode::Char('e') | KeyCode::Char('-') => {
                let Some(author) = selected else {
                    self.set_status("No author selected.", StatusKind::Error);
                    return Ok(Mode::Normal);
                };
                match code {
                    KeyCode::Enter => self.open_books(BookFilter::ByAuthor {
                        id: author.id.unwrap_or_default(),
                        name: author.name,
                    })?,
                    KeyCode::Char('e') => {
                        let form = AuthorForm::from_author(&author);
                        return Ok(Mode::EditingAuthor { author, form });
                    }
                    _ => return Ok(Mode::ConfirmAuthorDelete(author)),
                }
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_books_key(&mut self, code: KeyCode) -> Result<Mode> {
        let Screen::Books(screen) = &mut self.screen else {
            return Ok(Mode::Normal);
        };
        let selected = screen.current().cloned();
        let author_filter = match &screen.filter {
            BookFilter::ByAuthor { id, .. } => Some(*id),
            _ => None,
        };

        match code {
            KeyCode::Up => screen.move_selection(-1),
            KeyCode::Down => screen.move_selection(1),
            KeyCode::PageUp => screen.move_selection(-PAGE_STEP),
            KeyCode::PageDown => screen.move_selection(PAGE_STEP),
            KeyCode::Home => screen.select_first(),
            KeyCode::End => screen.select_last(),
            KeyCode::Char('c') => {
                if screen.filter != BookFilter::All {
                    screen.filter = BookFilter::All;
                    screen.reload(&self.catalog, selected.and_then(|book| book.id))?;
                    self.set_status("Showing all books.", StatusKind::Info);
                }
            }
            KeyCode::Esc | KeyCode::Char('a') | KeyCode::Tab => self.open_authors()?,
            KeyCode::Char('f') => return Ok(Mode::Prompting(Prompt::new(PromptKind::TitleSearch))),
            KeyCode::Char('r') => return Ok(Mode::Prompting(Prompt::new(PromptKind::RecentYears))),
            KeyCode::Char('g') => return Ok(Mode::Prompting(Prompt::new(PromptKind::FindBook))),
            KeyCode::Char('+') => {
                let authors = self.catalog.authors()?;
                if authors.is_empty() {
                    self.set_status("Add an author before adding books.", StatusKind::Error);
                    return Ok(Mode::Normal);
                }
                return Ok(Mode::AddingBook(BookForm::new(authors, author_filter)));
            }
            KeyCode::Char('e') | KeyCode::Char('-') => {
                let Some(book) = selected else {
                    self.set_status("No book selected.", StatusKind::Error);
                    return Ok(Mode::Normal);
                };
                if code == KeyCode::Char('-') {
                    return Ok(Mode::ConfirmBookDelete(book));
                }
                let form = BookForm::from_book(&book, self.catalog.authors()?);
                return Ok(Mode::EditingBook { book, form });
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_author_form(
        &mut self,
        code: KeyCode,
        editing: Option<Author>,
        mut form: AuthorForm,
    ) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                let message = if editing.is_some() {
                    "Edit cancelled."
                } else {
                    "Add author cancelled."
                };
                self.set_status(message, StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_author(editing.as_ref(), &form) {
                Ok(()) => keep_open = false,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if !keep_open {
            return Ok(Mode::Normal);
        }
        Ok(match editing {
            Some(author) => Mode::EditingAuthor { author, form },
            None => Mode::AddingAuthor(form),
        })
    }

    fn handle_confirm_author_delete(&mut self, code: KeyCode, author: Author) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                let Some(id) = author.id else {
                    return Ok(Mode::Normal);
                };
                match self.catalog.delete_author(id) {
                    Ok(removed) => {
                        self.refresh_screen(None)?;
                        self.set_status(
                            format!("Deleted author {}.", removed.name),
                            StatusKind::Info,
                        );
                        Ok(Mode::Normal)
                    }
                    Err(CatalogError::AuthorHasBooks { author, books }) => {
                        self.set_status(
                            format!(
                                "{} still has {} book(s); delete them first.",
                                author.name,
                                books.len()
                            ),
                            StatusKind::Error,
                        );
                        Ok(Mode::DeleteBlocked { author, books })
                    }
                    Err(err) => Err(err.into()),
                }
            }
            _ => Ok(Mode::ConfirmAuthorDelete(author)),
        }
    }

    fn handle_delete_blocked(
        &mut self,
        code: KeyCode,
        author: Author,
        books: Vec<Book>,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Enter => Ok(Mode::Normal),
            KeyCode::Char('v') => {
                self.open_books(BookFilter::ByAuthor {
                    id: author.id.unwrap_or_default(),
                    name: author.name,
                })?;
                Ok(Mode::Normal)
            }
            _ => Ok(Mode::DeleteBlocked { author, books }),
        }
    }

    fn handle_book_form(
        &mut self,
        code: KeyCode,
        editing: Option<Book>,
        mut form: BookForm,
    ) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                let message = if editing.is_some() {
                    "Edit cancelled."
                } else {
                    "Add book cancelled."
                };
                self.set_status(message, StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_book(editing.as_ref(), &form) {
                Ok(()) => keep_open = false,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if !keep_open {
            return Ok(Mode::Normal);
        }
        Ok(match editing {
            Some(book) => Mode::EditingBook { book, form },
            None => Mode::AddingBook(form),
        })
    }

    fn handle_confirm_book_delete(&mut self, code: KeyCode, book: Book) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                let Some(id) = book.id else {
                    return Ok(Mode::Normal);
                };
                let removed = self.catalog.delete_book(id)?;
                self.refresh_screen(None)?;
                self.set_status(format!("Deleted book {}.", removed.title), StatusKind::Info);
                Ok(Mode::Normal)
            }
            _ => Ok(Mode::ConfirmBookDelete(book)),
        }
    }

    fn handle_prompt(&mut self, code: KeyCode, mut prompt: Prompt) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.clear_status();
                Ok(Mode::Normal)
            }
            KeyCode::Backspace => {
                prompt.backspace();
                Ok(Mode::Prompting(prompt))
            }
            KeyCode::Enter => match self.submit_prompt(&prompt) {
                Ok(mode) => Ok(mode),
                Err(err) => {
                    let message = surface_error(&err);
                    prompt.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                    Ok(Mode::Prompting(prompt))
                }
            },
            KeyCode::Char(ch) => {
                prompt.push_char(ch);
                Ok(Mode::Prompting(prompt))
            }
            _ => Ok(Mode::Prompting(prompt)),
        }
    }

    fn submit_prompt(&mut self, prompt: &Prompt) -> Result<Mode> {
        match prompt.kind {
            PromptKind::Nationality => {
                let nationality = prompt.text()?.to_string();
                let screen = AuthorScreen::load(&self.catalog, Some(nationality))?;
                self.set_status(
                    format!("{} matching author(s).", screen.authors.len()),
                    StatusKind::Info,
                );
                self.screen = Screen::Authors(screen);
                Ok(Mode::Normal)
            }
            PromptKind::TitleSearch => {
                let needle = prompt.text()?.to_string();
                self.open_books(BookFilter::TitleContains(needle))?;
                Ok(Mode::Normal)
            }
            PromptKind::RecentYears => {
                let years: u32 = prompt.number()?;
                let (cutoff, books) = self.catalog.recent_books(years, self.today)?;
                info!(
                    "event=recent_books module=ui years={years} cutoff={cutoff} count={}",
                    books.len()
                );
                let filter = BookFilter::PublishedAfter(cutoff);
                let screen = BookScreen::with_books(&self.catalog, filter, books)?;
                self.set_status(
                    format!(
                        "{} book(s) from the last {years} year(s).",
                        screen.books.len()
                    ),
                    StatusKind::Info,
                );
                self.screen = Screen::Books(screen);
                Ok(Mode::Normal)
            }
            PromptKind::FindAuthor => {
                let id: i64 = prompt.number()?;
                let author = self
                    .catalog
                    .author(id)?
                    .ok_or(CatalogError::AuthorNotFound(id))?;
                let books = self.catalog.books_by_author(id)?;
                Ok(Mode::Viewing(RecordView::author(&author, &books)))
            }
            PromptKind::FindBook => {
                let id: i64 = prompt.number()?;
                let book = self
                    .catalog
                    .book(id)?
                    .ok_or(CatalogError::BookNotFound(id))?;
                let author = self.catalog.author(book.author_id)?;
                Ok(Mode::Viewing(RecordView::book(&book, author.as_ref())))
            }
        }
    }

    fn handle_view(code: KeyCode, view: RecordView) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => Mode::Normal,
            _ => Mode::Viewing(view),
        }
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match &self.screen {
            Screen::Authors(screen) => self.draw_authors(frame, content_area, screen),
            Screen::Books(screen) => self.draw_books(frame, content_area, screen),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::Normal => {}
            Mode::AddingAuthor(form) => self.draw_author_form(frame, area, "Add Author", form),
            Mode::EditingAuthor { form, .. } => {
                self.draw_author_form(frame, area, "Edit Author", form)
            }
            Mode::ConfirmAuthorDelete(author) => self.draw_confirm(
                frame,
                area,
                "Confirm Deletion",
                vec![Line::from(format!("Delete author {}?", author.name))],
            ),
            Mode::DeleteBlocked { author, books } => {
                self.draw_delete_blocked(frame, area, author, books)
            }
            Mode::AddingBook(form) => self.draw_book_form(frame, area, "Add Book", form),
            Mode::EditingBook { form, .. } => self.draw_book_form(frame, area, "Edit Book", form),
            Mode::ConfirmBookDelete(book) => self.draw_confirm(
                frame,
                area,
                "Confirm Deletion",
                vec![Line::from(format!("Delete book {}?", book.title))],
            ),
            Mode::Prompting(prompt) => self.draw_prompt(frame, area, prompt),
            Mode::Viewing(view) => self.draw_record(frame, area, view),
        }
    }

    fn draw_authors(&self, frame: &mut Frame, area: Rect, screen: &AuthorScreen) {
        let block = Block::default().borders(Borders::ALL).title(screen.title());
        if screen.authors.is_empty() {
            let paragraph = Paragraph::new(screen.empty_message())
                .alignment(Alignment::Center)
                .block(block)
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
            return;
        }

        let items: Vec<ListItem> = screen
            .authors
            .iter()
            .map(|author| ListItem::new(author.to_string()))
            .collect();
        self.render_list(frame, area, block, items, screen.selected);
    }

    fn draw_books(&self, frame: &mut Frame, area: Rect, screen: &BookScreen) {
        let block = Block::default().borders(Borders::ALL).title(screen.title());
        if screen.books.is_empty() {
            let paragraph = Paragraph::new(screen.empty_message())
                .alignment(Alignment::Center)
                .block(block)
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
            return;
        }

        let items: Vec<ListItem> = screen
            .books
            .iter()
            .map(|book| ListItem::new(screen.row(book)))
            .collect();
        self.render_list(frame, area, block, items, screen.selected);
    }

    fn render_list<'a>(
        &self,
        frame: &mut Frame,
        area: Rect,
        block: Block<'a>,
        items: Vec<ListItem<'a>>,
        selected: usize,
    ) {
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().fg(Color::Black).bg(Color::Yellow))
            .highlight_symbol("> ");
        let mut state = ListState::default();
        state.select(Some(selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph = Paragraph::new(vec![status_line, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        match (&self.screen, &self.mode) {
            (
                _,
                Mode::AddingAuthor(_)
                | Mode::EditingAuthor { .. }
                | Mode::AddingBook(_)
                | Mode::EditingBook { .. },
            ) => key_hints(&[("Tab", "Next Field"), ("Enter", "Save"), ("Esc", "Cancel")]),
            (_, Mode::ConfirmAuthorDelete(_) | Mode::ConfirmBookDelete(_)) => {
                key_hints(&[("y", "Delete"), ("n", "Keep")])
            }
            (_, Mode::DeleteBlocked { .. }) => {
                key_hints(&[("v", "View Their Books"), ("Esc", "Close")])
            }
            (_, Mode::Prompting(_)) => key_hints(&[("Enter", "Go"), ("Esc", "Cancel")]),
            (_, Mode::Viewing(_)) => key_hints(&[("Esc", "Close")]),
            (Screen::Authors(_), Mode::Normal) => key_hints(&[
                ("↑↓", "Navigate"),
                ("Enter", "Books"),
                ("+", "Add"),
                ("e", "Edit"),
                ("-", "Delete"),
                ("n", "Nationality"),
                ("g", "Find by ID"),
                ("c", "Clear"),
                ("b", "All Books"),
                ("q", "Quit"),
            ]),
            (Screen::Books(_), Mode::Normal) => key_hints(&[
                ("↑↓", "Navigate"),
                ("+", "Add"),
                ("e", "Edit"),
                ("-", "Delete"),
                ("f", "Title Search"),
                ("r", "Recent"),
                ("g", "Find by ID"),
                ("c", "Clear"),
                ("a", "Authors"),
                ("q", "Quit"),
            ]),
        }
    }

    /// Clear a centered popup, draw its border and return the inner area.
    fn open_popup(&self, frame: &mut Frame, popup_area: Rect, title: &str) -> Rect {
        frame.render_widget(Clear, popup_area);
        let block = Block::default().title(title.to_string()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        block.inner(popup_area)
    }

    fn draw_author_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &AuthorForm) {
        let inner = self.open_popup(frame, centered_rect(60, 40, area), title);

        let mut lines = form.lines();
        lines.push(Line::from(""));
        lines.push(form_message(form.error.as_deref()));

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let (row, label, value) = form.cursor();
        frame.set_cursor_position((form_cursor_x(inner, label, value), inner.y + row));
    }

    fn draw_book_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &BookForm) {
        let inner = self.open_popup(frame, centered_rect(70, 60, area), title);

        let mut lines = form.lines();
        lines.push(Line::from(""));
        lines.push(form_message(form.error.as_deref()));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Authors:",
            Style::default().fg(Color::Gray),
        )));
        lines.extend(
            form.authors
                .iter()
                .map(|author| Line::from(format!("  {author}"))),
        );

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let (row, label, value) = form.cursor();
        frame.set_cursor_position((form_cursor_x(inner, label, value), inner.y + row));
    }

    fn draw_confirm(&self, frame: &mut Frame, area: Rect, title: &str, mut lines: Vec<Line<'_>>) {
        let inner = self.open_popup(frame, centered_rect(60, 30, area), title);

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Press Y to confirm or N / Esc to cancel.",
            Style::default().fg(Color::Gray),
        )));

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_delete_blocked(&self, frame: &mut Frame, area: Rect, author: &Author, books: &[Book]) {
        let inner = self.open_popup(frame, centered_rect(70, 50, area), "Cannot Delete Author");

        let mut lines = vec![
            Line::from(Span::styled(
                format!("{} is still referenced by:", author.name),
                Style::default().fg(Color::Red),
            )),
            Line::from(""),
        ];
        lines.extend(books.iter().map(|book| Line::from(format!("  {book}"))));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Delete or reassign these books first. Press V to view them.",
            Style::default().fg(Color::Gray),
        )));

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_prompt(&self, frame: &mut Frame, area: Rect, prompt: &Prompt) {
        let inner = self.open_popup(frame, centered_rect(50, 25, area), prompt.kind.title());

        let label = prompt.kind.label();
        let lines = vec![
            Line::from(format!("{label}: {}", prompt.input)),
            Line::from(""),
            form_message(prompt.error.as_deref()),
        ];
        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        frame.set_cursor_position((form_cursor_x(inner, label, &prompt.input), inner.y));
    }

    fn draw_record(&self, frame: &mut Frame, area: Rect, view: &RecordView) {
        let inner = self.open_popup(frame, centered_rect(60, 50, area), &view.title);
        let lines: Vec<Line> = view
            .lines
            .iter()
            .map(|line| Line::from(line.as_str()))
            .collect();
        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
        frame.render_widget(paragraph, inner);
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    fn save_author(&mut self, editing: Option<&Author>, form: &AuthorForm) -> Result<()> {
        let (name, nationality) = form.parse_inputs()?;
        let (saved, verb) = match editing {
            None => (
                self.catalog.add_author(&name, nationality.as_deref())?,
                "Added",
            ),
            Some(existing) => {
                let updated = Author {
                    id: existing.id,
                    name,
                    nationality,
                };
                self.catalog.update_author(&updated)?;
                (updated, "Updated")
            }
        };
        self.refresh_screen(saved.id)?;
        self.set_status(format!("{verb} author {saved}."), StatusKind::Info);
        Ok(())
    }

    fn save_book(&mut self, editing: Option<&Book>, form: &BookForm) -> Result<()> {
        let BookInput {
            title,
            isbn,
            publication_date,
            author_id,
        } = form.parse_inputs()?;
        let (saved, verb) = match editing {
            None => (
                self.catalog
                    .add_book(&title, isbn.as_deref(), publication_date, author_id)?,
                "Added",
            ),
            Some(existing) => {
                let updated = Book {
                    id: existing.id,
                    title,
                    isbn,
                    publication_date,
                    author_id,
                };
                self.catalog.update_book(&updated)?;
                (updated, "Updated")
            }
        };
        self.refresh_screen(saved.id)?;
        self.set_status(format!("{verb} book {}.", saved.title), StatusKind::Info);
        Ok(())
    }

    /// Re-run the current screen's query, keeping the cursor on `focus_id`.
    fn refresh_screen(&mut self, focus_id: Option<i64>) -> Result<()> {
        match &mut self.screen {
            Screen::Authors(screen) => screen.reload(&self.catalog, focus_id)?,
            Screen::Books(screen) => screen.reload(&self.catalog, focus_id)?,
        }
        Ok(())
    }

    fn open_books(&mut self, filter: BookFilter) -> Result<()> {
        let screen = BookScreen::load(&self.catalog, filter)?;
        if screen.filter != BookFilter::All {
            self.set_status(
                format!("{} book(s) {}.", screen.books.len(), screen.filter.describe()),
                StatusKind::Info,
            );
        } else {
            self.clear_status();
        }
        self.screen = Screen::Books(screen);
        Ok(())
    }

    fn open_authors(&mut self) -> Result<()> {
        self.screen = Screen::Authors(AuthorScreen::load(&self.catalog, None)?);
        self.clear_status();
        Ok(())
    }
}

/// Error line for a form, or the key reminder when the input is fine.
fn form_message(error: Option<&str>) -> Line<'static> {
    match error {
        Some(error) => Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(Color::Red),
        )),
        None => Line::from(Span::styled(
            "Enter to save • Tab to switch field • Esc to cancel",
            Style::default().fg(Color::Gray),
        )),
    }
}
