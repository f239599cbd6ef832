use chrono::NaiveDate;
use library_catalog_manager::db::{
    AuthorRepository, BookRepository, Database, SqliteAuthorRepository, SqliteBookRepository,
    StoreError,
};
use library_catalog_manager::{Author, Book, ValidationError};
use rusqlite::Connection;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn seed_author(conn: &Connection, name: &str) -> i64 {
    SqliteAuthorRepository::new(conn)
        .save(&mut Author::new(name, None))
        .unwrap()
        .id
        .unwrap()
}

fn book(title: &str, isbn: Option<&str>, published: Option<NaiveDate>, author_id: i64) -> Book {
    Book::new(title, isbn.map(str::to_string), published, author_id)
}

fn titles(books: Vec<Book>) -> Vec<String> {
    books.into_iter().map(|book| book.title).collect()
}

#[test]
fn save_and_find_roundtrip() {
    let mut database = Database::in_memory();
    let conn = database.acquire().unwrap();
    let author_id = seed_author(conn, "Gabriel García Márquez");
    let repo = SqliteBookRepository::new(conn);

    let saved = repo
        .save(&mut book(
            "Cien años de soledad",
            Some("978-1"),
            Some(date(1967, 6, 5)),
            author_id,
        ))
        .unwrap();
    assert_eq!(saved.id, Some(1));

    let loaded = repo.find_by_id(1).unwrap().unwrap();
    assert_eq!(loaded.title, "Cien años de soledad");
    assert_eq!(loaded.isbn.as_deref(), Some("978-1"));
    assert_eq!(loaded.publication_date, Some(date(1967, 6, 5)));
    assert_eq!(loaded.author_id, author_id);
    assert!(repo.find_by_id(2).unwrap().is_none());
}

#[test]
fn duplicate_isbn_is_rejected_and_first_row_survives() {
    let mut database = Database::in_memory();
    let conn = database.acquire().unwrap();
    let author_id = seed_author(conn, "Jorge Luis Borges");
    let repo = SqliteBookRepository::new(conn);

    repo.save(&mut book("Ficciones", Some("978-0"), None, author_id))
        .unwrap();
    let err = repo
        .save(&mut book("El Aleph", Some("978-0"), None, author_id))
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicateIsbn(ref isbn) if isbn == "978-0"));

    assert_eq!(titles(repo.find_all().unwrap()), vec!["Ficciones"]);

    // Books without an ISBN never collide.
    repo.save(&mut book("Untitled draft", None, None, author_id))
        .unwrap();
    repo.save(&mut book("Second draft", None, None, author_id))
        .unwrap();
    assert_eq!(repo.find_all().unwrap().len(), 3);
}

#[test]
fn unknown_author_is_caught_by_the_foreign_key() {
    let mut database = Database::in_memory();
    let repo = SqliteBookRepository::new(database.acquire().unwrap());

    let err = repo
        .save(&mut book("Orphan", None, None, 42))
        .unwrap_err();
    assert!(matches!(err, StoreError::UnknownAuthor(42)));
    assert!(repo.find_all().unwrap().is_empty());
}

#[test]
fn blank_title_is_rejected_before_sql() {
    let mut database = Database::in_memory();
    let conn = database.acquire().unwrap();
    let author_id = seed_author(conn, "Alfonsina Storni");
    let repo = SqliteBookRepository::new(conn);

    let err = repo.save(&mut book(" ", None, None, author_id)).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::EmptyTitle)
    ));
}

#[test]
fn title_search_matches_substrings_literally() {
    let mut database = Database::in_memory();
    let conn = database.acquire().unwrap();
    let author_id = seed_author(conn, "Various");
    let repo = SqliteBookRepository::new(conn);

    for title in ["El túnel", "Sobre héroes y tumbas", "100% Poesía", "1000 Poemas"] {
        repo.save(&mut book(title, None, None, author_id)).unwrap();
    }

    assert_eq!(
        titles(repo.find_by_title("Poe").unwrap()),
        vec!["100% Poesía", "1000 Poemas"]
    );
    assert_eq!(titles(repo.find_by_title("tumba").unwrap()), vec!["Sobre héroes y tumbas"]);
    assert_eq!(titles(repo.find_by_title("0%").unwrap()), vec!["100% Poesía"]);
    assert!(repo.find_by_title("_").unwrap().is_empty());
}

#[test]
fn books_by_author_only_lists_that_author() {
    let mut database = Database::in_memory();
    let conn = database.acquire().unwrap();
    let cortazar = seed_author(conn, "Julio Cortázar");
    let sabato = seed_author(conn, "Ernesto Sabato");
    let repo = SqliteBookRepository::new(conn);

    repo.save(&mut book("Rayuela", None, None, cortazar)).unwrap();
    repo.save(&mut book("El túnel", None, None, sabato)).unwrap();
    repo.save(&mut book("Bestiario", None, None, cortazar)).unwrap();

    assert_eq!(
        titles(repo.find_by_author_id(cortazar).unwrap()),
        vec!["Rayuela", "Bestiario"]
    );
    assert!(repo.find_by_author_id(999).unwrap().is_empty());
}

#[test]
fn published_after_is_strict_and_skips_undated_books() {
    let mut database = Database::in_memory();
    let conn = database.acquire().unwrap();
    let author_id = seed_author(conn, "Various");
    let repo = SqliteBookRepository::new(conn);
    let cutoff = date(2000, 1, 1);

    repo.save(&mut book("On the day", None, Some(cutoff), author_id))
        .unwrap();
    repo.save(&mut book("Undated", None, None, author_id)).unwrap();
    repo.save(&mut book("Much later", None, Some(date(2010, 3, 4)), author_id))
        .unwrap();
    repo.save(&mut book("Day after", None, Some(date(2000, 1, 2)), author_id))
        .unwrap();
    repo.save(&mut book("Long before", None, Some(date(1950, 1, 1)), author_id))
        .unwrap();

    assert_eq!(
        titles(repo.find_by_publication_date_after(cutoff).unwrap()),
        vec!["Day after", "Much later"]
    );
}

#[test]
fn update_rewrites_the_row_and_maps_constraints() {
    let mut database = Database::in_memory();
    let conn = database.acquire().unwrap();
    let first_author = seed_author(conn, "Horacio Quiroga");
    let second_author = seed_author(conn, "Rómulo Gallegos");
    let repo = SqliteBookRepository::new(conn);

    repo.save(&mut book("Doña Bárbara", Some("978-9"), None, second_author))
        .unwrap();
    let mut saved = repo
        .save(&mut book("Cuentos de la selva", None, None, first_author))
        .unwrap();

    saved.publication_date = Some(date(1918, 1, 1));
    saved.author_id = second_author;
    assert!(repo.update(&saved).unwrap());
    let loaded = repo.find_by_id(saved.id.unwrap()).unwrap().unwrap();
    assert_eq!(loaded.publication_date, Some(date(1918, 1, 1)));
    assert_eq!(loaded.author_id, second_author);

    let mut clash = loaded.clone();
    clash.isbn = Some("978-9".to_string());
    assert!(matches!(
        repo.update(&clash),
        Err(StoreError::DuplicateIsbn(_))
    ));

    let mut orphan = loaded.clone();
    orphan.author_id = 77;
    assert!(matches!(repo.update(&orphan), Err(StoreError::UnknownAuthor(77))));

    let mut ghost = loaded;
    ghost.id = Some(500);
    assert!(!repo.update(&ghost).unwrap());
}

#[test]
fn rows_without_an_author_are_skipped() {
    let mut database = Database::in_memory();
    let conn = database.acquire().unwrap();
    let author_id = seed_author(conn, "Rosario Castellanos");
    conn.execute(
        "INSERT INTO books (title, author_id) VALUES ('Legacy', NULL)",
        [],
    )
    .unwrap();
    let legacy_id = conn.last_insert_rowid();
    let repo = SqliteBookRepository::new(conn);
    repo.save(&mut book("Balún Canán", None, Some(date(1957, 1, 1)), author_id))
        .unwrap();

    assert_eq!(titles(repo.find_all().unwrap()), vec!["Balún Canán"]);
    assert!(repo.find_by_title("Legacy").unwrap().is_empty());
    assert!(repo.find_by_id(legacy_id).unwrap().is_none());
    assert_eq!(
        titles(repo.find_by_publication_date_after(date(1900, 1, 1)).unwrap()),
        vec!["Balún Canán"]
    );
}

#[test]
fn delete_removes_once() {
    let mut database = Database::in_memory();
    let conn = database.acquire().unwrap();
    let author_id = seed_author(conn, "César Vallejo");
    let repo = SqliteBookRepository::new(conn);

    let id = repo
        .save(&mut book("Trilce", None, None, author_id))
        .unwrap()
        .id
        .unwrap();
    assert!(repo.delete(id).unwrap());
    assert!(!repo.delete(id).unwrap());
}
