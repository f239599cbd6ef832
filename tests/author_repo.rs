use library_catalog_manager::db::{
    AuthorRepository, Database, SqliteAuthorRepository, StoreError,
};
use library_catalog_manager::{Author, ValidationError};

fn author(name: &str, nationality: Option<&str>) -> Author {
    Author::new(name, nationality.map(str::to_string))
}

#[test]
fn save_assigns_id_and_roundtrips() {
    let mut database = Database::in_memory();
    let repo = SqliteAuthorRepository::new(database.acquire().unwrap());

    let mut draft = author("Gabriel García Márquez", Some("Colombian"));
    let saved = repo.save(&mut draft).unwrap();
    assert_eq!(saved.id, Some(1));
    assert_eq!(draft.id, Some(1));

    let loaded = repo.find_by_id(1).unwrap().unwrap();
    assert_eq!(loaded.name, "Gabriel García Márquez");
    assert_eq!(loaded.nationality.as_deref(), Some("Colombian"));
    assert_eq!(loaded, saved);
}

#[test]
fn missing_author_is_none_not_an_error() {
    let mut database = Database::in_memory();
    let repo = SqliteAuthorRepository::new(database.acquire().unwrap());

    assert!(repo.find_by_id(404).unwrap().is_none());
    assert!(repo.find_all().unwrap().is_empty());
}

#[test]
fn save_rejects_saved_and_invalid_authors() {
    let mut database = Database::in_memory();
    let repo = SqliteAuthorRepository::new(database.acquire().unwrap());

    let mut draft = author("Pablo Neruda", Some("Chilean"));
    repo.save(&mut draft).unwrap();
    assert!(matches!(
        repo.save(&mut draft),
        Err(StoreError::AlreadySaved(1))
    ));

    let mut blank = author("   ", None);
    assert!(matches!(
        repo.save(&mut blank),
        Err(StoreError::Validation(ValidationError::EmptyName))
    ));
    assert_eq!(repo.find_all().unwrap().len(), 1);
}

#[test]
fn nationality_filter_is_an_exact_match() {
    let mut database = Database::in_memory();
    let repo = SqliteAuthorRepository::new(database.acquire().unwrap());

    repo.save(&mut author("Gabriel García Márquez", Some("Colombian")))
        .unwrap();
    repo.save(&mut author("Álvaro Mutis", Some("Colombian-born")))
        .unwrap();
    repo.save(&mut author("Anonymous", None)).unwrap();
    repo.save(&mut author("Laura Restrepo", Some("Colombian")))
        .unwrap();

    let names: Vec<String> = repo
        .find_by_nationality("Colombian")
        .unwrap()
        .into_iter()
        .map(|author| author.name)
        .collect();
    assert_eq!(names, vec!["Gabriel García Márquez", "Laura Restrepo"]);
    assert!(repo.find_by_nationality("Colomb").unwrap().is_empty());
}

#[test]
fn update_overwrites_fields_and_reports_missing_rows() {
    let mut database = Database::in_memory();
    let repo = SqliteAuthorRepository::new(database.acquire().unwrap());

    let mut saved = repo.save(&mut author("Rubén Dario", None)).unwrap();
    saved.name = "Rubén Darío".to_string();
    saved.nationality = Some("Nicaraguan".to_string());
    assert!(repo.update(&saved).unwrap());

    let loaded = repo.find_by_id(saved.id.unwrap()).unwrap().unwrap();
    assert_eq!(loaded.name, "Rubén Darío");
    assert_eq!(loaded.nationality.as_deref(), Some("Nicaraguan"));

    let mut ghost = loaded.clone();
    ghost.id = Some(99);
    assert!(!repo.update(&ghost).unwrap());
    assert!(!repo.update(&author("Unsaved", None)).unwrap());
}

#[test]
fn delete_removes_once() {
    let mut database = Database::in_memory();
    let repo = SqliteAuthorRepository::new(database.acquire().unwrap());

    let id = repo.save(&mut author("Juana Inés de la Cruz", None)).unwrap().id.unwrap();
    assert!(repo.delete(id).unwrap());
    assert!(!repo.delete(id).unwrap());
    assert!(repo.find_by_id(id).unwrap().is_none());
}

#[test]
fn delete_of_referenced_author_hits_the_foreign_key() {
    let mut database = Database::in_memory();
    let conn = database.acquire().unwrap();
    let repo = SqliteAuthorRepository::new(conn);

    let id = repo.save(&mut author("Juan Rulfo", Some("Mexican"))).unwrap().id.unwrap();
    conn.execute(
        "INSERT INTO books (title, author_id) VALUES ('Pedro Páramo', ?1)",
        [id],
    )
    .unwrap();

    assert!(matches!(repo.delete(id), Err(StoreError::AuthorInUse(found)) if found == id));
    assert!(repo.find_by_id(id).unwrap().is_some());
}

#[test]
fn identity_follows_the_row_id() {
    let mut database = Database::in_memory();
    let repo = SqliteAuthorRepository::new(database.acquire().unwrap());

    let saved = repo.save(&mut author("Mario Benedetti", None)).unwrap();
    let first = repo.find_by_id(saved.id.unwrap()).unwrap().unwrap();
    let second = repo.find_all().unwrap().remove(0);
    assert_eq!(first, second);

    let mut renamed = first.clone();
    renamed.name = "Someone Else".to_string();
    assert_eq!(renamed, first);
    assert_ne!(first, author("Mario Benedetti", None));
}
