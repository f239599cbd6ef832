use rusqlite::{Connection, Result};

/// Create the catalog tables when they are missing. Every statement is
/// `IF NOT EXISTS`, so this runs on each process start no matter what the
/// file already holds.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS authors (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            nationality TEXT
        )",
        [],
    )?;

    // Dates are stored as `YYYY-MM-DD` text, which keeps `>` comparisons
    // chronological.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS books (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            isbn TEXT UNIQUE,
            publication_date DATE,
            author_id INTEGER,
            FOREIGN KEY(author_id) REFERENCES authors(id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_books_author_id ON books(author_id)",
        [],
    )?;

    Ok(())
}
