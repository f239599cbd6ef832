//! Persistence module split across logical submodules: the connection owner,
//! schema bootstrap, one repository per table and the shared error type.

mod authors;
mod books;
mod connection;
mod error;
mod schema;

pub use authors::{AuthorRepository, SqliteAuthorRepository};
pub use books::{BookRepository, SqliteBookRepository};
pub use connection::{Database, DbLocation};
pub use error::{StoreError, StoreResult};
pub use schema::ensure_schema;
