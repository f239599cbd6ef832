//! Library catalog manager: authors and their books in a local SQLite file,
//! browsed through a terminal UI.
//!
//! `db` owns the connection and the per-table repositories, `catalog` adds the
//! cross-table rules on top, and `ui` drives both from the keyboard.
pub mod catalog;
pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod ui;

pub use catalog::{Catalog, CatalogError, CatalogResult, SqliteCatalog};
pub use config::AppConfig;
pub use db::{Database, DbLocation, StoreError, StoreResult};
pub use logging::{init_logging, shutdown_logging};
pub use models::{Author, Book, ValidationError};
pub use ui::{run_app, App};
