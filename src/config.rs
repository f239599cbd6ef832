//! Runtime settings: where the catalog file and the logs live, and how
//! verbose the logs are. Everything has a default under the user's home so
//! the binary runs without any setup; environment variables override them.

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use directories::BaseDirs;

use crate::logging::default_log_level;

/// Overrides the SQLite file path.
pub const DB_PATH_ENV: &str = "LIBRARY_CATALOG_DB";
/// Overrides the log directory.
pub const LOG_DIR_ENV: &str = "LIBRARY_CATALOG_LOG_DIR";
/// Overrides the log level (`trace|debug|info|warn|error`).
pub const LOG_LEVEL_ENV: &str = "LIBRARY_CATALOG_LOG_LEVEL";

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".library-catalog";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "catalog.sqlite";
const LOG_DIR_NAME: &str = "logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: String,
}

impl AppConfig {
    /// Resolve settings from the process environment and the home directory.
    pub fn from_env() -> Result<Self> {
        let home = BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf());
        Self::resolve(|key| env::var(key).ok(), home)
    }

    /// Resolve settings from an arbitrary variable source. Blank values count
    /// as unset. The home directory is only required for settings that fall
    /// back to their defaults.
    pub fn resolve<F>(lookup: F, home: Option<PathBuf>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let data_dir = || {
            home.as_ref()
                .map(|home| home.join(DATA_DIR_NAME))
                .ok_or_else(|| {
                    anyhow!("could not locate home directory; set {DB_PATH_ENV} and {LOG_DIR_ENV}")
                })
        };

        let db_path = match var(DB_PATH_ENV) {
            Some(path) => PathBuf::from(path),
            None => data_dir()?.join(DB_FILE_NAME),
        };
        let log_dir = match var(LOG_DIR_ENV) {
            Some(path) => PathBuf::from(path),
            None => data_dir()?.join(LOG_DIR_NAME),
        };
        let log_level = var(LOG_LEVEL_ENV).unwrap_or_else(|| default_log_level().to_string());

        Ok(Self {
            db_path,
            log_dir,
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_live_under_home() {
        let config = AppConfig::resolve(lookup_from(&[]), Some(PathBuf::from("/home/reader")))
            .expect("defaults should resolve");

        assert_eq!(
            config.db_path,
            PathBuf::from("/home/reader/.library-catalog/catalog.sqlite")
        );
        assert_eq!(
            config.log_dir,
            PathBuf::from("/home/reader/.library-catalog/logs")
        );
        assert_eq!(config.log_level, default_log_level());
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = AppConfig::resolve(
            lookup_from(&[
                (DB_PATH_ENV, "/tmp/books.sqlite"),
                (LOG_DIR_ENV, "/tmp/logs"),
                (LOG_LEVEL_ENV, "warn"),
            ]),
            None,
        )
        .expect("overrides should not need a home directory");

        assert_eq!(config.db_path, PathBuf::from("/tmp/books.sqlite"));
        assert_eq!(config.log_dir, PathBuf::from("/tmp/logs"));
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn blank_values_fall_back_and_missing_home_is_an_error() {
        let err = AppConfig::resolve(lookup_from(&[(DB_PATH_ENV, "   ")]), None)
            .expect_err("blank override without home must fail");
        assert!(err.to_string().contains("home directory"));
    }
}
