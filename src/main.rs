//! Binary entry point: resolve settings, start file logging, open the catalog
//! and hand the connection to the Ratatui loop.
use anyhow::{Context, Result};
use library_catalog_manager::{
    init_logging, run_app, shutdown_logging, App, AppConfig, Database,
};
use log::{error, info};

fn main() -> Result<()> {
    let config = AppConfig::from_env()?;

    // Logging is best-effort; the catalog still works without it.
    if let Err(err) = init_logging(&config.log_level, &config.log_dir) {
        eprintln!("warning: file logging disabled: {err}");
    }

    let mut database = Database::open(&config.db_path);
    let result = run(&mut database);
    database.release();

    match &result {
        Ok(()) => info!("event=app_exit module=core status=ok"),
        Err(err) => error!("event=app_exit module=core status=error error={err:#}"),
    }
    shutdown_logging();
    result
}

fn run(database: &mut Database) -> Result<()> {
    let conn = database
        .acquire()
        .context("failed to open catalog database")?;
    let mut app = App::new(conn)?;
    run_app(&mut app)
}
