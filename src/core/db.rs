use crate::core::error;
use crate::core::schemas;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub fn db_connect(db_path: &Path) -> Result<Connection, error::CoursekitError> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(Duration::from_secs(5))
        .map_err(error::CoursekitError::RusqliteError)?;
    conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))
        .map_err(error::CoursekitError::RusqliteError)?;
    conn.execute("PRAGMA foreign_keys=ON;", [])
        .map_err(error::CoursekitError::RusqliteError)?;
    Ok(conn)
}

pub fn progress_db_path(data_dir: &Path) -> PathBuf {
    data_dir.join(schemas::PROGRESS_DB_NAME)
}

pub fn initialize_progress_db(data_dir: &Path) -> Result<(), error::CoursekitError> {
    fs::create_dir_all(data_dir).map_err(error::CoursekitError::IoError)?;

    let conn = db_connect(&progress_db_path(data_dir))?;
    conn.execute(schemas::PROGRESS_DB_SCHEMA, [])?;
    conn.execute(schemas::PROGRESS_DB_SCHEMA_INDEX, [])?;

    tracing::debug!(data_dir = %data_dir.display(), "progress database ready");
    Ok(())
}
