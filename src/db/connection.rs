use rusqlite::Connection;
use std::cell::RefCell;
use std::path::{Path, PathBuf};

use crate::errors::AppError;

const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

// Thread-local connection slot, tagged with the file it was opened on.
thread_local! {
    static DB_CONN: RefCell<Option<(PathBuf, Connection)>> = const { RefCell::new(None) };
}

#[derive(Clone, Debug)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Provides a mutable connection to the closure.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut Connection) -> Result<T, AppError>,
    {
        DB_CONN
            .try_with(|cell| {
                let mut slot = cell.borrow_mut();
                let reuse = matches!(slot.as_ref(), Some((open_path, _)) if *open_path == self.path);
                if !reuse {
                    let conn = Connection::open(&self.path)
                        .map_err(|e| AppError::DbError(format!("Open DB failed: {e}")))?;
                    *slot = Some((self.path.clone(), conn));
                }
                match slot.as_mut() {
                    Some((_, conn)) => f(conn),
                    None => Err(AppError::DbError("connection slot empty".into())),
                }
            })
            .map_err(|e| AppError::DbError(format!("connection slot unavailable: {e}")))?
    }
}

/// Creates the ledger file (and its directory) if needed and applies the schema.
pub fn init_db(db: &Database) -> Result<(), AppError> {
    if let Some(dir) = db.path().parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }

    db.with_conn(|conn| {
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| AppError::DbError(format!("Failed to apply schema: {e}")))?;
        Ok(())
    })?;

    tracing::debug!("ledger ready at {}", db.path().display());
    Ok(())
}
