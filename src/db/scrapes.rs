use crate::errors::AppError;
use rusqlite::{params, Connection};

#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeRun {
    pub id: i64,
    pub location: String,
    pub category: String,
    pub run_folder: Option<String>,
    pub started_at: i64,
    pub finished_at: Option<i64>,
    pub pages_fetched: Option<i64>,
    pub listings_seen: Option<i64>,
    pub success: bool,
    pub error_message: Option<String>,
}

/// Outcome written when a run finishes.
#[derive(Debug, Clone)]
pub struct ScrapeRunEnd {
    pub finished_at: i64,
    pub pages_fetched: u32,
    pub listings_seen: usize,
    pub success: bool,
    pub error_message: Option<String>,
}

pub fn start_scrape_run(
    conn: &Connection,
    location: &str,
    category: &str,
    run_folder: &str,
    now: i64,
) -> Result<i64, AppError> {
    conn.execute(
        "INSERT INTO scrape_runs (location, category, run_folder, started_at, success) VALUES (?, ?, ?, ?, 0)",
        params![location, category, run_folder, now],
    )
    .map_err(|e| AppError::DbError(e.to_string()))?;
    Ok(conn.last_insert_rowid())
}

pub fn end_scrape_run(conn: &Connection, run_id: i64, end: &ScrapeRunEnd) -> Result<(), AppError> {
    conn.execute(
        "UPDATE scrape_runs SET finished_at = ?, pages_fetched = ?, listings_seen = ?, success = ?, error_message = ? WHERE id = ?",
        params![
            end.finished_at,
            end.pages_fetched,
            end.listings_seen as i64,
            end.success,
            end.error_message,
            run_id
        ],
    )
    .map_err(|e| AppError::DbError(e.to_string()))?;
    Ok(())
}

pub fn get_recent_scrapes(conn: &Connection, limit: u32) -> Result<Vec<ScrapeRun>, AppError> {
    let mut stmt = conn
        .prepare(
            "SELECT id, location, category, run_folder, started_at, finished_at, pages_fetched, listings_seen, success, error_message \
             FROM scrape_runs ORDER BY started_at DESC, id DESC LIMIT ?",
        )
        .map_err(|e| AppError::DbError(e.to_string()))?;

    let rows = stmt
        .query_map(params![limit], |row| {
            Ok(ScrapeRun {
                id: row.get(0)?,
                location: row.get(1)?,
                category: row.get(2)?,
                run_folder: row.get(3)?,
                started_at: row.get(4)?,
                finished_at: row.get(5)?,
                pages_fetched: row.get(6)?,
                listings_seen: row.get(7)?,
                success: row.get(8)?,
                error_message: row.get(9)?,
            })
        })
        .map_err(|e| AppError::DbError(e.to_string()))?;

    let mut runs = Vec::new();
    for r in rows {
        runs.push(r.map_err(|e| AppError::DbError(e.to_string()))?);
    }
    Ok(runs)
}
