// errors.rs
use crate::scraper::ScraperError;
use thiserror::Error;

/// Errors originating from the outer layers of a run
/// (ledger, run folders, spreadsheet export) or the page fetch driver.
///
/// The extraction and aggregation core never produces one of these.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    DbError(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Spreadsheet error: {0}")]
    XlsxError(String),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error(transparent)]
    Scraper(#[from] ScraperError),
    #[error("Configuration error: {0}")]
    Config(String),
}

// Type alias used by the run-level operations.
pub type AppResult<T> = Result<T, AppError>;
