use thiserror::Error;

/// Failures of the page fetch driver. These concern one page request and
/// are counted against the consecutive-failure budget by the paginator.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },
    #[error("Invalid scrape configuration: {0}")]
    Config(String),
}

/// Non-fatal extraction diagnostics.
///
/// None of these ever escape `extract` as an `Err`: a missing or malformed
/// block yields an empty record set, and a field failure skips one element.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractError {
    #[error("listing data block not found")]
    BlockNotFound,
    #[error("listing data block malformed: {0}")]
    BlockMalformed(String),
    #[error("element {index} skipped ({fragment}): {reason}")]
    FieldExtractionFailed {
        index: usize,
        /// Listing id or title of the offending element, when one was readable.
        fragment: String,
        reason: String,
    },
}
