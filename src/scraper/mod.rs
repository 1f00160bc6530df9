pub mod extractor;
pub mod fields;
pub mod locator;
mod scraper;
mod scraper_error;
pub mod units;

#[cfg(test)]
pub use self::scraper::{paginate, PaginatedResult};
pub use self::scraper::ZameenScraper;
pub use scraper_error::{ExtractError, ScraperError};
