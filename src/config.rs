// config.rs
//
// Run-scoped parameters. Everything here is built once by the CLI and passed
// down explicitly; the extractor and aggregator never read globals.

use crate::domain::listing::Category;
use crate::scraper::locator::BlockMarker;
use crate::scraper::units::AreaUnit;
use std::path::PathBuf;
use std::time::Duration;

pub const BASE_URL: &str = "https://www.zameen.com";

/// A listing at least this many percent below the partition median
/// cost per square yard is a bargain candidate.
pub const DEFAULT_BARGAIN_THRESHOLD_PCT: f64 = -10.0;

/// Secondary screen in `analyze`: a finished listing whose cost per square
/// yard is this many standard deviations under the median.
pub const DEFAULT_Z_SCORE_THRESHOLD: f64 = -0.8;

pub const DEFAULT_MAX_PAGES: u32 = 8;
pub const DEFAULT_CITY: &str = "Karachi";

/// Plausible listing values. Anything outside is treated as a data-entry
/// error and skipped by the extractor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListingBounds {
    pub min_price: f64,
    pub max_price: f64,
    pub min_area_sq_yd: f64,
    pub max_area_sq_yd: f64,
}

impl Default for ListingBounds {
    fn default() -> Self {
        Self {
            min_price: 1_000_000.0,
            max_price: 10_000_000_000.0,
            min_area_sq_yd: 10.0,
            max_area_sq_yd: 10_000.0,
        }
    }
}

/// How one page's listing block is found and interpreted.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    pub marker: BlockMarker,
    /// Every record of one scrape invocation gets this category.
    pub category: Category,
    /// Used when an element carries no location breadcrumb.
    pub location_tag: String,
    /// Unit of bare numeric areas that declare no unit of their own.
    pub default_area_unit: AreaUnit,
    /// Prefix for listing URLs built from slugs.
    pub base_url: String,
    pub bounds: ListingBounds,
}

impl ExtractConfig {
    pub fn new(category: Category, location_tag: impl Into<String>) -> Self {
        Self {
            marker: BlockMarker::default(),
            category,
            location_tag: location_tag.into(),
            // The search state reports area in square metres.
            default_area_unit: AreaUnit::SquareMeters,
            base_url: BASE_URL.to_string(),
            bounds: ListingBounds::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateConfig {
    pub bargain_threshold_pct: f64,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            bargain_threshold_pct: DEFAULT_BARGAIN_THRESHOLD_PCT,
        }
    }
}

/// Parameters of the cross-location `analyze` report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisConfig {
    pub aggregate: AggregateConfig,
    pub z_score_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            aggregate: AggregateConfig::default(),
            z_score_threshold: DEFAULT_Z_SCORE_THRESHOLD,
        }
    }
}

/// Where and how much to scrape.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// URL-friendly location name, e.g. `Bahria_Town_Karachi_Bahria_Town___Precinct_8`.
    pub location_name: String,
    pub location_id: String,
    /// Folder name for this location's runs, e.g. `bahria_town_precinct_8`.
    pub location_tag: String,
    pub city: String,
    pub categories: Vec<Category>,
    pub max_pages: u32,
    pub base_url: String,
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub page_delay: DelayRange,
    /// Where listing data sits in each fetched page.
    pub marker: BlockMarker,
}

/// Random pause between page requests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayRange {
    pub min: Duration,
    pub max: Duration,
}

impl Default for DelayRange {
    fn default() -> Self {
        Self {
            min: Duration::from_secs(3),
            max: Duration::from_secs(6),
        }
    }
}

impl DelayRange {
    pub fn none() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
        }
    }
}
