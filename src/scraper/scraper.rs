// scraper.rs
use crate::config::{DelayRange, ExtractConfig, ScrapeConfig};
use crate::domain::listing::{Category, ListingRecord};
use crate::scraper::extractor::extract;
use crate::scraper::{ExtractError, ScraperError};
use rand::Rng;
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0 Safari/537.36";

const MAX_CONSECUTIVE_FAILURES: u32 = 3;

pub struct ZameenScraper {
    client: Client,
}

/// Everything one category scrape produced, in page order.
#[derive(Debug, Default)]
pub struct PaginatedResult {
    pub records: Vec<ListingRecord>,
    pub pages_fetched: u32,
    pub diagnostics: Vec<ExtractError>,
    /// Set when the scrape stopped because pages kept failing.
    pub aborted: Option<String>,
}

impl ZameenScraper {
    pub fn new() -> Result<Self, ScraperError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ScraperError::Network(e.to_string()))?;

        Ok(Self { client })
    }

    /// `{base}/{Homes|Plots}/{city}_{location_name}-{location_id}-{page}.html`
    pub fn page_url(config: &ScrapeConfig, category: Category, page: u32) -> Result<Url, ScraperError> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| ScraperError::Config(format!("base url {}: {e}", config.base_url)))?;
        let path = format!(
            "{}/{}_{}-{}-{}.html",
            category.url_segment(),
            config.city,
            config.location_name,
            config.location_id,
            page
        );
        base.join(&path)
            .map_err(|e| ScraperError::Config(format!("page url {path}: {e}")))
    }

    /// Extraction settings for one category of this scrape.
    pub fn extract_config(config: &ScrapeConfig, category: Category) -> ExtractConfig {
        ExtractConfig {
            marker: config.marker.clone(),
            base_url: config.base_url.clone(),
            ..ExtractConfig::new(category, config.location_tag.clone())
        }
    }

    /// Scrapes every page of one category for the configured location.
    pub fn scrape_category(&self, config: &ScrapeConfig, category: Category) -> PaginatedResult {
        let extract_config = Self::extract_config(config, category);

        paginate(
            config.max_pages,
            config.page_delay,
            &extract_config,
            |page| {
                let url = Self::page_url(config, category, page)?;
                info!("📄 Scraping {category} page {page}: {url}");
                self.fetch_html(url.as_str())
            },
        )
    }

    pub fn fetch_html(&self, url: &str) -> Result<String, ScraperError> {
        const MAX_ATTEMPTS: u64 = 5;
        const MAX_BACKOFF_SECS: u64 = 10;
        const JITTER_MAX_SECS: u64 = 2;

        let mut last_err = None;

        for attempt in 1..=MAX_ATTEMPTS {
            let start = std::time::Instant::now();

            match self.try_fetch_html(url) {
                Ok(html) => {
                    info!("✅ Fetched attempt {attempt} in {:?}", start.elapsed());
                    return Ok(html);
                }
                Err(e) => {
                    warn!("⚠️ Attempt {attempt} failed in {:?}: {e}", start.elapsed());

                    last_err = Some(e);

                    if attempt < MAX_ATTEMPTS {
                        // backoff
                        let base = std::cmp::min(2 * attempt, MAX_BACKOFF_SECS);
                        let jitter = rand::thread_rng().gen_range(0..=JITTER_MAX_SECS);
                        std::thread::sleep(Duration::from_secs(base + jitter));
                    }
                }
            }
        }

        Err(last_err.unwrap_or_else(|| ScraperError::Network("retry loop failed".into())))
    }

    fn try_fetch_html(&self, url: &str) -> Result<String, ScraperError> {
        use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/html,application/xhtml+xml"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let resp = self
            .client
            .get(url)
            .headers(headers)
            .send()
            .map_err(|e| ScraperError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ScraperError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        resp.text().map_err(|e| ScraperError::Network(e.to_string()))
    }
}

/// Fetches and extracts pages 1..=`max_pages` in order.
///
/// Stops at the first page with no valid listings, at the page cap, or
/// after three consecutive failed fetches of the same page.
pub fn paginate<F>(
    max_pages: u32,
    delay: DelayRange,
    extract_config: &ExtractConfig,
    mut fetch_page: F,
) -> PaginatedResult
where
    F: FnMut(u32) -> Result<String, ScraperError>,
{
    let mut result = PaginatedResult::default();
    let mut page = 1;
    let mut consecutive_failures = 0;

    while page <= max_pages {
        match fetch_page(page) {
            Ok(html) => {
                consecutive_failures = 0;
                let extraction = extract(&html, extract_config);
                result.pages_fetched += 1;
                result.diagnostics.extend(extraction.diagnostics);

                if extraction.records.is_empty() {
                    info!("🏁 No listings on page {page}, stopping");
                    break;
                }

                info!("✅ Page {page} parsed ({} listings)", extraction.records.len());
                result.records.extend(extraction.records);
                page += 1;
            }
            Err(e) => {
                consecutive_failures += 1;
                warn!("⚠️ Page {page} failed (attempt {consecutive_failures}): {e}");

                if consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                    warn!("❌ Too many failures, aborting scrape");
                    result.aborted = Some(e.to_string());
                    break;
                }
            }
        }

        if page <= max_pages {
            pause(delay);
        }
    }

    result
}

fn pause(delay: DelayRange) {
    if delay.max.is_zero() {
        return;
    }
    let wait = if delay.max > delay.min {
        let millis = rand::thread_rng().gen_range(delay.min.as_millis()..=delay.max.as_millis());
        Duration::from_millis(millis as u64)
    } else {
        delay.min
    };
    std::thread::sleep(wait);
}
