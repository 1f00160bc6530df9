// cli.rs
use crate::config::{
    AggregateConfig, AnalysisConfig, DelayRange, ScrapeConfig, BASE_URL, DEFAULT_BARGAIN_THRESHOLD_PCT,
    DEFAULT_CITY, DEFAULT_MAX_PAGES, DEFAULT_Z_SCORE_THRESHOLD,
};
use crate::domain::construction::ConstructionAssumptions;
use crate::domain::listing::Category;
use crate::errors::{AppError, AppResult};
use crate::scraper::locator::BlockMarker;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Scrapes Zameen.com listings for one location and flags bargains
#[derive(Parser, Debug)]
#[command(name = "zameen-scraper", version)]
pub struct Cli {
    /// Logging level (RUST_LOG overrides)
    #[arg(long, global = true, default_value = "info", value_parser = ["trace", "debug", "info", "warn", "error"])]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scrape listing pages and write a new run folder
    Scrape(ScrapeArgs),
    /// Compare the latest runs of every location
    Analyze(AnalyzeArgs),
    /// Show recent scrape runs from the ledger
    Runs(RunsArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryArg {
    Houses,
    Plots,
}

impl From<CategoryArg> for Category {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Houses => Category::ResidentialBuilt,
            CategoryArg::Plots => Category::LandParcel,
        }
    }
}

#[derive(Args, Debug)]
pub struct ScrapeArgs {
    /// URL location name, e.g. Bahria_Town_Karachi_Bahria_Town___Precinct_8
    #[arg(long)]
    pub location_name: String,

    /// Marketplace location id, e.g. 10016
    #[arg(long)]
    pub location_id: String,

    /// Folder name for this location's runs
    #[arg(long)]
    pub location_tag: String,

    #[arg(long, default_value = DEFAULT_CITY)]
    pub city: String,

    /// Categories to scrape (repeatable, default both)
    #[arg(long = "category", value_enum)]
    pub categories: Vec<CategoryArg>,

    #[arg(long, default_value_t = DEFAULT_MAX_PAGES, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_pages: u32,

    /// Percent below the median cost per sq yd that counts as a bargain
    #[arg(long, default_value_t = DEFAULT_BARGAIN_THRESHOLD_PCT, allow_hyphen_values = true)]
    pub bargain_threshold: f64,

    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Scrape-run ledger
    #[arg(long = "db", default_value = "data/scrapes.sqlite3")]
    pub db_path: PathBuf,

    /// Skip the pause between page requests
    #[arg(long)]
    pub no_delay: bool,

    /// Regex whose first group is the body of the listings array
    #[arg(long, conflicts_with = "script_id")]
    pub hits_pattern: Option<String>,

    /// Read listings from the JSON inside <script id=...> instead
    #[arg(long, requires = "json_pointer")]
    pub script_id: Option<String>,

    /// JSON pointer of the listings array inside the script document
    #[arg(long, requires = "script_id")]
    pub json_pointer: Option<String>,
}

impl ScrapeArgs {
    pub fn marker(&self) -> AppResult<BlockMarker> {
        match (&self.hits_pattern, &self.script_id, &self.json_pointer) {
            (Some(pattern), _, _) => BlockMarker::array_pattern(pattern)
                .map_err(|e| AppError::Config(format!("invalid --hits-pattern: {e}"))),
            (None, Some(id), Some(pointer)) => Ok(BlockMarker::script_json(id, pointer)),
            _ => Ok(BlockMarker::default()),
        }
    }

    pub fn scrape_config(&self) -> AppResult<ScrapeConfig> {
        let categories = if self.categories.is_empty() {
            Category::ALL.to_vec()
        } else {
            let mut cats: Vec<Category> = self.categories.iter().map(|c| Category::from(*c)).collect();
            cats.sort();
            cats.dedup();
            cats
        };

        Ok(ScrapeConfig {
            location_name: self.location_name.clone(),
            location_id: self.location_id.clone(),
            location_tag: self.location_tag.clone(),
            city: self.city.clone(),
            categories,
            max_pages: self.max_pages,
            base_url: BASE_URL.to_string(),
            data_dir: self.data_dir.clone(),
            db_path: self.db_path.clone(),
            page_delay: if self.no_delay { DelayRange::none() } else { DelayRange::default() },
            marker: self.marker()?,
        })
    }

    pub fn aggregate_config(&self) -> AggregateConfig {
        AggregateConfig {
            bargain_threshold_pct: self.bargain_threshold,
        }
    }
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    #[arg(long, default_value_t = DEFAULT_BARGAIN_THRESHOLD_PCT, allow_hyphen_values = true)]
    pub bargain_threshold: f64,

    /// Z-score cutoff of the secondary bargain screen
    #[arg(long, default_value_t = DEFAULT_Z_SCORE_THRESHOLD, allow_hyphen_values = true)]
    pub z_threshold: f64,

    /// Plot size for the bottom-up estimate (sq yd)
    #[arg(long)]
    pub plot_size: Option<f64>,

    #[arg(long)]
    pub floors: Option<u32>,

    /// Share of the plot covered per floor (0-1)
    #[arg(long)]
    pub coverage: Option<f64>,

    /// Build rate per sq ft, low end
    #[arg(long)]
    pub rate_low: Option<f64>,

    /// Build rate per sq ft, high end
    #[arg(long)]
    pub rate_high: Option<f64>,
}

impl AnalyzeArgs {
    pub fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            aggregate: AggregateConfig {
                bargain_threshold_pct: self.bargain_threshold,
            },
            z_score_threshold: self.z_threshold,
        }
    }

    pub fn assumptions(&self) -> ConstructionAssumptions {
        let d = ConstructionAssumptions::default();
        ConstructionAssumptions {
            plot_size_sq_yd: self.plot_size.unwrap_or(d.plot_size_sq_yd),
            floors: self.floors.unwrap_or(d.floors),
            coverage_ratio: self.coverage.unwrap_or(d.coverage_ratio),
            cost_per_sq_ft_low: self.rate_low.unwrap_or(d.cost_per_sq_ft_low),
            cost_per_sq_ft_high: self.rate_high.unwrap_or(d.cost_per_sq_ft_high),
            ..d
        }
    }
}

#[derive(Args, Debug)]
pub struct RunsArgs {
    #[arg(long = "db", default_value = "data/scrapes.sqlite3")]
    pub db_path: PathBuf,

    #[arg(long, default_value_t = 50)]
    pub limit: u32,
}
