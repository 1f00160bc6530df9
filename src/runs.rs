// runs.rs
//
// On-disk layout of scrape output:
//
//   <data_dir>/<location_tag>/<YYYY-MM-DD_HHMMSS>/
//       houses.xlsx  houses.json
//       plots.xlsx   plots.json
//       README.txt

use crate::domain::listing::{Category, ListingRecord};
use crate::errors::AppResult;
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

pub const RUN_FOLDER_FORMAT: &str = "%Y-%m-%d_%H%M%S";

pub fn run_folder_name(at: DateTime<Local>) -> String {
    at.format(RUN_FOLDER_FORMAT).to_string()
}

pub fn create_run_folder(data_dir: &Path, location_tag: &str, at: DateTime<Local>) -> AppResult<PathBuf> {
    let folder = data_dir.join(location_tag).join(run_folder_name(at));
    fs::create_dir_all(&folder)?;
    debug!("run folder {}", folder.display());
    Ok(folder)
}

pub fn xlsx_path(run_folder: &Path, category: Category) -> PathBuf {
    run_folder.join(format!("{}.xlsx", category.file_stem()))
}

pub fn snapshot_path(run_folder: &Path, category: Category) -> PathBuf {
    run_folder.join(format!("{}.json", category.file_stem()))
}

/// Saves the records of one category so the run can be re-aggregated later.
pub fn write_snapshot(run_folder: &Path, category: Category, records: &[ListingRecord]) -> AppResult<PathBuf> {
    let path = snapshot_path(run_folder, category);
    let json = serde_json::to_string_pretty(records)?;
    fs::write(&path, json)?;
    Ok(path)
}

/// `None` when the run has no snapshot for `category`.
pub fn read_snapshot(run_folder: &Path, category: Category) -> AppResult<Option<Vec<ListingRecord>>> {
    let path = snapshot_path(run_folder, category);
    if !path.is_file() {
        return Ok(None);
    }
    let text = fs::read_to_string(&path)?;
    Ok(Some(serde_json::from_str(&text)?))
}

/// Per-category line of the run README.
#[derive(Debug, Clone)]
pub struct CategoryOutcome {
    pub category: Category,
    pub count: usize,
    pub pages_fetched: u32,
    /// Pagination stopped early on repeated fetch failures.
    pub aborted: Option<String>,
    /// The category could not be scraped or written at all.
    pub error: Option<String>,
}

impl CategoryOutcome {
    pub fn failed(category: Category, error: impl Into<String>) -> Self {
        Self {
            category,
            count: 0,
            pages_fetched: 0,
            aborted: None,
            error: Some(error.into()),
        }
    }
}

/// Runs `scrape_one` for every category in order. A failing category is
/// logged and recorded, and the remaining categories still run.
pub fn scrape_categories<F>(categories: &[Category], mut scrape_one: F) -> Vec<CategoryOutcome>
where
    F: FnMut(Category) -> AppResult<CategoryOutcome>,
{
    categories
        .iter()
        .map(|&category| match scrape_one(category) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("❌ {category} failed: {e}");
                CategoryOutcome::failed(category, e.to_string())
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct RunSummary<'a> {
    pub location_tag: &'a str,
    pub location_id: &'a str,
    pub scraped_at: DateTime<Local>,
    pub max_pages: u32,
    pub outcomes: Vec<CategoryOutcome>,
}

impl RunSummary<'_> {
    pub fn total(&self) -> usize {
        self.outcomes.iter().map(|o| o.count).sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &CategoryOutcome> {
        self.outcomes.iter().filter(|o| o.error.is_some())
    }
}

pub fn render_readme(summary: &RunSummary<'_>) -> String {
    let mut out = format!(
        "Zameen.com Scraper Run\n{}\n\n\
         Run Date: {}\n\
         Location: {}\n\
         Location ID: {}\n\
         Pages Scraped: up to {} per category\n\n\
         Results:\n",
        "=".repeat(50),
        summary.scraped_at.format("%Y-%m-%d %H:%M:%S"),
        display_name(summary.location_tag),
        summary.location_id,
        summary.max_pages,
    );

    for o in &summary.outcomes {
        out.push_str(&format!(
            "  - {}: {} properties ({} pages)",
            o.category, o.count, o.pages_fetched
        ));
        if let Some(reason) = &o.aborted {
            out.push_str(&format!(" [aborted: {reason}]"));
        }
        if let Some(error) = &o.error {
            out.push_str(&format!(" [failed: {error}]"));
        }
        out.push('\n');
    }

    out.push_str(&format!("\nTotal Properties: {}\n", summary.total()));
    out
}

pub fn write_readme(run_folder: &Path, summary: &RunSummary<'_>) -> AppResult<PathBuf> {
    let path = run_folder.join("README.txt");
    fs::write(&path, render_readme(summary))?;
    Ok(path)
}

/// "bahria_town_precinct_8" -> "Bahria Town Precinct 8"
pub fn display_name(tag: &str) -> String {
    tag.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Location folders under `data_dir`, sorted by name.
pub fn location_dirs(data_dir: &Path) -> AppResult<Vec<PathBuf>> {
    if !data_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut dirs = Vec::new();
    for entry in fs::read_dir(data_dir)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Newest run folder of one location. Folder names sort chronologically.
pub fn latest_run_folder(location_dir: &Path) -> AppResult<Option<PathBuf>> {
    let mut latest: Option<PathBuf> = None;
    for entry in fs::read_dir(location_dir)? {
        let path = entry?.path();
        let is_run = path.is_dir()
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| chrono::NaiveDateTime::parse_from_str(n, RUN_FOLDER_FORMAT).is_ok());
        if is_run && latest.as_ref().map_or(true, |l| path > *l) {
            latest = Some(path);
        }
    }
    Ok(latest)
}
