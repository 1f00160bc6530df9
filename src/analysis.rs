// analysis.rs
//
// Cross-location report over the newest run folder of every location in
// the data dir. Reads only the JSON snapshots written by `scrape`.

use crate::config::AnalysisConfig;
use crate::domain::aggregate::{aggregate, PartitionReport, SummaryStatistics};
use crate::domain::construction::{
    bottom_up_estimate, implied_construction_cost, BottomUpEstimate, ConstructionAssumptions,
    ImpliedConstructionCost,
};
use crate::domain::listing::Category;
use crate::domain::market::{
    by_bedrooms, by_location, size_vs_price, zscore_screen, GroupSummary, SizeVsPrice, ZScoreScreen,
};
use crate::errors::AppResult;
use crate::runs::{display_name, latest_run_folder, location_dirs, read_snapshot};
use crate::spreadsheets::money;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const SUMMARY_FILE: &str = "analysis_summary.json";

#[derive(Debug, Clone, Serialize)]
pub struct CategoryAnalysis {
    pub summary: SummaryStatistics,
    pub bargains: usize,
    /// Bargains as a share of comparable listings; `None` when there are none.
    pub bargain_pct: Option<f64>,
    pub zscore: Option<ZScoreScreen>,
    pub by_bedrooms: Vec<GroupSummary<i64>>,
    pub by_location: Vec<GroupSummary<String>>,
}

impl CategoryAnalysis {
    fn from_partition(partition: &PartitionReport, z_score_threshold: f64) -> Self {
        let bargains = partition.bargains().count();
        let count = partition.summary.count;
        Self {
            summary: partition.summary.clone(),
            bargains,
            bargain_pct: (count > 0).then(|| bargains as f64 * 100.0 / count as f64),
            zscore: zscore_screen(partition, z_score_threshold),
            by_bedrooms: by_bedrooms(partition),
            by_location: by_location(partition),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationAnalysis {
    pub location: String,
    pub run_folder: PathBuf,
    pub houses: Option<CategoryAnalysis>,
    pub plots: Option<CategoryAnalysis>,
    /// Price against size over finished houses.
    pub size_vs_price: Option<SizeVsPrice>,
    pub implied_construction: Option<ImpliedConstructionCost>,
    pub bottom_up: Option<BottomUpEstimate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub bargain_threshold_pct: f64,
    pub z_score_threshold: f64,
    pub assumptions: ConstructionAssumptions,
    pub locations: Vec<LocationAnalysis>,
}

/// Analyses the latest run of one location; `None` when it has no runs.
/// A snapshot that cannot be read is logged and left out.
pub fn analyze_location(
    location_dir: &Path,
    config: &AnalysisConfig,
    assumptions: &ConstructionAssumptions,
) -> AppResult<Option<LocationAnalysis>> {
    let location = location_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let Some(run_folder) = latest_run_folder(location_dir)? else {
        warn!("⚠️ No run folders found in {location}");
        return Ok(None);
    };

    let mut records = Vec::new();
    let mut loaded = Vec::new();
    for category in Category::ALL {
        match read_snapshot(&run_folder, category) {
            Ok(Some(batch)) => {
                info!("✅ Loaded {} {category} from {}", batch.len(), run_folder.display());
                records.extend(batch);
                loaded.push(category);
            }
            Ok(None) => warn!("⚠️ {location}: no {category} snapshot"),
            Err(e) => warn!("⚠️ {location}: skipping unreadable {category} snapshot: {e}"),
        }
    }

    let report = aggregate(records, &config.aggregate);
    let category_analysis = |category: Category| {
        loaded
            .contains(&category)
            .then(|| CategoryAnalysis::from_partition(report.partition(category), config.z_score_threshold))
    };

    let houses = report.partition(Category::ResidentialBuilt);
    let plots = report.partition(Category::LandParcel);
    let implied_construction = implied_construction_cost(houses, plots);
    let bottom_up = plots
        .summary
        .median_cost_per_sq_yd
        .map(|plot_rate| bottom_up_estimate(assumptions, plot_rate));

    Ok(Some(LocationAnalysis {
        houses: category_analysis(Category::ResidentialBuilt),
        plots: category_analysis(Category::LandParcel),
        size_vs_price: size_vs_price(houses),
        location,
        run_folder,
        implied_construction,
        bottom_up,
    }))
}

/// Every location folder under `data_dir`. A location that fails is logged
/// and skipped so the others are still reported.
pub fn analyze_data_dir(
    data_dir: &Path,
    config: &AnalysisConfig,
    assumptions: &ConstructionAssumptions,
    now: DateTime<Utc>,
) -> AppResult<AnalysisReport> {
    let mut locations = Vec::new();
    for dir in location_dirs(data_dir)? {
        match analyze_location(&dir, config, assumptions) {
            Ok(Some(analysis)) => locations.push(analysis),
            Ok(None) => {}
            Err(e) => warn!("⚠️ Skipping {}: {e}", dir.display()),
        }
    }

    Ok(AnalysisReport {
        generated_at: now,
        bargain_threshold_pct: config.aggregate.bargain_threshold_pct,
        z_score_threshold: config.z_score_threshold,
        assumptions: assumptions.clone(),
        locations,
    })
}

pub fn write_summary_json(data_dir: &Path, report: &AnalysisReport) -> AppResult<PathBuf> {
    let path = data_dir.join(SUMMARY_FILE);
    std::fs::write(&path, serde_json::to_string_pretty(report)?)?;
    Ok(path)
}

pub fn print_report(report: &AnalysisReport) {
    let rule = "=".repeat(70);

    println!("{rule}");
    println!("LOCATION ANALYSIS ({} locations)", report.locations.len());
    println!("{rule}");

    for loc in &report.locations {
        println!("\n{}  [{}]", display_name(&loc.location), loc.run_folder.display());

        for (label, analysis) in [("Houses", &loc.houses), ("Plots", &loc.plots)] {
            match analysis {
                Some(a) => println!(
                    "  {label:<7} {:>4} listings | median PKR {:>12}/sq yd | {} bargains ({})",
                    a.summary.count,
                    money(a.summary.median_cost_per_sq_yd),
                    a.bargains,
                    a.bargain_pct
                        .map(|p| format!("{p:.1}%"))
                        .unwrap_or_else(|| "N/A".into()),
                ),
                None => println!("  {label:<7} no data"),
            }
            if let Some(z) = analysis.as_ref().and_then(|a| a.zscore.as_ref()) {
                println!(
                    "          z < {:.1}: {} of {} finished ({:.1}%), std PKR {}/sq yd, p10-p90 {} - {}",
                    z.threshold,
                    z.n_bargains,
                    z.n_listings,
                    z.bargain_pct,
                    money(Some(z.std_cost_per_sq_yd)),
                    money(Some(z.p10_cost_per_sq_yd)),
                    money(Some(z.p90_cost_per_sq_yd)),
                );
            }
        }

        if let Some(s) = &loc.size_vs_price {
            match &s.fit {
                Some(fit) => println!(
                    "  Size vs price:        price = {} * sq yd + {} (R² {:.3}, {} houses)",
                    money(Some(fit.slope)),
                    money(Some(fit.intercept)),
                    fit.r_squared,
                    s.n_listings
                ),
                None => println!("  Size vs price:        no fit (all {} houses the same size)", s.n_listings),
            }
            println!(
                "                        size p25-p75 {:.0} - {:.0} sq yd, price p25-p75 PKR {} - {}",
                s.size_sq_yd.p25,
                s.size_sq_yd.p75,
                money(Some(s.price.p25)),
                money(Some(s.price.p75)),
            );
        }

        if let Some(houses) = &loc.houses {
            for g in &houses.by_bedrooms {
                println!(
                    "  {:>2} bed: {:>3} houses, avg PKR {} (PKR {} - {})",
                    g.key,
                    g.count,
                    money(Some(g.mean)),
                    money(Some(g.min)),
                    money(Some(g.max)),
                );
            }
            for g in houses.by_location.iter().take(10) {
                println!(
                    "  {:<30} {:>3} houses, avg PKR {}/sq yd",
                    g.key,
                    g.count,
                    money(Some(g.mean)),
                );
            }
        }

        match &loc.implied_construction {
            Some(c) => {
                println!(
                    "  Implied construction: PKR {}/sq yd (p25 {}, p75 {}) over {} houses, {} grey structures excluded",
                    money(Some(c.median_cost_per_sq_yd)),
                    money(Some(c.p25_cost_per_sq_yd)),
                    money(Some(c.p75_cost_per_sq_yd)),
                    c.n_houses,
                    c.n_grey_structures
                );
            }
            None => println!("  Implied construction: N/A (needs houses and plots)"),
        }

        if let Some(b) = &loc.bottom_up {
            println!(
                "  Bottom-up build:      PKR {} - {} (+ land {} = {} - {})",
                money(Some(b.total_build.low)),
                money(Some(b.total_build.high)),
                money(Some(b.land_cost)),
                money(Some(b.total_project.low)),
                money(Some(b.total_project.high)),
            );
        }
    }

    println!("\n{rule}");
}
