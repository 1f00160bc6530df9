use crate::cli::{AnalyzeArgs, Cli, Command, RunsArgs, ScrapeArgs};
use crate::config::{AggregateConfig, ScrapeConfig};
use crate::db::scrapes::{end_scrape_run, get_recent_scrapes, start_scrape_run, ScrapeRunEnd};
use crate::db::{init_db, Database};
use crate::domain::aggregate::{aggregate, PartitionReport};
use crate::domain::listing::{Category, ListingRecord};
use crate::errors::AppResult;
use crate::runs::{CategoryOutcome, RunSummary};
use crate::scraper::ZameenScraper;
use crate::spreadsheets::{export_partition_xlsx, money, ExportContext};
use anyhow::Context;
use chrono::{DateTime, Local, Utc};
use clap::Parser;
use std::path::Path;
use tracing::info;

mod analysis;
mod cli;
mod config;
mod db;
mod domain;
mod errors;
mod logging;
mod runs;
mod scraper;
mod spreadsheets;

#[cfg(test)]
mod tests;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(&cli.log_level);

    match cli.command {
        Command::Scrape(args) => scrape(&args),
        Command::Analyze(args) => analyze(&args),
        Command::Runs(args) => list_runs(&args),
    }
}

fn scrape(args: &ScrapeArgs) -> anyhow::Result<()> {
    let config = args.scrape_config().context("invalid scrape options")?;
    let agg_config = args.aggregate_config();

    let db = Database::new(&config.db_path);
    init_db(&db).with_context(|| format!("opening ledger {}", config.db_path.display()))?;

    let scraper = ZameenScraper::new().context("building HTTP client")?;

    let started = Local::now();
    let run_folder = runs::create_run_folder(&config.data_dir, &config.location_tag, started)
        .context("creating run folder")?;
    info!("📁 Run folder: {}", run_folder.display());

    let outcomes = runs::scrape_categories(&config.categories, |category| {
        let run_id = db.with_conn(|conn| {
            start_scrape_run(
                conn,
                &config.location_tag,
                category.file_stem(),
                &run_folder.to_string_lossy(),
                Utc::now().timestamp(),
            )
        })?;

        let result = scrape_category(&scraper, &config, &agg_config, category, &run_folder, started);

        let end = match &result {
            Ok(outcome) => ScrapeRunEnd {
                finished_at: Utc::now().timestamp(),
                pages_fetched: outcome.pages_fetched,
                listings_seen: outcome.count,
                success: outcome.aborted.is_none(),
                error_message: outcome.aborted.clone(),
            },
            Err(e) => ScrapeRunEnd {
                finished_at: Utc::now().timestamp(),
                pages_fetched: 0,
                listings_seen: 0,
                success: false,
                error_message: Some(e.to_string()),
            },
        };
        db.with_conn(|conn| end_scrape_run(conn, run_id, &end))?;
        result
    });

    let summary = RunSummary {
        location_tag: &config.location_tag,
        location_id: &config.location_id,
        scraped_at: started,
        max_pages: config.max_pages,
        outcomes,
    };
    runs::write_readme(&run_folder, &summary)?;

    println!("\n✓ Scraping complete: {} properties", summary.total());
    println!("✓ All data saved to: {}", run_folder.display());

    let failed: Vec<String> = summary.failures().map(|o| o.category.to_string()).collect();
    if !failed.is_empty() {
        anyhow::bail!("{} categories failed: {}", failed.len(), failed.join(", "));
    }
    Ok(())
}

fn scrape_category(
    scraper: &ZameenScraper,
    config: &ScrapeConfig,
    agg_config: &AggregateConfig,
    category: Category,
    run_folder: &Path,
    started: DateTime<Local>,
) -> AppResult<CategoryOutcome> {
    info!("🔎 Scraping {category} for {}", config.location_tag);
    let scraped = scraper.scrape_category(config, category);
    if !scraped.diagnostics.is_empty() {
        info!("{} listing elements skipped", scraped.diagnostics.len());
    }

    let report = aggregate(scraped.records, agg_config);
    if report.duplicates_removed > 0 {
        info!("{} duplicate listings removed", report.duplicates_removed);
    }
    let partition = report.partition(category);

    let ctx = ExportContext {
        location: &config.location_tag,
        scraped_at: started.with_timezone(&Utc),
        bargain_threshold_pct: agg_config.bargain_threshold_pct,
    };
    let xlsx = runs::xlsx_path(run_folder, category);
    export_partition_xlsx(partition, &ctx, &xlsx)?;
    info!("✅ Wrote {}", xlsx.display());

    let records: Vec<ListingRecord> = partition.listings.iter().map(|l| l.record.clone()).collect();
    runs::write_snapshot(run_folder, category, &records)?;

    print_partition(partition);

    Ok(CategoryOutcome {
        category,
        count: partition.listings.len(),
        pages_fetched: scraped.pages_fetched,
        aborted: scraped.aborted,
        error: None,
    })
}

fn print_partition(partition: &PartitionReport) {
    let s = &partition.summary;
    println!("\n{}", "=".repeat(70));
    println!("{}", partition.category);
    println!("{}", "=".repeat(70));
    println!("  Properties:              {}", s.count);
    println!("  Median price:            PKR {}", money(s.median_price));
    println!("  Average price:           PKR {}", money(s.mean_price));
    println!("  Median price per sq yd:  PKR {}", money(s.median_cost_per_sq_yd));
    println!("  Price range:             PKR {} - {}", money(s.min_price), money(s.max_price));
    if s.excluded > 0 {
        println!("  Excluded:                {}", s.excluded);
    }

    let bargains: Vec<_> = partition.bargains().collect();
    println!("  Bargain candidates:      {}", bargains.len());
    for listing in bargains.iter().take(5) {
        let Some(m) = listing.metrics else { continue };
        println!(
            "    {:>6.1}%  PKR {:>12}/sq yd  {}",
            m.pct_variance,
            money(Some(m.cost_per_sq_yd)),
            listing.record.title.as_deref().unwrap_or("(untitled)")
        );
    }
}

fn analyze(args: &AnalyzeArgs) -> anyhow::Result<()> {
    let report = analysis::analyze_data_dir(
        &args.data_dir,
        &args.analysis_config(),
        &args.assumptions(),
        Utc::now(),
    )
    .with_context(|| format!("analyzing {}", args.data_dir.display()))?;

    if report.locations.is_empty() {
        println!("⚠ No run folders found in {}", args.data_dir.display());
        return Ok(());
    }

    analysis::print_report(&report);
    let path = analysis::write_summary_json(&args.data_dir, &report)?;
    println!("✓ Summary saved to {}", path.display());
    Ok(())
}

fn list_runs(args: &RunsArgs) -> anyhow::Result<()> {
    let db = Database::new(&args.db_path);
    init_db(&db)?;
    let runs = db.with_conn(|conn| get_recent_scrapes(conn, args.limit))?;

    if runs.is_empty() {
        println!("No scrape runs recorded in {}", args.db_path.display());
        return Ok(());
    }

    println!(
        "{:>5}  {:<19}  {:<30}  {:<7}  {:>5}  {:>8}  STATUS",
        "ID", "STARTED", "LOCATION", "TYPE", "PAGES", "LISTINGS"
    );
    for run in runs {
        let started = DateTime::<Utc>::from_timestamp(run.started_at, 0)
            .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| run.started_at.to_string());
        let status = match (run.finished_at, run.success) {
            (None, _) => "unfinished".to_string(),
            (Some(_), true) => "ok".to_string(),
            (Some(_), false) => format!("failed: {}", run.error_message.unwrap_or_default()),
        };
        println!(
            "{:>5}  {:<19}  {:<30}  {:<7}  {:>5}  {:>8}  {}",
            run.id,
            started,
            run.location,
            run.category,
            run.pages_fetched.unwrap_or(0),
            run.listings_seen.unwrap_or(0),
            status
        );
        if let Some(folder) = &run.run_folder {
            println!("{:>5}  {folder}", "");
        }
    }
    Ok(())
}
