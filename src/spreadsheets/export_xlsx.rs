use crate::domain::aggregate::{AggregatedListing, PartitionReport, SummaryStatistics};
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};
use std::path::Path;

/// Context printed on the Summary sheet.
#[derive(Debug, Clone)]
pub struct ExportContext<'a> {
    pub location: &'a str,
    pub scraped_at: DateTime<Utc>,
    pub bargain_threshold_pct: f64,
}

const PROPERTY_HEADERS: [&str; 19] = [
    "Listing ID",
    "Title",
    "Price",
    "Area (sq yd)",
    "Source Unit",
    "Cost per Sq Yd",
    "Variance from Median",
    "Pct Variance from Median",
    "Bargain",
    "Bedrooms",
    "Bathrooms",
    "Location",
    "Location Detail",
    "Property Type",
    "Days on Market",
    "Grey Structure",
    "Agency",
    "URL",
    "Description",
];

/// Writes one category's partition to `path` as a Summary sheet and a
/// Properties sheet (rows in the partition's canonical order).
pub fn export_partition_xlsx(report: &PartitionReport, ctx: &ExportContext<'_>, path: &Path) -> AppResult<()> {
    let mut workbook = build_workbook(report, ctx)?;
    workbook
        .save(path)
        .map_err(|e| AppError::XlsxError(format!("Failed to save {}: {e}", path.display())))
}

pub fn build_workbook(report: &PartitionReport, ctx: &ExportContext<'_>) -> AppResult<Workbook> {
    let mut workbook = Workbook::new();

    let summary = workbook.add_worksheet();
    write_summary(summary, report, ctx)
        .map_err(|e| AppError::XlsxError(format!("Failed to write summary sheet: {e}")))?;

    let properties = workbook.add_worksheet();
    write_properties(properties, &report.listings, ctx.scraped_at)
        .map_err(|e| AppError::XlsxError(format!("Failed to write properties sheet: {e}")))?;

    Ok(workbook)
}

fn write_summary(
    sheet: &mut Worksheet,
    report: &PartitionReport,
    ctx: &ExportContext<'_>,
) -> Result<(), XlsxError> {
    sheet.set_name("Summary")?;
    sheet.write_string(0, 0, "Metric")?;
    sheet.write_string(0, 1, "Value")?;

    let s: &SummaryStatistics = &report.summary;
    let bargains = report.bargains().count();

    let rows: Vec<(&str, String)> = vec![
        ("Location", ctx.location.to_string()),
        ("Category", report.category.to_string()),
        ("Total Properties", s.count.to_string()),
        ("Median Price (PKR)", money(s.median_price)),
        ("Average Price (PKR)", money(s.mean_price)),
        ("Median Price per Sq Yd (PKR)", money(s.median_cost_per_sq_yd)),
        ("Average Price per Sq Yd (PKR)", money(s.mean_cost_per_sq_yd)),
        ("Min Price (PKR)", money(s.min_price)),
        ("Max Price (PKR)", money(s.max_price)),
        ("Bargain Candidates", bargains.to_string()),
        ("Bargain Threshold (%)", format!("{:.1}", ctx.bargain_threshold_pct)),
        ("Excluded (no finite cost)", s.excluded.to_string()),
        ("Scraped Date", ctx.scraped_at.format("%Y-%m-%d %H:%M:%S").to_string()),
    ];

    for (i, (metric, value)) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        sheet.write_string(r, 0, *metric)?;
        sheet.write_string(r, 1, value)?;
    }

    sheet.set_column_width(0, 30)?;
    sheet.set_column_width(1, 25)?;
    Ok(())
}

fn write_properties(
    sheet: &mut Worksheet,
    listings: &[AggregatedListing],
    now: DateTime<Utc>,
) -> Result<(), XlsxError> {
    sheet.set_name("Properties")?;

    for (col, header) in PROPERTY_HEADERS.iter().enumerate() {
        sheet.write_string(0, col as u16, *header)?;
    }

    for (i, listing) in listings.iter().enumerate() {
        let r = (i + 1) as u32;
        let rec = &listing.record;
        let m = listing.metrics.as_ref();

        sheet.write_string(r, 0, rec.identity_key.to_string())?;
        write_opt_string(sheet, r, 1, rec.title.as_deref())?;
        sheet.write_number(r, 2, rec.price)?;
        sheet.write_number(r, 3, rec.area_sq_yd)?;
        sheet.write_string(r, 4, rec.source_unit.to_string())?;
        write_opt_number(sheet, r, 5, m.map(|m| m.cost_per_sq_yd))?;
        write_opt_number(sheet, r, 6, m.map(|m| m.variance_from_median))?;
        write_opt_number(sheet, r, 7, m.map(|m| (m.pct_variance * 10.0).round() / 10.0))?;
        sheet.write_string(r, 8, yes_no(m.is_some_and(|m| m.is_bargain)))?;
        write_opt_number(sheet, r, 9, rec.bedrooms.map(|b| b as f64))?;
        write_opt_number(sheet, r, 10, rec.bathrooms.map(|b| b as f64))?;
        sheet.write_string(r, 11, &rec.location_tag)?;
        write_opt_string(sheet, r, 12, rec.location_detail.as_deref())?;
        write_opt_string(sheet, r, 13, rec.property_type.as_deref())?;
        write_opt_number(sheet, r, 14, rec.days_on_market(now).map(|d| d as f64))?;
        sheet.write_string(r, 15, yes_no(rec.is_grey_structure))?;
        write_opt_string(sheet, r, 16, rec.agency_name.as_deref())?;
        write_opt_string(sheet, r, 17, rec.url.as_deref())?;
        write_opt_string(sheet, r, 18, rec.short_description.as_deref())?;
    }

    Ok(())
}

fn write_opt_string(sheet: &mut Worksheet, row: u32, col: u16, value: Option<&str>) -> Result<(), XlsxError> {
    if let Some(v) = value {
        sheet.write_string(row, col, v)?;
    }
    Ok(())
}

fn write_opt_number(sheet: &mut Worksheet, row: u32, col: u16, value: Option<f64>) -> Result<(), XlsxError> {
    if let Some(v) = value {
        sheet.write_number(row, col, v)?;
    }
    Ok(())
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

/// Whole rupees with thousands separators, or "N/A".
pub fn money(value: Option<f64>) -> String {
    let Some(v) = value else {
        return "N/A".to_string();
    };
    let rounded = v.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if rounded < 0 {
        out.insert(0, '-');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AggregateConfig;
    use crate::domain::aggregate::aggregate;
    use crate::domain::listing::Category;
    use crate::tests::utils::record;
    use chrono::TimeZone;

    fn ctx() -> ExportContext<'static> {
        ExportContext {
            location: "bahria_town_precinct_8",
            scraped_at: Utc.with_ymd_and_hms(2025, 11, 11, 12, 43, 25).unwrap(),
            bargain_threshold_pct: -10.0,
        }
    }

    #[test]
    fn money_groups_thousands() {
        assert_eq!(money(Some(12_500_000.4)), "12,500,000");
        assert_eq!(money(Some(999.0)), "999");
        assert_eq!(money(Some(-1_000.0)), "-1,000");
        assert_eq!(money(None), "N/A");
    }

    #[test]
    fn writes_workbook_to_disk() {
        let records = vec![
            record("a", Category::ResidentialBuilt, 9_000_000.0, 100.0),
            record("b", Category::ResidentialBuilt, 12_000_000.0, 100.0),
        ];
        let report = aggregate(records, &AggregateConfig::default());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("houses.xlsx");

        export_partition_xlsx(report.partition(Category::ResidentialBuilt), &ctx(), &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"PK"), "xlsx files are zip archives");
    }

    #[test]
    fn empty_partition_still_exports() {
        let report = aggregate(Vec::new(), &AggregateConfig::default());
        let mut workbook = build_workbook(report.partition(Category::LandParcel), &ctx()).unwrap();
        let buffer = workbook.save_to_buffer().unwrap();
        assert!(!buffer.is_empty());
    }
}
