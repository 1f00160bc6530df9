// Pages in, report out: pagination, extraction and aggregation together.

use crate::config::{AggregateConfig, DelayRange, ExtractConfig};
use crate::domain::aggregate::aggregate;
use crate::domain::listing::{Category, IdentityKey};
use crate::scraper::{paginate, ExtractError};
use crate::tests::utils::{hits_page, listing_json};
use serde_json::json;

fn scrape(pages: Vec<String>) -> crate::scraper::PaginatedResult {
    let config = ExtractConfig::new(Category::ResidentialBuilt, "bahria_town_precinct_8");
    paginate(10, DelayRange::none(), &config, |page| {
        Ok(pages
            .get(page as usize - 1)
            .cloned()
            .unwrap_or_else(|| hits_page(&[])))
    })
}

#[test]
fn two_pages_with_one_malformed_element() {
    let pages = vec![
        hits_page(&[
            listing_json(1, 8_000_000.0, 100.0),
            listing_json(2, 10_000_000.0, 100.0),
            json!({"id": 3, "title": "No price here", "area": 100, "areaUnit": "sq yd"}),
        ]),
        hits_page(&[
            listing_json(4, 10_000_000.0, 100.0),
            listing_json(5, 12_000_000.0, 100.0),
            listing_json(6, 9_000_000.0, 100.0),
        ]),
    ];

    let scraped = scrape(pages);
    assert_eq!(scraped.pages_fetched, 3);
    assert_eq!(scraped.records.len(), 5);
    assert!(matches!(
        scraped.diagnostics.as_slice(),
        [ExtractError::FieldExtractionFailed { index: 2, .. }]
    ));

    let report = aggregate(scraped.records, &AggregateConfig::default());
    let houses = report.partition(Category::ResidentialBuilt);

    assert_eq!(houses.summary.count, 5);
    assert_eq!(houses.summary.median_cost_per_sq_yd, Some(100_000.0));
    assert_eq!(houses.summary.median_price, Some(10_000_000.0));
    assert_eq!(houses.summary.mean_price, Some(9_800_000.0));

    let bargain_ids: Vec<String> = houses
        .bargains()
        .map(|l| l.record.identity_key.to_string())
        .collect();
    assert_eq!(bargain_ids, vec!["1", "6"]);

    assert_eq!(report.partition(Category::LandParcel).summary.count, 0);
}

#[test]
fn listing_repeated_across_pages_counts_once() {
    let pages = vec![
        hits_page(&[
            listing_json(10, 9_000_000.0, 100.0),
            listing_json(11, 11_000_000.0, 100.0),
        ]),
        hits_page(&[
            listing_json(11, 11_000_000.0, 100.0),
            listing_json(12, 10_000_000.0, 100.0),
        ]),
    ];

    let scraped = scrape(pages);
    assert_eq!(scraped.records.len(), 4);

    let report = aggregate(scraped.records, &AggregateConfig::default());
    assert_eq!(report.duplicates_removed, 1);

    let houses = report.partition(Category::ResidentialBuilt);
    assert_eq!(houses.summary.count, 3);
    assert!(houses
        .listings
        .iter()
        .any(|l| l.record.identity_key == IdentityKey::ListingId("11".into())));
}
