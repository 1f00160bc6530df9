// src/domain/aggregate.rs

use crate::config::AggregateConfig;
use crate::domain::listing::{Category, IdentityKey, ListingRecord};
use crate::domain::stats;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

/// Statistics for one (location, category) batch.
///
/// Numeric fields are `None` when the batch had no comparable records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStatistics {
    pub count: usize,
    pub median_price: Option<f64>,
    pub mean_price: Option<f64>,
    pub median_cost_per_sq_yd: Option<f64>,
    pub mean_cost_per_sq_yd: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Records left out because their cost per square yard was not finite.
    pub excluded: usize,
}

impl SummaryStatistics {
    pub fn undefined() -> Self {
        Self {
            count: 0,
            median_price: None,
            mean_price: None,
            median_cost_per_sq_yd: None,
            mean_cost_per_sq_yd: None,
            min_price: None,
            max_price: None,
            excluded: 0,
        }
    }
}

/// Per-record metrics relative to the partition median.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedMetrics {
    pub cost_per_sq_yd: f64,
    pub variance_from_median: f64,
    pub pct_variance: f64,
    pub is_bargain: bool,
}

/// A record with its metrics. `metrics` is `None` for records whose cost per
/// square yard could not be computed as a finite number.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedListing {
    pub record: ListingRecord,
    pub metrics: Option<DerivedMetrics>,
}

/// Output for one category.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionReport {
    pub category: Category,
    pub summary: SummaryStatistics,
    /// Ordered by `pct_variance` ascending, records without metrics last.
    pub listings: Vec<AggregatedListing>,
}

impl PartitionReport {
    pub fn bargains(&self) -> impl Iterator<Item = &AggregatedListing> {
        self.listings
            .iter()
            .filter(|l| l.metrics.is_some_and(|m| m.is_bargain))
    }
}

/// Output of one aggregation run, one partition per category.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateReport {
    pub partitions: BTreeMap<Category, PartitionReport>,
    /// Input records dropped as repeats of an earlier identity key.
    pub duplicates_removed: usize,
}

impl AggregateReport {
    /// Every category has a partition, possibly empty.
    pub fn partition(&self, category: Category) -> &PartitionReport {
        &self.partitions[&category]
    }
}

/// Deduplicates, partitions by category and computes summary statistics and
/// per-record metrics. Pure: the same input always gives the same report.
pub fn aggregate(records: Vec<ListingRecord>, config: &AggregateConfig) -> AggregateReport {
    let input_len = records.len();
    let unique = dedupe(records);
    let duplicates_removed = input_len - unique.len();
    if duplicates_removed > 0 {
        debug!("dropped {duplicates_removed} duplicate listings");
    }

    let mut by_category: BTreeMap<Category, Vec<ListingRecord>> =
        Category::ALL.into_iter().map(|c| (c, Vec::new())).collect();
    for record in unique {
        by_category.entry(record.category).or_default().push(record);
    }

    let partitions = by_category
        .into_iter()
        .map(|(category, records)| (category, aggregate_partition(category, records, config)))
        .collect();

    AggregateReport {
        partitions,
        duplicates_removed,
    }
}

/// Keeps the first record seen for each identity key, preserving order.
/// Invalid records are dropped here as well.
pub fn dedupe(records: Vec<ListingRecord>) -> Vec<ListingRecord> {
    let mut seen: HashSet<IdentityKey> = HashSet::new();
    records
        .into_iter()
        .filter(ListingRecord::is_valid)
        .filter(|r| seen.insert(r.identity_key.clone()))
        .collect()
}

fn aggregate_partition(
    category: Category,
    records: Vec<ListingRecord>,
    config: &AggregateConfig,
) -> PartitionReport {
    let costs: Vec<Option<f64>> = records
        .iter()
        .map(|r| {
            let cost = r.price / r.area_sq_yd;
            cost.is_finite().then_some(cost)
        })
        .collect();

    let mut prices = Vec::with_capacity(records.len());
    let mut finite_costs = Vec::with_capacity(records.len());
    for (record, cost) in records.iter().zip(&costs) {
        match cost {
            Some(c) => {
                prices.push(record.price);
                finite_costs.push(*c);
            }
            None => warn!(
                "listing {} has no finite cost per sq yd (price {}, area {}); excluded",
                record.identity_key, record.price, record.area_sq_yd
            ),
        }
    }

    let summary = if finite_costs.is_empty() {
        SummaryStatistics {
            excluded: records.len(),
            ..SummaryStatistics::undefined()
        }
    } else {
        SummaryStatistics {
            count: finite_costs.len(),
            median_price: stats::median(&prices),
            mean_price: stats::mean(&prices),
            median_cost_per_sq_yd: stats::median(&finite_costs),
            mean_cost_per_sq_yd: stats::mean(&finite_costs),
            min_price: stats::min(&prices),
            max_price: stats::max(&prices),
            excluded: records.len() - finite_costs.len(),
        }
    };

    let median = summary.median_cost_per_sq_yd.filter(|m| *m > 0.0);
    let mut listings: Vec<AggregatedListing> = records
        .into_iter()
        .zip(costs)
        .map(|(record, cost)| {
            let metrics = match (cost, median) {
                (Some(c), Some(m)) => {
                    let metrics = derive_metrics(c, m, config.bargain_threshold_pct);
                    if metrics.is_none() {
                        warn!("listing {} has no finite variance from median; unranked", record.identity_key);
                    }
                    metrics
                }
                _ => None,
            };
            AggregatedListing { record, metrics }
        })
        .collect();

    // Stable, so equal variances keep their input order.
    listings.sort_by(|a, b| match (&a.metrics, &b.metrics) {
        (Some(x), Some(y)) => x.pct_variance.total_cmp(&y.pct_variance),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    PartitionReport {
        category,
        summary,
        listings,
    }
}

/// Metrics of one cost against the partition median. The threshold is
/// inclusive: exactly `threshold` percent below median is a bargain.
///
/// `None` when the variance or percentage is not finite.
pub fn derive_metrics(cost_per_sq_yd: f64, median: f64, bargain_threshold_pct: f64) -> Option<DerivedMetrics> {
    let variance_from_median = cost_per_sq_yd - median;
    // Scale before dividing so round-number inputs give exact percentages.
    let scaled = variance_from_median * 100.0 / median;
    let pct_variance = if scaled.is_finite() {
        scaled
    } else {
        variance_from_median / median * 100.0
    };
    if !(variance_from_median.is_finite() && pct_variance.is_finite()) {
        return None;
    }
    Some(DerivedMetrics {
        cost_per_sq_yd,
        variance_from_median,
        pct_variance,
        is_bargain: pct_variance <= bargain_threshold_pct,
    })
}
