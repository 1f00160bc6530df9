// src/domain/market.rs
//
// Secondary views over one aggregated partition: how price scales with
// size, a z-score bargain screen, and per-bedroom and per-sub-area
// breakdowns. They are reported next to the median-variance bargain flag
// and never change it.

use crate::domain::aggregate::{AggregatedListing, PartitionReport};
use crate::domain::stats::{self, LinearFit, Quartiles};
use serde::Serialize;
use std::collections::BTreeMap;

/// Price regressed on size over finished (non-grey) listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeVsPrice {
    pub n_listings: usize,
    pub n_grey_structures: usize,
    pub median_cost_per_sq_yd: f64,
    /// `None` when every listing has the same size.
    pub fit: Option<LinearFit>,
    pub size_sq_yd: Quartiles,
    pub price: Quartiles,
}

/// `None` when the partition has no finished listing.
pub fn size_vs_price(partition: &PartitionReport) -> Option<SizeVsPrice> {
    let (finished, grey): (Vec<&AggregatedListing>, Vec<_>) = partition
        .listings
        .iter()
        .partition(|l| !l.record.is_grey_structure);

    let sizes: Vec<f64> = finished.iter().map(|l| l.record.area_sq_yd).collect();
    let prices: Vec<f64> = finished.iter().map(|l| l.record.price).collect();
    let costs: Vec<f64> = finished
        .iter()
        .filter_map(|l| l.metrics)
        .map(|m| m.cost_per_sq_yd)
        .collect();

    Some(SizeVsPrice {
        n_listings: finished.len(),
        n_grey_structures: grey.len(),
        median_cost_per_sq_yd: stats::median(&costs)?,
        fit: stats::linear_fit(&sizes, &prices),
        size_sq_yd: stats::quartiles(&sizes)?,
        price: stats::quartiles(&prices)?,
    })
}

/// Listings far below the median in standard-deviation terms.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZScoreScreen {
    pub threshold: f64,
    pub n_listings: usize,
    pub n_grey_structures: usize,
    pub n_bargains: usize,
    pub bargain_pct: f64,
    pub median_cost_per_sq_yd: f64,
    pub std_cost_per_sq_yd: f64,
    pub p10_cost_per_sq_yd: f64,
    pub p90_cost_per_sq_yd: f64,
    pub min_bargain_cost_per_sq_yd: Option<f64>,
    pub max_bargain_cost_per_sq_yd: Option<f64>,
}

/// A finished listing is flagged when its cost per square yard is below the
/// finished-listing median and `(cost - median) / std < threshold`.
///
/// `None` with fewer than two finished listings or a zero spread.
pub fn zscore_screen(partition: &PartitionReport, threshold: f64) -> Option<ZScoreScreen> {
    let n_grey_structures = partition
        .listings
        .iter()
        .filter(|l| l.record.is_grey_structure)
        .count();
    let costs: Vec<f64> = partition
        .listings
        .iter()
        .filter(|l| !l.record.is_grey_structure)
        .filter_map(|l| l.metrics)
        .map(|m| m.cost_per_sq_yd)
        .collect();

    let median = stats::median(&costs)?;
    let std = stats::std_dev(&costs)?;
    if std == 0.0 {
        return None;
    }

    let bargains: Vec<f64> = costs
        .iter()
        .copied()
        .filter(|&c| c < median && (c - median) / std < threshold)
        .collect();

    Some(ZScoreScreen {
        threshold,
        n_listings: costs.len(),
        n_grey_structures,
        n_bargains: bargains.len(),
        bargain_pct: bargains.len() as f64 * 100.0 / costs.len() as f64,
        median_cost_per_sq_yd: median,
        std_cost_per_sq_yd: std,
        p10_cost_per_sq_yd: stats::percentile(&costs, 10.0)?,
        p90_cost_per_sq_yd: stats::percentile(&costs, 90.0)?,
        min_bargain_cost_per_sq_yd: stats::min(&bargains),
        max_bargain_cost_per_sq_yd: stats::max(&bargains),
    })
}

/// Count, mean, min and max of one value over a group of listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary<K> {
    pub key: K,
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

fn summarize<K: Ord>(pairs: impl Iterator<Item = (K, f64)>) -> Vec<GroupSummary<K>> {
    let mut groups: BTreeMap<K, Vec<f64>> = BTreeMap::new();
    for (key, value) in pairs {
        groups.entry(key).or_default().push(value);
    }
    groups
        .into_iter()
        .filter_map(|(key, values)| {
            Some(GroupSummary {
                count: values.len(),
                mean: stats::mean(&values)?,
                min: stats::min(&values)?,
                max: stats::max(&values)?,
                key,
            })
        })
        .collect()
}

/// Price by bedroom count, fewest bedrooms first. Listings without a
/// bedroom count are left out.
pub fn by_bedrooms(partition: &PartitionReport) -> Vec<GroupSummary<i64>> {
    summarize(
        partition
            .listings
            .iter()
            .filter_map(|l| Some((l.record.bedrooms?, l.record.price))),
    )
}

/// Cost per square yard by sub-area, most expensive first.
pub fn by_location(partition: &PartitionReport) -> Vec<GroupSummary<String>> {
    let mut groups = summarize(
        partition
            .listings
            .iter()
            .filter_map(|l| Some((l.record.location_tag.clone(), l.metrics?.cost_per_sq_yd))),
    );
    groups.sort_by(|a, b| b.mean.total_cmp(&a.mean));
    groups
}
