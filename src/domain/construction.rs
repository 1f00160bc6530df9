// src/domain/construction.rs
//
// Construction cost estimates built on top of aggregated house and plot
// partitions for one location. The implied figure assumes that the gap
// between house and plot prices per square yard at the same location is
// construction cost; nothing here checks that assumption.

use crate::domain::aggregate::PartitionReport;
use crate::domain::stats;
use serde::Serialize;

pub const SQ_FT_PER_SQ_YD: f64 = 9.0;

/// Inputs for the bottom-up build estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstructionAssumptions {
    pub plot_size_sq_yd: f64,
    pub floors: u32,
    /// Share of the plot covered on each floor.
    pub coverage_ratio: f64,
    pub cost_per_sq_ft_low: f64,
    pub cost_per_sq_ft_high: f64,
    /// Design, approvals and fees, as a share of build cost.
    pub soft_cost_pct: f64,
    pub contingency_pct: f64,
    pub utilities_fixed: f64,
}

impl Default for ConstructionAssumptions {
    fn default() -> Self {
        Self {
            plot_size_sq_yd: 280.0,
            floors: 2,
            coverage_ratio: 0.70,
            cost_per_sq_ft_low: 5000.0,
            cost_per_sq_ft_high: 5500.0,
            soft_cost_pct: 0.03,
            contingency_pct: 0.10,
            utilities_fixed: 300_000.0,
        }
    }
}

/// House cost per square yard minus the median plot cost per square yard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpliedConstructionCost {
    pub median_plot_cost_per_sq_yd: f64,
    pub median_cost_per_sq_yd: f64,
    pub p25_cost_per_sq_yd: f64,
    pub p75_cost_per_sq_yd: f64,
    pub n_houses: usize,
    pub n_grey_structures: usize,
}

/// `None` when there is no plot median or no finished house to compare.
pub fn implied_construction_cost(
    houses: &PartitionReport,
    plots: &PartitionReport,
) -> Option<ImpliedConstructionCost> {
    let plot_median = plots.summary.median_cost_per_sq_yd?;

    let n_grey_structures = houses
        .listings
        .iter()
        .filter(|l| l.record.is_grey_structure)
        .count();

    let implied: Vec<f64> = houses
        .listings
        .iter()
        .filter(|l| !l.record.is_grey_structure)
        .filter_map(|l| l.metrics)
        .map(|m| m.cost_per_sq_yd - plot_median)
        .collect();

    Some(ImpliedConstructionCost {
        median_plot_cost_per_sq_yd: plot_median,
        median_cost_per_sq_yd: stats::median(&implied)?,
        p25_cost_per_sq_yd: stats::percentile(&implied, 25.0)?,
        p75_cost_per_sq_yd: stats::percentile(&implied, 75.0)?,
        n_houses: implied.len(),
        n_grey_structures,
    })
}

/// A low/high pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Range {
    pub low: f64,
    pub high: f64,
}

impl Range {
    fn map(self, f: impl Fn(f64) -> f64) -> Range {
        Range {
            low: f(self.low),
            high: f(self.high),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BottomUpEstimate {
    pub covered_area_sq_ft: f64,
    pub build_cost: Range,
    pub soft_cost: Range,
    pub contingency: Range,
    pub total_build: Range,
    pub land_cost: f64,
    pub total_project: Range,
    pub build_cost_per_sq_yd: Range,
}

/// Builds a house on a plot bought at `plot_cost_per_sq_yd`.
pub fn bottom_up_estimate(
    assumptions: &ConstructionAssumptions,
    plot_cost_per_sq_yd: f64,
) -> BottomUpEstimate {
    let a = assumptions;
    let covered_area_sq_ft =
        a.plot_size_sq_yd * SQ_FT_PER_SQ_YD * a.coverage_ratio * f64::from(a.floors);

    let rate = Range {
        low: a.cost_per_sq_ft_low,
        high: a.cost_per_sq_ft_high,
    };
    let build_cost = rate.map(|r| covered_area_sq_ft * r);
    let soft_cost = build_cost.map(|b| b * a.soft_cost_pct);
    let contingency = build_cost.map(|b| b * a.contingency_pct);
    let total_build = build_cost.map(|b| b + b * a.soft_cost_pct + b * a.contingency_pct + a.utilities_fixed);
    let land_cost = a.plot_size_sq_yd * plot_cost_per_sq_yd;

    BottomUpEstimate {
        covered_area_sq_ft,
        build_cost,
        soft_cost,
        contingency,
        total_build,
        land_cost,
        total_project: total_build.map(|t| t + land_cost),
        build_cost_per_sq_yd: total_build.map(|t| t / a.plot_size_sq_yd),
    }
}
