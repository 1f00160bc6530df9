// Summary statistics over plain f64 samples. Every function returns `None`
// for an empty sample instead of dividing by zero.

use serde::Serialize;

/// `None` when the sample is empty or the mean is not finite.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let sum: f64 = values.iter().sum();
    let mean = if sum.is_finite() {
        sum / n
    } else {
        // The plain sum overflowed; pre-divided terms stay in range.
        values.iter().map(|v| v / n).sum()
    };
    mean.is_finite().then_some(mean)
}

/// Middle value, or the average of the two middle values for even counts.
pub fn median(values: &[f64]) -> Option<f64> {
    percentile(values, 50.0)
}

/// `p`-th percentile with linear interpolation between closest ranks
/// (NumPy's default method). Input need not be sorted.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = (p / 100.0) * (sorted.len() as f64 - 1.0);
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return Some(sorted[lo]);
    }
    let frac = rank - lo as f64;
    let value = sorted[lo] + frac * (sorted[hi] - sorted[lo]);
    if value.is_finite() {
        return Some(value);
    }
    let weighted = sorted[lo] * (1.0 - frac) + sorted[hi] * frac;
    weighted.is_finite().then_some(weighted)
}

/// Sample standard deviation (n - 1 denominator). Needs two values.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    let sd = (ss / (values.len() as f64 - 1.0)).sqrt();
    sd.is_finite().then_some(sd)
}

/// Least-squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// 0 when every `y` is the same.
    pub r_squared: f64,
}

/// `None` with fewer than two points or when every `x` is the same.
pub fn linear_fit(xs: &[f64], ys: &[f64]) -> Option<LinearFit> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mx = mean(xs)?;
    let my = mean(ys)?;
    let sxx: f64 = xs.iter().map(|x| (x - mx).powi(2)).sum();
    let sxy: f64 = xs.iter().zip(ys).map(|(x, y)| (x - mx) * (y - my)).sum();
    if sxx == 0.0 || !sxx.is_finite() || !sxy.is_finite() {
        return None;
    }
    let slope = sxy / sxx;
    let intercept = my - slope * mx;

    let ss_res: f64 = xs
        .iter()
        .zip(ys)
        .map(|(x, y)| (y - (slope * x + intercept)).powi(2))
        .sum();
    let ss_tot: f64 = ys.iter().map(|y| (y - my).powi(2)).sum();
    let r_squared = if ss_tot == 0.0 { 0.0 } else { 1.0 - ss_res / ss_tot };

    [slope, intercept, r_squared]
        .iter()
        .all(|v| v.is_finite())
        .then_some(LinearFit {
            slope,
            intercept,
            r_squared,
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quartiles {
    pub min: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub max: f64,
}

pub fn quartiles(values: &[f64]) -> Option<Quartiles> {
    Some(Quartiles {
        min: min(values)?,
        p25: percentile(values, 25.0)?,
        median: median(values)?,
        p75: percentile(values, 75.0)?,
        max: max(values)?,
    })
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().min_by(f64::total_cmp)
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().max_by(f64::total_cmp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_resists_outliers() {
        let v = [90_000.0, 95_000.0, 100_000.0, 105_000.0, 500_000.0];
        assert_eq!(median(&v), Some(100_000.0));
        assert_eq!(mean(&v), Some(178_000.0));
    }

    #[test]
    fn median_of_even_count_averages_middle_pair() {
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn percentiles_interpolate() {
        let v = [10.0, 20.0, 30.0, 40.0, 50.0];
        assert_eq!(percentile(&v, 25.0), Some(20.0));
        assert_eq!(percentile(&v, 75.0), Some(40.0));
        assert_eq!(percentile(&[1.0, 2.0], 25.0), Some(1.25));
        assert_eq!(percentile(&[7.0], 90.0), Some(7.0));
    }

    #[test]
    fn empty_samples_have_no_statistics() {
        assert_eq!(mean(&[]), None);
        assert_eq!(median(&[]), None);
        assert_eq!(percentile(&[], 75.0), None);
        assert_eq!(min(&[]), None);
        assert_eq!(max(&[]), None);
    }

    #[test]
    fn huge_samples_do_not_overflow() {
        let v = [1e307, 1e308, 1.7e308];
        let m = mean(&v).unwrap();
        assert!(m.is_finite());
        assert!((m - 9.333_333_333_333_333e307).abs() / m < 1e-12);
        assert_eq!(median(&v), Some(1e308));
        assert_eq!(percentile(&[-1.7e308, 1.7e308], 50.0), Some(0.0));
    }

    #[test]
    fn sample_std_dev_uses_n_minus_one() {
        assert_eq!(std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), Some((32.0f64 / 7.0).sqrt()));
        assert_eq!(std_dev(&[1.0, 3.0]), Some(2.0f64.sqrt()));
        assert_eq!(std_dev(&[5.0]), None);
        assert_eq!(std_dev(&[3.0, 3.0, 3.0]), Some(0.0));
    }

    #[test]
    fn exact_line_has_full_r_squared() {
        let xs = [100.0, 200.0, 300.0];
        let ys = [15_000_000.0, 25_000_000.0, 35_000_000.0];
        let fit = linear_fit(&xs, &ys).unwrap();
        assert!((fit.slope - 100_000.0).abs() < 1e-6);
        assert!((fit.intercept - 5_000_000.0).abs() < 1e-3);
        assert!((fit.r_squared - 1.0).abs() < 1e-12);
    }

    #[test]
    fn noisy_fit() {
        // y = 0.6x + 2.2 is the least-squares line through these points
        let fit = linear_fit(&[1.0, 2.0, 3.0, 4.0, 5.0], &[2.0, 4.0, 5.0, 4.0, 5.0]).unwrap();
        assert!((fit.slope - 0.6).abs() < 1e-12);
        assert!((fit.intercept - 2.2).abs() < 1e-12);
        assert!((fit.r_squared - 0.6).abs() < 1e-12);
    }

    #[test]
    fn degenerate_fits() {
        assert_eq!(linear_fit(&[1.0], &[1.0]), None);
        assert_eq!(linear_fit(&[2.0, 2.0], &[1.0, 3.0]), None);
        assert_eq!(linear_fit(&[1.0, 2.0], &[1.0]), None);
        assert_eq!(linear_fit(&[1.0, 2.0], &[4.0, 4.0]).unwrap().r_squared, 0.0);
    }

    #[test]
    fn quartiles_of_five() {
        let q = quartiles(&[50.0, 10.0, 40.0, 20.0, 30.0]).unwrap();
        assert_eq!((q.min, q.p25, q.median, q.p75, q.max), (10.0, 20.0, 30.0, 40.0, 50.0));
        assert_eq!(quartiles(&[]), None);
    }

    #[test]
    fn extremes() {
        let v = [3.0, -1.0, 8.5];
        assert_eq!(min(&v), Some(-1.0));
        assert_eq!(max(&v), Some(8.5));
    }
}
