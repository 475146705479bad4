//! Statistics behind the chart kinds and the summary table
//!
//! Chart kinds extract plain `f64`/label vectors from the dataset and hand
//! them here; everything below is pure math on slices so it can be tested
//! without touching a frame or a drawing backend.

/// Arithmetic mean. `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (ddof = 1). `None` below two values.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// Linearly interpolated quantile of an ascending-sorted slice.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        return Some(sorted[lo]);
    }
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Frequency counts of non-null labels, ordered by descending count with
/// ties broken by label.
pub fn value_counts(labels: &[Option<String>]) -> Vec<(String, u32)> {
    let mut counts: std::collections::HashMap<&str, u32> = std::collections::HashMap::new();
    for label in labels.iter().flatten() {
        *counts.entry(label.as_str()).or_insert(0) += 1;
    }
    let mut pairs: Vec<(String, u32)> = counts
        .into_iter()
        .map(|(label, count)| (label.to_string(), count))
        .collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    pairs
}

/// Binned counts over a value range. `edges` has one more entry than
/// `counts`; the final bin is closed on both sides.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBins {
    pub edges: Vec<f64>,
    pub counts: Vec<u32>,
}

impl HistogramBins {
    pub fn bin_width(&self) -> f64 {
        self.edges[1] - self.edges[0]
    }

    pub fn max_count(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

/// Histogram with an automatic bin count: the larger of the
/// Freedman-Diaconis and Sturges estimates, capped at 100 bins.
pub fn histogram(values: &[f64]) -> Option<HistogramBins> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let min = sorted[0];
    let max = sorted[sorted.len() - 1];
    if min == max {
        // Degenerate range: one unit-wide bin centred on the value.
        return Some(HistogramBins {
            edges: vec![min - 0.5, min + 0.5],
            counts: vec![values.len() as u32],
        });
    }
    let n = values.len() as f64;
    let sturges = (n.log2().ceil() as usize) + 1;
    let iqr = quantile(&sorted, 0.75)? - quantile(&sorted, 0.25)?;
    let fd = if iqr > 0.0 {
        let width = 2.0 * iqr / n.cbrt();
        ((max - min) / width).ceil() as usize
    } else {
        0
    };
    let bins = sturges.max(fd).clamp(1, 100);
    let width = (max - min) / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|i| min + width * i as f64).collect();
    let mut counts = vec![0u32; bins];
    for &v in values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    Some(HistogramBins { edges, counts })
}

/// Gaussian kernel density estimate sampled on an even grid.
///
/// Bandwidth follows Scott's rule. Returns an empty curve when the data
/// cannot support one (fewer than two values or zero variance), in which
/// case the histogram is drawn without an overlay.
pub fn kde_curve(values: &[f64], lo: f64, hi: f64, points: usize) -> Vec<(f64, f64)> {
    let n = values.len() as f64;
    let Some(sigma) = std_dev(values) else {
        return Vec::new();
    };
    if sigma == 0.0 || points < 2 || hi <= lo {
        return Vec::new();
    }
    let bandwidth = sigma * n.powf(-0.2);
    let norm = 1.0 / (n * bandwidth * (2.0 * std::f64::consts::PI).sqrt());
    let step = (hi - lo) / (points - 1) as f64;
    (0..points)
        .map(|i| {
            let x = lo + step * i as f64;
            let density = values
                .iter()
                .map(|&v| {
                    let t = (x - v) / bandwidth;
                    (-0.5 * t * t).exp()
                })
                .sum::<f64>()
                * norm;
            (x, density)
        })
        .collect()
}

/// Quartiles, whiskers and outliers for one box.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

/// Box statistics with whiskers at the furthest values within 1.5 IQR of
/// the box, everything outside collected as outliers.
pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let q1 = quantile(&sorted, 0.25)?;
    let median = quantile(&sorted, 0.5)?;
    let q3 = quantile(&sorted, 0.75)?;
    let iqr = q3 - q1;
    let low_fence = q1 - 1.5 * iqr;
    let high_fence = q3 + 1.5 * iqr;
    let whisker_low = sorted
        .iter()
        .copied()
        .find(|v| *v >= low_fence)
        .unwrap_or(q1);
    let whisker_high = sorted
        .iter()
        .rev()
        .copied()
        .find(|v| *v <= high_fence)
        .unwrap_or(q3);
    let outliers = sorted
        .iter()
        .copied()
        .filter(|v| *v < low_fence || *v > high_fence)
        .collect();
    Some(BoxStats {
        q1,
        median,
        q3,
        whisker_low,
        whisker_high,
        outliers,
    })
}

/// Pearson correlation coefficient. `None` when either side has zero
/// variance or fewer than two pairs exist.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let n_f = n as f64;
    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_x2, mut sum_y2) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for (&x, &y) in xs.iter().zip(ys.iter()) {
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_x2 += x * x;
        sum_y2 += y * y;
    }
    let num = n_f * sum_xy - sum_x * sum_y;
    let den = ((n_f * sum_x2 - sum_x * sum_x) * (n_f * sum_y2 - sum_y * sum_y)).sqrt();
    if den == 0.0 || !den.is_finite() {
        return None;
    }
    Some((num / den).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_std() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(mean(&v), Some(2.5));
        assert!((std_dev(&v).unwrap() - 1.2909944487358056).abs() < 1e-12);
        assert_eq!(mean(&[]), None);
        assert_eq!(std_dev(&[5.0]), None);
    }

    #[test]
    fn test_quantile_linear_interpolation() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&v, 0.25), Some(1.75));
        assert_eq!(quantile(&v, 0.5), Some(2.5));
        assert_eq!(quantile(&v, 1.0), Some(4.0));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn test_value_counts_order_and_ties() {
        let labels: Vec<Option<String>> = ["b", "a", "b", "c", "a", "b"]
            .iter()
            .map(|s| Some(s.to_string()))
            .collect();
        let counts = value_counts(&labels);
        assert_eq!(
            counts,
            vec![
                ("b".to_string(), 3),
                ("a".to_string(), 2),
                ("c".to_string(), 1),
            ]
        );
        // Ties break by label.
        let tied: Vec<Option<String>> =
            vec![Some("y".to_string()), Some("x".to_string()), None];
        assert_eq!(
            value_counts(&tied),
            vec![("x".to_string(), 1), ("y".to_string(), 1)]
        );
    }

    #[test]
    fn test_histogram_covers_all_values() {
        let values: Vec<f64> = (0..50).map(|i| i as f64).collect();
        let bins = histogram(&values).unwrap();
        assert_eq!(bins.edges.len(), bins.counts.len() + 1);
        assert_eq!(bins.counts.iter().sum::<u32>(), 50);
        assert_eq!(bins.edges[0], 0.0);
        assert_eq!(*bins.edges.last().unwrap(), 49.0);
    }

    #[test]
    fn test_histogram_constant_data_single_bin() {
        let bins = histogram(&[7.0; 12]).unwrap();
        assert_eq!(bins.counts, vec![12]);
        assert_eq!(bins.edges, vec![6.5, 7.5]);
    }

    #[test]
    fn test_kde_integrates_to_one() {
        let values: Vec<f64> = (0..40).map(|i| (i % 10) as f64).collect();
        let curve = kde_curve(&values, -10.0, 20.0, 400);
        let step = curve[1].0 - curve[0].0;
        let integral: f64 = curve.iter().map(|(_, d)| d * step).sum();
        assert!((integral - 1.0).abs() < 0.05, "integral was {integral}");
    }

    #[test]
    fn test_kde_degenerate_data_is_empty() {
        assert!(kde_curve(&[3.0, 3.0, 3.0], 0.0, 6.0, 100).is_empty());
        assert!(kde_curve(&[1.0], 0.0, 2.0, 100).is_empty());
    }

    #[test]
    fn test_box_stats_with_outlier() {
        let stats = box_stats(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert_eq!(stats.q1, 2.0);
        assert_eq!(stats.median, 3.0);
        assert_eq!(stats.q3, 4.0);
        assert_eq!(stats.whisker_low, 1.0);
        assert_eq!(stats.whisker_high, 4.0);
        assert_eq!(stats.outliers, vec![100.0]);
    }

    #[test]
    fn test_pearson_extremes() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let up = [2.0, 4.0, 6.0, 8.0];
        let down = [8.0, 6.0, 4.0, 2.0];
        assert!((pearson(&xs, &up).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&xs, &down).unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(pearson(&xs, &[5.0, 5.0, 5.0, 5.0]), None);
        assert_eq!(pearson(&[1.0], &[2.0]), None);
    }
}
