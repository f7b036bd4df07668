//! Summary statistics behind the exploratory plots

use std::collections::BTreeMap;

/// Bin count from the square-root rule, `ceil(sqrt(n))`
pub fn sqrt_bins(n: usize) -> usize {
    ((n as f64).sqrt().ceil() as usize).max(1)
}

/// Equal-width histogram
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub min: f64,
    pub width: f64,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn new(values: &[f64], bins: usize) -> Option<Self> {
        let (min, max) = min_max(values)?;
        let bins = bins.max(1);
        let width = if max > min { (max - min) / bins as f64 } else { 1.0 };

        let mut counts = vec![0; bins];
        for v in values.iter().filter(|v| v.is_finite()) {
            // The maximum falls into the last bin
            let idx = (((v - min) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }

        Some(Histogram { min, width, counts })
    }

    /// (lower edge, upper edge, count) per bin
    pub fn bins(&self) -> impl Iterator<Item = (f64, f64, usize)> + '_ {
        self.counts.iter().enumerate().map(move |(i, &count)| {
            let lo = self.min + i as f64 * self.width;
            (lo, lo + self.width, count)
        })
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

/// Quantile with linear interpolation between order statistics
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

/// Five-number summary with 1.5 IQR whiskers
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

impl BoxStats {
    pub fn new(values: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let q1 = quantile(&sorted, 0.25)?;
        let median = quantile(&sorted, 0.5)?;
        let q3 = quantile(&sorted, 0.75)?;
        let iqr = q3 - q1;
        let (fence_low, fence_high) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);

        let inside = sorted.iter().filter(|v| **v >= fence_low && **v <= fence_high);
        let whisker_low = inside.clone().copied().fold(f64::INFINITY, f64::min);
        let whisker_high = inside.copied().fold(f64::NEG_INFINITY, f64::max);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|v| *v < fence_low || *v > fence_high)
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
}

/// Gaussian kernel density estimate with Scott's bandwidth
#[derive(Debug, Clone, PartialEq)]
pub struct Kde {
    values: Vec<f64>,
    pub bandwidth: f64,
}

impl Kde {
    /// `None` with fewer than two finite values or zero spread
    pub fn new(values: &[f64]) -> Option<Self> {
        let values: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        let n = values.len();
        if n < 2 {
            return None;
        }
        let mean = values.iter().sum::<f64>() / n as f64;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        if var == 0.0 {
            return None;
        }
        let bandwidth = var.sqrt() * (n as f64).powf(-0.2);
        Some(Kde { values, bandwidth })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn density(&self, x: f64) -> f64 {
        let h = self.bandwidth;
        let norm = self.values.len() as f64 * h * (2.0 * std::f64::consts::PI).sqrt();
        self.values
            .iter()
            .map(|v| (-0.5 * ((x - v) / h).powi(2)).exp())
            .sum::<f64>()
            / norm
    }

    /// Evenly spaced (x, density) points over the data range extended by
    /// `cut` bandwidths on each side
    pub fn curve(&self, cut: f64, points: usize) -> Vec<(f64, f64)> {
        let Some((min, max)) = min_max(&self.values) else {
            return Vec::new();
        };
        let lo = min - cut * self.bandwidth;
        let hi = max + cut * self.bandwidth;
        let points = points.max(2);
        let step = (hi - lo) / (points - 1) as f64;
        (0..points)
            .map(|i| {
                let x = lo + i as f64 * step;
                (x, self.density(x))
            })
            .collect()
    }
}

/// Occurrences per label, sorted by label
pub fn category_counts(labels: &[String]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for label in labels {
        *counts.entry(label.as_str()).or_insert(0) += 1;
    }
    counts.into_iter().map(|(l, c)| (l.to_string(), c)).collect()
}

/// Mean value per label, sorted by label
pub fn category_means(pairs: &[(String, f64)]) -> Vec<(String, f64)> {
    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for (label, value) in pairs.iter().filter(|(_, v)| v.is_finite()) {
        let entry = sums.entry(label.as_str()).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(l, (sum, n))| (l.to_string(), sum / n as f64))
        .collect()
}

/// Pearson correlation; `None` with fewer than two pairs or zero variance
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    let n = pairs.len();
    if n < 2 {
        return None;
    }
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n as f64;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n as f64;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in pairs {
        let (dx, dy) = (x - mean_x, y - mean_y);
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}
