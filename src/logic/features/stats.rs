//! Channel Statistics
//!
//! Numeric conventions (fixed, part of the feature layout version):
//! - standard deviation: population (divide by n)
//! - median / q1 / q3: linear interpolation, `h = (n - 1) * p`
//! - skewness: adjusted Fisher-Pearson `G1 = g1 * sqrt(n(n-1)) / (n-2)`
//! - excess kurtosis: `G2 = ((n+1) g2 + 6)(n-1) / ((n-2)(n-3))`
//!   where `g1 = m3 / m2^1.5`, `g2 = m4 / m2^2 - 3` from population moments.
//!   Skew is 0 below 3 samples, kurtosis 0 below 4, both 0 for flat signals.

use super::layout::STATS_PER_CHANNEL;

/// Variance below this is treated as a flat signal
const FLAT_VARIANCE: f64 = 1e-12;

/// Statistics of one channel over one window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelStats {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub range: f64,
    pub q1: f64,
    pub q3: f64,
    pub skew: f64,
    pub kurt: f64,
    pub iqr: f64,
}

impl ChannelStats {
    /// Compute all statistics. `values` must be non-empty.
    pub fn compute(values: &[f64]) -> Self {
        let n = values.len() as f64;

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let mean = values.iter().sum::<f64>() / n;

        let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
        for &v in values {
            let d = v - mean;
            let d2 = d * d;
            m2 += d2;
            m3 += d2 * d;
            m4 += d2 * d2;
        }
        m2 /= n;
        m3 /= n;
        m4 /= n;

        let (skew, kurt) = if m2 > FLAT_VARIANCE {
            (
                adjusted_skew(m3 / m2.powf(1.5), n),
                adjusted_kurtosis(m4 / (m2 * m2) - 3.0, n),
            )
        } else {
            (0.0, 0.0)
        };

        let min = sorted[0];
        let max = sorted[sorted.len() - 1];
        let q1 = quantile(&sorted, 0.25);
        let q3 = quantile(&sorted, 0.75);

        Self {
            mean,
            std: m2.sqrt(),
            min,
            max,
            median: quantile(&sorted, 0.5),
            range: max - min,
            q1,
            q3,
            skew,
            kurt,
            iqr: q3 - q1,
        }
    }

    /// Values in `STATISTICS` order
    pub fn to_array(&self) -> [f64; STATS_PER_CHANNEL] {
        [
            self.mean,
            self.std,
            self.min,
            self.max,
            self.median,
            self.range,
            self.q1,
            self.q3,
            self.skew,
            self.kurt,
            self.iqr,
        ]
    }
}

/// Sample-size corrected skewness (G1)
fn adjusted_skew(g1: f64, n: f64) -> f64 {
    if n < 3.0 {
        return 0.0;
    }
    g1 * (n * (n - 1.0)).sqrt() / (n - 2.0)
}

/// Sample-size corrected excess kurtosis (G2)
fn adjusted_kurtosis(g2: f64, n: f64) -> f64 {
    if n < 4.0 {
        return 0.0;
    }
    ((n + 1.0) * g2 + 6.0) * (n - 1.0) / ((n - 2.0) * (n - 3.0))
}

/// Linear-interpolated quantile of an ascending, non-empty slice
pub fn quantile(sorted: &[f64], p: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}
