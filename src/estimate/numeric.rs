//! Numerical estimator.
//!
//! Median point estimate with a confidence derived from the robust
//! coefficient of variation (scaled MAD over the magnitude of the
//! median), so single outliers barely move either number.

use super::Estimator;

/// Consistency factor that scales the MAD to the standard deviation of a
/// Gaussian.
const MAD_SCALE: f64 = 1.4826;

/// Median estimator for real-valued samples.
pub struct MedianEstimator;

impl Estimator<f64> for MedianEstimator {
    fn estimate(&self, samples: &[f64]) -> f64 {
        median(samples)
    }

    fn confidence(&self, samples: &[f64], estimate: &f64) -> f64 {
        if samples.len() < 2 {
            return 0.0;
        }
        if samples.iter().all(|v| *v == 0.0) {
            return 1.0;
        }
        if *estimate == 0.0 {
            // Spread-to-magnitude ratio is undefined at a zero median
            return 0.0;
        }

        let deviations: Vec<f64> = samples.iter().map(|v| (v - estimate).abs()).collect();
        let mad = median(&deviations);
        let ratio = MAD_SCALE * mad / estimate.abs();
        1.0 / (1.0 + ratio)
    }
}

/// Median with the usual even-length tie-break: the arithmetic mean of
/// the two central order statistics.
fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
