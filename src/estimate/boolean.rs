//! Boolean estimator.
//!
//! Majority vote with raw-agreement confidence. The binary case skips
//! the categorical chance normalisation: raw agreement is the more
//! intuitive reading when there are only two alternatives.

use super::Estimator;

/// Majority estimator for boolean samples. An exact split resolves to
/// `false`.
pub struct MajorityEstimator;

impl Estimator<bool> for MajorityEstimator {
    fn estimate(&self, samples: &[bool]) -> bool {
        let yes = samples.iter().filter(|v| **v).count();
        yes * 2 > samples.len()
    }

    fn confidence(&self, samples: &[bool], estimate: &bool) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let agreeing = samples.iter().filter(|v| *v == estimate).count();
        agreeing as f64 / samples.len() as f64
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
