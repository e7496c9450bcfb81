//! Categorical estimator.
//!
//! Mode point estimate over a known finite domain, with agreement
//! normalised against the chance rate for that domain size.

use super::Estimator;

/// Mode estimator for values drawn from a finite set of `domain_size`
/// alternatives.
///
/// Ties are broken by first appearance among the samples, so the
/// estimate is stable under re-evaluation.
pub struct ModeEstimator {
    domain_size: usize,
}

impl ModeEstimator {
    pub fn new(domain_size: usize) -> Self {
        Self { domain_size }
    }

    pub fn domain_size(&self) -> usize {
        self.domain_size
    }
}

impl<T> Estimator<T> for ModeEstimator
where
    T: Clone + PartialEq + Send + Sync,
{
    fn estimate(&self, samples: &[T]) -> T {
        let mut best: Option<(&T, usize)> = None;
        for (i, candidate) in samples.iter().enumerate() {
            if samples[..i].contains(candidate) {
                continue; // counted at its first appearance
            }
            let count = samples.iter().filter(|s| *s == candidate).count();
            if best.map_or(true, |(_, best_count)| count > best_count) {
                best = Some((candidate, count));
            }
        }
        best.expect("estimate requires at least one sample").0.clone()
    }

    fn confidence(&self, samples: &[T], estimate: &T) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        if self.domain_size <= 1 {
            return 1.0; // nothing to disagree about
        }

        let agreeing = samples.iter().filter(|s| *s == estimate).count();
        let p = agreeing as f64 / samples.len() as f64;
        let chance = 1.0 / self.domain_size as f64;
        ((p - chance) / (1.0 - chance)).clamp(0.0, 1.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
