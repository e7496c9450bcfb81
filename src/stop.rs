//! Stopping predicates.
//!
//! A stopping rule is a small tagged tree: five primitive conditions
//! plus `All`/`Any` combinators, evaluated as a post-order fold over the
//! question's sample state and estimator. The standard compositions are
//! plain factories; the engine gives them no special treatment.

use crate::estimate::Estimator;
use crate::types::SampleState;

// ---------------------------------------------------------------------------
// Defaults for the factory compositions
// ---------------------------------------------------------------------------

const STANDARD_MIN_SAMPLES: usize = 5;
const STANDARD_NUMERICAL_THRESHOLD: f64 = 0.90;
const STANDARD_NUMERICAL_MAX_QUERIES: usize = 20;
const STANDARD_MAX_DECLINES: u32 = 5;

const CATEGORICAL_THRESHOLD: f64 = 0.85;
const CATEGORICAL_MAX_QUERIES: usize = 15;

const RELAXED_MIN_SAMPLES: usize = 3;
const RELAXED_THRESHOLD: f64 = 0.75;
const RELAXED_MAX_QUERIES: usize = 10;
const RELAXED_MAX_DECLINES: u32 = 3;

/// Reference threshold for archetype classification when a stopping rule
/// carries no `ConfidenceReached` leaf.
pub const DEFAULT_THRESHOLD: f64 = 0.80;

// ---------------------------------------------------------------------------
// StopRule
// ---------------------------------------------------------------------------

/// Composable stopping rule for one question.
#[derive(Debug, Clone, PartialEq)]
pub enum StopRule {
    /// Stop once at least `n` successful samples are collected.
    MinSamples(usize),
    /// Stop once `n` total queries (samples + declines + failures) are spent.
    MaxQueries(usize),
    /// Stop once the raw estimator confidence reaches the threshold.
    /// Requires at least 2 samples before it can fire.
    ConfidenceReached(f64),
    /// Stop after a run of `n` declines in a row.
    ConsecutiveDeclines(u32),
    /// Stop once at least `k` samples exist and all of them are equal.
    UnanimousAgreement(usize),
    /// Stop iff every child wants to stop.
    All(Vec<StopRule>),
    /// Stop iff any child wants to stop.
    Any(Vec<StopRule>),
}

impl StopRule {
    /// Evaluate the rule against the current state.
    ///
    /// `ConfidenceReached` consults the raw estimator confidence; the
    /// decline penalty is applied only at finalisation, never here.
    pub fn should_stop<T>(&self, state: &SampleState<T>, estimator: &dyn Estimator<T>) -> bool
    where
        T: PartialEq,
    {
        match self {
            StopRule::MinSamples(n) => state.sample_count() >= *n,
            StopRule::MaxQueries(n) => state.query_count() >= *n,
            StopRule::ConfidenceReached(threshold) => {
                let samples = state.samples();
                if samples.len() < 2 {
                    return false;
                }
                let estimate = estimator.estimate(samples);
                estimator.confidence(samples, &estimate) >= *threshold
            }
            StopRule::ConsecutiveDeclines(n) => state.consecutive_declines() >= *n,
            StopRule::UnanimousAgreement(k) => {
                let samples = state.samples();
                samples.len() >= *k && samples.windows(2).all(|w| w[0] == w[1])
            }
            StopRule::All(children) => {
                children.iter().all(|c| c.should_stop(state, estimator))
            }
            StopRule::Any(children) => {
                children.iter().any(|c| c.should_stop(state, estimator))
            }
        }
    }

    /// Conjunction: stop iff both sides want to stop.
    pub fn and(self, other: StopRule) -> StopRule {
        match self {
            StopRule::All(mut children) => {
                children.push(other);
                StopRule::All(children)
            }
            first => StopRule::All(vec![first, other]),
        }
    }

    /// Disjunction: stop iff either side wants to stop.
    pub fn or(self, other: StopRule) -> StopRule {
        match self {
            StopRule::Any(mut children) => {
                children.push(other);
                StopRule::Any(children)
            }
            first => StopRule::Any(vec![first, other]),
        }
    }

    /// The notional confidence threshold of this rule: the maximum
    /// `ConfidenceReached` value anywhere in the tree.
    pub fn confidence_threshold(&self) -> Option<f64> {
        match self {
            StopRule::ConfidenceReached(threshold) => Some(*threshold),
            StopRule::All(children) | StopRule::Any(children) => children
                .iter()
                .filter_map(|c| c.confidence_threshold())
                .fold(None, |acc, t| Some(acc.map_or(t, |a: f64| a.max(t)))),
            _ => None,
        }
    }

    /// The query budget of this rule: the maximum `MaxQueries` bound
    /// anywhere in the tree.
    pub fn max_queries(&self) -> Option<usize> {
        match self {
            StopRule::MaxQueries(n) => Some(*n),
            StopRule::All(children) | StopRule::Any(children) => children
                .iter()
                .filter_map(|c| c.max_queries())
                .max(),
            _ => None,
        }
    }

    // -- Standard compositions -------------------------------------------

    /// `(MinSamples(5) ∧ ConfidenceReached(0.90)) ∨ MaxQueries(20)
    /// ∨ ConsecutiveDeclines(5)`.
    pub fn standard_numerical() -> StopRule {
        StopRule::MinSamples(STANDARD_MIN_SAMPLES)
            .and(StopRule::ConfidenceReached(STANDARD_NUMERICAL_THRESHOLD))
            .or(StopRule::MaxQueries(STANDARD_NUMERICAL_MAX_QUERIES))
            .or(StopRule::ConsecutiveDeclines(STANDARD_MAX_DECLINES))
    }

    /// `UnanimousAgreement(k) ∨ (MinSamples(5) ∧ ConfidenceReached(0.85))
    /// ∨ MaxQueries(15)`.
    pub fn standard_categorical(unanimous_after: usize) -> StopRule {
        StopRule::UnanimousAgreement(unanimous_after)
            .or(StopRule::MinSamples(STANDARD_MIN_SAMPLES)
                .and(StopRule::ConfidenceReached(CATEGORICAL_THRESHOLD)))
            .or(StopRule::MaxQueries(CATEGORICAL_MAX_QUERIES))
    }

    /// The cheap profile: lower threshold, tighter budgets.
    pub fn relaxed() -> StopRule {
        StopRule::MinSamples(RELAXED_MIN_SAMPLES)
            .and(StopRule::ConfidenceReached(RELAXED_THRESHOLD))
            .or(StopRule::MaxQueries(RELAXED_MAX_QUERIES))
            .or(StopRule::ConsecutiveDeclines(RELAXED_MAX_DECLINES))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
