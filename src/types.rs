//! Shared types for the SIFT library.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that parser, estimator,
//! and engine modules can depend on them without circular references.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// A typed value extracted from an oracle response, erased so that one
/// battery can mix numerical, boolean, and categorical questions while
/// the output mapping stays homogeneous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl Value {
    /// The numeric payload, if this is a `Number`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// The boolean payload, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// The string payload, if this is a `Text`.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "{v}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sample state
// ---------------------------------------------------------------------------

/// Per-question sampling state: the successful samples in arrival order
/// plus the decline / parse-failure bookkeeping.
///
/// Mutated only by the engine between oracle completions; progress
/// callbacks and diagnostics see cloned snapshots, never this struct.
#[derive(Debug, Clone)]
pub struct SampleState<T> {
    samples: Vec<T>,
    decline_count: u32,
    parse_failure_count: u32,
    consecutive_declines: u32,
}

impl<T> SampleState<T> {
    pub fn new() -> Self {
        Self {
            samples: Vec::new(),
            decline_count: 0,
            parse_failure_count: 0,
            consecutive_declines: 0,
        }
    }

    /// Successful parsed samples, in the order oracle calls completed.
    pub fn samples(&self) -> &[T] {
        &self.samples
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn decline_count(&self) -> u32 {
        self.decline_count
    }

    pub fn parse_failure_count(&self) -> u32 {
        self.parse_failure_count
    }

    /// Length of the current run of declines. Reset by any successful
    /// sample or parse failure.
    pub fn consecutive_declines(&self) -> u32 {
        self.consecutive_declines
    }

    /// Total oracle attempts: samples + declines + parse failures.
    pub fn query_count(&self) -> usize {
        self.samples.len() + self.decline_count as usize + self.parse_failure_count as usize
    }

    /// Record a successfully parsed sample. Resets the decline streak.
    pub fn record_sample(&mut self, value: T) {
        self.samples.push(value);
        self.consecutive_declines = 0;
    }

    /// Record a decline. Extends the decline streak.
    pub fn record_decline(&mut self) {
        self.decline_count += 1;
        self.consecutive_declines += 1;
    }

    /// Record a parse failure. A failure is not a refusal, so it resets
    /// the decline streak while still consuming a query.
    pub fn record_failure(&mut self) {
        self.parse_failure_count += 1;
        self.consecutive_declines = 0;
    }
}

impl<T> Default for SampleState<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// State snapshot
// ---------------------------------------------------------------------------

/// Read-only view of one question's state, handed to progress callbacks.
///
/// Sample values are erased to `Value` so a single callback can observe a
/// mixed-type battery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub samples: Vec<Value>,
    pub sample_count: usize,
    pub decline_count: u32,
    pub parse_failure_count: u32,
    pub consecutive_declines: u32,
    /// Whether the question's stopping predicate is already satisfied.
    pub done: bool,
}

impl StateSnapshot {
    /// Total oracle attempts: samples + declines + parse failures.
    pub fn query_count(&self) -> usize {
        self.sample_count + self.decline_count as usize + self.parse_failure_count as usize
    }
}

impl fmt::Display for StateSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "samples={} declines={} failures={} streak={}{}",
            self.sample_count,
            self.decline_count,
            self.parse_failure_count,
            self.consecutive_declines,
            if self.done { " [done]" } else { "" },
        )
    }
}

// ---------------------------------------------------------------------------
// Archetype
// ---------------------------------------------------------------------------

/// Classification of how sampling terminated for a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    /// Confidence threshold met well inside the query budget.
    Confident,
    /// Confidence threshold met, but only within the budget.
    Acceptable,
    /// Budget exhausted without meeting the threshold.
    Uncertain,
    /// No successful samples at all.
    InsufficientData,
}

impl Archetype {
    /// Classify a finalised question.
    ///
    /// `threshold` is the notional confidence threshold of the question's
    /// stopping predicate; `max_queries` its query budget, when one exists.
    /// "Well inside budget" means fewer than 0.75 × the budget; without a
    /// budget that distinction collapses and threshold-meeting outcomes
    /// are `Acceptable`.
    pub fn classify(
        sample_count: usize,
        final_confidence: f64,
        threshold: f64,
        query_count: usize,
        max_queries: Option<usize>,
    ) -> Self {
        if sample_count == 0 {
            return Archetype::InsufficientData;
        }
        if final_confidence >= threshold {
            match max_queries {
                Some(budget) if (query_count as f64) < 0.75 * budget as f64 => {
                    Archetype::Confident
                }
                _ => Archetype::Acceptable,
            }
        } else {
            Archetype::Uncertain
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Archetype::Confident => write!(f, "CONFIDENT"),
            Archetype::Acceptable => write!(f, "ACCEPTABLE"),
            Archetype::Uncertain => write!(f, "UNCERTAIN"),
            Archetype::InsufficientData => write!(f, "INSUFFICIENT_DATA"),
        }
    }
}

// ---------------------------------------------------------------------------
// Estimate
// ---------------------------------------------------------------------------

/// Final output record for one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Estimate {
    /// The consensus value, or `None` when no samples were obtained.
    pub value: Option<Value>,
    /// Decline-adjusted confidence in [0, 1].
    pub confidence: f64,
    pub archetype: Archetype,
    pub sample_count: usize,
    pub decline_count: u32,
    /// Full sample tuple, preserved for diagnostics.
    pub samples: Vec<Value>,
}

impl fmt::Display for Estimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(
                f,
                "{} (conf={:.0}% {} | samples={} declines={})",
                v,
                self.confidence * 100.0,
                self.archetype,
                self.sample_count,
                self.decline_count,
            ),
            None => write!(
                f,
                "<no value> ({} | declines={})",
                self.archetype, self.decline_count,
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for SIFT.
#[derive(Debug, thiserror::Error)]
pub enum SiftError {
    #[error("question id must not be empty")]
    EmptyId,

    #[error("duplicate question id: {0}")]
    DuplicateId(String),

    #[error("question bank is empty")]
    EmptyBank,

    #[error("concurrency limit must be at least 1")]
    ZeroConcurrency,

    #[error("oracle query failed for question '{id}': {source}")]
    Oracle {
        id: String,
        #[source]
        source: anyhow::Error,
    },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
