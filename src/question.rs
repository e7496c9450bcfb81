//! Questions and the question bank.
//!
//! A `Question<T>` binds an id and prompt to a parser, an estimator, and
//! a stopping rule for one value type. The bank erases the type behind
//! an engine-facing sampler object so a single battery can mix
//! numerical, boolean, and categorical questions.

use tracing::debug;

use crate::estimate::{Estimator, MajorityEstimator, MedianEstimator, ModeEstimator};
use crate::parse::{BoolParser, FloatParser, LiteralParser, Outcome, Parser};
use crate::stop::{StopRule, DEFAULT_THRESHOLD};
use crate::types::{Archetype, Estimate, SampleState, SiftError, StateSnapshot, Value};

/// Unanimity bound used by the convenience constructors for boolean and
/// categorical questions.
const DEFAULT_UNANIMOUS_AFTER: usize = 3;

// ---------------------------------------------------------------------------
// Sample values
// ---------------------------------------------------------------------------

/// Types that can serve as question sample values.
///
/// The erased [`Value`] form is what progress snapshots and estimate
/// records carry, so mixed-type batteries share one output shape.
pub trait SampleValue: Clone + PartialEq + Send + Sync + 'static {
    fn to_value(&self) -> Value;
}

impl SampleValue for f64 {
    fn to_value(&self) -> Value {
        Value::Number(*self)
    }
}

impl SampleValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl SampleValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

// ---------------------------------------------------------------------------
// Question
// ---------------------------------------------------------------------------

/// One question in a battery: id, prompt, and the parser / estimator /
/// stopping triple for its value type. Immutable once constructed.
pub struct Question<T> {
    id: String,
    prompt: String,
    parser: Box<dyn Parser<T>>,
    estimator: Box<dyn Estimator<T>>,
    stop: StopRule,
}

impl<T: SampleValue> Question<T> {
    pub fn new(
        id: impl Into<String>,
        prompt: impl Into<String>,
        parser: impl Parser<T> + 'static,
        estimator: impl Estimator<T> + 'static,
        stop: StopRule,
    ) -> Result<Self, SiftError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(SiftError::EmptyId);
        }
        Ok(Self {
            id,
            prompt: prompt.into(),
            parser: Box::new(parser),
            estimator: Box::new(estimator),
            stop,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn stop_rule(&self) -> &StopRule {
        &self.stop
    }
}

impl Question<f64> {
    /// A numerical question with the standard float parser, median
    /// estimator, and standard numerical stopping rule.
    pub fn numeric(id: impl Into<String>, prompt: impl Into<String>) -> Result<Self, SiftError> {
        Self::new(
            id,
            prompt,
            FloatParser::new(),
            MedianEstimator,
            StopRule::standard_numerical(),
        )
    }
}

impl Question<bool> {
    /// A boolean question with the standard yes/no parser, majority
    /// estimator, and categorical stopping rule.
    pub fn boolean(id: impl Into<String>, prompt: impl Into<String>) -> Result<Self, SiftError> {
        Self::new(
            id,
            prompt,
            BoolParser::new(),
            MajorityEstimator,
            StopRule::standard_categorical(DEFAULT_UNANIMOUS_AFTER),
        )
    }
}

impl Question<String> {
    /// A categorical question over a fixed option set, with the literal
    /// parser, mode estimator sized to the set, and categorical stopping
    /// rule.
    pub fn categorical(
        id: impl Into<String>,
        prompt: impl Into<String>,
        options: &[&str],
    ) -> Result<Self, SiftError> {
        Self::new(
            id,
            prompt,
            LiteralParser::new(options),
            ModeEstimator::new(options.len()),
            StopRule::standard_categorical(DEFAULT_UNANIMOUS_AFTER),
        )
    }
}

// ---------------------------------------------------------------------------
// Type erasure
// ---------------------------------------------------------------------------

/// Engine-facing view of a question with its value type erased.
pub(crate) trait ErasedQuestion: Send + Sync {
    fn id(&self) -> &str;
    fn prompt(&self) -> &str;
    /// Begin sampling: a fresh sampler holding this question's state.
    fn start(&self) -> Box<dyn Sampler + '_>;
}

/// Per-question runtime cell owned by the engine during `collect`.
pub(crate) trait Sampler: Send {
    /// Parse one oracle response and apply the state transition.
    fn absorb(&mut self, response: &str);
    /// Whether the stopping rule is satisfied.
    fn is_done(&self) -> bool;
    /// Erased read-only view for progress callbacks.
    fn snapshot(&self) -> StateSnapshot;
    /// Build the output record from the accumulated state.
    fn finalize(&self) -> Estimate;
}

impl<T: SampleValue> ErasedQuestion for Question<T> {
    fn id(&self) -> &str {
        &self.id
    }

    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn start(&self) -> Box<dyn Sampler + '_> {
        Box::new(TypedSampler {
            question: self,
            state: SampleState::new(),
        })
    }
}

struct TypedSampler<'q, T: SampleValue> {
    question: &'q Question<T>,
    state: SampleState<T>,
}

impl<T: SampleValue> Sampler for TypedSampler<'_, T> {
    fn absorb(&mut self, response: &str) {
        match self.question.parser.parse(response) {
            Outcome::Value(value) => {
                debug!(question = %self.question.id, "sample accepted");
                self.state.record_sample(value);
            }
            Outcome::Decline => {
                debug!(
                    question = %self.question.id,
                    streak = self.state.consecutive_declines() + 1,
                    "oracle declined",
                );
                self.state.record_decline();
            }
            Outcome::Failure => {
                debug!(question = %self.question.id, response, "unparseable response");
                self.state.record_failure();
            }
        }
    }

    fn is_done(&self) -> bool {
        self.question
            .stop
            .should_stop(&self.state, self.question.estimator.as_ref())
    }

    fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            samples: self.state.samples().iter().map(|s| s.to_value()).collect(),
            sample_count: self.state.sample_count(),
            decline_count: self.state.decline_count(),
            parse_failure_count: self.state.parse_failure_count(),
            consecutive_declines: self.state.consecutive_declines(),
            done: self.is_done(),
        }
    }

    fn finalize(&self) -> Estimate {
        let samples = self.state.samples();
        let decline_count = self.state.decline_count();

        if samples.is_empty() {
            return Estimate {
                value: None,
                confidence: 0.0,
                archetype: Archetype::InsufficientData,
                sample_count: 0,
                decline_count,
                samples: Vec::new(),
            };
        }

        let estimator = self.question.estimator.as_ref();
        let value = estimator.estimate(samples);
        let raw = estimator.confidence(samples, &value);

        // Decline penalty: the adjusted score shrinks with the fraction
        // of attempts the oracle refused.
        let penalty =
            1.0 - decline_count as f64 / (decline_count as f64 + samples.len() as f64);
        let confidence = raw * penalty;

        let threshold = self
            .question
            .stop
            .confidence_threshold()
            .unwrap_or(DEFAULT_THRESHOLD);
        let archetype = Archetype::classify(
            samples.len(),
            confidence,
            threshold,
            self.state.query_count(),
            self.question.stop.max_queries(),
        );

        Estimate {
            value: Some(value.to_value()),
            confidence,
            archetype,
            sample_count: samples.len(),
            decline_count,
            samples: samples.iter().map(|s| s.to_value()).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Question bank
// ---------------------------------------------------------------------------

/// A finite ordered battery of questions with pairwise distinct ids.
pub struct QuestionBank {
    questions: Vec<Box<dyn ErasedQuestion>>,
}

impl QuestionBank {
    pub fn new() -> Self {
        Self {
            questions: Vec::new(),
        }
    }

    /// Add a question, rejecting duplicate ids eagerly.
    pub fn push<T: SampleValue>(&mut self, question: Question<T>) -> Result<(), SiftError> {
        if self.questions.iter().any(|q| q.id() == question.id) {
            return Err(SiftError::DuplicateId(question.id));
        }
        self.questions.push(Box::new(question));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Question ids in bank order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.questions.iter().map(|q| q.id())
    }

    pub(crate) fn questions(&self) -> &[Box<dyn ErasedQuestion>] {
        &self.questions
    }
}

impl Default for QuestionBank {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
