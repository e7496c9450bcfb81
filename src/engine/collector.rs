//! The sampling collector.
//!
//! Drives the `collect` loop: while any question's stopping rule is
//! unsatisfied, pick one uniformly at random among the eligible
//! questions, query the oracle (up to the configured number of calls in
//! flight, at most one per question), apply the parser outcome to that
//! question's state, and finally build one estimate record per question.
//!
//! Interleaving questions instead of draining them one by one avoids
//! response ruts where an oracle anchors on its most recent answer to
//! the same prompt.

use std::collections::BTreeMap;

use futures::stream::{FuturesUnordered, StreamExt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::oracle::Oracle;
use crate::question::{QuestionBank, Sampler};
use crate::types::{Estimate, SiftError, StateSnapshot};

/// Progress observer: called synchronously after every state update
/// with a read-only snapshot of all question states.
pub type ProgressCallback = Box<dyn FnMut(&BTreeMap<String, StateSnapshot>) + Send>;

// ---------------------------------------------------------------------------
// Collector
// ---------------------------------------------------------------------------

/// Configurable driver for one collection run over a question bank.
pub struct Collector {
    concurrency: usize,
    rng: StdRng,
    progress: Option<ProgressCallback>,
}

impl Collector {
    pub fn new() -> Self {
        Self {
            concurrency: 1,
            rng: StdRng::from_entropy(),
            progress: None,
        }
    }

    /// Maximum number of oracle calls in flight. Validated at the start
    /// of `collect`; must be at least 1.
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit;
        self
    }

    /// Seed the question-selection RNG for deterministic runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Install a progress callback.
    pub fn on_progress(
        mut self,
        callback: impl FnMut(&BTreeMap<String, StateSnapshot>) + Send + 'static,
    ) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Run the battery to completion.
    ///
    /// Returns one estimate per question, keyed by question id. Oracle
    /// failures abort the run immediately (in-flight calls are dropped)
    /// and surface as [`SiftError::Oracle`]; dropping the returned
    /// future cancels the run without finalising anything.
    pub async fn collect<O>(
        mut self,
        bank: &QuestionBank,
        oracle: &O,
    ) -> Result<BTreeMap<String, Estimate>, SiftError>
    where
        O: Oracle + ?Sized,
    {
        if bank.is_empty() {
            return Err(SiftError::EmptyBank);
        }
        if self.concurrency == 0 {
            return Err(SiftError::ZeroConcurrency);
        }

        info!(
            questions = bank.len(),
            concurrency = self.concurrency,
            "starting collection"
        );

        let questions = bank.questions();
        let mut samplers: Vec<_> = questions.iter().map(|q| q.start()).collect();
        let mut in_flight = vec![false; samplers.len()];
        let mut pending = FuturesUnordered::new();

        loop {
            // Fill free slots. At most one outstanding call per question
            // keeps each state machine well-defined.
            while pending.len() < self.concurrency {
                let Some(index) = self.pick_question(&samplers, &in_flight) else {
                    break;
                };
                in_flight[index] = true;
                let prompt = questions[index].prompt().to_string();
                debug!(question = questions[index].id(), "dispatching oracle query");
                pending.push(async move { (index, oracle.query(&prompt).await) });
            }

            // Nothing pending and nothing eligible: the battery is done.
            let Some((index, outcome)) = pending.next().await else {
                break;
            };
            in_flight[index] = false;

            let response = match outcome {
                Ok(response) => response,
                Err(source) => {
                    let id = questions[index].id().to_string();
                    warn!(question = %id, error = %source, "oracle query failed");
                    return Err(SiftError::Oracle { id, source });
                }
            };

            // Samples land in completion order, not dispatch order.
            samplers[index].absorb(&response);

            if let Some(callback) = self.progress.as_mut() {
                let snapshot = snapshot_map(bank, &samplers);
                callback(&snapshot);
            }
        }

        let mut results = BTreeMap::new();
        for (question, sampler) in questions.iter().zip(&samplers) {
            let estimate = sampler.finalize();
            debug!(
                question = question.id(),
                archetype = %estimate.archetype,
                samples = estimate.sample_count,
                "question finalised"
            );
            results.insert(question.id().to_string(), estimate);
        }

        info!(questions = results.len(), "collection complete");
        Ok(results)
    }

    /// Uniform-random choice among questions that are neither done nor
    /// already in flight.
    fn pick_question(
        &mut self,
        samplers: &[Box<dyn Sampler + '_>],
        in_flight: &[bool],
    ) -> Option<usize> {
        let eligible: Vec<usize> = samplers
            .iter()
            .enumerate()
            .filter(|(i, sampler)| !in_flight[*i] && !sampler.is_done())
            .map(|(i, _)| i)
            .collect();
        if eligible.is_empty() {
            None
        } else {
            Some(eligible[self.rng.gen_range(0..eligible.len())])
        }
    }
}

impl Default for Collector {
    fn default() -> Self {
        Self::new()
    }
}

fn snapshot_map(
    bank: &QuestionBank,
    samplers: &[Box<dyn Sampler + '_>],
) -> BTreeMap<String, StateSnapshot> {
    bank.questions()
        .iter()
        .zip(samplers)
        .map(|(question, sampler)| (question.id().to_string(), sampler.snapshot()))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
