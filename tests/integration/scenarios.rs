//! End-to-end collection scenarios against the scripted oracle.
//!
//! Each test drives a full battery through `Collector::collect` with a
//! deterministic seed and asserts the finalised estimate records.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use sift::engine::collector::Collector;
use sift::estimate::{MedianEstimator, ModeEstimator};
use sift::parse::{FloatParser, LiteralParser};
use sift::question::{Question, QuestionBank};
use sift::stop::StopRule;
use sift::types::{Archetype, SiftError, Value};

use crate::init_test_logging;
use crate::mock_oracle::ScriptedOracle;

const PROTEIN_PROMPT: &str = "How many grams of protein per 100g of chicken breast?";

fn bank_of(questions: Vec<Question<f64>>) -> QuestionBank {
    let mut bank = QuestionBank::new();
    for q in questions {
        bank.push(q).unwrap();
    }
    bank
}

// ---------------------------------------------------------------------------
// Numerical consensus
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_stable_numerical_consensus() {
    init_test_logging();
    let bank = bank_of(vec![Question::numeric("protein", PROTEIN_PROMPT).unwrap()]);
    let oracle = ScriptedOracle::new("31").script(
        "protein",
        &["31", "31", "29", "31", "280", "30", "31", "32", "31", "30"],
    );

    let results = Collector::new()
        .with_seed(1)
        .collect(&bank, &oracle)
        .await
        .unwrap();

    let estimate = &results["protein"];
    assert_eq!(estimate.value, Some(Value::Number(31.0)));
    assert!(estimate.confidence >= 0.85, "confidence {}", estimate.confidence);
    assert!(matches!(
        estimate.archetype,
        Archetype::Confident | Archetype::Acceptable,
    ));
    // The engine may stop as soon as its rule fires, so at most the
    // scripted ten samples are consumed
    assert!(estimate.sample_count <= 10);
    assert_eq!(estimate.decline_count, 0);
}

#[tokio::test]
async fn test_consensus_is_median_not_mean() {
    let bank = bank_of(vec![Question::numeric("protein", PROTEIN_PROMPT).unwrap()]);
    let oracle = ScriptedOracle::new("30").script(
        "protein",
        &["31", "31", "29", "31", "280", "30", "31", "32", "31", "30"],
    );

    let results = Collector::new()
        .with_seed(2)
        .collect(&bank, &oracle)
        .await
        .unwrap();

    // The 280 outlier would drag the arithmetic mean to ~80.6; the
    // consensus must be the median instead
    let value = results["protein"].value.as_ref().unwrap().as_number().unwrap();
    assert_eq!(value, 31.0);
}

// ---------------------------------------------------------------------------
// Boolean consensus
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_unanimous_boolean_early_stop() {
    let mut bank = QuestionBank::new();
    bank.push(Question::boolean("is_vegan", "Is chickpea flour vegan?").unwrap())
        .unwrap();
    let oracle = ScriptedOracle::new("no").script("vegan", &["yes", "yes", "yes"]);

    let results = Collector::new()
        .with_seed(3)
        .collect(&bank, &oracle)
        .await
        .unwrap();

    let estimate = &results["is_vegan"];
    assert_eq!(estimate.value, Some(Value::Bool(true)));
    assert_eq!(estimate.confidence, 1.0);
    assert_eq!(estimate.sample_count, 3);
    // Unanimity fired before the fallback "no" could ever be served
    assert_eq!(oracle.call_count(), 3);
    assert!(oracle.calls().iter().all(|p| p.contains("vegan")));
}

// ---------------------------------------------------------------------------
// Declines
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_all_declines_yield_insufficient_data() {
    let bank = bank_of(vec![Question::numeric("protein", PROTEIN_PROMPT).unwrap()]);
    let oracle = ScriptedOracle::new("UNKNOWN");

    let results = Collector::new()
        .with_seed(4)
        .collect(&bank, &oracle)
        .await
        .unwrap();

    let estimate = &results["protein"];
    assert_eq!(estimate.archetype, Archetype::InsufficientData);
    assert_eq!(estimate.value, None);
    assert_eq!(estimate.confidence, 0.0);
    assert_eq!(estimate.sample_count, 0);
    // The five-decline streak halts the question
    assert_eq!(estimate.decline_count, 5);
}

#[tokio::test]
async fn test_parse_failure_resets_decline_streak() {
    let question = Question::new(
        "protein",
        PROTEIN_PROMPT,
        FloatParser::new(),
        MedianEstimator,
        StopRule::ConsecutiveDeclines(3),
    )
    .unwrap();
    let bank = bank_of(vec![question]);
    let oracle = ScriptedOracle::new("UNKNOWN")
        .script("protein", &["UNKNOWN", "UNKNOWN", "garbage", "UNKNOWN"]);

    let after_fourth = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&after_fourth);

    let results = Collector::new()
        .with_seed(5)
        .on_progress(move |states| {
            let snap = &states["protein"];
            if snap.query_count() == 4 {
                *sink.lock().unwrap() = Some((snap.consecutive_declines, snap.done));
            }
        })
        .collect(&bank, &oracle)
        .await
        .unwrap();

    // After UNKNOWN, UNKNOWN, garbage, UNKNOWN the streak is 1, not 3:
    // the parse failure reset it, so sampling continued
    let (streak, done) = after_fourth.lock().unwrap().unwrap();
    assert_eq!(streak, 1);
    assert!(!done);

    // Two more fallback declines complete the streak of three
    assert_eq!(oracle.call_count(), 6);
    let estimate = &results["protein"];
    assert_eq!(estimate.decline_count, 5);
    assert_eq!(estimate.archetype, Archetype::InsufficientData);
}

// ---------------------------------------------------------------------------
// Categorical consensus
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_categorical_mode_confidence() {
    let question = Question::new(
        "unit",
        "What is the natural serving unit for chicken breast?",
        LiteralParser::new(&["gram", "piece", "breast", "cup"]),
        ModeEstimator::new(4),
        StopRule::MinSamples(5),
    )
    .unwrap();
    let mut bank = QuestionBank::new();
    bank.push(question).unwrap();
    let oracle = ScriptedOracle::new("gram")
        .script("unit", &["breast", "gram", "breast", "breast", "breast"]);

    let results = Collector::new()
        .with_seed(6)
        .collect(&bank, &oracle)
        .await
        .unwrap();

    let estimate = &results["unit"];
    assert_eq!(estimate.value, Some(Value::Text("breast".into())));
    // 4 of 5 agree over 4 options: (0.8 - 0.25) / (1 - 0.25) = 11/15,
    // and no declines means no penalty on top
    assert!((estimate.confidence - 11.0 / 15.0).abs() < 1e-12);
    assert_eq!(estimate.decline_count, 0);
    assert_eq!(estimate.sample_count, 5);
}

// ---------------------------------------------------------------------------
// Battery invariants
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_mixed_battery_one_estimate_per_question() {
    init_test_logging();
    let mut bank = QuestionBank::new();
    bank.push(Question::numeric("protein", PROTEIN_PROMPT).unwrap())
        .unwrap();
    bank.push(Question::boolean("is_vegan", "Is chicken breast vegan?").unwrap())
        .unwrap();
    bank.push(
        Question::categorical(
            "unit",
            "Natural serving unit for chicken breast?",
            &["gram", "piece", "breast", "cup"],
        )
        .unwrap(),
    )
    .unwrap();

    let oracle = ScriptedOracle::new("UNKNOWN")
        .script("protein", &["31", "30", "31", "31", "32", "31"])
        .script("vegan", &["no", "no", "no"])
        .script("unit", &["breast", "breast", "breast"]);

    let updates = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&updates);

    let results = Collector::new()
        .with_seed(7)
        .on_progress(move |states| {
            counter.fetch_add(1, Ordering::SeqCst);
            // Consistency: every snapshot satisfies the accounting identity
            for snap in states.values() {
                assert_eq!(
                    snap.query_count(),
                    snap.sample_count
                        + snap.decline_count as usize
                        + snap.parse_failure_count as usize,
                );
            }
        })
        .collect(&bank, &oracle)
        .await
        .unwrap();

    // Every question appears exactly once in the output
    assert_eq!(results.len(), 3);
    for id in ["protein", "is_vegan", "unit"] {
        assert!(results.contains_key(id), "missing estimate for {id}");
        let c = results[id].confidence;
        assert!((0.0..=1.0).contains(&c), "confidence {c} out of range");
    }

    assert_eq!(results["is_vegan"].value, Some(Value::Bool(false)));
    assert_eq!(results["unit"].value, Some(Value::Text("breast".into())));

    // One progress callback per oracle completion
    assert_eq!(updates.load(Ordering::SeqCst), oracle.call_count());
}

#[tokio::test]
async fn test_budget_halts_unparseable_oracle() {
    let bank = bank_of(vec![Question::numeric("protein", PROTEIN_PROMPT).unwrap()]);
    // Never declines, never parses: only MaxQueries can end this
    let oracle = ScriptedOracle::new("ask again later");

    let results = Collector::new()
        .with_seed(8)
        .collect(&bank, &oracle)
        .await
        .unwrap();

    assert_eq!(oracle.call_count(), 20);
    let estimate = &results["protein"];
    assert_eq!(estimate.archetype, Archetype::InsufficientData);
    assert_eq!(estimate.sample_count, 0);
    assert_eq!(estimate.decline_count, 0);
}

#[tokio::test]
async fn test_oracle_outage_aborts_collection() {
    let bank = bank_of(vec![Question::numeric("protein", PROTEIN_PROMPT).unwrap()]);
    let oracle = ScriptedOracle::new("31");
    oracle.set_error("upstream 503");

    let err = Collector::new()
        .with_seed(9)
        .collect(&bank, &oracle)
        .await
        .unwrap_err();

    match err {
        SiftError::Oracle { id, source } => {
            assert_eq!(id, "protein");
            assert!(source.to_string().contains("503"));
        }
        other => panic!("expected oracle error, got {other}"),
    }
}

#[tokio::test]
async fn test_one_query_in_flight_per_question() {
    let bank = bank_of(vec![Question::numeric("protein", PROTEIN_PROMPT).unwrap()]);

    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let (active_in, peak_in) = (Arc::clone(&active), Arc::clone(&peak));

    let oracle = move |_prompt: String| {
        let active = Arc::clone(&active_in);
        let peak = Arc::clone(&peak_in);
        async move {
            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
            active.fetch_sub(1, Ordering::SeqCst);
            Ok::<_, anyhow::Error>("31".to_string())
        }
    };

    // Concurrency budget of 4, but a single question may never have more
    // than one call outstanding
    let results = Collector::new()
        .with_concurrency(4)
        .with_seed(10)
        .collect(&bank, &oracle)
        .await
        .unwrap();

    assert_eq!(peak.load(Ordering::SeqCst), 1);
    assert_eq!(results["protein"].sample_count, 5);
}
