//! Literal parser.
//!
//! Accepts a response iff it equals one of a finite set of options,
//! returning the canonical option string.

use super::{default_keywords, matches_decline, normalise_keywords, Outcome, Parser};

/// Matches the trimmed response against a caller-supplied option set.
///
/// Matching is case-folded by default; [`LiteralParser::case_sensitive`]
/// switches to exact comparison. A successful parse yields the canonical
/// option string, not the raw response.
pub struct LiteralParser {
    options: Vec<String>,
    fold_case: bool,
    decline_keywords: Vec<String>,
}

impl LiteralParser {
    pub fn new(options: &[&str]) -> Self {
        Self {
            options: options.iter().map(|s| s.to_string()).collect(),
            fold_case: true,
            decline_keywords: default_keywords(),
        }
    }

    /// Require exact (case-sensitive) matches.
    pub fn case_sensitive(mut self) -> Self {
        self.fold_case = false;
        self
    }

    /// Replace the decline keyword set for this parser.
    pub fn with_decline_keywords(mut self, keywords: &[&str]) -> Self {
        self.decline_keywords = normalise_keywords(keywords.iter().copied());
        self
    }

    /// Number of options in the set. Useful for sizing a categorical
    /// estimator's domain.
    pub fn option_count(&self) -> usize {
        self.options.len()
    }
}

impl Parser<String> for LiteralParser {
    fn parse(&self, response: &str) -> Outcome<String> {
        if matches_decline(response, &self.decline_keywords) {
            return Outcome::Decline;
        }

        let trimmed = response.trim();
        for option in &self.options {
            let hit = if self.fold_case {
                option.eq_ignore_ascii_case(trimmed)
            } else {
                option == trimmed
            };
            if hit {
                return Outcome::Value(option.clone());
            }
        }
        Outcome::Failure
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
