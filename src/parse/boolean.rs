//! Boolean parser.
//!
//! Maps yes/no style responses onto `bool` through configurable truthy
//! and falsy vocabularies.

use super::{default_keywords, matches_decline, normalise_keywords, Outcome, Parser};

const DEFAULT_TRUTHY: &[&str] = &["yes", "true", "1", "y"];
const DEFAULT_FALSY: &[&str] = &["no", "false", "0", "n"];

/// Parses a trimmed, case-folded response as a boolean.
///
/// Members of the truthy set map to `true`, members of the falsy set to
/// `false`; anything else is a parse failure.
pub struct BoolParser {
    truthy: Vec<String>,
    falsy: Vec<String>,
    decline_keywords: Vec<String>,
}

impl BoolParser {
    pub fn new() -> Self {
        Self {
            truthy: DEFAULT_TRUTHY.iter().map(|s| s.to_string()).collect(),
            falsy: DEFAULT_FALSY.iter().map(|s| s.to_string()).collect(),
            decline_keywords: default_keywords(),
        }
    }

    /// Replace both vocabularies. Entries are matched case-insensitively.
    pub fn with_vocabulary(mut self, truthy: &[&str], falsy: &[&str]) -> Self {
        self.truthy = truthy.iter().map(|s| s.to_lowercase()).collect();
        self.falsy = falsy.iter().map(|s| s.to_lowercase()).collect();
        self
    }

    /// Replace the decline keyword set for this parser.
    pub fn with_decline_keywords(mut self, keywords: &[&str]) -> Self {
        self.decline_keywords = normalise_keywords(keywords.iter().copied());
        self
    }
}

impl Default for BoolParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser<bool> for BoolParser {
    fn parse(&self, response: &str) -> Outcome<bool> {
        if matches_decline(response, &self.decline_keywords) {
            return Outcome::Decline;
        }

        let folded = response.trim().to_lowercase();
        if self.truthy.iter().any(|t| *t == folded) {
            Outcome::Value(true)
        } else if self.falsy.iter().any(|f| *f == folded) {
            Outcome::Value(false)
        } else {
            Outcome::Failure
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
