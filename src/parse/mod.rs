//! Response parsers.
//!
//! Defines the `Parser` trait plus decline detection, and provides the
//! built-in float, literal, and boolean parsers in sibling modules.

pub mod boolean;
pub mod float;
pub mod literal;

pub use boolean::BoolParser;
pub use float::FloatParser;
pub use literal::LiteralParser;

/// Keywords that mark a response as a refusal to answer. Matching is a
/// case-insensitive substring test over the trimmed response, so phrases
/// like "I don't know — UNKNOWN" still count as declines.
pub const DEFAULT_DECLINE_KEYWORDS: &[&str] = &["UNKNOWN", "INSUFFICIENT_DATA"];

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Result of running a parser against a raw oracle response.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The response carried a usable value.
    Value(T),
    /// The oracle refused to answer (matched a decline keyword).
    Decline,
    /// The response was unintelligible to this parser.
    Failure,
}

impl<T> Outcome<T> {
    pub fn is_decline(&self) -> bool {
        matches!(self, Outcome::Decline)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure)
    }

    /// The parsed value, if any.
    pub fn value(self) -> Option<T> {
        match self {
            Outcome::Value(v) => Some(v),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Abstraction over response parsers.
///
/// Implementors map a raw response string to a typed value, a decline
/// marker, or a parse failure. The decline check must run before any
/// type-specific parsing: "UNKNOWN 42" is a decline, not the number 42.
pub trait Parser<T>: Send + Sync {
    fn parse(&self, response: &str) -> Outcome<T>;
}

/// Shared decline check. Keywords are expected upper-cased; the response
/// is trimmed and upper-cased before the substring scan.
pub(crate) fn matches_decline(response: &str, keywords: &[String]) -> bool {
    let folded = response.trim().to_uppercase();
    keywords.iter().any(|k| folded.contains(k.as_str()))
}

/// Normalise a caller-supplied keyword set: upper-cased, empties dropped.
pub(crate) fn normalise_keywords<I, S>(keywords: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    keywords
        .into_iter()
        .map(|k| k.as_ref().trim().to_uppercase())
        .filter(|k| !k.is_empty())
        .collect()
}

pub(crate) fn default_keywords() -> Vec<String> {
    normalise_keywords(DEFAULT_DECLINE_KEYWORDS.iter().copied())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
