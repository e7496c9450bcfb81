//! Float parser.
//!
//! Extracts the first decimal number from a free-text oracle response,
//! with optional unit conversion through a caller-supplied
//! unit → multiplier table.

use std::collections::HashMap;

use super::{default_keywords, matches_decline, normalise_keywords, Outcome, Parser};

// ---------------------------------------------------------------------------
// FloatParser
// ---------------------------------------------------------------------------

/// Parses the first decimal number (optional leading sign and decimal
/// point) out of a response, together with an optional alphabetic unit
/// token immediately following it.
///
/// When a unit table has been declared via [`FloatParser::with_units`],
/// a recognised unit multiplies the value and an unrecognised unit is a
/// parse failure. Without a table, unit tokens are ignored.
pub struct FloatParser {
    decline_keywords: Vec<String>,
    /// Lower-cased unit token → multiplier.
    units: HashMap<String, f64>,
}

impl FloatParser {
    pub fn new() -> Self {
        Self {
            decline_keywords: default_keywords(),
            units: HashMap::new(),
        }
    }

    /// Declare the accepted units. Matching is case-insensitive.
    pub fn with_units(mut self, units: &[(&str, f64)]) -> Self {
        self.units = units
            .iter()
            .map(|(name, mult)| (name.trim().to_lowercase(), *mult))
            .collect();
        self
    }

    /// Replace the decline keyword set for this parser.
    pub fn with_decline_keywords(mut self, keywords: &[&str]) -> Self {
        self.decline_keywords = normalise_keywords(keywords.iter().copied());
        self
    }
}

impl Default for FloatParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser<f64> for FloatParser {
    fn parse(&self, response: &str) -> Outcome<f64> {
        if matches_decline(response, &self.decline_keywords) {
            return Outcome::Decline;
        }

        let Some((value, unit)) = extract_number(response) else {
            return Outcome::Failure;
        };

        match unit {
            Some(token) if !self.units.is_empty() => {
                match self.units.get(&token.to_lowercase()) {
                    Some(multiplier) => Outcome::Value(value * multiplier),
                    None => Outcome::Failure,
                }
            }
            _ => Outcome::Value(value),
        }
    }
}

// ---------------------------------------------------------------------------
// Number extraction
// ---------------------------------------------------------------------------

/// Scan for the first decimal number in the text, returning it together
/// with the alphabetic token (if any) that immediately follows it.
fn extract_number(text: &str) -> Option<(f64, Option<String>)> {
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        if !starts_number(&chars, i) {
            i += 1;
            continue;
        }

        let mut literal = String::new();
        if chars[i] == '+' || chars[i] == '-' {
            literal.push(chars[i]);
            i += 1;
        }
        let mut seen_point = false;
        while i < chars.len() {
            let c = chars[i];
            if c.is_ascii_digit() {
                literal.push(c);
                i += 1;
            } else if c == '.' && !seen_point {
                seen_point = true;
                literal.push(c);
                i += 1;
            } else {
                break;
            }
        }

        if let Ok(value) = literal.parse::<f64>() {
            // Unit token: alphabetic run directly after the number,
            // optionally separated by spaces ("3 kg" and "250mg" both count).
            let mut j = i;
            while j < chars.len() && chars[j] == ' ' {
                j += 1;
            }
            let mut unit = String::new();
            while j < chars.len() && chars[j].is_alphabetic() {
                unit.push(chars[j]);
                j += 1;
            }
            let unit = if unit.is_empty() { None } else { Some(unit) };
            return Some((value, unit));
        }
        // Not a number after all (lone "-" or "."): keep scanning.
    }

    None
}

/// Whether a number literal can start at position `i`.
fn starts_number(chars: &[char], i: usize) -> bool {
    match chars[i] {
        c if c.is_ascii_digit() => true,
        '+' | '-' => {
            matches!(chars.get(i + 1), Some(c) if c.is_ascii_digit())
                || (chars.get(i + 1) == Some(&'.')
                    && matches!(chars.get(i + 2), Some(c) if c.is_ascii_digit()))
        }
        '.' => matches!(chars.get(i + 1), Some(c) if c.is_ascii_digit()),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
