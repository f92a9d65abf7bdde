//! Number and duration parsing
//!
//! Duration numbers arrive as digits ("12"), parenthesized digits ("(12)"),
//! or spelled English words up to twenty-four ("twelve", "twenty-one" with
//! any of the unicode hyphens the conversion service emits).

use super::error::PopError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Day counts above this are treated as parse artifacts, not durations.
pub(crate) const MAX_DURATION_DAYS: i64 = 999_999_999;

/// Days per month used when converting month counts, matching the
/// reconciliation convention of the upstream classifier.
pub(crate) const DAYS_PER_MONTH: f64 = 30.41;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeUnit {
    Days,
    Months,
    Years,
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeUnit::Days => write!(f, "days"),
            TimeUnit::Months => write!(f, "months"),
            TimeUnit::Years => write!(f, "years"),
        }
    }
}

/// Parse a number token: parentheses stripped, digits first, spelled word
/// as the fallback.
pub(crate) fn parse_number_token(token: &str) -> Result<i64, PopError> {
    let stripped = token.trim().trim_matches(|c| c == '(' || c == ')');
    if let Ok(value) = stripped.parse::<i64>() {
        return Ok(value);
    }
    spelled_value(stripped).ok_or_else(|| PopError::MalformedNumber {
        token: token.to_string(),
    })
}

fn spelled_value(word: &str) -> Option<i64> {
    // normalize the hyphen/en-dash variants seen in converted PDFs
    let normalized = word.to_lowercase().replace(['\u{2010}', '\u{2013}'], "-");
    let value = match normalized.as_str() {
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        "thirteen" => 13,
        "fourteen" => 14,
        "fifteen" => 15,
        "sixteen" => 16,
        "seventeen" => 17,
        "eighteen" => 18,
        "nineteen" => 19,
        "twenty" => 20,
        "twenty-one" => 21,
        "twenty-two" => 22,
        "twenty-three" => 23,
        "twenty-four" => 24,
        _ => return None,
    };
    Some(value)
}

/// Convert a duration number and unit into days.
///
/// Days pass through verbatim, months round at 30.41 days, years use exactly
/// 365 days. Overflow or implausible magnitudes are `MalformedDuration`.
pub(crate) fn duration_days(number: i64, unit: TimeUnit) -> Result<i64, PopError> {
    let days = match unit {
        TimeUnit::Days => Some(number),
        TimeUnit::Months => {
            let scaled = number as f64 * DAYS_PER_MONTH;
            if scaled.is_finite() && scaled.abs() <= MAX_DURATION_DAYS as f64 {
                Some(scaled.round() as i64)
            } else {
                None
            }
        }
        TimeUnit::Years => number.checked_mul(365),
    };

    days.filter(|d| d.abs() <= MAX_DURATION_DAYS)
        .ok_or(PopError::MalformedDuration { number, unit })
}
