//! Error kinds for the period-of-performance engine
//!
//! Every variant is a per-candidate or per-strategy condition: the caller
//! logs it and moves on. Nothing here aborts a Document.

use super::numbers::TimeUnit;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PopError {
    /// A digit or spelled-word number failed to parse.
    #[error("malformed number {token:?}")]
    MalformedNumber { token: String },

    /// Number and unit were present but the day count is implausible.
    #[error("implausible duration: {number} {unit}")]
    MalformedDuration { number: i64, unit: TimeUnit },

    /// A date literal stayed unparseable even after leap-typo normalization.
    #[error("unparseable date {text:?}")]
    MalformedDateRange { text: String },

    /// A capture group the matched designator implies was absent.
    #[error("capture group `{group}` missing for matched designator")]
    MissingCaptureGroup { group: &'static str },

    /// An entire strategy failed; its record set is reported empty.
    #[error("strategy {strategy} failed: {message}")]
    StrategyFatal {
        strategy: &'static str,
        message: String,
    },
}
