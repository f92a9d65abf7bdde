//! Compiled regex patterns for period-of-performance extraction
//!
//! All patterns are built once into `Lazy` statics and use named capture
//! groups; strategies never touch positional group indices. The character
//! classes carry the unicode hyphen/dash variants that survive PDF
//! conversion.

use once_cell::sync::Lazy;
use regex::Regex;

/// Spelled numbers one through twenty-four, longest alternatives first so the
/// compound forms win over their prefixes.
const SPELLED_NUMBERS: &str = "twenty[‐–-]four|twenty[‐–-]three|twenty[‐–-]two|twenty[‐–-]one|\
twenty|nineteen|eighteen|seventeen|sixteen|fifteen|fourteen|thirteen|twelve|eleven|ten|\
nine|eight|seven|six|five|four|three|two|one";

const MONTH_NAMES: &str = "Jan(?:uary)?|Feb(?:ruary)?|Mar(?:ch)?|May|Apr(?:il)?|July|Jun(?:e)?|\
Aug(?:ust)?|October|Sep(?:tember)?|Nov(?:ember)?|Dec(?:ember)?";

/// Period designator: explicit base, numbered or generic option period, or
/// numbered or generic award term. The free-text tails keep the whole
/// designator phrase available as a literal period key.
fn designator_pattern() -> String {
    format!(
        r"(?:(?P<option>option(?:al)?\s*(?:period|year)?\s*(?:(?P<option_number>\d{{1,3}}|{SPELLED_NUMBERS})|\b[\w ]{{1,30}}\b)?)|(?P<base>based?\s*(?:period)?\b[\w: ]{{0,30}}\b)|(?P<award>award-?\s*(?:term)?\s*(?P<award_number>\d{{1,3}}|{SPELLED_NUMBERS})?))\s*\)?"
    )
}

/// Separator between a designator and its duration.
const FILLER: &str = r"\s*(?:[-:‐–]|of)*\s*";

/// A duration phrase: digit or spelled number, optional parenthesized digit
/// echo, then a day/month/year unit.
fn duration_pattern() -> String {
    format!(
        r"\(?\s*(?P<duration>(?:(?P<duration_digits>\d+)|(?P<duration_word>{SPELLED_NUMBERS})\s*(?:\(\d+\))?)\s*\)?\s*[‐–-]*\s*(?:(?P<days>days?)|(?P<months>months?)|(?P<years>years?)))"
    )
}

fn date_literal_pattern() -> String {
    format!(
        r"(?:\d{{1,2}}[/\\](?:\d{{1,2}}[/\\])*(?:\d{{4}}|\d{{2}})|(?:{MONTH_NAMES})\s*\.?\s*\d+(?:st|nd|rd|th)*,?\s*(?:\d{{4}}|\d{{2}}))"
    )
}

/// Strategy A: `<designator> <number> <unit>`.
pub(crate) static FULL_PERIOD_WORDS_RE: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!("(?i){}{}{}", designator_pattern(), FILLER, duration_pattern());
    Regex::new(&pattern).expect("period duration-words pattern")
});

/// Strategy B: `<designator> <date1> <connector> <date2>`.
pub(crate) static FULL_PERIOD_DATES_RE: Lazy<Regex> = Lazy::new(|| {
    let date = date_literal_pattern();
    let pattern = format!(
        r"(?i){}{}\(?\s*(?P<date_range>(?P<date1>{date})\s*(?:[-:‐–]|through|to|thru| )\s*(?P<date2>{date}))",
        designator_pattern(),
        FILLER,
    );
    Regex::new(&pattern).expect("period date-range pattern")
});

/// Strategy C: `[multiplier] <per-unit number> <unit> <base|option|award>`.
pub(crate) static MULTIPLIER_WORDS_RE: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(
        r"(?i)(?P<mult_word>{SPELLED_NUMBERS})?\s*(?P<mult_digits>\(?\d+\)?)?\s*,?\s*(?P<per_word>{SPELLED_NUMBERS})?\s*(?P<per_digits>\(?\d+\)?)?\s*[‐–-]*\s*(?:(?P<days>days?)|(?P<months>months?)|(?P<years>years?))\s*(?:(?P<base>base\s*(?:period)?)|(?P<option>option\s*(?:period)?)|(?P<award>award(?:-?|\s*)terms))"
    );
    Regex::new(&pattern).expect("multiplier phrasing pattern")
});

/// Strategy D: any bare `<number> <unit>` phrase, no designator context.
/// Deliberately compiled without `(?i)`, matching only the lowercase unit
/// forms the conversion service normalizes body text to.
pub(crate) static CATCH_ALL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&duration_pattern()).expect("catch-all duration pattern"));

/// February 29 in any spelling, for leap-typo normalization.
pub(crate) static FEB_29_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)feb(?:ruary)?\s*\.?\s*29").expect("february 29 pattern"));

/// Month-name token for decomposing a matched date literal.
pub(crate) static MONTH_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b(?:{MONTH_NAMES})")).expect("month token pattern")
});

pub(crate) static NUMBER_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+").expect("number token pattern"));

// Line-admission patterns for gathering PoP evidence out of the topic's
// attached lines.
pub(crate) static EVIDENCE_DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // numeric dates: 12/31/2021, 12-31-21, 2021/12/31
        Regex::new(
            r"\b\d{1,2}[/-]\d{1,2}[/-]?(?:\d{4}|\d{2})|(?:\d{4}|\d{2})[/-]\d{1,2}[/-]\d{1,2}\b",
        )
        .expect("numeric evidence date pattern"),
        // month-name tokens
        Regex::new(&format!(r"(?i)\b(?:{MONTH_NAMES})\b")).expect("month evidence pattern"),
        // bare four-digit years
        Regex::new(r"\b(?:19|20)[0-9]{2}\b").expect("year evidence pattern"),
    ]
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_words_pattern_names_groups() {
        let caps = FULL_PERIOD_WORDS_RE
            .captures("Option Period 2: 12 months")
            .expect("should match an option period duration");
        assert!(caps.name("option").is_some());
        assert_eq!(caps.name("option_number").unwrap().as_str(), "2");
        assert_eq!(caps.name("duration_digits").unwrap().as_str(), "12");
        assert!(caps.name("months").is_some());
        assert!(caps.name("base").is_none());
    }

    #[test]
    fn test_duration_words_spelled_number() {
        let caps = FULL_PERIOD_WORDS_RE
            .captures("base period: twelve months")
            .expect("should match a spelled base duration");
        assert!(caps.name("base").is_some());
        assert_eq!(caps.name("duration_word").unwrap().as_str(), "twelve");
    }

    #[test]
    fn test_date_range_pattern() {
        let caps = FULL_PERIOD_DATES_RE
            .captures("Base Period: 01/01/2021 \u{2013} 12/31/2021")
            .expect("should match a numeric date range");
        assert!(caps.name("base").is_some());
        assert!(caps.name("date_range").is_some());
        assert!(caps.name("date1").unwrap().as_str().ends_with("2021"));
        assert_eq!(caps.name("date2").unwrap().as_str(), "12/31/2021");
    }

    #[test]
    fn test_multiplier_pattern() {
        let caps = MULTIPLIER_WORDS_RE
            .captures("four (4) twelve (12) month option periods")
            .expect("should match multiplier phrasing");
        assert_eq!(caps.name("mult_digits").unwrap().as_str(), "(4)");
        assert_eq!(caps.name("per_digits").unwrap().as_str(), "(12)");
        assert!(caps.name("months").is_some());
        assert!(caps.name("option").is_some());
    }

    #[test]
    fn test_catch_all_is_case_sensitive() {
        assert!(CATCH_ALL_RE.is_match("up to 18 months of support"));
        assert!(!CATCH_ALL_RE.is_match("18 MONTHS"));
    }

    #[test]
    fn test_compound_spelled_numbers_win_over_prefixes() {
        let caps = FULL_PERIOD_WORDS_RE
            .captures("option period: twenty-four months")
            .expect("should match compound spelled duration");
        assert_eq!(caps.name("duration_word").unwrap().as_str(), "twenty-four");
    }
}
