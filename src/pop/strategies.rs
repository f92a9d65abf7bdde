//! The four period-of-performance extraction strategies
//!
//! Each strategy independently scans the gathered evidence text and yields a
//! map of period key -> record. Within one strategy the first successful
//! parse of a key wins; later duplicates are logged and dropped, never
//! overwritten. Every per-match failure is logged and discarded without
//! touching the rest of the strategy.

use super::error::PopError;
use super::numbers::{TimeUnit, duration_days, parse_number_token};
use super::patterns::{
    CATCH_ALL_RE, FEB_29_RE, FULL_PERIOD_DATES_RE, FULL_PERIOD_WORDS_RE, MONTH_TOKEN_RE,
    MULTIPLIER_WORDS_RE, NUMBER_TOKEN_RE,
};
use chrono::NaiveDate;
use regex::Captures;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Period key -> parsed record, one namespace per strategy.
pub type PeriodMap = BTreeMap<String, PeriodRecord>;

pub const BASE_KEY: &str = "base";
pub(crate) const OPTIONS_ALL_KEY: &str = "options";
pub(crate) const AWARD_TERM_KEY: &str = "award";
pub(crate) const ADDITIONAL_KEY: &str = "additional";

/// One strategy's parsed duration entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodRecord {
    /// The span of evidence text this record was parsed from.
    pub matched_text: String,
    pub days: i64,
    pub detail: PeriodDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PeriodDetail {
    Duration {
        number: i64,
        unit: TimeUnit,
    },
    DateRange {
        start_text: String,
        end_text: String,
        start: NaiveDate,
        end: NaiveDate,
    },
    Multiplier {
        multiplier: Option<i64>,
        per_unit: i64,
        total: i64,
        unit: TimeUnit,
    },
}

/// Classify the matched designator into a period key.
///
/// Priority: explicit base keyword, then numbered option/award (digit or
/// spelled word), then a generic "option period"/"award term" phrase counted
/// as index 1, then the literal matched phrase itself.
fn classify_designator(caps: &Captures) -> Option<String> {
    if caps.name("base").is_some() {
        debug!("found base period");
        return Some(BASE_KEY.to_string());
    }

    if let Some(title) = caps.name("option") {
        let number = caps.name("option_number").and_then(|m| {
            parse_number_token(m.as_str())
                .map_err(|err| warn!("could not convert option number: {err}"))
                .ok()
        });
        let key = match number {
            Some(number) => format!("option_{number}"),
            None if title.as_str().trim().eq_ignore_ascii_case("option period") => {
                "option_1".to_string()
            }
            None => title.as_str().to_string(),
        };
        return Some(key);
    }

    if let Some(title) = caps.name("award") {
        let number = caps.name("award_number").and_then(|m| {
            parse_number_token(m.as_str())
                .map_err(|err| warn!("could not convert award number: {err}"))
                .ok()
        });
        let normalized = title.as_str().trim().to_lowercase();
        let key = match number {
            Some(number) => format!("award_{number}"),
            None if matches!(
                normalized.as_str(),
                "award term" | "award-term" | "award\u{2013}term"
            ) =>
            {
                "award_1".to_string()
            }
            None => title.as_str().to_string(),
        };
        return Some(key);
    }

    None
}

fn unit_from_captures(caps: &Captures) -> Result<TimeUnit, PopError> {
    if caps.name("days").is_some() {
        Ok(TimeUnit::Days)
    } else if caps.name("months").is_some() {
        Ok(TimeUnit::Months)
    } else if caps.name("years").is_some() {
        Ok(TimeUnit::Years)
    } else {
        Err(PopError::MissingCaptureGroup { group: "unit" })
    }
}

/// Strategy A: `<designator> <number> <unit>`, e.g. "Option Period 2: 12 months".
pub(crate) fn scrape_duration_words(text: &str) -> PeriodMap {
    let mut periods = PeriodMap::new();

    for caps in FULL_PERIOD_WORDS_RE.captures_iter(text) {
        let Some(key) = classify_designator(&caps) else {
            continue;
        };
        if periods.contains_key(&key) {
            warn!("not overwriting duplicate period of performance key {key:?}");
            continue;
        }

        let Some(duration) = caps.name("duration") else {
            warn!(
                "could not add period {key:?}: {}",
                PopError::MissingCaptureGroup { group: "duration" }
            );
            continue;
        };
        let token = caps
            .name("duration_digits")
            .or_else(|| caps.name("duration_word"));
        let Some(token) = token else {
            warn!(
                "could not add period {key:?}: {}",
                PopError::MissingCaptureGroup { group: "duration number" }
            );
            continue;
        };
        let number = match parse_number_token(token.as_str()) {
            Ok(number) => number,
            Err(err) => {
                warn!("dropping period {key:?}: {err}");
                continue;
            }
        };
        let unit = match unit_from_captures(&caps) {
            Ok(unit) => unit,
            Err(err) => {
                warn!("dropping period {key:?}: {err}");
                continue;
            }
        };
        let days = match duration_days(number, unit) {
            Ok(days) => days,
            Err(err) => {
                warn!("dropping period {key:?}: {err}");
                continue;
            }
        };

        periods.insert(
            key,
            PeriodRecord {
                matched_text: duration.as_str().to_string(),
                days,
                detail: PeriodDetail::Duration { number, unit },
            },
        );
    }

    periods
}

/// Strategy B: `<designator> <date1> <connector> <date2>`, e.g.
/// "Base Period: 01/01/2021 - 12/31/2021".
pub(crate) fn scrape_date_ranges(text: &str) -> PeriodMap {
    let mut periods = PeriodMap::new();

    for caps in FULL_PERIOD_DATES_RE.captures_iter(text) {
        let Some(key) = classify_designator(&caps) else {
            continue;
        };
        if periods.contains_key(&key) {
            warn!("not overwriting duplicate period of performance key {key:?}");
            continue;
        }

        let (Some(range), Some(date1), Some(date2)) = (
            caps.name("date_range"),
            caps.name("date1"),
            caps.name("date2"),
        ) else {
            warn!(
                "could not add period {key:?}: {}",
                PopError::MissingCaptureGroup { group: "date range" }
            );
            continue;
        };

        let (start_text, start) = match parse_date_with_leap_fallback(date1.as_str()) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!("dropping period {key:?}: {err}");
                continue;
            }
        };
        let (end_text, end) = match parse_date_with_leap_fallback(date2.as_str()) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!("dropping period {key:?}: {err}");
                continue;
            }
        };

        // duration passes through unvalidated: date2 before date1 yields a
        // negative day count
        let days = (end - start).num_days();
        periods.insert(
            key,
            PeriodRecord {
                matched_text: range.as_str().to_string(),
                days,
                detail: PeriodDetail::DateRange {
                    start_text,
                    end_text,
                    start,
                    end,
                },
            },
        );
    }

    periods
}

/// Strategy C: `[multiplier] <per-unit number> <unit> <base|option|award>`,
/// e.g. "four (4) twelve (12) month option periods".
///
/// This form only distinguishes base/options/award collectively, so two
/// collective option mentions on adjacent evidence lines are recorded as
/// distinct periods (`options` then `additional`); mentions further apart are
/// duplicates and dropped.
pub(crate) fn scrape_multiplier_words(
    text: &str,
    evidence_lines: &[String],
    evidence_indices: &[usize],
) -> PeriodMap {
    let mut periods = PeriodMap::new();
    let mut last_matched_text: Option<String> = None;

    for caps in MULTIPLIER_WORDS_RE.captures_iter(text) {
        let mut key = if caps.name("base").is_some() {
            BASE_KEY.to_string()
        } else if caps.name("option").is_some() {
            OPTIONS_ALL_KEY.to_string()
        } else if caps.name("award").is_some() {
            AWARD_TERM_KEY.to_string()
        } else {
            continue;
        };

        let multiplier = match caps.name("mult_digits").or_else(|| caps.name("mult_word")) {
            Some(token) => match parse_number_token(token.as_str()) {
                Ok(number) => Some(number),
                Err(err) => {
                    warn!("dropping period {key:?}: multiplier {err}");
                    continue;
                }
            },
            None => None,
        };
        let per_unit = match caps.name("per_digits").or_else(|| caps.name("per_word")) {
            Some(token) => match parse_number_token(token.as_str()) {
                Ok(number) => Some(number),
                Err(err) => {
                    warn!("dropping period {key:?}: per-unit number {err}");
                    continue;
                }
            },
            None => None,
        };
        // a per-unit number is required for the match to mean anything
        let Some(per_unit) = per_unit.filter(|n| *n != 0) else {
            continue;
        };

        let whole_match = caps.get(0).map(|m| m.as_str()).unwrap_or_default();

        if key == OPTIONS_ALL_KEY && periods.contains_key(OPTIONS_ALL_KEY) {
            let current_text = whole_match.replace('\n', " ");
            let previous_text = last_matched_text.as_deref().unwrap_or_default();
            match mention_line_delta(
                previous_text,
                &current_text,
                evidence_lines,
                evidence_indices,
            ) {
                Some(delta) if (0..=1).contains(&delta) => {
                    debug!("consecutive option mention; recording under additional key");
                    key = ADDITIONAL_KEY.to_string();
                }
                Some(delta) => {
                    debug!("option mention {delta} lines from previous; treated as repeat");
                }
                None => {
                    warn!("could not locate option mention lines; dropping match");
                    continue;
                }
            }
        }

        if periods.contains_key(&key) {
            warn!("not overwriting duplicate period of performance key {key:?}");
            continue;
        }

        let total = match multiplier.filter(|n| *n != 0) {
            Some(multiplier) => match multiplier.checked_mul(per_unit) {
                Some(total) => total,
                None => {
                    warn!("dropping period {key:?}: multiplier product overflows");
                    continue;
                }
            },
            None => per_unit,
        };
        let unit = match unit_from_captures(&caps) {
            Ok(unit) => unit,
            Err(err) => {
                warn!("dropping period {key:?}: {err}");
                continue;
            }
        };
        let days = match duration_days(total, unit) {
            Ok(days) => days,
            Err(err) => {
                warn!("dropping period {key:?}: {err}");
                continue;
            }
        };

        periods.insert(
            key,
            PeriodRecord {
                matched_text: whole_match.to_string(),
                days,
                detail: PeriodDetail::Multiplier {
                    multiplier: multiplier.filter(|n| *n != 0),
                    per_unit,
                    total,
                    unit,
                },
            },
        );
        last_matched_text = Some(whole_match.to_string());
    }

    periods
}

/// Strategy D: any bare `<number> <unit>` phrase in the parentheses-stripped
/// evidence text. Records are anonymous and only the single largest one ever
/// contributes to reconciliation.
pub(crate) fn scrape_catch_all(text: &str) -> PeriodMap {
    let cleaned = text.replace(['(', ')'], "");
    let mut periods = PeriodMap::new();
    let mut catch_all_num = 1usize;

    for caps in CATCH_ALL_RE.captures_iter(&cleaned) {
        let token = caps
            .name("duration_digits")
            .or_else(|| caps.name("duration_word"));
        let Some(token) = token else {
            warn!(
                "could not add catch-all period: {}",
                PopError::MissingCaptureGroup { group: "duration number" }
            );
            continue;
        };
        let number = match parse_number_token(token.as_str()) {
            Ok(number) => number,
            Err(err) => {
                warn!("dropping catch-all match: {err}");
                continue;
            }
        };
        let unit = match unit_from_captures(&caps) {
            Ok(unit) => unit,
            Err(err) => {
                warn!("dropping catch-all match: {err}");
                continue;
            }
        };
        let days = match duration_days(number, unit) {
            Ok(days) => days,
            Err(err) => {
                warn!("dropping catch-all match: {err}");
                continue;
            }
        };

        let matched_text = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
        periods.insert(
            catch_all_num.to_string(),
            PeriodRecord {
                matched_text: matched_text.to_string(),
                days,
                detail: PeriodDetail::Duration { number, unit },
            },
        );
        catch_all_num += 1;
    }

    periods
}

/// Locate the evidence lines containing the previous and current multiplier
/// mentions by scanning cumulative text, and return the line-index delta
/// between them.
fn mention_line_delta(
    previous_text: &str,
    current_text: &str,
    lines: &[String],
    indices: &[usize],
) -> Option<i64> {
    let mut cumulative = String::new();
    let mut previous_pos = None;
    let mut current_pos = None;

    for (i, line) in lines.iter().enumerate() {
        cumulative.push(' ');
        cumulative.push_str(line);
        if previous_pos.is_none() && !previous_text.is_empty() && cumulative.contains(previous_text)
        {
            previous_pos = Some(i);
        }
        if current_pos.is_none() && cumulative.contains(current_text) {
            current_pos = Some(i);
        }
        if previous_pos.is_some() && current_pos.is_some() {
            break;
        }
    }

    let (previous_pos, current_pos) = (previous_pos?, current_pos?);
    Some(indices[current_pos] as i64 - indices[previous_pos] as i64)
}

/// Parse a matched date literal, tolerating the common "February 29 of a
/// non-leap year" typo by rewriting it to February 28 rather than failing.
/// Returns the (possibly rewritten) literal alongside the date.
fn parse_date_with_leap_fallback(text: &str) -> Result<(String, NaiveDate), PopError> {
    if let Some(date) = parse_date_literal(text) {
        return Ok((text.to_string(), date));
    }
    if FEB_29_RE.is_match(text) {
        let rewritten = text.replace("29", "28");
        if let Some(date) = parse_date_literal(&rewritten) {
            warn!("invalid february 29 date {text:?}; treating as february 28");
            return Ok((rewritten, date));
        }
    }
    Err(PopError::MalformedDateRange {
        text: text.to_string(),
    })
}

fn parse_date_literal(text: &str) -> Option<NaiveDate> {
    let normalized = text.replace('\\', "/");

    if normalized.contains('/') {
        let parts: Option<Vec<i32>> = normalized
            .split('/')
            .map(|part| part.trim().parse::<i32>().ok())
            .collect();
        return match parts?.as_slice() {
            [month, year] => {
                NaiveDate::from_ymd_opt(expand_year(*year), u32::try_from(*month).ok()?, 1)
            }
            [month, day, year] => {
                // month-first with day-first fallback when the month slot
                // cannot be a month
                let (month, day) = if *month > 12 && *day <= 12 {
                    (*day, *month)
                } else {
                    (*month, *day)
                };
                NaiveDate::from_ymd_opt(
                    expand_year(*year),
                    u32::try_from(month).ok()?,
                    u32::try_from(day).ok()?,
                )
            }
            _ => None,
        };
    }

    let month_token = MONTH_TOKEN_RE.find(&normalized)?;
    let month = month_number(month_token.as_str())?;
    let numbers: Option<Vec<i64>> = NUMBER_TOKEN_RE
        .find_iter(&normalized[month_token.end()..])
        .map(|m| m.as_str().parse::<i64>().ok())
        .collect();
    let (day, year) = match numbers?.as_slice() {
        [year] => (1, *year),
        [day, year, ..] => (*day, *year),
        [] => return None,
    };
    NaiveDate::from_ymd_opt(
        expand_year(i32::try_from(year).ok()?),
        month,
        u32::try_from(day).ok()?,
    )
}

fn expand_year(year: i32) -> i32 {
    if (0..100).contains(&year) {
        if year < 70 { 2000 + year } else { 1900 + year }
    } else {
        year
    }
}

fn month_number(token: &str) -> Option<u32> {
    let token = token.to_lowercase();
    let month = match token.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_words_option_period() {
        let periods = scrape_duration_words("Option Period 2: 12 months");
        let record = periods.get("option_2").expect("option_2 key");
        assert_eq!(record.days, 365);
        assert!(matches!(
            record.detail,
            PeriodDetail::Duration {
                number: 12,
                unit: TimeUnit::Months
            }
        ));
    }

    #[test]
    fn test_duration_words_generic_option_counts_as_one() {
        let periods = scrape_duration_words("option period: 6 months");
        assert!(periods.contains_key("option_1"));
    }

    #[test]
    fn test_duration_words_duplicate_key_first_wins() {
        let periods =
            scrape_duration_words("Base Period: 12 months. Later, the base period: 6 months.");
        assert_eq!(periods.len(), 1);
        let record = periods.get(BASE_KEY).expect("base key");
        assert_eq!(record.days, 365);
    }

    #[test]
    fn test_duration_words_spelled_award_number() {
        let periods = scrape_duration_words("award term two: 1 year");
        let record = periods.get("award_2").expect("award_2 key");
        assert_eq!(record.days, 365);
    }

    #[test]
    fn test_date_range_base_period() {
        let periods = scrape_date_ranges("Base Period: 01/01/2021 - 12/31/2021");
        let record = periods.get(BASE_KEY).expect("base key");
        assert_eq!(record.days, 364);
    }

    #[test]
    fn test_date_range_leap_typo_tolerated() {
        let periods =
            scrape_date_ranges("Base Period: January 1, 2021 through February 29, 2021");
        let record = periods.get(BASE_KEY).expect("base key");
        match &record.detail {
            PeriodDetail::DateRange { end, .. } => {
                assert_eq!(*end, NaiveDate::from_ymd_opt(2021, 2, 28).unwrap());
            }
            other => panic!("expected date range detail, got {other:?}"),
        }
        assert_eq!(record.days, 58);
    }

    #[test]
    fn test_date_range_negative_duration_passes_through() {
        let periods = scrape_date_ranges("Base Period: 12/31/2021 to 01/01/2021");
        let record = periods.get(BASE_KEY).expect("base key");
        assert_eq!(record.days, -364);
    }

    #[test]
    fn test_multiplier_words_total() {
        let periods = scrape_multiplier_words("four (4) twelve (12) month option periods", &[], &[]);
        let record = periods.get(OPTIONS_ALL_KEY).expect("options key");
        assert_eq!(record.days, 1460);
        assert!(matches!(
            record.detail,
            PeriodDetail::Multiplier {
                multiplier: Some(4),
                per_unit: 12,
                total: 48,
                unit: TimeUnit::Months
            }
        ));
    }

    #[test]
    fn test_multiplier_adjacent_mentions_get_additional_key() {
        let lines = vec![
            "two (2) twelve (12) month option periods".to_string(),
            "one (1) six (6) month option period".to_string(),
        ];
        let indices = vec![10, 11];
        let text = lines.join("\n");
        let periods = scrape_multiplier_words(&text, &lines, &indices);
        assert!(periods.contains_key(OPTIONS_ALL_KEY));
        let additional = periods.get(ADDITIONAL_KEY).expect("additional key");
        assert_eq!(additional.days, duration_days(6, TimeUnit::Months).unwrap());
    }

    #[test]
    fn test_multiplier_distant_mentions_collapse() {
        let lines = vec![
            "two (2) twelve (12) month option periods".to_string(),
            "one (1) six (6) month option period".to_string(),
        ];
        let indices = vec![10, 14];
        let text = lines.join("\n");
        let periods = scrape_multiplier_words(&text, &lines, &indices);
        assert_eq!(periods.len(), 1);
        let record = periods.get(OPTIONS_ALL_KEY).expect("options key");
        assert_eq!(record.days, duration_days(24, TimeUnit::Months).unwrap());
    }

    #[test]
    fn test_catch_all_strips_parentheses() {
        let periods = scrape_catch_all("a total of four (4) years, plus 60 days transition");
        assert!(!periods.is_empty());
        let max_days = periods.values().map(|r| r.days).max().unwrap();
        assert_eq!(max_days, 4 * 365);
    }

    #[test]
    fn test_empty_text_yields_no_periods() {
        assert!(scrape_duration_words("").is_empty());
        assert!(scrape_date_ranges("").is_empty());
        assert!(scrape_multiplier_words("", &[], &[]).is_empty());
        assert!(scrape_catch_all("").is_empty());
    }
}
