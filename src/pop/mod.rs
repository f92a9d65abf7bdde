//! Period-of-performance extraction engine
//!
//! Takes the compacted Period-of-Performance Topic, gathers duration evidence
//! line by line, runs the four extraction strategies, and reconciles them to
//! a single day count. The engine never fails a Document: every per-match
//! problem is logged and dropped, and a strategy that dies wholesale simply
//! contributes an empty record set.

pub(crate) mod error;
pub(crate) mod numbers;
pub(crate) mod patterns;
pub mod reconcile;
pub mod strategies;

pub use error::PopError;
pub use numbers::TimeUnit;
pub use reconcile::{Strategy, StrategyRecords};
pub use strategies::{PeriodDetail, PeriodMap, PeriodRecord};

use crate::document::{Document, Topic};
use patterns::EVIDENCE_DATE_PATTERNS;
use serde::{Deserialize, Serialize};
use std::panic::{AssertUnwindSafe, catch_unwind};
use tracing::{debug, error, warn};

/// The full result of one engine run, with per-strategy raw records kept for
/// audit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PopExtraction {
    /// Evidence text the strategies ran over.
    pub evidence_text: String,
    /// Original line indices the evidence was gathered from, in order.
    pub evidence_lines: Vec<usize>,
    pub records: StrategyRecords,
    /// Best-estimate total duration in days; `None` when nothing was found.
    pub total_days: Option<i64>,
    pub winning_strategy: Option<Strategy>,
}

/// Duration evidence gathered from the PoP Topic's attached lines.
#[derive(Debug, Default)]
struct Evidence {
    text: String,
    lines: Vec<String>,
    indices: Vec<usize>,
}

impl Evidence {
    fn admit(&mut self, index: usize, text: &str) {
        self.lines.push(text.to_string());
        self.indices.push(index);
    }

    fn contains_line(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }
}

/// Run the engine over a scanned Document.
///
/// `pop_topic` names the canonical Period-of-Performance Topic; a Document
/// without it yields an empty extraction, not an error.
pub fn extract_period_of_performance(document: &Document, pop_topic: &str) -> PopExtraction {
    let Some(topic) = document.topics.iter().find(|t| t.name == pop_topic) else {
        warn!("no {pop_topic:?} topic in document {}; skipping extraction", document.name);
        return PopExtraction::default();
    };

    let evidence = gather_evidence(topic, &document.lines);
    debug!(
        "gathered {} evidence lines for period of performance",
        evidence.lines.len()
    );

    let records = run_strategies(&evidence);
    let (total_days, winning_strategy) = reconcile::reconcile(&records);

    PopExtraction {
        evidence_text: evidence.text,
        evidence_lines: evidence.indices,
        records,
        total_days,
        winning_strategy,
    }
}

fn run_strategies(evidence: &Evidence) -> StrategyRecords {
    StrategyRecords {
        duration_words: isolated("duration words", || {
            strategies::scrape_duration_words(&evidence.text)
        }),
        date_ranges: isolated("date ranges", || {
            strategies::scrape_date_ranges(&evidence.text)
        }),
        multiplier: isolated("multiplier words", || {
            strategies::scrape_multiplier_words(&evidence.text, &evidence.lines, &evidence.indices)
        }),
        catch_all: isolated("catch-all", || strategies::scrape_catch_all(&evidence.text)),
    }
}

/// Isolate one strategy: an unexpected failure inside it yields an empty
/// record set instead of aborting the Document.
fn isolated(name: &'static str, strategy: impl FnOnce() -> PeriodMap) -> PeriodMap {
    match catch_unwind(AssertUnwindSafe(strategy)) {
        Ok(periods) => periods,
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(
                "{}",
                PopError::StrategyFatal {
                    strategy: name,
                    message
                }
            );
            PeriodMap::new()
        }
    }
}

/// First pass over the PoP Topic: admit lines that look like duration
/// evidence (time-unit words, dates, or base/option keywords) into a compact
/// evidence text.
///
/// Lines admitted for a time-unit or date hit also pull in the directly
/// preceding document line when it is contiguous and not yet admitted, since
/// period designators frequently sit on the line above their duration.
fn gather_evidence(topic: &Topic, lines: &[String]) -> Evidence {
    let mut evidence = Evidence::default();

    for (pos, &line_index) in topic.line_indices.iter().enumerate() {
        let Some(text) = lines.get(line_index) else {
            continue;
        };

        let unit_hit = has_time_unit_word(text);
        let date_hit = EVIDENCE_DATE_PATTERNS.iter().any(|re| re.is_match(text));

        if (unit_hit || date_hit) && !evidence.contains_line(line_index) {
            if !evidence.text.is_empty() {
                evidence.text.push('\n');
            }
            // pull in the preceding line when it directly precedes this one
            // in the document
            if pos > 0 {
                let previous_index = topic.line_indices[pos - 1];
                if !evidence.contains_line(previous_index)
                    && previous_index + 1 == line_index
                    && let Some(previous_text) = lines.get(previous_index)
                {
                    debug!("admitting line before evidence hit: {previous_text:?}");
                    evidence.text.push_str(previous_text);
                    evidence.text.push(' ');
                    evidence.admit(previous_index, previous_text);
                }
            }
            debug!("admitting evidence line: {text:?}");
            evidence.text.push_str(text);
            evidence.admit(line_index, text);
            continue;
        }

        // keyword fallback: designator mentions without a duration on the
        // same line still carry context for the multiplier strategy
        if !evidence.contains_line(line_index) && has_period_keyword(text) {
            if !evidence.text.is_empty() {
                evidence.text.push('\n');
            }
            debug!("admitting keyword evidence line: {text:?}");
            evidence.text.push_str(text);
            evidence.admit(line_index, text);
        }
    }

    evidence
}

/// Body text from the conversion service is lowercase-normalized, so the unit
/// probe is deliberately case-sensitive.
fn has_time_unit_word(text: &str) -> bool {
    text.contains("month") || text.contains("day") || text.contains("year")
}

fn has_period_keyword(text: &str) -> bool {
    let lowered = text.to_lowercase();
    lowered.contains("option") || lowered.contains("base")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic_with_lines(indices: &[usize]) -> Topic {
        let mut topic = Topic::new("PERIOD OF PERFORMANCE:");
        topic.line_indices = indices.to_vec();
        topic
    }

    #[test]
    fn test_evidence_pulls_in_preceding_line() {
        let lines = vec![
            "The period of performance consists of".to_string(),
            "a base period: 12 months".to_string(),
            "unrelated boilerplate".to_string(),
        ];
        let topic = topic_with_lines(&[0, 1, 2]);
        let evidence = gather_evidence(&topic, &lines);

        // line 0 has no unit/date hit of its own ("period" is not a unit
        // word) but rides in ahead of line 1
        assert_eq!(evidence.indices, vec![0, 1]);
        assert!(evidence.text.contains("consists of a base period"));
    }

    #[test]
    fn test_evidence_skips_noncontiguous_previous_line() {
        let lines = vec![
            "a heading far away".to_string(),
            "filler".to_string(),
            "base period: 12 months".to_string(),
        ];
        let topic = topic_with_lines(&[0, 2]);
        let evidence = gather_evidence(&topic, &lines);
        // line 0 is not contiguous with line 2, so it is not pulled in; it
        // has no hit of its own either
        assert_eq!(evidence.indices, vec![2]);
    }

    #[test]
    fn test_keyword_lines_admitted_without_units() {
        let lines = vec!["with two option periods".to_string()];
        let topic = topic_with_lines(&[0]);
        let evidence = gather_evidence(&topic, &lines);
        assert_eq!(evidence.indices, vec![0]);
    }

    #[test]
    fn test_unit_probe_is_case_sensitive() {
        assert!(has_time_unit_word("12 months"));
        assert!(!has_time_unit_word("12 MONTHS"));
    }

    #[test]
    fn test_missing_pop_topic_yields_empty_extraction() {
        let document = Document::new("doc-1", "empty");
        let extraction = extract_period_of_performance(&document, "PERIOD OF PERFORMANCE:");
        assert_eq!(extraction.total_days, None);
        assert!(extraction.evidence_lines.is_empty());
    }
}
