//! Report assembly and export
//!
//! The downstream interface of a run: ordered topics with their compacted
//! text and contributing lines, the reconciled period-of-performance day
//! count, and the full per-strategy records for audit.

use crate::document::{Document, SummaryInput};
use crate::pop::{PeriodMap, PopExtraction};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub doc_id: String,
    pub name: String,
    pub topics: Vec<TopicReport>,
    pub period_of_performance: PopExtraction,
    pub summary_input: SummaryInput,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicReport {
    pub name: String,
    pub text: String,
    pub line_indices: Vec<usize>,
}

impl ExtractionReport {
    pub fn build(document: &Document, pop: PopExtraction, summary: SummaryInput) -> Self {
        let topics = document
            .topics
            .iter()
            .map(|topic| TopicReport {
                name: topic.name.clone(),
                text: topic.text.trim().to_string(),
                line_indices: topic.line_indices.clone(),
            })
            .collect();

        ExtractionReport {
            doc_id: document.doc_id.clone(),
            name: document.name.clone(),
            topics,
            period_of_performance: pop,
            summary_input: summary,
        }
    }
}

pub fn export_to_json(report: &ExtractionReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub fn export_to_text(report: &ExtractionReport) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Document: {} ({})", report.name, report.doc_id);
    let _ = writeln!(output);

    match report.period_of_performance.total_days {
        Some(days) => {
            let strategy = report
                .period_of_performance
                .winning_strategy
                .map(|s| s.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            let _ = writeln!(
                output,
                "Period of performance: {days} days (from {strategy})"
            );
        }
        None => {
            let _ = writeln!(output, "Period of performance: not found");
        }
    }
    let _ = writeln!(output);

    let records = &report.period_of_performance.records;
    write_period_map(&mut output, "duration words", &records.duration_words);
    write_period_map(&mut output, "date ranges", &records.date_ranges);
    write_period_map(&mut output, "multiplier words", &records.multiplier);
    write_period_map(&mut output, "catch-all", &records.catch_all);

    for topic in &report.topics {
        let _ = writeln!(output, "## {}", topic.name);
        if topic.text.is_empty() {
            let _ = writeln!(output, "(no text attached)");
        } else {
            let _ = writeln!(output, "{}", topic.text);
        }
        let _ = writeln!(output);
    }

    output
}

fn write_period_map(output: &mut String, label: &str, periods: &PeriodMap) {
    if periods.is_empty() {
        return;
    }
    let _ = writeln!(output, "Strategy [{label}]:");
    for (key, record) in periods {
        let _ = writeln!(
            output,
            "  {key}: {} days  <- {:?}",
            record.days, record.matched_text
        );
    }
    let _ = writeln!(output);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Topic;

    fn report_fixture() -> ExtractionReport {
        let mut document = Document::new("doc-9", "fixture");
        let mut topic = Topic::new("GENERAL:");
        topic.text = "general info".to_string();
        document.topics.push(topic);
        ExtractionReport::build(&document, PopExtraction::default(), SummaryInput::default())
    }

    #[test]
    fn test_json_export_round_trips() {
        let report = report_fixture();
        let json = export_to_json(&report).unwrap();
        let parsed: ExtractionReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.doc_id, "doc-9");
        assert_eq!(parsed.topics.len(), 1);
    }

    #[test]
    fn test_text_export_reports_unset_duration() {
        let report = report_fixture();
        let text = export_to_text(&report);
        assert!(text.contains("Period of performance: not found"));
        assert!(text.contains("## GENERAL:"));
    }
}
