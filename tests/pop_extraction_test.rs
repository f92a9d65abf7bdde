use popx::Registry;
use popx::document::{
    LineInput, MatchAnnotation, RegexMatchInput, RunInput, TopicBox, load_run, scan_document,
};
use popx::export::{ExtractionReport, export_to_json, export_to_text};
use popx::pop::{Strategy, extract_period_of_performance};
use std::path::Path;

async fn load_fixture() -> popx::Document {
    let path = Path::new("tests/fixtures/solicitation.json");
    load_run(path, &Registry::default())
        .await
        .expect("Failed to load fixture run file")
}

/// A one-section document whose Period-of-Performance section body is the
/// given lines.
fn pop_document(body_lines: &[&str]) -> popx::Document {
    let mut lines = vec![LineInput {
        text: "3. Period of Performance".to_string(),
        top: Some(60),
        block_id: Some("sec_3".to_string()),
        matches: vec![MatchAnnotation {
            id: "id_pop".to_string(),
            text: "Period of Performance".to_string(),
        }],
    }];
    for (i, text) in body_lines.iter().enumerate() {
        lines.push(LineInput {
            text: text.to_string(),
            top: Some(76 + 16 * i as i64),
            block_id: None,
            matches: Vec::new(),
        });
    }

    let input = RunInput {
        doc_id: "test-doc".to_string(),
        name: "test".to_string(),
        topic_boxes: vec![TopicBox {
            name: "PERIOD OF PERFORMANCE:".to_string(),
            regex_matches: vec![RegexMatchInput {
                id: "id_pop".to_string(),
                name: "Period of Performance".to_string(),
            }],
            cluster_matches: Vec::new(),
        }],
        lines,
    };

    let registry = Registry::default();
    let titles = registry.title_registry().expect("default registry compiles");
    scan_document(&input, &registry, &titles)
}

#[cfg(test)]
mod strategy_tests {
    use super::*;

    #[test]
    fn test_duration_words_document() {
        let document = pop_document(&["Option Period 2: 12 months"]);
        let extraction = extract_period_of_performance(&document, "PERIOD OF PERFORMANCE:");

        let record = extraction
            .records
            .duration_words
            .get("option_2")
            .expect("option_2 should be recorded");
        assert_eq!(record.days, 365);
        assert_eq!(extraction.total_days, Some(365));
        assert_eq!(extraction.winning_strategy, Some(Strategy::DurationWords));
    }

    #[test]
    fn test_date_range_document() {
        let document = pop_document(&["The base period: 01/01/2021 - 12/31/2021"]);
        let extraction = extract_period_of_performance(&document, "PERIOD OF PERFORMANCE:");

        let record = extraction
            .records
            .date_ranges
            .get("base")
            .expect("base should be recorded");
        assert_eq!(record.days, 364);
        assert_eq!(extraction.total_days, Some(364));
        assert_eq!(extraction.winning_strategy, Some(Strategy::DateRanges));
    }

    #[test]
    fn test_leap_typo_date_range_document() {
        // February 29, 2021 does not exist; the range must still parse,
        // pinned to February 28
        let document =
            pop_document(&["Base period: January 1, 2021 through February 29, 2021"]);
        let extraction = extract_period_of_performance(&document, "PERIOD OF PERFORMANCE:");

        assert_eq!(extraction.total_days, Some(58));
        assert_eq!(extraction.winning_strategy, Some(Strategy::DateRanges));
    }

    #[test]
    fn test_no_match_reports_unset_not_zero() {
        let document = pop_document(&["This section intentionally says nothing useful."]);
        let extraction = extract_period_of_performance(&document, "PERIOD OF PERFORMANCE:");

        assert_eq!(extraction.total_days, None);
        assert_eq!(extraction.winning_strategy, None);
        assert!(extraction.records.duration_words.is_empty());
        assert!(extraction.records.catch_all.is_empty());
    }

    #[test]
    fn test_duplicate_base_keeps_first_value() {
        let document = pop_document(&[
            "Base period: 12 months,",
            "and elsewhere the base period: 6 months.",
        ]);
        let extraction = extract_period_of_performance(&document, "PERIOD OF PERFORMANCE:");

        let record = extraction
            .records
            .duration_words
            .get("base")
            .expect("base should be recorded");
        assert_eq!(record.days, 365, "first parse wins; later duplicate dropped");
    }

    #[test]
    fn test_winner_backfilled_from_other_strategies() {
        // the date range wins on total days but carries no option period;
        // the duration-words option backfills it
        let document = pop_document(&[
            "Base period: 01/01/2021 - 12/31/2022,",
            "option period 1: 3 months",
        ]);
        let extraction = extract_period_of_performance(&document, "PERIOD OF PERFORMANCE:");

        assert_eq!(extraction.winning_strategy, Some(Strategy::DateRanges));
        // 729 days of base range plus round(3 * 30.41) = 91 days of option
        assert_eq!(extraction.total_days, Some(729 + 91));
    }
}

#[cfg(test)]
mod fixture_tests {
    use super::*;

    #[tokio::test]
    async fn test_fixture_sections_and_topics() {
        let document = load_fixture().await;

        assert_eq!(document.sections.len(), 3);
        let general = document
            .topics
            .iter()
            .find(|t| t.name == "GENERAL:")
            .expect("GENERAL: topic");
        assert!(
            general
                .text
                .contains("This solicitation covers maintenance of widget assemblies.")
        );

        let pop = document
            .topics
            .iter()
            .find(|t| t.name == "PERIOD OF PERFORMANCE:")
            .expect("PoP topic");
        // the whole PoP section plus the custom in-body mention line
        assert!(pop.text.contains("The base period: 01/01/2021 - 12/31/2021"));
        assert!(pop.text.contains("See Period of Performance"));
    }

    #[tokio::test]
    async fn test_fixture_end_to_end_extraction() {
        let document = load_fixture().await;
        let extraction = extract_period_of_performance(&document, "PERIOD OF PERFORMANCE:");

        // evidence: the section header rides in ahead of the date line, then
        // the option-periods line
        assert_eq!(extraction.evidence_lines, vec![8, 9, 10]);

        let base = extraction.records.date_ranges.get("base").expect("base");
        assert_eq!(base.days, 364);
        let options = extraction
            .records
            .multiplier
            .get("options")
            .expect("options");
        assert_eq!(options.days, 1460);

        // multiplier wins with 1460 days and gets the 364-day base range
        // backfilled
        assert_eq!(extraction.winning_strategy, Some(Strategy::Multiplier));
        assert_eq!(extraction.total_days, Some(1824));
    }

    #[tokio::test]
    async fn test_fixture_report_exports() {
        let registry = Registry::default();
        let document = load_fixture().await;
        let extraction = extract_period_of_performance(&document, &registry.pop_topic);
        let summary = popx::document::assemble_summary_input(
            &document,
            &registry.priority_topics,
            registry.summary_sentence_cutoff,
        );
        let report = ExtractionReport::build(&document, extraction, summary);

        let json = export_to_json(&report).expect("json export");
        let parsed: ExtractionReport = serde_json::from_str(&json).expect("round trip");
        assert_eq!(parsed.doc_id, "RFQ-21-0042");
        assert_eq!(parsed.period_of_performance.total_days, Some(1824));

        let text = export_to_text(&report);
        assert!(text.contains("Period of performance: 1824 days"));
        assert!(text.contains("## GENERAL:"));
    }

    #[tokio::test]
    async fn test_fixture_summary_input_prioritizes_general() {
        let registry = Registry::default();
        let document = load_fixture().await;
        let summary = popx::document::assemble_summary_input(
            &document,
            &registry.priority_topics,
            registry.summary_sentence_cutoff,
        );

        assert_eq!(summary.topic_names.first().map(String::as_str), Some("GENERAL:"));
        assert!(summary.text.contains("This solicitation covers maintenance"));
    }
}
