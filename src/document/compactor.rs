//! Post-scan text compaction
//!
//! After the full line scan, each Topic assembles its final text from its
//! attached Sections plus any custom lines not already covered by them. The
//! summary-input assembly then admits topic texts in priority order up to a
//! sentence cutoff, deduplicating repeated text by substring containment.
//! The containment check is position-blind on purpose; see DESIGN.md.

use super::models::Document;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

/// Tokens this long are conversion artifacts (hashes, mangled URLs), not
/// prose; they are stripped before text reaches the summarizer.
static OVERLONG_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\S{22,}").expect("overlong token pattern"));

/// Assemble every Topic's final text and contributing line indices.
///
/// Section text lands first, space-joined in document order; custom lines
/// follow in line-index order, skipping any line already present among the
/// attached Sections' lines.
pub(crate) fn compact_topics(document: &mut Document) {
    for topic_index in 0..document.topics.len() {
        let topic = &document.topics[topic_index];

        let mut text = String::new();
        let mut line_indices = Vec::new();
        for &section_id in &topic.sections {
            let section = &document.sections[section_id];
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(&section.text);
            line_indices.extend(section.line_elements.iter().copied());
        }

        let mut custom_lines = topic.custom_lines.clone();
        custom_lines.sort_unstable();

        let mut custom_lines_added = Vec::new();
        for line_index in custom_lines {
            if line_indices.contains(&line_index) {
                debug!("skipping duplicate custom line {line_index}");
                continue;
            }
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(&document.lines[line_index]);
            line_indices.push(line_index);
            custom_lines_added.push(line_index);
        }

        let topic = &mut document.topics[topic_index];
        topic.text = text;
        topic.line_indices = line_indices;
        topic.custom_lines_added = custom_lines_added;
    }
}

/// Text selected for the downstream summarizer, with the raw (uncleaned)
/// admitted text kept for containment checks.
#[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize)]
pub struct SummaryInput {
    pub text: String,
    pub topic_names: Vec<String>,
    #[serde(skip)]
    raw_text: String,
}

impl SummaryInput {
    /// Clean a topic's text for the summary: remove section and custom-line
    /// text already admitted (exact substring containment), then strip
    /// overlong tokens.
    fn clean_topic_text(&self, document: &Document, topic_index: usize) -> String {
        let topic = &document.topics[topic_index];
        let mut text = topic.text.clone();

        for &section_id in &topic.sections {
            let section_text = &document.sections[section_id].text;
            if !section_text.is_empty() && self.raw_text.contains(section_text.as_str()) {
                debug!(
                    "removing repeated section text of topic {} from summary input",
                    topic.name
                );
                text = text.replace(section_text.as_str(), "");
            }
        }
        for &line_index in &topic.custom_lines_added {
            let line_text = &document.lines[line_index];
            if !line_text.is_empty() && self.raw_text.contains(line_text.as_str()) {
                debug!(
                    "removing repeated custom line text of topic {} from summary input",
                    topic.name
                );
                text = text.replace(line_text.as_str(), "");
            }
        }

        OVERLONG_TOKEN_RE.replace_all(&text, "").into_owned()
    }

    fn admit(&mut self, name: &str, cleaned: String, raw: &str) -> bool {
        if cleaned.trim().is_empty() {
            return false;
        }
        self.text.push('\n');
        self.text.push_str(&cleaned);
        self.raw_text.push('\n');
        self.raw_text.push_str(raw);
        self.topic_names.push(name.to_string());
        true
    }

    fn sentence_count(&self) -> usize {
        self.text.unicode_sentences().count()
    }
}

/// Admit topic texts to the summary input in priority order until the
/// sentence cutoff is reached. If every priority topic is exhausted below the
/// cutoff, the document's remaining text goes in last.
pub fn assemble_summary_input(
    document: &Document,
    priority_topics: &[String],
    sentence_cutoff: usize,
) -> SummaryInput {
    let mut summary = SummaryInput::default();

    for topic_name in priority_topics {
        if summary.sentence_count() > sentence_cutoff {
            debug!("summary input reached the sentence cutoff ({sentence_cutoff})");
            return summary;
        }
        let Some(topic_index) = document.topic_index_by_name(topic_name) else {
            debug!("priority topic {topic_name:?} not present in document");
            continue;
        };
        let cleaned = summary.clean_topic_text(document, topic_index);
        let raw = document.topics[topic_index].text.clone();
        if !summary.admit(topic_name, cleaned, &raw) {
            debug!("topic {topic_name:?} contributed no text to the summary input");
        }
    }

    if summary.sentence_count() <= sentence_cutoff {
        // out of priority topics and still under the cutoff: fall back to
        // everything the priority topics did not already consume
        debug!("admitting remaining document text to the summary input");
        let remaining = remaining_text(document, priority_topics);
        let cleaned = OVERLONG_TOKEN_RE.replace_all(&remaining, "").into_owned();
        summary.admit("ALLTEXT", cleaned, &remaining);
    }

    summary
}

/// The document's full text minus every Section and custom-line text already
/// consumed by the given topics, by substring removal.
pub fn remaining_text(document: &Document, topic_names: &[String]) -> String {
    let mut text = document.full_text.clone();

    for topic_name in topic_names {
        let Some(topic_index) = document.topic_index_by_name(topic_name) else {
            continue;
        };
        let topic = &document.topics[topic_index];
        for &section_id in &topic.sections {
            let section_text = &document.sections[section_id].text;
            if !section_text.is_empty() && text.contains(section_text.as_str()) {
                text = text.replace(section_text.as_str(), "");
            }
        }
        for &line_index in &topic.custom_lines_added {
            let line_text = &document.lines[line_index];
            if !line_text.is_empty() && text.contains(line_text.as_str()) {
                text = text.replace(line_text.as_str(), "");
            }
        }
    }

    text
}
