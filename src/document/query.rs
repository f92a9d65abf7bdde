//! Read-only queries over a scanned Document
//!
//! This module provides search and outline operations used by the CLI and by
//! downstream consumers; nothing here mutates the Document.

use super::models::*;

/// Case-insensitive search across every Topic's compacted text.
pub fn search_topics(document: &Document, query: &str) -> Vec<TopicSearchResult> {
    let mut results = Vec::new();
    if query.is_empty() {
        return results;
    }
    let query_lower = query.to_lowercase();

    for (topic_index, topic) in document.topics.iter().enumerate() {
        let text_lower = topic.text.to_lowercase();
        if let Some(start_pos) = text_lower.find(&query_lower) {
            results.push(TopicSearchResult {
                topic_index,
                topic_name: topic.name.clone(),
                start_pos,
                end_pos: start_pos + query.len(),
            });
        }
    }

    results
}

/// Outline of the document: every detected section header in document order.
pub fn section_outline(document: &Document) -> Vec<OutlineItem> {
    document
        .sections
        .iter()
        .enumerate()
        .map(|(section_index, section)| OutlineItem {
            section_index,
            header_text: section.header_text.trim().to_string(),
            first_line: section.header_lines.first().copied(),
        })
        .collect()
}
