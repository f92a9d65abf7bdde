//! Section segmentation and match routing
//!
//! A single pass over the positioned line sequence drives a small state
//! machine (`NoSection` / `InHeader` / `InBody`). Layout-block boundaries
//! open Sections, multi-line headers are stitched together, and every
//! embedded match annotation is routed to its owning Topics in one of three
//! attachment modes.

use super::models::{Document, LineIndex, LineInput, Section, SectionId, SubTopicKind};
use crate::registry::TitleRegistry;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    NoSection,
    InHeader,
    InBody,
}

/// How a line's match annotations attach to the owning Topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RouteMode {
    /// The line is a boundary/header line: a canonical-title match attaches
    /// the whole new Section.
    SectionHeader,
    /// An in-body canonical-title match: defer to the next boundary if one
    /// follows immediately, otherwise treat as informational.
    TitleLookahead,
    /// Attach a 1-3 line window directly, without the enclosing Section.
    CustomLine,
}

pub(crate) struct Segmenter<'a> {
    rules: &'a TitleRegistry,
    lines: &'a [LineInput],
    state: ScanState,
    current_block: Option<String>,
    current_section: Option<SectionId>,
    /// Subtopic id of a title match waiting for the next boundary line.
    pending_title: Option<String>,
    previous_top: Option<i64>,
    previous_line_was_header: bool,
    /// True on the line right after a header finished accumulating.
    header_just_completed: bool,
}

impl<'a> Segmenter<'a> {
    pub(crate) fn new(rules: &'a TitleRegistry, lines: &'a [LineInput]) -> Self {
        Segmenter {
            rules,
            lines,
            state: ScanState::NoSection,
            current_block: None,
            current_section: None,
            pending_title: None,
            previous_top: None,
            previous_line_was_header: false,
            header_just_completed: false,
        }
    }

    /// Scan every line into `document`, creating Sections at boundaries and
    /// routing match annotations as they appear.
    pub(crate) fn scan(mut self, document: &mut Document) {
        for index in 0..self.lines.len() {
            let text = clean_line_text(&self.lines[index].text);
            if self.rules.should_skip_line(&text) {
                // keep the line-index space intact; a skipped line joins no
                // section and no full text
                document.lines.push(text);
                continue;
            }

            let mut added_to_header = false;

            if let Some(block_id) = self.take_boundary(index) {
                let section = Section::new(block_id.clone(), index, text.clone());
                let section_id = document.new_section(section);
                self.current_section = Some(section_id);
                // the block id doubles as the ML cluster subtopic id
                document.attach_section_to_owners(&block_id, section_id, "ml cluster match");
                if let Some(deferred_id) = self.pending_title.take() {
                    debug!("attaching new section for deferred title match {deferred_id}");
                    document.attach_section_to_owners(&deferred_id, section_id, "deferred title");
                }
                self.route_matches(document, index, true);
                self.state = if has_consecutive_alpha(&text) {
                    ScanState::InBody
                } else {
                    // numeral-only headers like "3." keep the header open
                    ScanState::InHeader
                };
                added_to_header = true;
            } else if self.state == ScanState::InHeader {
                if let Some(section_id) = self.current_section {
                    document.sections[section_id].add_header_line(index, &text);
                    self.route_matches(document, index, true);
                    self.state = if has_consecutive_alpha(&text) {
                        ScanState::InBody
                    } else {
                        ScanState::InHeader
                    };
                    added_to_header = true;
                }
            }

            // a line repeating the previous header line's vertical offset is a
            // layout continuation of that header
            if !added_to_header && self.previous_line_was_header {
                if let (Some(previous_top), Some(top)) = (self.previous_top, self.lines[index].top)
                    && previous_top == top
                    && let Some(section_id) = self.current_section
                {
                    document.sections[section_id].add_header_line(index, &text);
                    added_to_header = true;
                }
            }

            if self.header_just_completed {
                self.apply_specific_titles(document);
            }

            // canonical-title mentions in body text look ahead one line;
            // other detector hits take their line windows
            self.pending_title = self.route_matches(document, index, false);

            if let Some(section_id) = self.current_section {
                document.sections[section_id].add_line_element(index, &text);
            }
            document.push_line(text);

            self.previous_top = self.lines[index].top;
            self.header_just_completed = !added_to_header && self.previous_line_was_header;
            self.previous_line_was_header = added_to_header;
        }
    }

    /// Detect whether this line opens a new layout block, updating the
    /// tracked block id when it does.
    fn take_boundary(&mut self, index: usize) -> Option<String> {
        let block_id = stripped_block_id(&self.lines[index])?;
        if self.current_block.as_deref() == Some(block_id) {
            return None;
        }
        self.current_block = Some(block_id.to_string());
        Some(block_id.to_string())
    }

    /// Whether the line after `index` would open a new block, without
    /// touching the tracked id.
    fn peek_boundary(&self, index: usize) -> bool {
        self.lines
            .get(index + 1)
            .and_then(stripped_block_id)
            .is_some_and(|block_id| self.current_block.as_deref() != Some(block_id))
    }

    /// Route every match annotation on a line, picking the attachment mode
    /// from the annotation's kind and the line's position. Returns the
    /// subtopic id of a title match deferring attachment to the next
    /// boundary, if any.
    fn route_matches(
        &self,
        document: &mut Document,
        index: usize,
        at_boundary: bool,
    ) -> Option<String> {
        let mut pending = None;

        for annotation in &self.lines[index].matches {
            let owners = document.topic_indices_by_subtopic_id(&annotation.id);
            if owners.is_empty() {
                continue;
            }

            // only regex-match detectors carry title semantics; cluster
            // matches attach through block boundaries instead
            let regex_name = document.subtopic_by_id(&annotation.id).and_then(|subtopic| {
                match &subtopic.kind {
                    SubTopicKind::RegexMatch => Some(subtopic.name.clone()),
                    SubTopicKind::ClusterMatch { .. } => None,
                }
            });
            let is_title = regex_name
                .as_deref()
                .is_some_and(|name| self.rules.is_canonical_title(name));

            let mode = if at_boundary {
                RouteMode::SectionHeader
            } else if is_title {
                RouteMode::TitleLookahead
            } else {
                RouteMode::CustomLine
            };

            // duration evidence is line-granular: the PoP topic always takes
            // the custom window, whatever the mode
            let pop_owned = owners
                .iter()
                .any(|&t| document.topics[t].name == self.rules.pop_topic());
            if pop_owned {
                let window = self.window_for(index, mode);
                document.attach_custom_lines_to_owners(&annotation.id, &window);
            }

            match mode {
                RouteMode::SectionHeader => {
                    if let Some(section_id) = self.current_section
                        && is_title
                    {
                        document.attach_section_to_owners(
                            &annotation.id,
                            section_id,
                            "section header",
                        );
                    }
                }
                RouteMode::TitleLookahead => {
                    if self.peek_boundary(index) {
                        // the title ends this section; let the upcoming
                        // boundary perform the attachment instead of
                        // double-attaching here
                        debug!("title match {regex_name:?} defers to the next section");
                        pending = Some(annotation.id.clone());
                    }
                }
                RouteMode::CustomLine => {
                    // non-title detector hits pull their line window in
                    // directly, never the whole section
                    if regex_name.is_some() {
                        let window = self.window_for(index, mode);
                        document.attach_custom_lines_to_owners(&annotation.id, &window);
                    }
                }
            }
        }

        pending
    }

    /// The custom line window for an attachment: the line itself, plus its
    /// neighbors depending on the mode.
    fn window_for(&self, index: usize, mode: RouteMode) -> Vec<LineIndex> {
        match mode {
            RouteMode::SectionHeader => vec![index],
            RouteMode::TitleLookahead => {
                let mut window = vec![index];
                if index + 1 < self.lines.len() {
                    window.push(index + 1);
                }
                window
            }
            RouteMode::CustomLine => {
                let mut window = Vec::with_capacity(3);
                if index > 0 {
                    window.push(index - 1);
                }
                window.push(index);
                if index + 1 < self.lines.len() {
                    window.push(index + 1);
                }
                window
            }
        }
    }

    /// Once a header has fully accumulated, test it against the configured
    /// specific-title patterns and claim the Section for the matching Topic.
    fn apply_specific_titles(&self, document: &mut Document) {
        let (Some(section_id), Some(block_id)) = (self.current_section, &self.current_block) else {
            return;
        };

        for (topic_name, patterns) in self.rules.specific_titles() {
            let header_text = document.sections[section_id].header_text.clone();
            for pattern in patterns {
                if !pattern.is_match(&header_text) {
                    continue;
                }
                debug!("specific title {pattern:?} matched header {header_text:?}");
                let Some(topic_index) = document.topic_index_by_name(topic_name) else {
                    continue;
                };
                // register the block's cluster subtopic with the topic so the
                // attachment (and later ones for this block) resolve to it
                if let Some(subtopic) = document.subtopic_by_id(block_id).cloned() {
                    document.topics[topic_index].add_subtopic(subtopic);
                }
                document.attach_section_to_owners(block_id, section_id, "specific title");
            }
        }
    }
}

/// Strip the page-split continuation suffix from a line's block id, if the
/// line opens a block at all.
fn stripped_block_id(line: &LineInput) -> Option<&str> {
    let block_id = line.block_id.as_deref()?;
    Some(block_id.strip_suffix("_top").unwrap_or(block_id))
}

/// Header text is complete once it contains at least two consecutive
/// alphabetic characters; bare numbering like "3." is not terminal.
fn has_consecutive_alpha(text: &str) -> bool {
    let mut previous_alpha = false;
    for c in text.chars() {
        let alpha = c.is_ascii_alphabetic();
        if alpha && previous_alpha {
            return true;
        }
        previous_alpha = alpha;
    }
    false
}

/// Normalize conversion artifacts in a line before the scan sees it.
fn clean_line_text(text: &str) -> String {
    if text.contains('\u{2022}') {
        text.replace('\u{2022}', ".")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consecutive_alpha_detection() {
        assert!(has_consecutive_alpha("Scope of Work"));
        assert!(has_consecutive_alpha("3. General"));
        assert!(!has_consecutive_alpha("3."));
        assert!(!has_consecutive_alpha("1 2 3"));
        assert!(!has_consecutive_alpha("a b c"));
        assert!(!has_consecutive_alpha(""));
    }

    #[test]
    fn test_block_id_suffix_stripping() {
        let line = LineInput {
            block_id: Some("id_12_top".to_string()),
            ..Default::default()
        };
        assert_eq!(stripped_block_id(&line), Some("id_12"));

        let line = LineInput {
            block_id: Some("id_12".to_string()),
            ..Default::default()
        };
        assert_eq!(stripped_block_id(&line), Some("id_12"));

        let line = LineInput::default();
        assert_eq!(stripped_block_id(&line), None);
    }

    #[test]
    fn test_bullet_normalization() {
        assert_eq!(clean_line_text("\u{2022} item"), ". item");
        assert_eq!(clean_line_text("plain"), "plain");
    }
}
