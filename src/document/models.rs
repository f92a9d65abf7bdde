//! Core data structures for document representation
//!
//! This module defines all the public types used to represent a scanned
//! solicitation run: the upstream line/annotation input, and the topic model
//! (Topics, SubTopics, Clusters, Sections) built from it.

use serde::{Deserialize, Serialize};
use tracing::debug;

// Type aliases for convenience
pub type SectionId = usize;
pub type LineIndex = usize;

/// One run of the pipeline as delivered by the document-conversion service:
/// the positioned, annotated line sequence plus the per-topic detector boxes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunInput {
    pub doc_id: String,
    pub name: String,
    #[serde(default)]
    pub topic_boxes: Vec<TopicBox>,
    pub lines: Vec<LineInput>,
}

/// A single positioned text line from the conversion service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineInput {
    pub text: String,
    /// Vertical offset of the line on its page, as reported by layout analysis.
    #[serde(default)]
    pub top: Option<i64>,
    /// Present when this line opens a new layout block. A `_top` suffix marks
    /// the continuation of a block split across a page break.
    #[serde(default)]
    pub block_id: Option<String>,
    #[serde(default)]
    pub matches: Vec<MatchAnnotation>,
}

/// An embedded classifier match on a line: the detector id and the exact
/// string it matched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchAnnotation {
    pub id: String,
    pub text: String,
}

/// Per-topic detector declarations supplied by the conversion service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicBox {
    pub name: String,
    #[serde(default)]
    pub regex_matches: Vec<RegexMatchInput>,
    #[serde(default)]
    pub cluster_matches: Vec<ClusterMatchInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegexMatchInput {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterMatchInput {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub clusters: Vec<Cluster>,
}

/// One ML-proposed label/confidence pair. Scores are percentages in [0, 100].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    pub name: String,
    pub score: f64,
}

/// A concrete detector that triggers attachment to a Topic.
///
/// Common fields live on the struct; the detector flavor is the tagged
/// [`SubTopicKind`] variant, dispatched by pattern match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubTopic {
    pub id: String,
    pub name: String,
    pub kind: SubTopicKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SubTopicKind {
    RegexMatch,
    ClusterMatch {
        clusters: Vec<Cluster>,
        /// Rank of the cluster that shares the subtopic's own name within the
        /// score-ordered cluster list. Falls back to 0 when the name is absent.
        name_rank: usize,
    },
}

/// A contiguous run of lines bounded by a detected layout boundary.
///
/// Header lines are accumulated separately while the segmenter is still in
/// its header state, but every line after the boundary (headers included)
/// also lands in `text`/`line_elements` so that a Section's text is a
/// contiguous slice of the document's full text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    /// Stable layout-block id with any `_top` continuation suffix stripped.
    pub block_id: String,
    pub header_lines: Vec<LineIndex>,
    pub header_text: String,
    pub text: String,
    pub line_elements: Vec<LineIndex>,
    /// Names of the Topics this Section was attached to whole.
    pub topics: Vec<String>,
}

impl Section {
    pub(crate) fn new(block_id: String, line_index: LineIndex, header_text: String) -> Self {
        Section {
            block_id,
            header_lines: vec![line_index],
            header_text,
            text: String::new(),
            line_elements: Vec::new(),
            topics: Vec::new(),
        }
    }

    /// A section header line is a line of text that extends the header of the
    /// section opened by a boundary line.
    pub(crate) fn add_header_line(&mut self, line_index: LineIndex, text: &str) {
        self.header_lines.push(line_index);
        self.header_text.push(' ');
        self.header_text.push_str(text);
    }

    pub(crate) fn add_line_element(&mut self, line_index: LineIndex, text: &str) {
        self.text.push(' ');
        self.text.push_str(text);
        self.line_elements.push(line_index);
    }
}

/// A registry-declared semantic bucket accumulating matched Sections and
/// custom line windows during the scan. `text` and `line_indices` are empty
/// until compaction runs after the full line scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    pub subtopics: Vec<SubTopic>,
    pub sections: Vec<SectionId>,
    /// Provenance note per attached section, parallel to `sections`.
    pub sections_added_by: Vec<String>,
    /// Line indices attached directly (custom-line mode), deduplicated by
    /// line identity.
    pub custom_lines: Vec<LineIndex>,
    /// Compacted text, derived after the full scan.
    pub text: String,
    /// Original line indices contributing to `text`, in document order.
    pub line_indices: Vec<LineIndex>,
    /// Custom lines that actually made it into `text` (those not already
    /// covered by an attached Section).
    pub custom_lines_added: Vec<LineIndex>,
}

impl Topic {
    pub fn new(name: impl Into<String>) -> Self {
        Topic {
            name: name.into(),
            subtopics: Vec::new(),
            sections: Vec::new(),
            sections_added_by: Vec::new(),
            custom_lines: Vec::new(),
            text: String::new(),
            line_indices: Vec::new(),
            custom_lines_added: Vec::new(),
        }
    }

    /// Add a SubTopic to the Topic. Subtopic ids are unique within a Topic;
    /// a repeat id is ignored.
    pub fn add_subtopic(&mut self, subtopic: SubTopic) {
        if self.subtopics.iter().any(|s| s.id == subtopic.id) {
            debug!(
                "topic {}: skipping duplicate subtopic id {}",
                self.name, subtopic.id
            );
            return;
        }
        self.subtopics.push(subtopic);
    }

    pub fn has_subtopic(&self, subtopic_id: &str) -> bool {
        self.subtopics.iter().any(|s| s.id == subtopic_id)
    }

    /// Attach a whole Section. Repeat attachments of the same Section are
    /// ignored.
    pub(crate) fn add_section(&mut self, section: SectionId, added_by: &str) -> bool {
        if self.sections.contains(&section) {
            return false;
        }
        self.sections.push(section);
        self.sections_added_by.push(added_by.to_string());
        true
    }

    /// Attach a custom line window without pulling in the whole Section,
    /// deduplicated by line identity.
    pub(crate) fn add_custom_lines(&mut self, window: &[LineIndex]) {
        for &line_index in window {
            if !self.custom_lines.contains(&line_index) {
                self.custom_lines.push(line_index);
            }
        }
    }
}

/// The root of one processing run: owns all Topics, Sections, and the raw
/// (cleaned) line texts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub doc_id: String,
    pub name: String,
    pub topics: Vec<Topic>,
    pub sections: Vec<Section>,
    /// Cleaned line texts in document order. Indices into this vector are the
    /// line identities used everywhere else.
    pub lines: Vec<String>,
    /// Space-joined text of every scanned line, section or not.
    pub full_text: String,
}

impl Document {
    pub fn new(doc_id: impl Into<String>, name: impl Into<String>) -> Self {
        Document {
            doc_id: doc_id.into(),
            name: name.into(),
            topics: Vec::new(),
            sections: Vec::new(),
            lines: Vec::new(),
            full_text: String::new(),
        }
    }

    pub fn add_topic(&mut self, topic: Topic) {
        self.topics.push(topic);
    }

    /// Indices of every Topic owning the given subtopic id. SubTopics are
    /// many-to-many with Topics, so more than one index is possible.
    pub fn topic_indices_by_subtopic_id(&self, subtopic_id: &str) -> Vec<usize> {
        self.topics
            .iter()
            .enumerate()
            .filter(|(_, topic)| topic.has_subtopic(subtopic_id))
            .map(|(index, _)| index)
            .collect()
    }

    pub fn topic_index_by_name(&self, name: &str) -> Option<usize> {
        self.topics.iter().position(|topic| topic.name == name)
    }

    pub fn subtopic_by_id(&self, subtopic_id: &str) -> Option<&SubTopic> {
        self.topics
            .iter()
            .flat_map(|topic| topic.subtopics.iter())
            .find(|subtopic| subtopic.id == subtopic_id)
    }

    pub(crate) fn new_section(&mut self, section: Section) -> SectionId {
        self.sections.push(section);
        self.sections.len() - 1
    }

    /// Record a scanned line in the document-level full text. Lines preceding
    /// the first boundary still land here even though they attach to no
    /// Section.
    pub(crate) fn push_line(&mut self, text: String) {
        self.full_text.push(' ');
        self.full_text.push_str(&text);
        self.lines.push(text);
    }

    /// Attach a whole Section to every Topic owning `subtopic_id`, recording
    /// the back-reference on the Section.
    pub(crate) fn attach_section_to_owners(
        &mut self,
        subtopic_id: &str,
        section: SectionId,
        added_by: &str,
    ) {
        for topic_index in self.topic_indices_by_subtopic_id(subtopic_id) {
            let topic = &mut self.topics[topic_index];
            if topic.add_section(section, added_by) {
                let name = topic.name.clone();
                self.sections[section].topics.push(name);
            }
        }
    }

    /// Attach a custom line window to every Topic owning `subtopic_id`.
    pub(crate) fn attach_custom_lines_to_owners(&mut self, subtopic_id: &str, window: &[LineIndex]) {
        for topic_index in self.topic_indices_by_subtopic_id(subtopic_id) {
            self.topics[topic_index].add_custom_lines(window);
        }
    }
}

/// One hit from a topic-text search.
#[derive(Debug, Clone)]
pub struct TopicSearchResult {
    pub topic_index: usize,
    pub topic_name: String,
    pub start_pos: usize,
    pub end_pos: usize,
}

/// One entry in the document outline: a detected section header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineItem {
    pub section_index: SectionId,
    pub header_text: String,
    pub first_line: Option<LineIndex>,
}
