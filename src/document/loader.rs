//! Document loading and orchestration
//!
//! This module contains the main `load_run()` / `scan_document()` functions
//! that orchestrate the scanning process, coordinating topic construction,
//! the segmenter, and compaction to turn raw conversion-service output into
//! our internal Document representation.

use anyhow::Result;
use std::path::Path;
use tracing::{debug, error};

use super::compactor::compact_topics;
use super::io::read_run_input;
use super::models::*;
use super::segmenter::Segmenter;
use crate::registry::{Registry, TitleRegistry};

/// Load a run-input file and scan it into a Document.
///
/// This function:
/// 1. Validates and reads the run-input JSON
/// 2. Builds Topics and SubTopics from the per-topic detector boxes
/// 3. Scans the line sequence, creating Sections and routing matches
/// 4. Compacts every Topic's final text
pub async fn load_run(file_path: &Path, registry: &Registry) -> Result<Document> {
    let input = read_run_input(file_path).await?;
    let titles = registry.title_registry()?;
    Ok(scan_document(&input, registry, &titles))
}

/// Scan an already-deserialized run input into a Document.
pub fn scan_document(input: &RunInput, registry: &Registry, titles: &TitleRegistry) -> Document {
    let mut document = Document::new(input.doc_id.clone(), input.name.clone());

    // Topics exist before any line is scanned
    for topic_box in &input.topic_boxes {
        document.add_topic(build_topic(topic_box, registry));
    }

    Segmenter::new(titles, &input.lines).scan(&mut document);
    compact_topics(&mut document);

    debug!(
        "scanned document {}: {} sections, {} topics",
        document.name,
        document.sections.len(),
        document.topics.len()
    );
    document
}

/// Build one Topic from its detector box, gating cluster matches on
/// classification confidence.
fn build_topic(topic_box: &TopicBox, registry: &Registry) -> Topic {
    let mut topic = Topic::new(topic_box.name.clone());

    for cluster_match in &topic_box.cluster_matches {
        let name_rank = cluster_match
            .clusters
            .iter()
            .position(|cluster| cluster.name == cluster_match.name)
            .unwrap_or_else(|| {
                error!(
                    "cluster match {} ({}) has no cluster named after itself; using rank 0",
                    cluster_match.id, cluster_match.name
                );
                0
            });

        if !should_add_cluster_match(cluster_match, name_rank, registry) {
            continue;
        }

        topic.add_subtopic(SubTopic {
            id: cluster_match.id.clone(),
            name: cluster_match.name.clone(),
            kind: SubTopicKind::ClusterMatch {
                clusters: cluster_match.clusters.clone(),
                name_rank,
            },
        });
    }

    for regex_match in &topic_box.regex_matches {
        topic.add_subtopic(SubTopic {
            id: regex_match.id.clone(),
            name: regex_match.name.clone(),
            kind: SubTopicKind::RegexMatch,
        });
    }

    topic
}

/// A cluster match is kept when its self-named cluster is top-ranked, or that
/// cluster still clears the configured score cutoff.
fn should_add_cluster_match(
    cluster_match: &ClusterMatchInput,
    name_rank: usize,
    registry: &Registry,
) -> bool {
    if registry.add_all_clusters {
        return true;
    }
    if name_rank == 0 {
        return true;
    }

    let score = cluster_match
        .clusters
        .get(name_rank)
        .map(|cluster| cluster.score)
        .unwrap_or(0.0);
    if score < registry.cluster_cutoff_score {
        debug!(
            "cluster match {} ({}) scored {score} below cutoff {}; not attached",
            cluster_match.id, cluster_match.name, registry.cluster_cutoff_score
        );
        return false;
    }
    true
}
