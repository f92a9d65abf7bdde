//! popx: Topic and period-of-performance extraction for solicitation documents
//!
//! This library turns the annotated, positioned line output of an upstream
//! document-conversion service into a hierarchical topic model, then runs a
//! four-strategy regex pipeline over the Period-of-Performance topic to
//! produce one audited day-count estimate.

pub mod document;
pub mod export;
pub mod pop;
pub mod registry;

/// Export format options
#[derive(clap::ValueEnum, Clone)]
pub enum ExportFormat {
    Text,
    Json,
}

// Re-export commonly used types
pub use document::{Document, Section, SubTopic, SubTopicKind, Topic};
pub use export::ExtractionReport;
pub use pop::{PopExtraction, extract_period_of_performance};
pub use registry::{Registry, TitleRegistry};
