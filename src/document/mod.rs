//! Document scanning and data structures module
//!
//! This module provides functionality for turning the annotated, positioned
//! line output of the upstream conversion service into a structured topic
//! model: Sections at layout boundaries, Topics accumulating matched text.

pub(crate) mod compactor;
pub(crate) mod io;
pub(crate) mod loader;
pub mod models;
pub(crate) mod segmenter;
pub mod query;

// Re-export all models and query functions
pub use models::*;
pub use query::*;

pub use compactor::{SummaryInput, assemble_summary_input, remaining_text};
pub use loader::{load_run, scan_document};
