//! Run-input I/O and validation
//!
//! This module reads and validates the annotated line-run JSON produced by
//! the upstream document-conversion service.

use anyhow::{Result, bail};
use std::path::Path;

use super::models::RunInput;

/// Validates that the file looks like a run-input JSON file before parsing.
pub(crate) fn validate_run_file(file_path: &Path) -> Result<()> {
    let extension = file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");

    if extension != "json" {
        bail!(
            "Invalid file format. Expected a .json run file, got .{}\n\
            Note: popx consumes the annotated line output of the conversion service.",
            extension
        );
    }

    if !file_path.exists() {
        bail!("Run file not found: {}", file_path.display());
    }

    Ok(())
}

/// Read and deserialize a run-input file.
pub(crate) async fn read_run_input(file_path: &Path) -> Result<RunInput> {
    validate_run_file(file_path)?;

    let contents = tokio::fs::read_to_string(file_path).await?;
    let input: RunInput = serde_json::from_str(&contents).map_err(|e| {
        anyhow::anyhow!(
            "Invalid run file {}: {e}\n\
            This file may be truncated or is not conversion-service output.",
            file_path.display()
        )
    })?;

    if input.lines.is_empty() {
        bail!(
            "Run file {} contains no lines; nothing to scan.",
            file_path.display()
        );
    }

    Ok(input)
}
