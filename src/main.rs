//! popx CLI: scan a conversion-service run file and report extracted topics
//! and the period-of-performance estimate.

use anyhow::Result;
use clap::Parser;
use popx::export::{ExtractionReport, export_to_json, export_to_text};
use popx::{ExportFormat, Registry, document, pop};
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser)]
#[command(
    name = "popx",
    about = "Topic and period-of-performance extraction for solicitation documents",
    version
)]
struct Cli {
    /// Annotated line-run JSON produced by the document-conversion service
    input: PathBuf,

    /// Registry configuration file (defaults to the user config dir, then
    /// compiled defaults)
    #[arg(long)]
    registry: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    export: ExportFormat,

    /// Write output to a file instead of stdout
    #[arg(short, long)]
    outfile: Option<PathBuf>,

    /// Attach every ML cluster match regardless of confidence score
    #[arg(long)]
    add_all_clusters: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut registry = Registry::load(cli.registry.as_deref())?;
    if cli.add_all_clusters {
        registry.add_all_clusters = true;
    }
    debug!(
        "registry loaded: {} priority topics, pop topic {:?}",
        registry.priority_topics.len(),
        registry.pop_topic
    );

    let doc = document::load_run(&cli.input, &registry).await?;
    info!(
        "scanned {}: {} sections across {} lines",
        doc.name,
        doc.sections.len(),
        doc.lines.len()
    );

    let extraction = pop::extract_period_of_performance(&doc, &registry.pop_topic);
    let summary = document::assemble_summary_input(
        &doc,
        &registry.priority_topics,
        registry.summary_sentence_cutoff,
    );
    let report = ExtractionReport::build(&doc, extraction, summary);

    let output = match cli.export {
        ExportFormat::Json => export_to_json(&report)?,
        ExportFormat::Text => export_to_text(&report),
    };

    match cli.outfile {
        Some(path) => tokio::fs::write(&path, output).await?,
        None => print!("{output}"),
    }

    Ok(())
}
