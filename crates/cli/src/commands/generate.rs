//! Generate command handler.
//!
//! Runs the full pipeline over one document and prints the answered pairs.

use super::{build_client, build_pipeline, PipelineArgs};
use anyhow::Context;
use clap::Args;
use docqa_core::config::AppConfig;
use docqa_pipeline::{DocumentParser, FileParser, PipelineReport};
use std::path::PathBuf;

/// Generate answered questions from a document
#[derive(Args, Debug)]
pub struct GenerateCommand {
    /// Document to process (.pdf, .txt, .md)
    pub file: PathBuf,

    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl GenerateCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing generate command for {:?}", self.file);

        let pages = FileParser
            .parse(&self.file)
            .with_context(|| format!("Failed to read {}", self.file.display()))?;

        let pipeline = build_pipeline(config, &self.pipeline).await?;
        let client = build_client(config)?;

        let report = pipeline.run(client, &config.model, &pages).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print!("{}", render_report(&report));
        }

        Ok(())
    }
}

/// Plain-text rendering of a report.
pub fn render_report(report: &PipelineReport) -> String {
    let mut out = String::new();

    for (i, pair) in report.pairs.iter().enumerate() {
        out.push_str(&format!("Q{}: {}\n", i + 1, pair.display_question()));
        out.push_str(&format!("A{}: {}\n\n", i + 1, pair.answer));
    }

    for failure in &report.failures {
        out.push_str(&format!(
            "[{} failed] {}: {}\n",
            failure.stage.as_str(),
            failure.item,
            failure.message
        ));
    }

    let stats = &report.stats;
    out.push_str(&format!(
        "{} of {} questions answered from {} pages ({} generation calls, {:.1}s{})\n",
        stats.answered,
        stats.selected_questions,
        stats.pages,
        stats.generation_calls,
        stats.duration_secs,
        if stats.fallback_used { ", fallback used" } else { "" }
    ));

    out
}
