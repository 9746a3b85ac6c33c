//! Questions command handler.
//!
//! Generates and selects questions without building an index or answering.

use super::{build_client, pipeline_settings, PipelineArgs};
use anyhow::Context;
use clap::Args;
use docqa_core::config::AppConfig;
use docqa_llm::ModelHandle;
use docqa_pipeline::{
    embeddings::providers::TrigramProvider, DocumentParser, FileParser, ProgressReporter,
    QaPipeline,
};
use docqa_prompt::PromptLibrary;
use std::path::PathBuf;
use std::sync::Arc;

/// Generate questions only, without answering them
#[derive(Args, Debug)]
pub struct QuestionsCommand {
    /// Document to process (.pdf, .txt, .md)
    pub file: PathBuf,

    /// Maximum number of questions to keep
    #[arg(long)]
    pub max_questions: Option<usize>,

    /// Question chunks per generation prompt
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl QuestionsCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing questions command for {:?}", self.file);

        let pages = FileParser
            .parse(&self.file)
            .with_context(|| format!("Failed to read {}", self.file.display()))?;

        let args = PipelineArgs {
            max_questions: self.max_questions,
            batch_size: self.batch_size,
            top_k: None,
        };
        let settings = pipeline_settings(config, &args)?;
        // Question generation never embeds, so the offline embedder stands in
        let embedder = Arc::new(TrigramProvider::new(settings.embedding.dimensions));
        let pipeline = QaPipeline::new(
            settings,
            PromptLibrary::for_workspace(&config.workspace)?,
            embedder,
        )?
        .with_progress(ProgressReporter::logging());

        let mut model = ModelHandle::acquire(build_client(config)?, &config.model);
        let result = pipeline.generate_questions(&model, &pages).await;
        let set = model.release_after(result).await?;

        if self.json {
            let output = serde_json::json!({
                "questions": set.questions,
                "failures": set.failures,
                "fallbackUsed": set.fallback_used,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            for (i, question) in set.questions.iter().enumerate() {
                println!("{}. {}", i + 1, question);
            }
            for failure in &set.failures {
                eprintln!(
                    "[{} failed] {}: {}",
                    failure.stage.as_str(),
                    failure.item,
                    failure.message
                );
            }
        }

        Ok(())
    }
}
