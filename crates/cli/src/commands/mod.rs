//! Command handlers for the docqa CLI.
//!
//! Each subcommand lives in its own module; the helpers below turn an
//! `AppConfig` into the clients and pipeline the commands share.

pub mod chunks;
pub mod generate;
pub mod prompts;
pub mod questions;

pub use chunks::ChunksCommand;
pub use generate::GenerateCommand;
pub use prompts::PromptsCommand;
pub use questions::QuestionsCommand;

use anyhow::Context;
use clap::Args;
use docqa_core::{config::AppConfig, AppError, AppResult};
use docqa_llm::{create_client, LlmClient};
use docqa_pipeline::{
    load_config, EmbeddingConfig, PipelineConfig, ProgressReporter, QaPipeline,
};
use std::sync::Arc;

/// Pipeline settings that can be overridden per invocation.
#[derive(Args, Debug, Default)]
pub struct PipelineArgs {
    /// Maximum number of questions to answer
    #[arg(long)]
    pub max_questions: Option<usize>,

    /// Question chunks per generation prompt
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Chunks stuffed into each answer prompt
    #[arg(long)]
    pub top_k: Option<usize>,
}

impl PipelineArgs {
    fn apply(&self, mut settings: PipelineConfig) -> PipelineConfig {
        if let Some(max_questions) = self.max_questions {
            settings.max_questions = max_questions;
        }
        if let Some(batch_size) = self.batch_size {
            settings.question_batch_size = batch_size;
        }
        if let Some(top_k) = self.top_k {
            settings.top_k = top_k;
            settings.fetch_k = settings.fetch_k.max(top_k);
        }
        settings
    }
}

/// Load `.docqa/pipeline.yaml` and fold in the app-level embedding choice.
///
/// The embedding section of `pipeline.yaml` is kept unless an embedding
/// provider was chosen explicitly in config.yaml, the environment or a flag.
pub fn pipeline_settings(config: &AppConfig, args: &PipelineArgs) -> AppResult<PipelineConfig> {
    let mut settings = args.apply(load_config(&config.workspace)?);

    if let Some(provider) = config.embedding_provider.as_deref() {
        if settings.embedding.provider != provider {
            settings.embedding = EmbeddingConfig::for_provider(provider);
            if let Some(model) = config
                .get_provider_config(provider)
                .and_then(|pc| pc.embedding_model())
            {
                settings.embedding.model = model.to_string();
            }
        }
    }

    if settings.embedding.endpoint.is_none() {
        settings.embedding.endpoint = config
            .get_provider_config(&settings.embedding.provider)
            .and_then(|pc| pc.endpoint())
            .map(str::to_string);
    }

    settings.validate()?;
    Ok(settings)
}

/// Build the pipeline for a run, connecting to the embedding backend.
pub async fn build_pipeline(config: &AppConfig, args: &PipelineArgs) -> anyhow::Result<QaPipeline> {
    let settings = pipeline_settings(config, args)?;
    let prompts = docqa_prompt::PromptLibrary::for_workspace(&config.workspace)?;
    let api_key = config.resolve_api_key(&settings.embedding.provider);

    let embedder = docqa_pipeline::create_provider(&settings.embedding, api_key.as_deref())
        .await
        .with_context(|| {
            format!(
                "Failed to set up embedding provider '{}'",
                settings.embedding.provider
            )
        })?;

    Ok(QaPipeline::new(settings, prompts, embedder)?.with_progress(ProgressReporter::logging()))
}

/// Create the generation client for the configured provider.
pub fn build_client(config: &AppConfig) -> AppResult<Arc<dyn LlmClient>> {
    config.validate()?;

    let provider_config = config.get_provider_config(&config.provider);
    let endpoint = provider_config.and_then(|pc| pc.endpoint());
    let timeout = provider_config.and_then(|pc| pc.timeout());
    let api_key = config.resolve_api_key(&config.provider);

    create_client(&config.provider, endpoint, api_key.as_deref(), timeout)
        .map_err(AppError::Config)
}
