//! Pipeline configuration management.

use crate::chunker::ChunkSettings;
use crate::embeddings::EmbeddingConfig;
use docqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Tunables for one pipeline run.
///
/// Every field has a default, so a partial `.docqa/pipeline.yaml` is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Question chunk size in tokens
    #[serde(default = "default_question_chunk_size")]
    pub question_chunk_size: usize,

    #[serde(default = "default_question_chunk_overlap")]
    pub question_chunk_overlap: usize,

    /// Answer chunk size in tokens
    #[serde(default = "default_answer_chunk_size")]
    pub answer_chunk_size: usize,

    #[serde(default = "default_answer_chunk_overlap")]
    pub answer_chunk_overlap: usize,

    /// Pages chunked per batch
    #[serde(default = "default_page_batch_size")]
    pub page_batch_size: usize,

    /// Question chunks per generation prompt
    #[serde(default = "default_question_batch_size")]
    pub question_batch_size: usize,

    /// Chunks tried one at a time when batches yield nothing
    #[serde(default = "default_fallback_chunks")]
    pub fallback_chunks: usize,

    #[serde(default = "default_max_questions")]
    pub max_questions: usize,

    /// Chunks stuffed into each answer prompt
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Chunks fetched before re-ranking down to `top_k`
    #[serde(default = "default_fetch_k")]
    pub fetch_k: usize,

    /// Ceiling applied by the normalizer, in characters
    #[serde(default = "default_max_normalized_chars")]
    pub max_normalized_chars: usize,

    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

fn default_question_chunk_size() -> usize {
    10000
}

fn default_question_chunk_overlap() -> usize {
    200
}

fn default_answer_chunk_size() -> usize {
    1000
}

fn default_answer_chunk_overlap() -> usize {
    100
}

fn default_page_batch_size() -> usize {
    10
}

fn default_question_batch_size() -> usize {
    3
}

fn default_fallback_chunks() -> usize {
    5
}

fn default_max_questions() -> usize {
    15
}

fn default_top_k() -> usize {
    2
}

fn default_fetch_k() -> usize {
    4
}

fn default_max_normalized_chars() -> usize {
    1000
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            question_chunk_size: default_question_chunk_size(),
            question_chunk_overlap: default_question_chunk_overlap(),
            answer_chunk_size: default_answer_chunk_size(),
            answer_chunk_overlap: default_answer_chunk_overlap(),
            page_batch_size: default_page_batch_size(),
            question_batch_size: default_question_batch_size(),
            fallback_chunks: default_fallback_chunks(),
            max_questions: default_max_questions(),
            top_k: default_top_k(),
            fetch_k: default_fetch_k(),
            max_normalized_chars: default_max_normalized_chars(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Reject settings a run could not complete with.
    pub fn validate(&self) -> AppResult<()> {
        self.question_chunking()?;
        self.answer_chunking()?;

        let positive = [
            ("page_batch_size", self.page_batch_size),
            ("question_batch_size", self.question_batch_size),
            ("max_questions", self.max_questions),
            ("top_k", self.top_k),
            ("max_normalized_chars", self.max_normalized_chars),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(AppError::Config(format!("{} must be at least 1", name)));
            }
        }

        if self.fetch_k < self.top_k {
            return Err(AppError::Config(format!(
                "fetch_k ({}) must be >= top_k ({})",
                self.fetch_k, self.top_k
            )));
        }

        self.embedding.validate()
    }

    pub fn question_chunking(&self) -> AppResult<ChunkSettings> {
        ChunkSettings::new(self.question_chunk_size, self.question_chunk_overlap)
    }

    pub fn answer_chunking(&self) -> AppResult<ChunkSettings> {
        ChunkSettings::new(self.answer_chunk_size, self.answer_chunk_overlap)
    }
}

/// Load pipeline configuration.
///
/// Loads from `.docqa/pipeline.yaml` if it exists, otherwise returns defaults.
pub fn load_config(workspace: &Path) -> AppResult<PipelineConfig> {
    let config_path = get_config_path(workspace);

    if !config_path.exists() {
        tracing::debug!("No pipeline config at {:?}, using defaults", config_path);
        return Ok(PipelineConfig::default());
    }

    let content = fs::read_to_string(&config_path).map_err(|e| {
        AppError::Config(format!("Failed to read config at {:?}: {}", config_path, e))
    })?;

    let config: PipelineConfig = serde_yaml::from_str(&content).map_err(|e| {
        AppError::Config(format!("Failed to parse config at {:?}: {}", config_path, e))
    })?;

    tracing::debug!("Loaded pipeline config from {:?}", config_path);
    Ok(config)
}

/// Get the path to the workspace's pipeline config file.
pub fn get_config_path(workspace: &Path) -> PathBuf {
    workspace.join(".docqa").join("pipeline.yaml")
}
