//! End-to-end document processing.
//!
//! `QaPipeline` wires the stages together: chunk the pages, index the answer
//! chunks, generate and select questions, then answer each one. Fatal errors
//! end the run; generation and embedding failures for a single batch or
//! question are recorded in the report and the run carries on.

use crate::answer::AnswerSynthesizer;
use crate::chunker::{split_answer_chunks, split_pages};
use crate::config::{self, PipelineConfig};
use crate::embeddings::{create_provider, EmbeddingProvider};
use crate::index::build_index;
use crate::normalize::Normalizer;
use crate::parser::DocumentParser;
use crate::progress::ProgressReporter;
use crate::questions::QuestionGenerator;
use crate::select::select;
use crate::types::{ChunkSet, PipelineReport, QuestionSet, RunStats, SourcePage, Stage, StepFailure};
use docqa_core::{AppError, AppResult};
use docqa_llm::{LlmClient, ModelHandle};
use docqa_prompt::PromptLibrary;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Document-to-QA pipeline.
pub struct QaPipeline {
    config: PipelineConfig,
    prompts: PromptLibrary,
    embedder: Arc<dyn EmbeddingProvider>,
    progress: ProgressReporter,
}

impl QaPipeline {
    pub fn new(
        config: PipelineConfig,
        prompts: PromptLibrary,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> AppResult<Self> {
        config.validate()?;

        Ok(Self {
            config,
            prompts,
            embedder,
            progress: ProgressReporter::noop(),
        })
    }

    /// Build a pipeline from a workspace's `.docqa/` settings and prompts.
    pub async fn from_workspace(workspace: &Path, api_key: Option<&str>) -> AppResult<Self> {
        let config = config::load_config(workspace)?;
        let prompts = PromptLibrary::for_workspace(workspace)?;
        let embedder = create_provider(&config.embedding, api_key).await?;
        Self::new(config, prompts, embedder)
    }

    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn normalizer(&self) -> Normalizer {
        Normalizer::with_max_chars(self.config.max_normalized_chars)
    }

    /// Split pages into question chunks and answer chunks.
    pub fn chunk(&self, pages: &[SourcePage]) -> AppResult<ChunkSet> {
        let question_chunks = split_pages(
            pages,
            self.config.question_chunking()?,
            self.config.page_batch_size,
        );
        let answer_chunks = split_answer_chunks(&question_chunks, self.config.answer_chunking()?);

        self.progress.chunk(question_chunks.len(), answer_chunks.len());

        Ok(ChunkSet {
            question_chunks,
            answer_chunks,
        })
    }

    /// Chunk the pages and generate the selected question set, without answering.
    pub async fn generate_questions(
        &self,
        model: &ModelHandle,
        pages: &[SourcePage],
    ) -> AppResult<QuestionSet> {
        let chunks = self.chunk(pages)?;
        let mut set = self.question_generator(model)?
            .generate(&chunks.question_chunks, &self.progress)
            .await?;

        set.questions = select(set.questions, self.config.max_questions);
        if set.questions.is_empty() {
            return Err(AppError::NoQuestions);
        }

        Ok(set)
    }

    fn question_generator<'a>(&'a self, model: &'a ModelHandle) -> AppResult<QuestionGenerator<'a>> {
        QuestionGenerator::new(
            model,
            &self.prompts,
            self.normalizer(),
            self.config.question_batch_size,
            self.config.fallback_chunks,
        )
    }

    /// Run the full pipeline over `pages` with an acquired model.
    ///
    /// The retrieval index is built before any generation call, so a document
    /// without usable text fails without touching the model.
    pub async fn process_document(
        &self,
        model: &ModelHandle,
        pages: &[SourcePage],
    ) -> AppResult<PipelineReport> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let started_at = chrono::Utc::now();
        let start = Instant::now();
        let calls_before = model.calls();

        tracing::info!("Starting run {} over {} pages", run_id, pages.len());

        let chunks = self.chunk(pages)?;
        let normalizer = self.normalizer();

        let index = build_index(
            &chunks.answer_chunks,
            self.embedder.as_ref(),
            &normalizer,
            self.config.embedding.batch_size,
            &self.progress,
        )
        .await?;

        let generated = self
            .question_generator(model)?
            .generate(&chunks.question_chunks, &self.progress)
            .await?;

        let candidates = generated.questions.len();
        let mut failures = generated.failures;
        let questions = select(generated.questions, self.config.max_questions);
        if questions.is_empty() {
            return Err(AppError::NoQuestions);
        }

        tracing::info!(
            "Selected {} of {} candidate questions",
            questions.len(),
            candidates
        );

        let synthesizer = AnswerSynthesizer::new(
            model,
            &self.prompts,
            self.embedder.as_ref(),
            &index,
            normalizer,
        )
        .with_retrieval(self.config.top_k, self.config.fetch_k);

        let total = questions.len() as u64;
        let mut pairs = Vec::with_capacity(questions.len());
        for (i, question) in questions.iter().enumerate() {
            self.progress.answer(i as u64 + 1, total, &question.text);

            match synthesizer.answer(question).await {
                Ok(pair) => pairs.push(pair),
                Err(e) if !e.is_fatal() => {
                    tracing::warn!("Failed to answer '{}': {}", question.text, e);
                    failures.push(StepFailure::new(
                        Stage::Answer,
                        question.to_string(),
                        e.to_string(),
                    ));
                }
                Err(e) => return Err(e),
            }
        }

        let stats = RunStats {
            pages: pages.len() as u32,
            question_chunks: chunks.question_chunks.len() as u32,
            answer_chunks: chunks.answer_chunks.len() as u32,
            candidates: candidates as u32,
            selected_questions: questions.len() as u32,
            answered: pairs.len() as u32,
            fallback_used: generated.fallback_used,
            generation_calls: model.calls() - calls_before,
            duration_secs: start.elapsed().as_secs_f64(),
        };

        tracing::info!(
            "Run {} complete: {} answered, {} failed steps, {} generation calls in {:.1}s",
            run_id,
            stats.answered,
            failures.len(),
            stats.generation_calls,
            stats.duration_secs
        );

        Ok(PipelineReport {
            run_id,
            started_at,
            pairs,
            failures,
            stats,
        })
    }

    /// Parse `path` and process it.
    pub async fn process_file(
        &self,
        model: &ModelHandle,
        path: &Path,
        parser: &dyn DocumentParser,
    ) -> AppResult<PipelineReport> {
        let pages = parser.parse(path)?;
        self.process_document(model, &pages).await
    }

    /// Acquire `model` from `client`, process the pages, and release the model.
    ///
    /// The model is released whether or not processing succeeds.
    pub async fn run(
        &self,
        client: Arc<dyn LlmClient>,
        model: &str,
        pages: &[SourcePage],
    ) -> AppResult<PipelineReport> {
        let mut handle = ModelHandle::acquire(client, model);
        let result = self.process_document(&handle, pages).await;
        handle.release_after(result).await
    }
}

impl std::fmt::Debug for QaPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QaPipeline")
            .field("config", &self.config)
            .field("embedder", &self.embedder)
            .finish_non_exhaustive()
    }
}
