//! Retrieval-augmented answer synthesis.
//!
//! Retrieves answer chunks for a question, stuffs them into a single prompt,
//! and cleans up the generated text.

use crate::embeddings::EmbeddingProvider;
use crate::index::{SearchHit, VectorIndex};
use crate::normalize::Normalizer;
use crate::types::{CandidateQuestion, QaPair};
use docqa_core::{AppError, AppResult};
use docqa_llm::{GenerationSettings, ModelHandle};
use docqa_prompt::PromptLibrary;
use std::collections::{BTreeSet, HashSet};

/// Sentences shorter than this are dropped from answers.
const MIN_SENTENCE_CHARS: usize = 10;

/// Answers questions from an index of answer chunks.
pub struct AnswerSynthesizer<'a> {
    model: &'a ModelHandle,
    prompts: &'a PromptLibrary,
    embedder: &'a dyn EmbeddingProvider,
    index: &'a dyn VectorIndex,
    normalizer: Normalizer,
    top_k: usize,
    fetch_k: usize,
}

impl<'a> AnswerSynthesizer<'a> {
    pub fn new(
        model: &'a ModelHandle,
        prompts: &'a PromptLibrary,
        embedder: &'a dyn EmbeddingProvider,
        index: &'a dyn VectorIndex,
        normalizer: Normalizer,
    ) -> Self {
        Self {
            model,
            prompts,
            embedder,
            index,
            normalizer,
            top_k: 2,
            fetch_k: 4,
        }
    }

    /// Set how many chunks are fetched and how many reach the prompt.
    pub fn with_retrieval(mut self, top_k: usize, fetch_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self.fetch_k = fetch_k.max(self.top_k);
        self
    }

    /// Retrieve the context chunks for `question`.
    ///
    /// Fetches `fetch_k` hits by similarity, drops hits whose normalized text
    /// repeats an earlier hit, and keeps the best `top_k`.
    pub async fn retrieve(&self, question: &str) -> AppResult<Vec<SearchHit>> {
        let query = self.embedder.embed(question).await?;
        let hits = self.index.search(&query, self.fetch_k)?;

        let mut seen = HashSet::new();
        let hits: Vec<SearchHit> = hits
            .into_iter()
            .filter(|hit| seen.insert(self.normalizer.normalize(&hit.chunk.text)))
            .take(self.top_k)
            .collect();

        tracing::debug!(
            "Retrieved {} chunks for question (scores: {:?})",
            hits.len(),
            hits.iter().map(|h| h.score).collect::<Vec<_>>()
        );

        Ok(hits)
    }

    /// Answer one question.
    pub async fn answer(&self, question: &CandidateQuestion) -> AppResult<QaPair> {
        let hits = self.retrieve(&question.text).await?;
        if hits.is_empty() {
            return Err(AppError::Embedding(format!(
                "No context retrieved for question: {}",
                question.text
            )));
        }

        let context = hits
            .iter()
            .map(|hit| hit.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = self.prompts.answer(&context, &question.text)?;
        let raw = self
            .model
            .generate_with(
                &prompt.text,
                GenerationSettings {
                    temperature: prompt.generation.temperature,
                    max_tokens: prompt.generation.max_tokens,
                },
            )
            .await?;

        let answer = postprocess_answer(&raw, &self.normalizer);
        if answer.is_empty() {
            return Err(AppError::Generation(format!(
                "Model returned no usable answer for: {}",
                question.text
            )));
        }

        let context_pages: BTreeSet<u32> = hits.iter().map(|hit| hit.chunk.source_page).collect();

        Ok(QaPair {
            question: question.text.clone(),
            answer,
            source_pages: question.source_pages.iter().copied().collect(),
            context_pages: context_pages.into_iter().collect(),
        })
    }
}

/// Clean up a generated answer.
///
/// The text is normalized and split on ". ". Sentences under 10 characters
/// and case-insensitive repeats are dropped. The rest are rejoined and the
/// result ends with '.'. Returns an empty string when nothing survives.
pub fn postprocess_answer(raw: &str, normalizer: &Normalizer) -> String {
    let normalized = normalizer.normalize(raw);

    let mut seen = HashSet::new();
    let sentences: Vec<&str> = normalized
        .split(". ")
        .map(str::trim)
        .filter(|s| s.chars().count() >= MIN_SENTENCE_CHARS)
        .filter(|s| seen.insert(s.trim_end_matches('.').to_lowercase()))
        .collect();

    if sentences.is_empty() {
        return String::new();
    }

    let mut answer = sentences.join(". ");
    if !answer.ends_with('.') {
        answer.push('.');
    }
    answer
}
