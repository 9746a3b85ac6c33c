//! Batched question generation with a single-chunk fallback.

use crate::normalize::Normalizer;
use crate::progress::ProgressReporter;
use crate::types::{page_annotation, CandidateQuestion, Chunk, QuestionSet, Stage, StepFailure};
use docqa_core::{AppError, AppResult};
use docqa_llm::{GenerationSettings, ModelHandle};
use docqa_prompt::{BuiltPrompt, PromptLibrary};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Shortest line, in characters, accepted as a question from a batch.
const MIN_QUESTION_CHARS: usize = 11;

static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\(?\d{1,3}[.):]|[-*•]|Q\d{0,3}[.:])\s+").unwrap());

/// Generates candidate questions from question chunks.
pub struct QuestionGenerator<'a> {
    model: &'a ModelHandle,
    prompts: &'a PromptLibrary,
    normalizer: Normalizer,
    batch_size: usize,
    fallback_chunks: usize,
}

impl<'a> QuestionGenerator<'a> {
    pub fn new(
        model: &'a ModelHandle,
        prompts: &'a PromptLibrary,
        normalizer: Normalizer,
        batch_size: usize,
        fallback_chunks: usize,
    ) -> AppResult<Self> {
        if batch_size == 0 {
            return Err(AppError::Config(
                "question batch size must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            model,
            prompts,
            normalizer,
            batch_size,
            fallback_chunks,
        })
    }

    /// Generate candidates for every batch of chunks, in order.
    ///
    /// A failing batch is recorded and skipped. When no batch yields a
    /// question, the first `fallback_chunks` chunks are retried one by one
    /// with the single-question prompt.
    pub async fn generate(
        &self,
        chunks: &[Chunk],
        progress: &ProgressReporter,
    ) -> AppResult<QuestionSet> {
        let mut set = QuestionSet::default();
        let total = chunks.len().div_ceil(self.batch_size) as u64;

        for (i, batch) in chunks.chunks(self.batch_size).enumerate() {
            let pages = batch_pages(batch);

            match self.generate_batch(batch).await {
                Ok(questions) => {
                    tracing::debug!(
                        "Batch {} (pages {:?}) produced {} questions",
                        i + 1,
                        pages,
                        questions.len()
                    );
                    set.questions.extend(questions);
                }
                Err(e) if !e.is_fatal() => {
                    tracing::warn!("Question batch {} failed: {}", i + 1, e);
                    set.failures.push(StepFailure::new(
                        Stage::QuestionBatch,
                        format!("batch {} {}", i + 1, page_annotation(pages)),
                        e.to_string(),
                    ));
                }
                Err(e) => return Err(e),
            }

            progress.question_batch(i as u64 + 1, total, set.questions.len());
        }

        if set.questions.is_empty() && !chunks.is_empty() {
            tracing::info!("Batches produced no questions, falling back to single chunks");
            set.fallback_used = true;
            self.fallback(chunks, &mut set, progress).await?;
        }

        tracing::info!(
            "Generated {} candidate questions from {} chunks ({} failed steps)",
            set.questions.len(),
            chunks.len(),
            set.failures.len()
        );

        Ok(set)
    }

    async fn fallback(
        &self,
        chunks: &[Chunk],
        set: &mut QuestionSet,
        progress: &ProgressReporter,
    ) -> AppResult<()> {
        let candidates = &chunks[..chunks.len().min(self.fallback_chunks)];
        let total = candidates.len() as u64;

        for (i, chunk) in candidates.iter().enumerate() {
            match self.generate_single(chunk).await {
                Ok(Some(question)) => set.questions.push(question),
                Ok(None) => {
                    tracing::debug!("Fallback on chunk {} produced no question", chunk.position)
                }
                Err(e) if !e.is_fatal() => {
                    tracing::warn!("Fallback on chunk {} failed: {}", chunk.position, e);
                    set.failures.push(StepFailure::new(
                        Stage::QuestionFallback,
                        format!("chunk {} {}", chunk.position, page_annotation([chunk.source_page])),
                        e.to_string(),
                    ));
                }
                Err(e) => return Err(e),
            }

            progress.fallback(i as u64 + 1, total);
        }

        Ok(())
    }

    /// One generation call for a batch of chunks.
    pub async fn generate_batch(&self, batch: &[Chunk]) -> AppResult<Vec<CandidateQuestion>> {
        let body = batch
            .iter()
            .map(|chunk| {
                format!(
                    "[Page {}]\n{}",
                    chunk.source_page,
                    self.normalizer.normalize(&chunk.text)
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = self.prompts.questions_batch(&body)?;
        let response = self.run(&prompt).await?;

        Ok(parse_questions(&response, &self.normalizer, &batch_pages(batch)))
    }

    /// One generation call asking for a single question about `chunk`.
    pub async fn generate_single(&self, chunk: &Chunk) -> AppResult<Option<CandidateQuestion>> {
        let excerpt = self.normalizer.normalize(&chunk.text);
        let prompt = self.prompts.questions_single(&excerpt)?;
        let response = self.run(&prompt).await?;

        Ok(response
            .lines()
            .map(|line| clean_line(line, &self.normalizer))
            .find(|line| line.ends_with('?'))
            .map(|text| CandidateQuestion::new(text, [chunk.source_page])))
    }

    async fn run(&self, prompt: &BuiltPrompt) -> AppResult<String> {
        self.model
            .generate_with(
                &prompt.text,
                GenerationSettings {
                    temperature: prompt.generation.temperature,
                    max_tokens: prompt.generation.max_tokens,
                },
            )
            .await
    }
}

fn batch_pages(batch: &[Chunk]) -> BTreeSet<u32> {
    batch.iter().map(|chunk| chunk.source_page).collect()
}

fn clean_line(line: &str, normalizer: &Normalizer) -> String {
    let normalized = normalizer.normalize(line);
    LIST_MARKER.replace(&normalized, "").trim().to_string()
}

/// Extract question lines from a batch response.
///
/// A line is kept when, after normalization and list-marker removal, it ends
/// with '?' and is longer than 10 characters. Kept lines are tagged with `pages`.
pub fn parse_questions(
    response: &str,
    normalizer: &Normalizer,
    pages: &BTreeSet<u32>,
) -> Vec<CandidateQuestion> {
    response
        .lines()
        .map(|line| clean_line(line, normalizer))
        .filter(|line| line.ends_with('?') && line.chars().count() >= MIN_QUESTION_CHARS)
        .map(|text| CandidateQuestion {
            text,
            source_pages: pages.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_llm::MockClient;
    use std::sync::Arc;

    fn chunk(text: &str, page: u32, position: u32) -> Chunk {
        Chunk {
            text: text.to_string(),
            source_page: page,
            position,
        }
    }

    fn pages(pages: &[u32]) -> BTreeSet<u32> {
        pages.iter().copied().collect()
    }

    #[test]
    fn test_parse_questions_filters_lines() {
        let response = "Here are some questions:\n\
            1. What does photosynthesis convert light into?\n\
            2) Why?\n\
            - How do mitochondria produce ATP?\n\
            This line is not a question.\n\
            \n\
            * Which organelle produces ATP in cells?";

        let questions = parse_questions(response, &Normalizer::default(), &pages(&[1, 2]));
        let texts: Vec<&str> = questions.iter().map(|q| q.text.as_str()).collect();

        assert_eq!(
            texts,
            vec![
                "What does photosynthesis convert light into?",
                "How do mitochondria produce ATP?",
                "Which organelle produces ATP in cells?",
            ]
        );
        assert!(questions.iter().all(|q| q.source_pages == pages(&[1, 2])));
    }

    #[test]
    fn test_parse_questions_length_boundary() {
        let normalizer = Normalizer::default();
        // exactly 10 characters is rejected, 11 accepted
        assert!(parse_questions("Is it ATP?", &normalizer, &pages(&[1])).is_empty());
        assert_eq!(parse_questions("Is it ATP??", &normalizer, &pages(&[1])).len(), 1);
    }

    #[test]
    fn test_parse_questions_normalizes_lines() {
        let response = "<|assistant|> What   is the role of ATP in cells?";
        let questions = parse_questions(response, &Normalizer::default(), &pages(&[2]));
        assert_eq!(questions[0].text, "What is the role of ATP in cells?");
    }

    #[tokio::test]
    async fn test_batches_tag_questions_with_batch_pages() {
        let client = Arc::new(MockClient::new(|prompt| {
            if prompt.contains("[Page 4]") {
                Ok("What happens on the fourth page?".to_string())
            } else {
                Ok("1. What happens on the first pages?".to_string())
            }
        }));
        let mut model = ModelHandle::acquire(client.clone(), "mock");
        let prompts = PromptLibrary::builtin().unwrap();
        let generator =
            QuestionGenerator::new(&model, &prompts, Normalizer::default(), 3, 5).unwrap();

        let chunks: Vec<Chunk> = (1..=4)
            .map(|p| chunk(&format!("Page {}: text {}", p, p), p, p - 1))
            .collect();
        let set = generator
            .generate(&chunks, &ProgressReporter::noop())
            .await
            .unwrap();

        assert_eq!(client.prompts().len(), 2);
        assert!(!set.fallback_used);
        assert_eq!(set.questions.len(), 2);
        assert_eq!(set.questions[0].source_pages, pages(&[1, 2, 3]));
        assert_eq!(set.questions[1].source_pages, pages(&[4]));
        assert!(client.prompts()[0].contains("[Page 1]\nPage 1: text 1\n\n[Page 2]"));
        model.release().await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_batch_is_recorded_and_skipped() {
        let client = Arc::new(MockClient::new(|prompt| {
            if prompt.contains("[Page 1]") {
                Err(AppError::Generation("model crashed".to_string()))
            } else {
                Ok("What is described on page two?".to_string())
            }
        }));
        let mut model = ModelHandle::acquire(client, "mock");
        let prompts = PromptLibrary::builtin().unwrap();
        let generator =
            QuestionGenerator::new(&model, &prompts, Normalizer::default(), 1, 5).unwrap();

        let chunks = vec![chunk("Page 1: a", 1, 0), chunk("Page 2: b", 2, 1)];
        let set = generator
            .generate(&chunks, &ProgressReporter::noop())
            .await
            .unwrap();

        assert_eq!(set.questions.len(), 1);
        assert_eq!(set.failures.len(), 1);
        assert_eq!(set.failures[0].stage, Stage::QuestionBatch);
        assert!(set.failures[0].item.contains("(From page(s) 1)"));
        assert!(set.failures[0].message.contains("model crashed"));
        model.release().await.unwrap();
    }

    #[tokio::test]
    async fn test_fallback_runs_when_batches_yield_nothing() {
        let client = Arc::new(MockClient::new(|prompt| {
            if prompt.starts_with("Generate one specific question") {
                Ok("Sure!\nWhat does the chunk describe?".to_string())
            } else {
                Ok("No questions here.".to_string())
            }
        }));
        let mut model = ModelHandle::acquire(client.clone(), "mock");
        let prompts = PromptLibrary::builtin().unwrap();
        let generator =
            QuestionGenerator::new(&model, &prompts, Normalizer::default(), 3, 5).unwrap();

        let chunks: Vec<Chunk> = (0..7)
            .map(|i| chunk(&format!("Page 1: part {}", i), 1, i))
            .collect();
        let set = generator
            .generate(&chunks, &ProgressReporter::noop())
            .await
            .unwrap();

        assert!(set.fallback_used);
        // 3 batch calls, then fallback on the first 5 chunks
        assert_eq!(client.prompts().len(), 8);
        assert_eq!(set.questions.len(), 5);
        assert_eq!(set.questions[0].text, "What does the chunk describe?");
        assert_eq!(set.questions[0].source_pages, pages(&[1]));
        model.release().await.unwrap();
    }

    #[tokio::test]
    async fn test_fallback_skipped_for_empty_input() {
        let client = Arc::new(MockClient::with_responses(vec![]));
        let mut model = ModelHandle::acquire(client.clone(), "mock");
        let prompts = PromptLibrary::builtin().unwrap();
        let generator =
            QuestionGenerator::new(&model, &prompts, Normalizer::default(), 3, 5).unwrap();

        let set = generator
            .generate(&[], &ProgressReporter::noop())
            .await
            .unwrap();

        assert!(set.questions.is_empty());
        assert!(!set.fallback_used);
        assert!(client.prompts().is_empty());
        model.release().await.unwrap();
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let client = Arc::new(MockClient::with_responses(vec![]));
        let model = ModelHandle::acquire(client, "mock");
        let prompts = PromptLibrary::builtin().unwrap();
        assert!(QuestionGenerator::new(&model, &prompts, Normalizer::default(), 0, 5).is_err());
    }
}
