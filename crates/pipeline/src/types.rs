//! Pipeline type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Raw text of one physical page, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePage {
    /// 1-based page number
    pub page_number: u32,

    /// Extracted page text
    pub raw_text: String,
}

impl SourcePage {
    pub fn new(page_number: u32, raw_text: impl Into<String>) -> Self {
        Self {
            page_number,
            raw_text: raw_text.into(),
        }
    }
}

/// A token-bounded span of text and the page it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk text
    pub text: String,

    /// Page the text was taken from
    pub source_page: u32,

    /// Position within its chunk sequence (0-based)
    pub position: u32,
}

/// The two chunk populations derived from one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkSet {
    /// Broad chunks fed to question generation
    pub question_chunks: Vec<Chunk>,

    /// Narrow chunks indexed for retrieval
    pub answer_chunks: Vec<Chunk>,
}

/// A generated question and the pages of the batch that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateQuestion {
    /// Question text, ending with '?'
    pub text: String,

    /// Pages that contributed to the generating prompt
    pub source_pages: BTreeSet<u32>,
}

impl CandidateQuestion {
    pub fn new(text: impl Into<String>, source_pages: impl IntoIterator<Item = u32>) -> Self {
        Self {
            text: text.into(),
            source_pages: source_pages.into_iter().collect(),
        }
    }

    /// Page annotation such as `(From page(s) 3, 4)`, empty without pages.
    pub fn page_annotation(&self) -> String {
        page_annotation(self.source_pages.iter().copied())
    }
}

impl fmt::Display for CandidateQuestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let annotation = self.page_annotation();
        if annotation.is_empty() {
            write!(f, "{}", self.text)
        } else {
            write!(f, "{} {}", self.text, annotation)
        }
    }
}

/// Render page numbers as a display annotation.
pub fn page_annotation(pages: impl IntoIterator<Item = u32>) -> String {
    let pages: Vec<String> = pages.into_iter().map(|p| p.to_string()).collect();
    if pages.is_empty() {
        String::new()
    } else {
        format!("(From page(s) {})", pages.join(", "))
    }
}

/// One answered question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,

    /// Pages annotated on the question
    pub source_pages: Vec<u32>,

    /// Pages of the chunks the answer was generated from
    pub context_pages: Vec<u32>,
}

impl QaPair {
    /// Question text with its page annotation appended.
    pub fn display_question(&self) -> String {
        let annotation = page_annotation(self.source_pages.iter().copied());
        if annotation.is_empty() {
            self.question.clone()
        } else {
            format!("{} {}", self.question, annotation)
        }
    }
}

/// Pipeline stage a scoped failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    QuestionBatch,
    QuestionFallback,
    Answer,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QuestionBatch => "question_batch",
            Self::QuestionFallback => "question_fallback",
            Self::Answer => "answer",
        }
    }
}

/// A batch or question that failed without ending the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFailure {
    pub stage: Stage,

    /// Which item failed, e.g. `batch 2 (pages 4, 5)` or the question text
    pub item: String,

    pub message: String,
}

impl StepFailure {
    pub fn new(stage: Stage, item: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage,
            item: item.into(),
            message: message.into(),
        }
    }
}

/// Candidate questions from one generation pass.
#[derive(Debug, Clone, Default)]
pub struct QuestionSet {
    pub questions: Vec<CandidateQuestion>,
    pub failures: Vec<StepFailure>,

    /// Whether the single-chunk fallback ran
    pub fallback_used: bool,
}

/// Counters describing one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub pages: u32,
    pub question_chunks: u32,
    pub answer_chunks: u32,
    pub candidates: u32,
    pub selected_questions: u32,
    pub answered: u32,
    pub fallback_used: bool,
    pub generation_calls: u64,
    pub duration_secs: f64,
}

/// Result of processing one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub pairs: Vec<QaPair>,
    pub failures: Vec<StepFailure>,
    pub stats: RunStats,
}

impl PipelineReport {
    /// True when every selected question was answered.
    pub fn is_complete(&self) -> bool {
        self.failures.iter().all(|f| f.stage != Stage::Answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_display_with_pages() {
        let question = CandidateQuestion::new("What is ATP?", [4, 3]);
        assert_eq!(question.page_annotation(), "(From page(s) 3, 4)");
        assert_eq!(question.to_string(), "What is ATP? (From page(s) 3, 4)");
    }

    #[test]
    fn test_question_display_without_pages() {
        let question = CandidateQuestion::new("What is ATP?", []);
        assert_eq!(question.to_string(), "What is ATP?");
    }

    #[test]
    fn test_pair_display_question() {
        let pair = QaPair {
            question: "What produces ATP?".to_string(),
            answer: "Mitochondria produce ATP.".to_string(),
            source_pages: vec![2],
            context_pages: vec![2],
        };
        assert_eq!(pair.display_question(), "What produces ATP? (From page(s) 2)");
    }

    #[test]
    fn test_stage_serialization() {
        let json = serde_json::to_string(&Stage::QuestionFallback).unwrap();
        assert_eq!(json, "\"question_fallback\"");
        assert_eq!(Stage::Answer.as_str(), "answer");
    }
}
