//! Document-to-QA pipeline.
//!
//! Turns a document's pages into question/answer pairs: pages are chunked
//! twice, questions are generated from the broad chunks, and each selected
//! question is answered from the narrow chunks it retrieves.

pub mod answer;
pub mod chunker;
pub mod config;
pub mod embeddings;
pub mod index;
pub mod normalize;
pub mod parser;
pub mod pipeline;
pub mod progress;
pub mod questions;
pub mod select;
pub mod tokenizer;
pub mod types;


// Re-export commonly used types
pub use answer::{postprocess_answer, AnswerSynthesizer};
pub use chunker::{split_answer_chunks, split_pages, split_text, ChunkSettings};
pub use config::{load_config, PipelineConfig};
pub use embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
pub use index::{build_index, FlatIndex, SearchHit, VectorIndex};
pub use normalize::{normalize, Normalizer};
pub use parser::{ContentType, DocumentParser, FileParser};
pub use pipeline::QaPipeline;
pub use progress::{Phase, ProgressEvent, ProgressReporter};
pub use questions::{parse_questions, QuestionGenerator};
pub use select::select;
pub use types::{
    CandidateQuestion, Chunk, ChunkSet, PipelineReport, QaPair, QuestionSet, RunStats,
    SourcePage, Stage, StepFailure,
};
