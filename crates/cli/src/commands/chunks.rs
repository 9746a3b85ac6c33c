//! Chunks command handler.
//!
//! Shows the question chunks (or answer chunks) a document is split into.

use super::{pipeline_settings, PipelineArgs};
use anyhow::Context;
use clap::Args;
use docqa_core::config::AppConfig;
use docqa_pipeline::{
    split_answer_chunks, split_pages, tokenizer::count_tokens, Chunk, DocumentParser, FileParser,
};
use std::path::PathBuf;

/// Characters of chunk text shown per chunk in text output.
const PREVIEW_CHARS: usize = 80;

/// Show how a document is chunked
#[derive(Args, Debug)]
pub struct ChunksCommand {
    /// Document to chunk (.pdf, .txt, .md)
    pub file: PathBuf,

    /// Show answer chunks instead of question chunks
    #[arg(long)]
    pub answer: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ChunksCommand {
    pub fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing chunks command for {:?}", self.file);

        let pages = FileParser
            .parse(&self.file)
            .with_context(|| format!("Failed to read {}", self.file.display()))?;
        let settings = pipeline_settings(config, &PipelineArgs::default())?;

        let question_chunks = split_pages(
            &pages,
            settings.question_chunking()?,
            settings.page_batch_size,
        );
        let chunks = if self.answer {
            split_answer_chunks(&question_chunks, settings.answer_chunking()?)
        } else {
            question_chunks
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&chunks)?);
        } else {
            for chunk in &chunks {
                println!("{}", describe(chunk));
            }
            eprintln!("{} chunks from {} pages", chunks.len(), pages.len());
        }

        Ok(())
    }
}

fn describe(chunk: &Chunk) -> String {
    let preview: String = chunk
        .text
        .chars()
        .take(PREVIEW_CHARS)
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect();
    let ellipsis = if chunk.text.chars().count() > PREVIEW_CHARS {
        "..."
    } else {
        ""
    };

    format!(
        "#{} page {} ({} tokens): {}{}",
        chunk.position,
        chunk.source_page,
        count_tokens(&chunk.text),
        preview,
        ellipsis
    )
}
