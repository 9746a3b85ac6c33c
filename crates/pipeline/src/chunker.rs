//! Token-windowed chunking of source pages.

use crate::tokenizer::tokenize;
use crate::types::{Chunk, SourcePage};
use docqa_core::{AppError, AppResult};

/// A validated chunk size / overlap pair, both in tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSettings {
    chunk_size: usize,
    overlap: usize,
}

impl ChunkSettings {
    /// Overlap must be strictly less than the chunk size, or windows never advance.
    pub fn new(chunk_size: usize, overlap: usize) -> AppResult<Self> {
        if chunk_size == 0 {
            return Err(AppError::InvalidChunking(
                "chunk size must be at least 1 token".to_string(),
            ));
        }
        if overlap >= chunk_size {
            return Err(AppError::InvalidChunking(format!(
                "overlap ({}) must be less than chunk size ({})",
                overlap, chunk_size
            )));
        }

        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

/// Split text into overlapping windows of at most `chunk_size` tokens.
///
/// Windows start at token 0 and advance by `chunk_size - overlap` until the
/// last token has been covered.
pub fn split_text(text: &str, settings: ChunkSettings) -> Vec<String> {
    let tokens = tokenize(text);
    let mut windows = Vec::new();
    let mut start = 0;

    while start < tokens.len() {
        let end = (start + settings.chunk_size).min(tokens.len());
        windows.push(tokens[start..end].concat());

        if end == tokens.len() {
            break;
        }
        start += settings.step();
    }

    windows
}

/// Chunk pages into question chunks, each prefixed with its page marker.
///
/// Pages are processed `page_batch_size` at a time; batching bounds the work
/// logged per step and never changes the resulting sequence. Blank pages
/// produce no chunks.
pub fn split_pages(
    pages: &[SourcePage],
    settings: ChunkSettings,
    page_batch_size: usize,
) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut position = 0u32;

    for (batch_index, batch) in pages.chunks(page_batch_size.max(1)).enumerate() {
        let before = chunks.len();

        for page in batch {
            if page.raw_text.trim().is_empty() {
                tracing::debug!("Skipping blank page {}", page.page_number);
                continue;
            }

            let marked = format!("Page {}: {}", page.page_number, page.raw_text);
            for text in split_text(&marked, settings) {
                chunks.push(Chunk {
                    text,
                    source_page: page.page_number,
                    position,
                });
                position += 1;
            }
        }

        tracing::debug!(
            "Page batch {}: {} pages -> {} chunks",
            batch_index + 1,
            batch.len(),
            chunks.len() - before
        );
    }

    tracing::debug!(
        "Chunked {} pages into {} question chunks (size: {}, overlap: {})",
        pages.len(),
        chunks.len(),
        settings.chunk_size,
        settings.overlap
    );

    chunks
}

/// Re-split question chunks into smaller answer chunks.
///
/// Each question chunk is windowed on its own, so every answer chunk is a
/// substring of exactly one question chunk and inherits its page.
pub fn split_answer_chunks(question_chunks: &[Chunk], settings: ChunkSettings) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut position = 0u32;

    for parent in question_chunks {
        for text in split_text(&parent.text, settings) {
            chunks.push(Chunk {
                text,
                source_page: parent.source_page,
                position,
            });
            position += 1;
        }
    }

    tracing::debug!(
        "Re-split {} question chunks into {} answer chunks (size: {}, overlap: {})",
        question_chunks.len(),
        chunks.len(),
        settings.chunk_size,
        settings.overlap
    );

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::count_tokens;

    fn settings(size: usize, overlap: usize) -> ChunkSettings {
        ChunkSettings::new(size, overlap).unwrap()
    }

    fn numbered_words(n: usize) -> String {
        (0..n)
            .map(|i| format!("w{}", i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_invalid_settings() {
        assert!(matches!(
            ChunkSettings::new(10, 10),
            Err(AppError::InvalidChunking(_))
        ));
        assert!(matches!(
            ChunkSettings::new(10, 20),
            Err(AppError::InvalidChunking(_))
        ));
        assert!(matches!(
            ChunkSettings::new(0, 0),
            Err(AppError::InvalidChunking(_))
        ));
        assert!(ChunkSettings::new(10, 9).is_ok());
    }

    #[test]
    fn test_split_text_empty() {
        assert!(split_text("", settings(10, 2)).is_empty());
    }

    #[test]
    fn test_split_text_short_text_is_one_chunk() {
        let chunks = split_text("Mitochondria produce ATP.", settings(100, 10));
        assert_eq!(chunks, vec!["Mitochondria produce ATP.".to_string()]);
    }

    #[test]
    fn test_windows_respect_size_and_overlap() {
        // 50 words + 49 spaces = 99 tokens
        let text = numbered_words(50);
        let chunks = split_text(&text, settings(20, 5));

        for chunk in &chunks {
            assert!(count_tokens(chunk) <= 20);
        }

        // Windows start at 0, 15, 30, 45, 60, 75, 90; the last one reaches 99.
        assert_eq!(chunks.len(), 7);

        let first = tokenize(&chunks[0]);
        let second = tokenize(&chunks[1]);
        assert_eq!(first[15..], second[..5]);
    }

    #[test]
    fn test_non_overlapping_parts_reconstruct_text() {
        let text = numbered_words(37);
        let s = settings(12, 4);
        let chunks = split_text(&text, s);

        let mut rebuilt: Vec<&str> = tokenize(&chunks[0]);
        for chunk in &chunks[1..] {
            rebuilt.extend(tokenize(chunk).into_iter().skip(s.overlap()));
        }
        assert_eq!(rebuilt.concat(), text);
    }

    #[test]
    fn test_split_pages_prefixes_and_tags() {
        let pages = vec![
            SourcePage::new(1, "Photosynthesis converts light into energy."),
            SourcePage::new(2, "   "),
            SourcePage::new(3, "Mitochondria produce ATP."),
        ];
        let chunks = split_pages(&pages, settings(10000, 200), 10);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "Page 1: Photosynthesis converts light into energy.");
        assert_eq!(chunks[0].source_page, 1);
        assert_eq!(chunks[1].text, "Page 3: Mitochondria produce ATP.");
        assert_eq!(chunks[1].source_page, 3);
        assert_eq!(chunks[1].position, 1);
    }

    #[test]
    fn test_page_batching_does_not_change_output() {
        let pages: Vec<SourcePage> = (1..=23)
            .map(|n| SourcePage::new(n, numbered_words(n as usize * 3)))
            .collect();

        let unbatched = split_pages(&pages, settings(16, 4), pages.len());
        for batch_size in [1, 3, 10] {
            assert_eq!(split_pages(&pages, settings(16, 4), batch_size), unbatched);
        }
    }

    #[test]
    fn test_answer_chunks_are_substrings_with_parent_page() {
        let pages = vec![
            SourcePage::new(1, numbered_words(60)),
            SourcePage::new(2, numbered_words(45)),
        ];
        let question_chunks = split_pages(&pages, settings(50, 10), 10);
        let answer_chunks = split_answer_chunks(&question_chunks, settings(12, 3));

        assert!(answer_chunks.len() > question_chunks.len());
        for chunk in &answer_chunks {
            assert!(question_chunks
                .iter()
                .any(|q| q.source_page == chunk.source_page && q.text.contains(&chunk.text)));
        }
        let positions: Vec<u32> = answer_chunks.iter().map(|c| c.position).collect();
        assert_eq!(positions, (0..answer_chunks.len() as u32).collect::<Vec<_>>());
    }
}
