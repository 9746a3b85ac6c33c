//! Retrieval index over answer chunks.

use crate::embeddings::EmbeddingProvider;
use crate::normalize::Normalizer;
use crate::progress::ProgressReporter;
use crate::types::Chunk;
use docqa_core::{AppError, AppResult};

/// A chunk returned by a similarity search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub chunk: Chunk,
    pub score: f32,
}

/// Trait for vector index backends.
pub trait VectorIndex: Send + Sync {
    /// Add a chunk with its embedding.
    fn insert(&mut self, chunk: Chunk, embedding: Vec<f32>) -> AppResult<()>;

    /// Search for the top-k most similar chunks to the query embedding.
    ///
    /// Returns hits ordered by descending similarity; equal scores keep
    /// insertion order, so the top-k list is a prefix of the top-(k+1) list.
    fn search(&self, query_embedding: &[f32], top_k: usize) -> AppResult<Vec<SearchHit>>;

    /// Number of indexed chunks.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Width of the stored vectors.
    fn dimensions(&self) -> usize;
}

struct Entry {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// In-memory index with exact cosine scoring.
pub struct FlatIndex {
    dimensions: usize,
    entries: Vec<Entry>,
}

impl FlatIndex {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            entries: Vec::new(),
        }
    }
}

impl VectorIndex for FlatIndex {
    fn insert(&mut self, chunk: Chunk, embedding: Vec<f32>) -> AppResult<()> {
        if embedding.len() != self.dimensions {
            return Err(AppError::Embedding(format!(
                "Dimension mismatch: index expects {}, got {}",
                self.dimensions,
                embedding.len()
            )));
        }
        self.entries.push(Entry { chunk, embedding });
        Ok(())
    }

    fn search(&self, query_embedding: &[f32], top_k: usize) -> AppResult<Vec<SearchHit>> {
        if query_embedding.len() != self.dimensions {
            return Err(AppError::Embedding(format!(
                "Dimension mismatch: index expects {}, query has {}",
                self.dimensions,
                query_embedding.len()
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(query_embedding, &entry.embedding)))
            .collect();

        // Stable sort keeps insertion order among equal scores
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(i, score)| SearchHit {
                chunk: self.entries[i].chunk.clone(),
                score,
            })
            .collect())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}

/// Embed answer chunks and build a [`FlatIndex`] over them.
///
/// Chunks are embedded on their normalized text, `batch_size` at a time.
/// Chunks that normalize to nothing are left out. Any embedding failure
/// aborts the build.
pub async fn build_index(
    chunks: &[Chunk],
    embedder: &dyn EmbeddingProvider,
    normalizer: &Normalizer,
    batch_size: usize,
    progress: &ProgressReporter,
) -> AppResult<FlatIndex> {
    let prepared: Vec<(&Chunk, String)> = chunks
        .iter()
        .map(|chunk| (chunk, normalizer.normalize(&chunk.text)))
        .filter(|(_, text)| !text.is_empty())
        .collect();

    if prepared.is_empty() {
        return Err(AppError::EmptyIndex);
    }

    tracing::info!(
        "Indexing {} answer chunks using provider '{}' (model: {})",
        prepared.len(),
        embedder.provider_name(),
        embedder.model_name()
    );

    let mut index = FlatIndex::new(embedder.dimensions());
    let total = prepared.len() as u64;

    for batch in prepared.chunks(batch_size.max(1)) {
        let texts: Vec<String> = batch.iter().map(|(_, text)| text.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;

        if embeddings.len() != batch.len() {
            return Err(AppError::Embedding(format!(
                "Provider returned {} embeddings for {} chunks",
                embeddings.len(),
                batch.len()
            )));
        }

        for ((chunk, _), embedding) in batch.iter().zip(embeddings) {
            index.insert((*chunk).clone(), embedding)?;
        }

        progress.index(index.len() as u64, Some(total), embedder.model_name());
    }

    tracing::debug!(
        "Built index with {} chunks of dimension {}",
        index.len(),
        index.dimensions()
    );

    Ok(index)
}
