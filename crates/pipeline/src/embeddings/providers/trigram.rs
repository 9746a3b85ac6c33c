//! Offline embedding provider built from hashed character trigrams.

use crate::embeddings::provider::EmbeddingProvider;
use docqa_core::AppResult;
use std::collections::BTreeMap;

/// Words too common to tell chunks apart, including question words.
const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them", "what", "how", "why", "does", "do", "into",
];

/// Deterministic bag-of-trigrams embedder.
///
/// Each content word adds weight to the buckets of its character trigrams
/// and to one bucket for the whole word. The vector is unit-normalized, so
/// cosine similarity reduces to a dot product. No network or model needed.
#[derive(Debug)]
pub struct TrigramProvider {
    dimensions: usize,
}

fn bucket(bytes: impl Iterator<Item = u8>, multiplier: u64, dimensions: usize) -> usize {
    let hash = bytes.fold(0u64, |acc, b| acc.wrapping_mul(multiplier).wrapping_add(b as u64));
    (hash % dimensions as u64) as usize
}

impl TrigramProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        let lower = text.to_lowercase();

        // Ordered map keeps float accumulation order stable across runs
        let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
        for word in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(w))
        {
            *counts.entry(word).or_insert(0) += 1;
        }

        for (word, count) in counts {
            let weight = count as f32;
            let chars: Vec<char> = word.chars().collect();

            for trigram in chars.windows(3) {
                let text: String = trigram.iter().collect();
                vector[bucket(text.bytes(), 37, self.dimensions)] += weight.sqrt();
            }
            vector[bucket(word.bytes(), 31, self.dimensions)] += weight;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }

        vector
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| self.embed_text(text))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[tokio::test]
    async fn test_vectors_are_unit_length() {
        let provider = TrigramProvider::new(384);
        let embeddings = provider
            .embed_batch(&[
                "Chlorophyll absorbs sunlight".to_string(),
                "Mitochondria produce ATP".to_string(),
            ])
            .await
            .unwrap();

        assert_eq!(embeddings.len(), 2);
        for embedding in &embeddings {
            assert_eq!(embedding.len(), 384);
            assert!((dot(embedding, embedding) - 1.0).abs() < 0.001);
        }
    }

    #[tokio::test]
    async fn test_same_text_same_vector() {
        let provider = TrigramProvider::new(128);
        let first = provider.embed("cellular respiration").await.unwrap();
        let second = provider.embed("cellular respiration").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_punctuation_does_not_split_vocabulary() {
        let provider = TrigramProvider::new(384);
        let question = provider.embed("What produces ATP?").await.unwrap();
        let related = provider.embed("Page 2: Mitochondria produce ATP.").await.unwrap();
        let unrelated = provider
            .embed("Page 1: Photosynthesis converts light into energy.")
            .await
            .unwrap();

        assert!(dot(&question, &related) > dot(&question, &unrelated));
    }

    #[tokio::test]
    async fn test_stop_words_only_gives_zero_vector() {
        let provider = TrigramProvider::new(64);
        let embedding = provider.embed("what is it, and how?").await.unwrap();
        assert!(embedding.iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn test_non_ascii_text() {
        let provider = TrigramProvider::new(384);
        let embedding = provider
            .embed("A fotossíntese converte luz em energia química 🌿")
            .await
            .unwrap();
        assert!((dot(&embedding, &embedding) - 1.0).abs() < 0.001);
    }
}
