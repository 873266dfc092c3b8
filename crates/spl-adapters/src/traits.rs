//! Provider traits at the external seams.

use async_trait::async_trait;

use crate::AdapterResult;

/// Embedding vector type
pub type Embedding = Vec<f32>;

/// Generative text service: `complete(prompt, temperature, max_tokens)`.
///
/// Implementations must honor a low-temperature, near-deterministic mode;
/// the enhancer and generator rely on it.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> AdapterResult<String>;
}

/// Embedding service: fixed-dimension text vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embedding for text
    async fn embed(&self, text: &str) -> AdapterResult<Embedding>;

    /// Generate embeddings for multiple texts (batch)
    async fn embed_batch(&self, texts: &[&str]) -> AdapterResult<Vec<Embedding>>;

    /// Get embedding dimension
    fn dimension(&self) -> usize;
}

/// Pairwise relevance scorer used for reranking. Scores the
/// (query, candidate) pair directly rather than via vector geometry.
#[async_trait]
pub trait RerankProvider: Send + Sync {
    /// Score a batch of query-document pairs.
    /// Returns scores in the same order as documents.
    async fn score_pairs(&self, query: &str, documents: &[&str]) -> AdapterResult<Vec<f32>>;
}

/// Cosine similarity between two vectors, 0.0 when either is degenerate.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a > 0.0 && norm_b > 0.0 {
        dot / (norm_a * norm_b)
    } else {
        0.0
    }
}
