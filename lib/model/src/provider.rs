//! Provider traits for text-to-vector, text-to-text and rerank capabilities.
//!
//! All implementations must be thread-safe (`Send + Sync`) so a single
//! provider instance can be shared across concurrent pipeline requests.

use async_trait::async_trait;

use crate::error::Result;

/// One reranked candidate: the index into the submitted document slice and
/// the relevance score assigned by the reranker. Hits arrive in the
/// reranker's own ordering; callers must not re-sort them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RerankHit {
    pub index: usize,
    pub score: f32,
}

/// Text-to-vector embedding capability.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for a batch of texts, in input order.
    ///
    /// The default implementation loops over [`embed`](Self::embed);
    /// HTTP providers override it with a single batched request.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

/// Prompt-in, text-out completion capability.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Second-pass relevance scoring of a candidate set against a query.
#[async_trait]
pub trait RerankProvider: Send + Sync {
    /// Score `documents` against `query` and return up to `top_n` hits in
    /// the reranker's relevance order.
    async fn rerank(&self, query: &str, documents: &[String], top_n: usize) -> Result<Vec<RerankHit>>;
}
