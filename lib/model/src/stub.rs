//! Deterministic providers for tests and keyless local runs.
//!
//! No network, no randomness: the same input always produces the same
//! output, so pipeline behavior can be asserted exactly.

use std::collections::{HashSet, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::provider::{CompletionProvider, EmbeddingProvider, RerankHit, RerankProvider};

/// Hash-based embedding: character trigrams hashed into a fixed-dimension
/// bucket vector, L2-normalized. Similar surface forms land in overlapping
/// buckets, which is enough signal for tests and offline runs.
pub struct HashEmbedding {
    dim: usize,
}

impl HashEmbedding {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(8) }
    }
}

impl Default for HashEmbedding {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut vector = vec![0.0f32; self.dim];
        let normalized = text.to_lowercase();

        let padded = format!("  {}  ", normalized);
        let chars: Vec<char> = padded.chars().collect();
        for window in chars.windows(3) {
            let trigram: String = window.iter().collect();
            let mut hasher = DefaultHasher::new();
            trigram.hash(&mut hasher);
            let pos = (hasher.finish() as usize) % self.dim;
            vector[pos] += 1.0;
        }

        for word in normalized.split_whitespace() {
            let mut hasher = DefaultHasher::new();
            word.hash(&mut hasher);
            let pos = (hasher.finish() as usize) % self.dim;
            vector[pos] += 2.0;
        }

        let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for v in &mut vector {
                *v /= magnitude;
            }
        }

        Ok(vector)
    }
}

/// Completion provider fed from a fixed queue of responses. Once the queue
/// is drained every call fails, which doubles as the failure-path fixture.
pub struct ScriptedCompletion {
    responses: Mutex<VecDeque<String>>,
}

impl ScriptedCompletion {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }

    /// A provider whose every call fails.
    pub fn failing() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl CompletionProvider for ScriptedCompletion {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        self.responses
            .lock()
            .pop_front()
            .ok_or_else(|| Error::Unavailable("scripted completion exhausted".to_string()))
    }
}

/// Token-overlap reranker: scores each document by Jaccard overlap with the
/// query tokens. Ties keep submission order, giving a stable full ordering.
pub struct LexicalRerank;

fn tokens(text: &str) -> HashSet<String> {
    text.split_whitespace().map(|t| t.to_lowercase()).collect()
}

#[async_trait]
impl RerankProvider for LexicalRerank {
    async fn rerank(&self, query: &str, documents: &[String], top_n: usize) -> Result<Vec<RerankHit>> {
        let query_tokens = tokens(query);

        let mut hits: Vec<RerankHit> = documents
            .iter()
            .enumerate()
            .map(|(index, doc)| {
                let doc_tokens = tokens(doc);
                let union = query_tokens.union(&doc_tokens).count();
                let score = if union == 0 {
                    0.0
                } else {
                    query_tokens.intersection(&doc_tokens).count() as f32 / union as f32
                };
                RerankHit { index, score }
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(top_n);
        Ok(hits)
    }
}

/// Reranker whose every call fails, for exercising degradation paths.
pub struct FailingRerank;

#[async_trait]
impl RerankProvider for FailingRerank {
    async fn rerank(&self, _query: &str, _documents: &[String], _top_n: usize) -> Result<Vec<RerankHit>> {
        Err(Error::Unavailable("rerank unavailable".to_string()))
    }
}
