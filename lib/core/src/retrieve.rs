//! Vector search plus rerank.
//!
//! Retrieves up to `K` candidates from the note index, sends them all to
//! the reranker with the query, and keeps the first `D` hits in the
//! reranker's ordering. The rerank ordering is authoritative; ties are
//! never re-broken locally.

use std::sync::Arc;

use tracing::{debug, warn};

use notex_model::{EmbeddingProvider, RerankProvider};

use crate::config::PipelineConfig;
use crate::error::StageError;
use crate::index::NoteIndex;

/// Format one hit for the retrieved-docs list.
pub fn format_doc(id: &str, content: &str) -> String {
    format!("【{}】\n{}", id, content)
}

/// Embed the query, search the index and rerank the candidates. Returns
/// formatted documents, best first, truncated to the display limit for the
/// current mode. An empty index or zero candidates yields `Ok(vec![])`.
pub async fn search_and_rerank(
    index: &Arc<NoteIndex>,
    embedder: &dyn EmbeddingProvider,
    reranker: &dyn RerankProvider,
    config: &PipelineConfig,
    query: &str,
    evaluation_mode: bool,
) -> Result<Vec<String>, StageError> {
    let query_vector = embedder.embed(query).await?;
    let candidates = index.search(&query_vector, config.vector_search_k);
    if candidates.is_empty() {
        warn!("vector search returned no candidates");
        return Ok(Vec::new());
    }
    debug!(candidates = candidates.len(), "vector search done");

    let documents: Vec<String> = candidates.iter().map(|c| c.content.clone()).collect();
    let hits = reranker
        .rerank(query, &documents, config.rerank_top_n)
        .await?;

    let display_limit = config.display_limit(evaluation_mode);
    let docs = hits
        .iter()
        .take(display_limit)
        .filter_map(|hit| candidates.get(hit.index))
        .map(|candidate| format_doc(&candidate.id, &candidate.content))
        .collect();
    Ok(docs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use notex_model::{HashEmbedding, LexicalRerank};

    use crate::index::NoteRecord;

    async fn indexed_note(embedder: &HashEmbedding, id: &str, content: &str) -> NoteRecord {
        NoteRecord {
            id: id.to_string(),
            content: content.to_string(),
            keywords: Vec::new(),
            embedding: embedder.embed(content).await.unwrap(),
        }
    }

    #[tokio::test]
    async fn test_empty_index_yields_empty_docs() {
        let index = Arc::new(NoteIndex::new());
        let embedder = HashEmbedding::new(16);
        let reranker = LexicalRerank;
        let docs = search_and_rerank(
            &index,
            &embedder,
            &reranker,
            &PipelineConfig::default(),
            "NaOH 滴定",
            false,
        )
        .await
        .unwrap();
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn test_docs_formatted_with_source_id() {
        let embedder = HashEmbedding::new(16);
        let index = Arc::new(NoteIndex::new());
        index.upsert(indexed_note(&embedder, "exp-001", "NaOH 滴定 実験").await);

        let reranker = LexicalRerank;
        let docs = search_and_rerank(
            &index,
            &embedder,
            &reranker,
            &PipelineConfig::default(),
            "NaOH 滴定",
            false,
        )
        .await
        .unwrap();
        assert_eq!(docs, vec!["【exp-001】\nNaOH 滴定 実験".to_string()]);
    }

    #[tokio::test]
    async fn test_display_limit_applied() {
        let embedder = HashEmbedding::new(16);
        let index = Arc::new(NoteIndex::new());
        for i in 0..8 {
            index.upsert(
                indexed_note(
                    &embedder,
                    &format!("exp-{:03}", i),
                    &format!("NaOH 滴定 実験 {}", i),
                )
                .await,
            );
        }

        let reranker = LexicalRerank;
        let config = PipelineConfig {
            vector_search_k: 8,
            rerank_top_n: 5,
            ui_display_top_n: 2,
        };
        let interactive =
            search_and_rerank(&index, &embedder, &reranker, &config, "NaOH 滴定", false)
                .await
                .unwrap();
        assert_eq!(interactive.len(), 2);

        let evaluation =
            search_and_rerank(&index, &embedder, &reranker, &config, "NaOH 滴定", true)
                .await
                .unwrap();
        assert_eq!(evaluation.len(), 5);
    }

    #[test]
    fn test_format_doc() {
        assert_eq!(format_doc("n1", "内容"), "【n1】\n内容");
    }
}
