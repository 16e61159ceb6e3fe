//! Pipeline orchestrator.
//!
//! Drives the stage state machine over a fresh [`PipelineState`] per
//! request. Recoverable stage errors (external calls, malformed model
//! output) are logged and replaced with the stage's deterministic default;
//! only storage errors abort the run.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, warn};

use notex_dict::Dictionary;
use notex_model::{CompletionProvider, EmbeddingProvider, RerankProvider};

use crate::compare::{synthesize_comparison, NO_RESULTS_MESSAGE};
use crate::config::PipelineConfig;
use crate::error::{Result, StageError};
use crate::expand::{fallback_query, generate_query};
use crate::index::NoteIndex;
use crate::normalize::normalize_materials;
use crate::prompts::PromptSet;
use crate::request::SearchRequest;
use crate::retrieve::search_and_rerank;
use crate::state::{PipelineState, Stage};

/// Result of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub retrieved_docs: Vec<String>,
    pub normalized_materials: String,
    pub search_query: String,
    /// Absent under evaluation mode.
    pub comparison: Option<String>,
    pub iterations: u32,
}

/// The search pipeline: dictionary-backed normalization, LLM query
/// expansion, vector search with rerank, and optional comparison synthesis.
///
/// One instance is shared across concurrent requests; per-request state
/// lives in a fresh [`PipelineState`].
pub struct SearchPipeline {
    dictionary: Arc<RwLock<Dictionary>>,
    index: Arc<NoteIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn CompletionProvider>,
    reranker: Arc<dyn RerankProvider>,
    config: PipelineConfig,
    prompts: PromptSet,
}

impl SearchPipeline {
    pub fn new(
        dictionary: Arc<RwLock<Dictionary>>,
        index: Arc<NoteIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn CompletionProvider>,
        reranker: Arc<dyn RerankProvider>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            dictionary,
            index,
            embedder,
            llm,
            reranker,
            config,
            prompts: PromptSet::default(),
        }
    }

    /// Replace the default prompt templates.
    pub fn with_prompts(mut self, prompts: PromptSet) -> Self {
        self.prompts = prompts;
        self
    }

    /// Run the full pipeline for one request.
    pub async fn run(&self, request: &SearchRequest, evaluation_mode: bool) -> Result<PipelineOutcome> {
        let mut state = PipelineState::new(request, evaluation_mode);
        let mut stage = Stage::Normalize;

        while stage != Stage::Terminal {
            if let Err(err) = self.run_stage(stage, &mut state).await {
                if err.is_fatal() {
                    return Err(err.into());
                }
                warn!(stage = ?stage, error = %err, "stage degraded to default");
                self.apply_default(stage, &mut state);
            }
            stage = stage.next(evaluation_mode);
        }

        info!(
            iterations = state.iteration,
            docs = state.retrieved_docs.len(),
            evaluation_mode,
            "pipeline finished"
        );
        Ok(PipelineOutcome {
            retrieved_docs: state.retrieved_docs,
            normalized_materials: state.normalized_materials,
            search_query: state.search_query,
            comparison: state.comparison,
            iterations: state.iteration,
        })
    }

    async fn run_stage(&self, stage: Stage, state: &mut PipelineState) -> std::result::Result<(), StageError> {
        match stage {
            Stage::Normalize => {
                let dictionary = self.dictionary.read();
                state.normalized_materials =
                    normalize_materials(&dictionary, &state.input_materials);
                debug!(normalized = %state.normalized_materials, "materials normalized");
                Ok(())
            }
            Stage::GenerateQuery => {
                let prompt = self.prompts.query_generation_prompt(state);
                state.search_query = generate_query(self.llm.as_ref(), &prompt).await?;
                debug!(query = %state.search_query, "combined query generated");
                Ok(())
            }
            Stage::Search => {
                state.iteration += 1;
                state.retrieved_docs = search_and_rerank(
                    &self.index,
                    self.embedder.as_ref(),
                    self.reranker.as_ref(),
                    &self.config,
                    &state.search_query,
                    state.evaluation_mode,
                )
                .await?;
                Ok(())
            }
            Stage::Compare => {
                state.comparison =
                    Some(synthesize_comparison(self.llm.as_ref(), &self.prompts, state).await?);
                Ok(())
            }
            Stage::Terminal => Ok(()),
        }
    }

    /// Deterministic per-stage defaults used when a recoverable error hit.
    fn apply_default(&self, stage: Stage, state: &mut PipelineState) {
        match stage {
            Stage::Normalize => {
                state.normalized_materials = state.input_materials.clone();
            }
            Stage::GenerateQuery => {
                state.search_query = fallback_query(
                    &state.input_purpose,
                    &state.normalized_materials,
                    &state.focus_instruction,
                );
            }
            Stage::Search => {
                state.retrieved_docs = Vec::new();
            }
            Stage::Compare => {
                state.comparison = Some(NO_RESULTS_MESSAGE.to_string());
            }
            Stage::Terminal => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notex_model::{FailingRerank, HashEmbedding, LexicalRerank, ScriptedCompletion};

    use crate::index::NoteRecord;
    use crate::request::RequestKind;

    fn request() -> SearchRequest {
        SearchRequest {
            kind: RequestKind::InitialSearch,
            purpose: "中和滴定の再現".to_string(),
            materials: "①NaOH: 5g\n②エタノール: 10ml".to_string(),
            methods: "滴定する".to_string(),
            instruction: None,
        }
    }

    fn dictionary() -> Arc<RwLock<Dictionary>> {
        let mut dict = Dictionary::new();
        dict.add_entry("水酸化ナトリウム", vec!["NaOH".to_string()], None, None)
            .unwrap();
        dict.add_entry("エタノール", vec![], None, None).unwrap();
        Arc::new(RwLock::new(dict))
    }

    async fn populated_index(embedder: &HashEmbedding) -> Arc<NoteIndex> {
        let index = NoteIndex::new();
        for (id, content) in [
            ("exp-001", "水酸化ナトリウム 滴定 中和"),
            ("exp-002", "エタノール 抽出"),
            ("exp-003", "培地 調整"),
        ] {
            index.upsert(NoteRecord {
                id: id.to_string(),
                content: content.to_string(),
                keywords: Vec::new(),
                embedding: embedder.embed(content).await.unwrap(),
            });
        }
        Arc::new(index)
    }

    fn pipeline(
        index: Arc<NoteIndex>,
        embedder: HashEmbedding,
        llm: ScriptedCompletion,
    ) -> SearchPipeline {
        SearchPipeline::new(
            dictionary(),
            index,
            Arc::new(embedder),
            Arc::new(llm),
            Arc::new(LexicalRerank),
            PipelineConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_full_run_normal_mode() {
        let embedder = HashEmbedding::new(64);
        let index = populated_index(&embedder).await;
        let llm = ScriptedCompletion::new(vec![
            r#"{"queries": ["水酸化ナトリウム 滴定", "中和 実験"]}"#.to_string(),
            "比較: exp-001が最も近い。".to_string(),
        ]);

        let outcome = pipeline(index, embedder, llm)
            .run(&request(), false)
            .await
            .unwrap();

        assert_eq!(
            outcome.normalized_materials,
            "- 水酸化ナトリウム: 5g\n- エタノール: 10ml"
        );
        assert_eq!(outcome.search_query, "水酸化ナトリウム 滴定 中和 実験");
        assert!(!outcome.retrieved_docs.is_empty());
        assert!(outcome.retrieved_docs.len() <= 3);
        assert_eq!(outcome.comparison.as_deref(), Some("比較: exp-001が最も近い。"));
        assert_eq!(outcome.iterations, 1);
    }

    #[tokio::test]
    async fn test_evaluation_mode_skips_compare() {
        let embedder = HashEmbedding::new(64);
        let index = populated_index(&embedder).await;
        // One response only: evaluation mode must not consume a second.
        let llm =
            ScriptedCompletion::new(vec![r#"{"queries": ["滴定 中和"]}"#.to_string()]);

        let outcome = pipeline(index, embedder, llm)
            .run(&request(), true)
            .await
            .unwrap();

        assert!(outcome.comparison.is_none());
        assert!(outcome.retrieved_docs.len() <= 10);
    }

    #[tokio::test]
    async fn test_non_json_expansion_falls_back() {
        let embedder = HashEmbedding::new(64);
        let index = populated_index(&embedder).await;
        let llm = ScriptedCompletion::new(vec![
            "クエリを生成できませんでした。".to_string(),
            "比較結果。".to_string(),
        ]);

        let outcome = pipeline(index, embedder, llm)
            .run(&request(), false)
            .await
            .unwrap();

        let expected = format!(
            "{} {} {}",
            "中和滴定の再現",
            "- 水酸化ナトリウム: 5g\n- エタノール: 10ml",
            crate::request::DEFAULT_FOCUS_INSTRUCTION
        );
        assert_eq!(outcome.search_query, expected);
        assert!(!outcome.retrieved_docs.is_empty());
    }

    #[tokio::test]
    async fn test_empty_index_yields_no_results_message() {
        let embedder = HashEmbedding::new(64);
        let index = Arc::new(NoteIndex::new());
        let llm = ScriptedCompletion::new(vec![
            r#"{"queries": ["滴定"]}"#.to_string(),
            "unused".to_string(),
        ]);

        let outcome = pipeline(index, embedder, llm)
            .run(&request(), false)
            .await
            .unwrap();

        assert!(outcome.retrieved_docs.is_empty());
        assert_eq!(outcome.comparison.as_deref(), Some(NO_RESULTS_MESSAGE));
    }

    #[tokio::test]
    async fn test_rerank_failure_degrades_to_no_results() {
        let embedder = HashEmbedding::new(64);
        let index = populated_index(&embedder).await;
        let llm = ScriptedCompletion::new(vec![r#"{"queries": ["滴定 中和"]}"#.to_string()]);

        let pipeline = SearchPipeline::new(
            dictionary(),
            index,
            Arc::new(embedder),
            Arc::new(llm),
            Arc::new(FailingRerank),
            PipelineConfig::default(),
        );
        let outcome = pipeline.run(&request(), false).await.unwrap();

        // The Search stage degraded to an empty result set; Compare then
        // emits the fixed message without another model call.
        assert!(outcome.retrieved_docs.is_empty());
        assert_eq!(outcome.comparison.as_deref(), Some(NO_RESULTS_MESSAGE));
        assert_eq!(outcome.iterations, 1);
    }

    #[tokio::test]
    async fn test_all_llm_calls_failing_still_completes() {
        let embedder = HashEmbedding::new(64);
        let index = populated_index(&embedder).await;
        let llm = ScriptedCompletion::failing();

        let outcome = pipeline(index, embedder, llm)
            .run(&request(), false)
            .await
            .unwrap();

        // Expansion degraded to the fallback query, search still ran, and
        // the failed comparison degraded to the fixed message.
        assert!(outcome.search_query.contains("中和滴定の再現"));
        assert!(!outcome.retrieved_docs.is_empty());
        assert_eq!(outcome.comparison.as_deref(), Some(NO_RESULTS_MESSAGE));
    }
}
