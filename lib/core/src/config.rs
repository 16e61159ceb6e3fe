use serde::{Deserialize, Serialize};

/// Search breadth and display limits for the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Candidates retrieved by vector search before reranking.
    pub vector_search_k: usize,
    /// Candidates kept by the reranker; also the display count under
    /// evaluation mode.
    pub rerank_top_n: usize,
    /// Display count for the interactive path.
    pub ui_display_top_n: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            vector_search_k: 20,
            rerank_top_n: 10,
            ui_display_top_n: 3,
        }
    }
}

impl PipelineConfig {
    /// Number of reranked hits surfaced to the caller for this mode.
    pub fn display_limit(&self, evaluation_mode: bool) -> usize {
        if evaluation_mode {
            self.rerank_top_n
        } else {
            self.ui_display_top_n
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_limit_per_mode() {
        let config = PipelineConfig::default();
        assert_eq!(config.display_limit(true), 10);
        assert_eq!(config.display_limit(false), 3);
    }
}
