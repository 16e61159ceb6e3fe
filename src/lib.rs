//! # notex
//!
//! Semantic search over lab experiment notes.
//!
//! A search request runs through a fixed pipeline: the materials list is
//! normalized against a terminology dictionary, an LLM expands the input
//! into complementary search queries, vector search and a reranker select
//! the closest notes, and (outside evaluation mode) an LLM synthesizes a
//! comparison of the hits.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! cargo install notex
//! notex --data-dir ./data --http-port 8642
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use notex::prelude::*;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let storage = Arc::new(StorageManager::new("./data")?);
//!
//! let pipeline = SearchPipeline::new(
//!     storage.dictionary(),
//!     storage.index(),
//!     Arc::new(HashEmbedding::default()),
//!     Arc::new(ScriptedCompletion::failing()),
//!     Arc::new(LexicalRerank),
//!     PipelineConfig::default(),
//! );
//!
//! let request = SearchRequest {
//!     kind: RequestKind::InitialSearch,
//!     purpose: "中和滴定の再現".to_string(),
//!     materials: "①NaOH: 5g".to_string(),
//!     methods: "滴定".to_string(),
//!     instruction: None,
//! };
//! let outcome = pipeline.run(&request, false).await?;
//! println!("{:?}", outcome.retrieved_docs);
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Structure
//!
//! - `notex-similarity` - edit-distance and cosine similarity primitives
//! - `notex-model` - embedding/completion/rerank provider traits, HTTP and
//!   stub implementations
//! - `notex-dict` - terminology dictionary, pattern generation, variant
//!   classification
//! - `notex-core` - the retrieval pipeline state machine and stages
//! - `notex-storage` - dictionary/index persistence and note ingestion
//! - `notex-api` - REST endpoints

// Re-export core types
pub use notex_core::{
    normalize_materials, NoteIndex, NoteRecord, PipelineConfig, PipelineError, PipelineOutcome,
    PipelineState, PromptSet, RequestKind, Result, ScoredNote, SearchPipeline, SearchRequest,
    Stage, StageError, DEFAULT_FOCUS_INSTRUCTION,
};

// Re-export the dictionary engine
pub use notex_dict::{
    detect_variants, generate_patterns, DictEntry, DictError, Dictionary, VariantCandidate,
    VariantDecision, Verdict,
};

// Re-export model providers
pub use notex_model::{
    CompletionProvider, EmbeddingProvider, HashEmbedding, HttpCompletion, HttpEmbeddings,
    HttpReranker, LexicalRerank, RerankHit, RerankProvider, ScriptedCompletion,
};

// Re-export storage
pub use notex_storage::{IngestReport, StorageManager};

// Re-export API
pub use notex_api::{AppState, RestApi};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        detect_variants, generate_patterns, normalize_materials, AppState, CompletionProvider,
        DictEntry, DictError, Dictionary, EmbeddingProvider, HashEmbedding, HttpCompletion,
        HttpEmbeddings, HttpReranker, IngestReport, LexicalRerank, NoteIndex, NoteRecord,
        PipelineConfig, PipelineError, PipelineOutcome, PromptSet, RequestKind, RerankProvider,
        RestApi, Result, ScriptedCompletion, SearchPipeline, SearchRequest, StageError,
        StorageManager, DEFAULT_FOCUS_INSTRUCTION,
    };
}
