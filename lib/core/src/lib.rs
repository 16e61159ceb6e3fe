//! # notex Core
//!
//! The retrieval pipeline for experiment-note search.
//!
//! A request flows through a fixed state machine:
//!
//! ```text
//! Normalize ──> GenerateQuery ──> Search ──┬─> Compare ──> Terminal
//!                                          └─> Terminal   (evaluation mode)
//! ```
//!
//! - **Normalize** rewrites the materials list into canonical terminology
//!   using the dictionary
//! - **GenerateQuery** asks the LLM for complementary sub-queries and merges
//!   them into one combined query
//! - **Search** embeds the query, runs vector search over the note index and
//!   reranks the candidates
//! - **Compare** synthesizes a natural-language comparison of the hits
//!   (skipped under evaluation mode, which returns the full rerank list for
//!   offline scoring)
//!
//! Every stage degrades to a deterministic default on external-call or
//! parse failure; only dictionary/storage I/O aborts a request.

pub mod compare;
pub mod config;
pub mod error;
pub mod expand;
pub mod index;
pub mod normalize;
pub mod pipeline;
pub mod prompts;
pub mod request;
pub mod retrieve;
pub mod state;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result, StageError};
pub use index::{NoteIndex, NoteRecord, ScoredNote};
pub use normalize::normalize_materials;
pub use pipeline::{PipelineOutcome, SearchPipeline};
pub use prompts::PromptSet;
pub use request::{RequestKind, SearchRequest, DEFAULT_FOCUS_INSTRUCTION};
pub use state::{PipelineState, Stage};
