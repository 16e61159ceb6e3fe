//! # notex Model
//!
//! Capability interfaces for the external models the pipeline depends on:
//!
//! - [`EmbeddingProvider`] - `embed(text) -> vector`
//! - [`CompletionProvider`] - `complete(prompt) -> text`
//! - [`RerankProvider`] - `rerank(query, docs) -> ordered scores`
//!
//! The pipeline and the dictionary classifier only ever see these traits.
//! Production wiring uses the HTTP providers in [`http`] (OpenAI-compatible
//! embeddings/chat, Cohere-compatible rerank); tests use the deterministic
//! providers in [`stub`].

pub mod error;
pub mod http;
pub mod parse;
pub mod provider;
pub mod stub;

pub use error::{Error, Result};
pub use parse::strip_code_fences;
pub use http::{HttpCompletion, HttpEmbeddings, HttpReranker};
pub use provider::{CompletionProvider, EmbeddingProvider, RerankHit, RerankProvider};
pub use stub::{FailingRerank, HashEmbedding, LexicalRerank, ScriptedCompletion};
