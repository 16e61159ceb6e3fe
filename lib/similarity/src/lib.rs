//! # notex Similarity
//!
//! Similarity primitives shared by the dictionary and the retrieval pipeline.
//!
//! This crate is a leaf: it has no dependencies and provides three functions:
//!
//! - [`edit_ratio`] - normalized edit-distance similarity between two strings
//! - [`cosine_similarity`] - cosine similarity between two embedding vectors
//! - [`combined_score`] - arithmetic mean of a lexical and a semantic score
//!
//! All scores are in `[0.0, 1.0]` where `1.0` means identical.
//!
//! ## Example
//!
//! ```rust
//! use notex_similarity::{edit_ratio, cosine_similarity, combined_score};
//!
//! let lexical = edit_ratio("エタノール", "エタノル");
//! assert!(lexical >= 0.8);
//!
//! let semantic = cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]);
//! assert_eq!(semantic, 1.0);
//!
//! let score = combined_score(lexical, semantic);
//! assert!(score >= 0.9);
//! ```

pub mod cosine;
pub mod edit;

pub use cosine::cosine_similarity;
pub use edit::edit_ratio;

/// Combined similarity: arithmetic mean of a lexical (edit-distance) score
/// and a semantic (embedding cosine) score.
pub fn combined_score(edit: f32, embedding: f32) -> f32 {
    (edit + embedding) / 2.0
}
