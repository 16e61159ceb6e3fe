//! # notex Dictionary
//!
//! The terminology normalization engine: a dictionary of canonical terms and
//! their spelling/notation variants, plus the machinery that keeps it clean.
//!
//! - [`Dictionary`] - ordered collection of [`DictEntry`] with CRUD, fuzzy
//!   search and exact normalization
//! - import/export in JSON and CSV (round-tripping), YAML for persistence
//! - [`generate_patterns`] - candidate substrings derived from a raw term
//! - [`detect_variants`] - fuzzy duplicate detection combining edit distance
//!   and embedding similarity, with an LLM verdict per candidate pair
//!
//! The dictionary itself is a pure in-memory structure; file handling lives
//! in `notex-storage`.

pub mod classifier;
pub mod codec;
pub mod entry;
pub mod error;
pub mod patterns;
pub mod store;

pub use classifier::{detect_variants, VariantCandidate, Verdict};
pub use codec::ImportReport;
pub use entry::DictEntry;
pub use error::{DictError, Result};
pub use patterns::generate_patterns;
pub use store::{ApplyReport, DecisionKind, Dictionary, SimilarTerm, VariantDecision};
