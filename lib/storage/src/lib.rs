//! # notex Storage
//!
//! File-backed persistence and ingestion:
//!
//! - [`DictionaryFile`] - YAML dictionary with backup-then-atomic-write saves
//! - [`IndexFile`] - binary snapshot of the note index
//! - [`ingest_notes`] - incremental markdown ingestion into the index
//! - [`StorageManager`] - loads both stores at startup and keeps in-memory
//!   state and disk in step

pub mod dictionary_file;
pub mod error;
pub mod index_file;
pub mod ingest;
pub mod manager;

pub use dictionary_file::DictionaryFile;
pub use error::{Result, StorageError};
pub use index_file::IndexFile;
pub use ingest::{ingest_notes, IngestReport};
pub use manager::StorageManager;
