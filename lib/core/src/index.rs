//! In-memory note index with linear cosine search.
//!
//! Holds one embedding per note. The corpus is small enough (hundreds to a
//! few thousand notes) that an exhaustive scan beats maintaining an
//! approximate index, and the scan gives exact, deterministic ordering.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use notex_similarity::cosine_similarity;

/// One indexed note: full content plus normalized search keywords and the
/// embedding they were folded into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteRecord {
    pub id: String,
    pub content: String,
    /// Canonicalized material terms, kept for inspection/debugging.
    pub keywords: Vec<String>,
    pub embedding: Vec<f32>,
}

/// A search hit. The score is the raw cosine similarity for this query;
/// it orders candidates within one search and is not comparable across
/// queries.
#[derive(Debug, Clone)]
pub struct ScoredNote {
    pub id: String,
    pub content: String,
    pub score: f32,
}

/// Thread-safe container of note records.
#[derive(Debug, Default)]
pub struct NoteIndex {
    records: RwLock<Vec<NoteRecord>>,
}

impl NoteIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<NoteRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Insert or replace by note id.
    pub fn upsert(&self, record: NoteRecord) {
        let mut records = self.records.write();
        if let Some(existing) = records.iter_mut().find(|r| r.id == record.id) {
            *existing = record;
        } else {
            records.push(record);
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.read().iter().any(|r| r.id == id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.records.read().iter().map(|r| r.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Snapshot of all records, for persistence.
    pub fn records(&self) -> Vec<NoteRecord> {
        self.records.read().clone()
    }

    /// Exhaustive cosine search: up to `k` hits, descending similarity,
    /// insertion order on ties.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<ScoredNote> {
        let records = self.records.read();

        let mut scored: Vec<ScoredNote> = records
            .iter()
            .map(|record| ScoredNote {
                id: record.id.clone(),
                content: record.content.clone(),
                score: cosine_similarity(query, &record.embedding),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, embedding: Vec<f32>) -> NoteRecord {
        NoteRecord {
            id: id.to_string(),
            content: format!("note {}", id),
            keywords: Vec::new(),
            embedding,
        }
    }

    #[test]
    fn test_upsert_replaces_by_id() {
        let index = NoteIndex::new();
        index.upsert(record("n1", vec![1.0, 0.0]));
        index.upsert(record("n1", vec![0.0, 1.0]));
        assert_eq!(index.len(), 1);
        assert_eq!(index.records()[0].embedding, vec![0.0, 1.0]);
    }

    #[test]
    fn test_search_orders_by_similarity() {
        let index = NoteIndex::new();
        index.upsert(record("far", vec![0.0, 1.0]));
        index.upsert(record("near", vec![1.0, 0.1]));
        index.upsert(record("exact", vec![1.0, 0.0]));

        let hits = index.search(&[1.0, 0.0], 3);
        assert_eq!(hits[0].id, "exact");
        assert_eq!(hits[1].id, "near");
        assert_eq!(hits[2].id, "far");
    }

    #[test]
    fn test_search_truncates_to_k() {
        let index = NoteIndex::new();
        for i in 0..10 {
            index.upsert(record(&format!("n{}", i), vec![1.0, i as f32]));
        }
        assert_eq!(index.search(&[1.0, 0.0], 4).len(), 4);
    }

    #[test]
    fn test_search_empty_index() {
        let index = NoteIndex::new();
        assert!(index.search(&[1.0, 0.0], 5).is_empty());
    }

    #[test]
    fn test_contains() {
        let index = NoteIndex::new();
        index.upsert(record("n1", vec![1.0]));
        assert!(index.contains("n1"));
        assert!(!index.contains("n2"));
    }
}
