//! The in-memory dictionary: an ordered sequence of entries with CRUD,
//! fuzzy lookup and exact normalization.
//!
//! Insertion order is preserved so exports are stable. Persistence lives in
//! `notex-storage`; this type never touches the filesystem.

use serde::{Deserialize, Serialize};
use tracing::debug;

use notex_similarity::edit_ratio;

use crate::entry::DictEntry;
use crate::error::{DictError, Result};

/// A fuzzy match returned by [`Dictionary::find_similar_terms`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarTerm {
    /// The matched term (a canonical or a variant).
    pub term: String,
    /// Edit-distance similarity to the query term.
    pub similarity: f32,
    /// Canonical of the entry the match belongs to.
    pub canonical: String,
}

/// A reviewed classifier decision to apply to the dictionary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantDecision {
    pub term: String,
    pub decision: DecisionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionKind {
    /// The term is a spelling variant of an existing canonical.
    Variant,
    /// The term is a new substance and becomes its own entry.
    New,
}

/// Outcome of a batch mutation (`apply_variant_updates`, imports).
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplyReport {
    pub added: usize,
    pub updated: usize,
    pub errors: Vec<String>,
}

/// Ordered collection of dictionary entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dictionary {
    entries: Vec<DictEntry>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from pre-existing entries, e.g. a loaded file. Order is kept.
    pub fn from_entries(entries: Vec<DictEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[DictEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every canonical and every variant, in dictionary order.
    pub fn all_terms(&self) -> Vec<String> {
        let mut terms = Vec::new();
        for entry in &self.entries {
            terms.push(entry.canonical.clone());
            terms.extend(entry.variants.iter().cloned());
        }
        terms
    }

    pub fn find_by_canonical(&self, canonical: &str) -> Option<&DictEntry> {
        self.entries.iter().find(|e| e.canonical == canonical)
    }

    fn find_by_canonical_mut(&mut self, canonical: &str) -> Option<&mut DictEntry> {
        self.entries.iter_mut().find(|e| e.canonical == canonical)
    }

    /// Find the entry owning `term`, whether as canonical or variant.
    pub fn find_by_term(&self, term: &str) -> Option<&DictEntry> {
        self.entries.iter().find(|e| e.matches(term))
    }

    /// Exact normalization: canonical/variant match returns the canonical,
    /// anything else passes through unchanged. Case-sensitive by contract,
    /// which makes normalization idempotent.
    pub fn normalize_term<'a>(&'a self, term: &'a str) -> &'a str {
        match self.find_by_term(term) {
            Some(entry) => &entry.canonical,
            None => term,
        }
    }

    /// Append a new entry. Fails without mutating when the canonical exists
    /// or a variant already belongs to another entry.
    pub fn add_entry(
        &mut self,
        canonical: &str,
        variants: Vec<String>,
        category: Option<String>,
        note: Option<String>,
    ) -> Result<()> {
        if self.find_by_canonical(canonical).is_some() {
            return Err(DictError::DuplicateCanonical(canonical.to_string()));
        }

        for variant in &variants {
            if variant == canonical {
                continue; // dropped by DictEntry::new
            }
            if let Some(owner) = self.find_by_term(variant) {
                return Err(DictError::VariantConflict {
                    variant: variant.clone(),
                    canonical: owner.canonical.clone(),
                });
            }
        }

        self.entries.push(DictEntry::new(canonical, variants, category, note));
        Ok(())
    }

    /// Update an existing entry; `None` fields are left unchanged.
    pub fn update_entry(
        &mut self,
        canonical: &str,
        variants: Option<Vec<String>>,
        category: Option<String>,
        note: Option<String>,
    ) -> Result<()> {
        if let Some(new_variants) = &variants {
            for variant in new_variants {
                if let Some(owner) = self.find_by_term(variant) {
                    if owner.canonical != canonical && variant != canonical {
                        return Err(DictError::VariantConflict {
                            variant: variant.clone(),
                            canonical: owner.canonical.clone(),
                        });
                    }
                }
            }
        }

        let entry = self
            .find_by_canonical_mut(canonical)
            .ok_or_else(|| DictError::EntryNotFound(canonical.to_string()))?;

        if let Some(new_variants) = variants {
            let canonical_owned = entry.canonical.clone();
            let mut cleaned = Vec::with_capacity(new_variants.len());
            for v in new_variants {
                if v != canonical_owned && !v.is_empty() && !cleaned.contains(&v) {
                    cleaned.push(v);
                }
            }
            entry.variants = cleaned;
        }
        if category.is_some() {
            entry.category = category;
        }
        if note.is_some() {
            entry.note = note;
        }
        entry.touch();
        Ok(())
    }

    /// Attach a variant to an existing canonical. Returns `false` (without
    /// touching the entry) when the variant is already present there.
    pub fn add_variant(&mut self, canonical: &str, variant: &str) -> Result<bool> {
        if let Some(owner) = self.find_by_term(variant) {
            if owner.canonical == canonical {
                return Ok(false);
            }
            return Err(DictError::VariantConflict {
                variant: variant.to_string(),
                canonical: owner.canonical.clone(),
            });
        }

        let entry = self
            .find_by_canonical_mut(canonical)
            .ok_or_else(|| DictError::EntryNotFound(canonical.to_string()))?;

        entry.variants.push(variant.to_string());
        entry.touch();
        Ok(true)
    }

    pub fn delete_entry(&mut self, canonical: &str) -> Result<DictEntry> {
        let pos = self
            .entries
            .iter()
            .position(|e| e.canonical == canonical)
            .ok_or_else(|| DictError::EntryNotFound(canonical.to_string()))?;
        Ok(self.entries.remove(pos))
    }

    /// Case-insensitive substring search over canonicals, variants and
    /// categories.
    pub fn search(&self, query: &str) -> Vec<&DictEntry> {
        let query = query.to_lowercase();
        self.entries
            .iter()
            .filter(|e| {
                e.canonical.to_lowercase().contains(&query)
                    || e.variants.iter().any(|v| v.to_lowercase().contains(&query))
                    || e.category
                        .as_deref()
                        .is_some_and(|c| c.to_lowercase().contains(&query))
            })
            .collect()
    }

    /// Fuzzy lookup: edit-distance similarity of `term` against every
    /// canonical and variant. Results at or above `threshold`, sorted
    /// descending, ties kept in encounter order, truncated to `top_k`.
    pub fn find_similar_terms(&self, term: &str, threshold: f32, top_k: usize) -> Vec<SimilarTerm> {
        let mut results = Vec::new();

        for entry in &self.entries {
            let sim = edit_ratio(term, &entry.canonical);
            if sim >= threshold {
                results.push(SimilarTerm {
                    term: entry.canonical.clone(),
                    similarity: sim,
                    canonical: entry.canonical.clone(),
                });
            }

            for variant in &entry.variants {
                let sim = edit_ratio(term, variant);
                if sim >= threshold {
                    results.push(SimilarTerm {
                        term: variant.clone(),
                        similarity: sim,
                        canonical: entry.canonical.clone(),
                    });
                }
            }
        }

        results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(top_k);
        results
    }

    /// Apply reviewed classifier decisions. Per-decision failures are
    /// collected, never aborting the batch.
    pub fn apply_variant_updates(&mut self, decisions: &[VariantDecision]) -> ApplyReport {
        let mut report = ApplyReport::default();

        for decision in decisions {
            match decision.decision {
                DecisionKind::Variant => {
                    let Some(canonical) = decision.canonical.as_deref() else {
                        report
                            .errors
                            .push(format!("{}: no canonical given for variant decision", decision.term));
                        continue;
                    };

                    if self.find_by_canonical(canonical).is_some() {
                        match self.add_variant(canonical, &decision.term) {
                            Ok(true) => report.updated += 1,
                            Ok(false) => {}
                            Err(e) => report.errors.push(format!("{}: {}", decision.term, e)),
                        }
                    } else {
                        // Canonical unseen so far: create the entry with the
                        // term attached as its first variant.
                        let variants = if decision.term != canonical {
                            vec![decision.term.clone()]
                        } else {
                            Vec::new()
                        };
                        match self.add_entry(
                            canonical,
                            variants,
                            decision.category.clone(),
                            decision.note.clone(),
                        ) {
                            Ok(()) => report.added += 1,
                            Err(e) => report.errors.push(format!("{}: {}", decision.term, e)),
                        }
                    }
                }
                DecisionKind::New => {
                    if self.find_by_canonical(&decision.term).is_none() {
                        match self.add_entry(
                            &decision.term,
                            Vec::new(),
                            decision.category.clone(),
                            decision.note.clone(),
                        ) {
                            Ok(()) => report.added += 1,
                            Err(e) => report.errors.push(format!("{}: {}", decision.term, e)),
                        }
                    }
                }
            }
        }

        report
    }

    /// Register extracted term patterns that the dictionary has never seen,
    /// each as its own canonical entry. Returns the newly added patterns.
    pub fn register_patterns(&mut self, patterns: &[String]) -> Vec<String> {
        let known: std::collections::HashSet<String> = self.all_terms().into_iter().collect();
        let mut added = Vec::new();

        for pattern in patterns {
            if pattern.is_empty() || known.contains(pattern) || added.contains(pattern) {
                continue;
            }
            if self
                .add_entry(pattern, Vec::new(), None, Some("自動生成".to_string()))
                .is_ok()
            {
                added.push(pattern.clone());
            }
        }

        if !added.is_empty() {
            debug!(count = added.len(), "registered new term patterns");
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dictionary {
        let mut dict = Dictionary::new();
        dict.add_entry(
            "水酸化ナトリウム",
            vec!["NaOH".to_string(), "苛性ソーダ".to_string()],
            Some("試薬".to_string()),
            None,
        )
        .unwrap();
        dict.add_entry("エタノール", vec!["EtOH".to_string()], Some("溶媒".to_string()), None)
            .unwrap();
        dict
    }

    #[test]
    fn test_normalize_term_maps_variant_to_canonical() {
        let dict = sample();
        assert_eq!(dict.normalize_term("NaOH"), "水酸化ナトリウム");
        assert_eq!(dict.normalize_term("エタノール"), "エタノール");
        assert_eq!(dict.normalize_term("unknown"), "unknown");
    }

    #[test]
    fn test_normalize_term_is_idempotent() {
        let dict = sample();
        let once = dict.normalize_term("NaOH");
        assert_eq!(dict.normalize_term(once), once);
    }

    #[test]
    fn test_add_entry_rejects_duplicate_without_mutation() {
        let mut dict = sample();
        let before = dict.len();
        let result = dict.add_entry("エタノール", vec!["spirit".to_string()], None, None);
        assert!(matches!(result, Err(DictError::DuplicateCanonical(_))));
        assert_eq!(dict.len(), before);
        assert!(!dict.all_terms().contains(&"spirit".to_string()));
    }

    #[test]
    fn test_add_entry_rejects_variant_owned_elsewhere() {
        let mut dict = sample();
        let result = dict.add_entry("sodium hydroxide", vec!["NaOH".to_string()], None, None);
        assert!(matches!(result, Err(DictError::VariantConflict { .. })));
    }

    #[test]
    fn test_add_variant_noop_when_present() {
        let mut dict = sample();
        assert!(!dict.add_variant("水酸化ナトリウム", "NaOH").unwrap());
        assert!(dict.add_variant("水酸化ナトリウム", "カセイソーダ").unwrap());
        assert!(dict
            .find_by_canonical("水酸化ナトリウム")
            .unwrap()
            .variants
            .contains(&"カセイソーダ".to_string()));
    }

    #[test]
    fn test_add_variant_unknown_canonical() {
        let mut dict = sample();
        assert!(matches!(
            dict.add_variant("メタノール", "MeOH"),
            Err(DictError::EntryNotFound(_))
        ));
    }

    #[test]
    fn test_delete_entry() {
        let mut dict = sample();
        dict.delete_entry("エタノール").unwrap();
        assert!(dict.find_by_canonical("エタノール").is_none());
        assert!(matches!(
            dict.delete_entry("エタノール"),
            Err(DictError::EntryNotFound(_))
        ));
    }

    #[test]
    fn test_update_entry_partial() {
        let mut dict = sample();
        dict.update_entry("エタノール", None, Some("アルコール".to_string()), None)
            .unwrap();
        let entry = dict.find_by_canonical("エタノール").unwrap();
        assert_eq!(entry.category.as_deref(), Some("アルコール"));
        assert_eq!(entry.variants, vec!["EtOH".to_string()]); // untouched
    }

    #[test]
    fn test_find_similar_terms_threshold_and_order() {
        let dict = sample();
        let results = dict.find_similar_terms("エタノル", 0.5, 5);
        assert!(!results.is_empty());
        assert!(results.iter().all(|r| r.similarity >= 0.5));
        for pair in results.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
        assert_eq!(results[0].term, "エタノール");
        assert_eq!(results[0].canonical, "エタノール");
    }

    #[test]
    fn test_find_similar_terms_top_k() {
        let dict = sample();
        let results = dict.find_similar_terms("エタノール", 0.0, 2);
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_search_matches_variant_and_category() {
        let dict = sample();
        assert_eq!(dict.search("naoh").len(), 1);
        assert_eq!(dict.search("溶媒").len(), 1);
        assert_eq!(dict.search("zzz").len(), 0);
    }

    #[test]
    fn test_apply_variant_updates() {
        let mut dict = sample();
        let decisions = vec![
            VariantDecision {
                term: "カセイソーダ".to_string(),
                decision: DecisionKind::Variant,
                canonical: Some("水酸化ナトリウム".to_string()),
                category: None,
                note: None,
            },
            VariantDecision {
                term: "メタノール".to_string(),
                decision: DecisionKind::New,
                canonical: None,
                category: None,
                note: None,
            },
            VariantDecision {
                term: "orphan".to_string(),
                decision: DecisionKind::Variant,
                canonical: None,
                category: None,
                note: None,
            },
        ];

        let report = dict.apply_variant_updates(&decisions);
        assert_eq!(report.updated, 1);
        assert_eq!(report.added, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(dict.find_by_canonical("メタノール").is_some());
    }

    #[test]
    fn test_register_patterns_skips_known_terms() {
        let mut dict = sample();
        let patterns = vec![
            "NaOH".to_string(),        // known variant
            "硫酸".to_string(),        // new
            "硫酸".to_string(),        // duplicate in batch
        ];
        let added = dict.register_patterns(&patterns);
        assert_eq!(added, vec!["硫酸".to_string()]);
        assert_eq!(
            dict.find_by_canonical("硫酸").unwrap().note.as_deref(),
            Some("自動生成")
        );
    }
}
