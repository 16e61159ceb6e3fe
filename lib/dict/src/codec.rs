//! Import/export for the dictionary: JSON and CSV for interchange, YAML for
//! the persisted file format.
//!
//! Contract: exporting then importing an unmodified dictionary yields an
//! equivalent dictionary. Canonical order is preserved; variant order within
//! an entry is not significant. CSV imports collect per-row errors instead
//! of aborting on the first bad row.

use serde::Serialize;
use tracing::warn;

use crate::entry::DictEntry;
use crate::error::{DictError, Result};
use crate::store::Dictionary;

/// Separator for the `variants` column in CSV. Not expected inside a term.
const VARIANT_SEPARATOR: char = '|';

/// Outcome of an import: counts plus per-row errors.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub added: usize,
    pub updated: usize,
    pub errors: Vec<String>,
}

impl Dictionary {
    // ==================== YAML (persisted format) ====================

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self.entries()).map_err(|e| DictError::Serialization(e.to_string()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let entries: Vec<DictEntry> =
            serde_yaml::from_str(content).map_err(|e| DictError::Serialization(e.to_string()))?;
        Ok(Self::from_entries(entries))
    }

    // ==================== JSON ====================

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self.entries()).map_err(|e| DictError::Serialization(e.to_string()))
    }

    /// Merge JSON entries into this dictionary: existing canonicals are
    /// updated, new ones appended. A document that is not a JSON array of
    /// objects fails as a whole; individual bad items become row errors.
    pub fn import_json(&mut self, data: &str) -> Result<ImportReport> {
        let items: Vec<serde_json::Value> =
            serde_json::from_str(data).map_err(|e| DictError::Import(e.to_string()))?;

        let mut report = ImportReport::default();

        for (i, item) in items.into_iter().enumerate() {
            let entry: DictEntry = match serde_json::from_value(item) {
                Ok(entry) => entry,
                Err(e) => {
                    report.errors.push(format!("item {}: {}", i + 1, e));
                    continue;
                }
            };
            if entry.canonical.is_empty() {
                report.errors.push(format!("item {}: missing canonical", i + 1));
                continue;
            }
            self.merge_entry(entry, &mut report);
        }

        Ok(report)
    }

    // ==================== CSV ====================

    /// CSV with header `canonical,variants,category,note`; variants joined
    /// with `|`.
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(["canonical", "variants", "category", "note"])
            .map_err(|e| DictError::Serialization(e.to_string()))?;

        for entry in self.entries() {
            let variants = entry
                .variants
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(&VARIANT_SEPARATOR.to_string());
            writer
                .write_record([
                    entry.canonical.as_str(),
                    variants.as_str(),
                    entry.category.as_deref().unwrap_or(""),
                    entry.note.as_deref().unwrap_or(""),
                ])
                .map_err(|e| DictError::Serialization(e.to_string()))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| DictError::Serialization(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| DictError::Serialization(e.to_string()))
    }

    /// Merge CSV rows into this dictionary. Malformed rows are collected as
    /// per-row errors; the rest of the file is still imported.
    pub fn import_csv(&mut self, content: &str) -> Result<ImportReport> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut report = ImportReport::default();

        for (i, row) in reader.records().enumerate() {
            let record = match row {
                Ok(record) => record,
                Err(e) => {
                    report.errors.push(format!("row {}: {}", i + 1, e));
                    continue;
                }
            };

            let canonical = record.get(0).unwrap_or("").trim();
            if canonical.is_empty() {
                report.errors.push(format!("row {}: missing canonical", i + 1));
                continue;
            }

            let variants: Vec<String> = record
                .get(1)
                .unwrap_or("")
                .split(VARIANT_SEPARATOR)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
                .collect();

            let category = record.get(2).map(str::trim).filter(|s| !s.is_empty()).map(String::from);
            let note = record.get(3).map(str::trim).filter(|s| !s.is_empty()).map(String::from);

            self.merge_entry(DictEntry::new(canonical, variants, category, note), &mut report);
        }

        Ok(report)
    }

    /// Update-or-append used by both importers.
    fn merge_entry(&mut self, entry: DictEntry, report: &mut ImportReport) {
        if self.find_by_canonical(&entry.canonical).is_some() {
            match self.update_entry(&entry.canonical, Some(entry.variants), entry.category, entry.note) {
                Ok(()) => report.updated += 1,
                Err(e) => {
                    warn!(canonical = %entry.canonical, error = %e, "import: update failed");
                    report.errors.push(format!("{}: {}", entry.canonical, e));
                }
            }
        } else {
            match self.add_entry(&entry.canonical, entry.variants, entry.category, entry.note) {
                Ok(()) => report.added += 1,
                Err(e) => {
                    warn!(canonical = %entry.canonical, error = %e, "import: add failed");
                    report.errors.push(format!("{}: {}", entry.canonical, e));
                }
            }
        }
    }
}
