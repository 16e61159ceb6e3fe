//! Incremental markdown ingestion.
//!
//! Scans a folder of `*.md` experiment notes, skips ids already present in
//! the index, extracts and canonicalizes material keywords, and embeds new
//! notes in fixed-size batches. A failed batch is logged and skipped, never
//! retried; re-running ingestion picks up whatever was missed because
//! already-indexed ids are excluded by identity.

use std::path::Path;

use tracing::{info, warn};

use notex_core::{NoteIndex, NoteRecord};
use notex_dict::Dictionary;
use notex_model::EmbeddingProvider;

use crate::error::Result;

/// Embedding batch size, sized for typical provider token limits.
const BATCH_SIZE: usize = 50;

/// Section headings recognized as the materials block.
const MATERIALS_HEADINGS: [&str; 4] = ["## 材料", "## Materials", "## 試薬", "## Reagents"];

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub added: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
    /// Dictionary terms registered from the new notes' materials.
    pub new_terms: Vec<String>,
}

struct ParsedNote {
    id: String,
    content: String,
    raw_terms: Vec<String>,
    keywords: Vec<String>,
}

/// Ingest every new `*.md` note under `source_dir` into the index.
///
/// Returns the report plus the deduplicated raw material names of the notes
/// that were actually indexed, for dictionary pattern registration.
pub async fn ingest_notes(
    source_dir: &Path,
    dictionary: &Dictionary,
    index: &NoteIndex,
    embedder: &dyn EmbeddingProvider,
) -> Result<(IngestReport, Vec<String>)> {
    let mut report = IngestReport::default();
    let mut material_terms: Vec<String> = Vec::new();
    let mut pending = Vec::new();

    let mut paths: Vec<_> = std::fs::read_dir(source_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("md"))
        .collect();
    paths.sort();

    for path in paths {
        let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if index.contains(id) {
            report.skipped.push(id.to_string());
            continue;
        }

        let content = std::fs::read_to_string(&path)?;
        let raw_terms = material_names(&content);
        let keywords = extract_keywords(dictionary, &raw_terms);
        pending.push(ParsedNote {
            id: id.to_string(),
            content,
            raw_terms,
            keywords,
        });
    }

    info!(
        new = pending.len(),
        skipped = report.skipped.len(),
        "ingestion scan done"
    );

    for batch in pending.chunks(BATCH_SIZE) {
        let texts: Vec<String> = batch.iter().map(|note| note.content.clone()).collect();
        let embeddings = match embedder.embed_batch(&texts).await {
            Ok(embeddings) => embeddings,
            Err(err) => {
                warn!(batch_size = batch.len(), error = %err, "embedding batch failed, skipping");
                report.failed.extend(batch.iter().map(|note| note.id.clone()));
                continue;
            }
        };

        for (note, embedding) in batch.iter().zip(embeddings) {
            index.upsert(NoteRecord {
                id: note.id.clone(),
                content: note.content.clone(),
                keywords: note.keywords.clone(),
                embedding,
            });
            report.added.push(note.id.clone());
            for term in &note.raw_terms {
                if !material_terms.contains(term) {
                    material_terms.push(term.clone());
                }
            }
        }
    }

    info!(added = report.added.len(), failed = report.failed.len(), "ingestion done");
    Ok((report, material_terms))
}

/// Raw material names from the note's materials section, pre-normalization.
fn material_names(content: &str) -> Vec<String> {
    let Some(section) = materials_section(content) else {
        return Vec::new();
    };

    let mut names = Vec::new();
    for line in section.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let line = line.trim_start_matches(|c: char| {
            c == '-' || c == '・' || c == '*' || c.is_whitespace()
        });
        let name = line
            .split(|c| c == ':' || c == '：')
            .next()
            .unwrap_or(line)
            .trim();
        if name.is_empty() {
            continue;
        }
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Canonicalize the raw material names through the dictionary.
fn extract_keywords(dictionary: &Dictionary, raw_terms: &[String]) -> Vec<String> {
    let mut keywords = Vec::new();
    for name in raw_terms {
        let canonical = dictionary.normalize_term(name).to_string();
        if !keywords.contains(&canonical) {
            keywords.push(canonical);
        }
    }
    keywords
}

/// The text between a recognized materials heading and the next heading.
fn materials_section(content: &str) -> Option<String> {
    let mut lines = content.lines();
    lines.find(|line| {
        let line = line.trim();
        MATERIALS_HEADINGS.iter().any(|h| line.starts_with(h))
    })?;

    let mut section = Vec::new();
    for line in lines {
        if line.trim_start().starts_with("##") {
            break;
        }
        section.push(line);
    }
    Some(section.join("\n"))
}
