//! Fuzzy duplicate detection and variant classification.
//!
//! Pairs candidate terms by length bucket, scores each pair with the
//! combined (edit + embedding) similarity, and defers the final
//! variant-or-different decision to an LLM judge. A failed judge call is
//! always treated as "different": the classifier never merges terms on the
//! strength of a failed classification.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use notex_model::{strip_code_fences, CompletionProvider, EmbeddingProvider};
use notex_similarity::{combined_score, cosine_similarity, edit_ratio};

/// Maximum char-length difference between paired terms. Notation drift
/// (dropped long-vowel marks, swapped letters) stays within this band.
const LENGTH_WINDOW: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Variant,
    Different,
}

/// A scored and judged candidate pair. Persisting the verdict is a separate
/// explicit step (`Dictionary::apply_variant_updates`).
#[derive(Debug, Clone, Serialize)]
pub struct VariantCandidate {
    pub term1: String,
    pub term2: String,
    pub edit_similarity: f32,
    pub embedding_similarity: f32,
    pub combined_similarity: f32,
    pub verdict: Verdict,
    pub recommended_canonical: Option<String>,
}

#[derive(Deserialize)]
struct JudgeResponse {
    decision: Option<String>,
    #[serde(default, alias = "suggested_canonical")]
    recommended_canonical: Option<String>,
}

fn judge_prompt(term1: &str, term2: &str, similarity: f32) -> String {
    format!(
        "あなたは化学・生物学分野の専門家です。\n\
         以下の2つの用語が、同一の化学物質の表記揺れなのか、それとも異なる物質なのかを判定してください。\n\n\
         用語1: {term1}\n\
         用語2: {term2}\n\
         文字列類似度: {similarity:.2}\n\n\
         判定基準:\n\
         1. 化学式の表記違い（例: NaOH と 水酸化ナトリウム）→ 表記揺れ\n\
         2. 同義語・別名（例: エタノール と エチルアルコール）→ 表記揺れ\n\
         3. 明らかに異なる物質 → 異なる物質\n\n\
         出力形式（JSON）:\n\
         {{\n\
           \"decision\": \"variant\" または \"different\",\n\
           \"recommended_canonical\": \"表記揺れの場合、正規化名として推奨する方\"\n\
         }}"
    )
}

/// Ask the judge for a verdict on one pair. Any failure (call error,
/// non-JSON output, missing decision) conservatively yields `Different`.
async fn judge_pair(
    judge: &dyn CompletionProvider,
    term1: &str,
    term2: &str,
    similarity: f32,
) -> (Verdict, Option<String>) {
    let prompt = judge_prompt(term1, term2, similarity);

    let response = match judge.complete(&prompt).await {
        Ok(response) => response,
        Err(e) => {
            warn!(term1, term2, error = %e, "variant judge call failed, keeping terms separate");
            return (Verdict::Different, None);
        }
    };

    match serde_json::from_str::<JudgeResponse>(strip_code_fences(&response)) {
        Ok(parsed) => {
            let verdict = match parsed.decision.as_deref() {
                Some("variant") => Verdict::Variant,
                _ => Verdict::Different,
            };
            (verdict, parsed.recommended_canonical)
        }
        Err(e) => {
            warn!(term1, term2, error = %e, "unparseable judge response, keeping terms separate");
            (Verdict::Different, None)
        }
    }
}

/// Detect likely spelling variants among `terms`.
///
/// Terms are bucketed by char length and only compared within ±2 chars,
/// which prunes the O(n²) pair space while keeping typical notation drift.
/// Pairs whose combined similarity reaches `threshold` are judged by the
/// LLM. Results are sorted by descending combined similarity.
pub async fn detect_variants(
    terms: &[String],
    threshold: f32,
    embedder: &dyn EmbeddingProvider,
    judge: &dyn CompletionProvider,
) -> Vec<VariantCandidate> {
    // Dedup while preserving first-seen order.
    let mut unique: Vec<&String> = Vec::new();
    for term in terms {
        if !term.is_empty() && !unique.contains(&term) {
            unique.push(term);
        }
    }
    if unique.len() < 2 {
        return Vec::new();
    }

    // Embed every unique term once. On failure the semantic half of the
    // score degrades to 0.0 for all pairs.
    let owned: Vec<String> = unique.iter().map(|t| t.to_string()).collect();
    let embeddings: Option<Vec<Vec<f32>>> = match embedder.embed_batch(&owned).await {
        Ok(vectors) => Some(vectors),
        Err(e) => {
            warn!(error = %e, "term embedding failed, falling back to lexical similarity only");
            None
        }
    };

    let lengths: Vec<usize> = unique.iter().map(|t| t.chars().count()).collect();
    let mut candidates = Vec::new();

    for i in 0..unique.len() {
        for j in (i + 1)..unique.len() {
            if lengths[i].abs_diff(lengths[j]) > LENGTH_WINDOW {
                continue;
            }

            let edit = edit_ratio(unique[i], unique[j]);
            let embedding = match &embeddings {
                Some(vectors) => cosine_similarity(&vectors[i], &vectors[j]),
                None => 0.0,
            };
            let combined = combined_score(edit, embedding);

            if combined >= threshold {
                candidates.push((i, j, edit, embedding, combined));
            }
        }
    }

    debug!(pairs = candidates.len(), "variant candidate pairs above threshold");

    let mut results = Vec::with_capacity(candidates.len());
    for (i, j, edit, embedding, combined) in candidates {
        let (verdict, recommended_canonical) = judge_pair(judge, unique[i], unique[j], combined).await;
        results.push(VariantCandidate {
            term1: unique[i].clone(),
            term2: unique[j].clone(),
            edit_similarity: edit,
            embedding_similarity: embedding,
            combined_similarity: combined,
            verdict,
            recommended_canonical,
        });
    }

    results.sort_by(|a, b| {
        b.combined_similarity
            .partial_cmp(&a.combined_similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results
}
