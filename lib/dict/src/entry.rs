use chrono::Utc;
use serde::{Deserialize, Serialize};

/// One canonical term with its known spelling/notation variants.
///
/// Invariants, maintained by [`Dictionary`](crate::Dictionary):
/// - `canonical` is unique across the dictionary
/// - `canonical` never appears in its own `variants`
/// - no variant is shared with another entry's canonical or variant set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictEntry {
    pub canonical: String,

    #[serde(default)]
    pub variants: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl DictEntry {
    /// Create an entry with fresh timestamps. Variants equal to the
    /// canonical and duplicate variants are dropped.
    pub fn new(
        canonical: impl Into<String>,
        variants: Vec<String>,
        category: Option<String>,
        note: Option<String>,
    ) -> Self {
        let canonical = canonical.into();
        let now = Utc::now().to_rfc3339();

        let mut cleaned: Vec<String> = Vec::with_capacity(variants.len());
        for variant in variants {
            if variant != canonical && !variant.is_empty() && !cleaned.contains(&variant) {
                cleaned.push(variant);
            }
        }

        Self {
            canonical,
            variants: cleaned,
            category,
            note,
            created_at: Some(now.clone()),
            updated_at: Some(now),
        }
    }

    /// True when `term` matches the canonical or any variant exactly.
    pub fn matches(&self, term: &str) -> bool {
        self.canonical == term || self.variants.iter().any(|v| v == term)
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Some(Utc::now().to_rfc3339());
    }
}
