//! Pipeline invocation payload.

use serde::{Deserialize, Serialize};

/// Default ranking hint applied on an initial search: prioritize notes whose
/// materials and methods read like the input.
pub const DEFAULT_FOCUS_INSTRUCTION: &str = "使用されている材料(化学物質、容量）と、方法（化学物質、容量、手順）の記述が類似している実験ノートを最優先して検索してください。";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    InitialSearch,
    Refinement,
}

/// A search request as submitted by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(rename = "type")]
    pub kind: RequestKind,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub materials: String,
    #[serde(default)]
    pub methods: String,
    /// Ranking hint; required in spirit for refinements, where it overrides
    /// the default instruction.
    #[serde(default)]
    pub instruction: Option<String>,
}

impl SearchRequest {
    /// The focus instruction for this request. Initial searches always use
    /// the fixed default; refinements use the caller's instruction and fall
    /// back to the default when it is absent or blank.
    pub fn focus_instruction(&self) -> &str {
        match self.kind {
            RequestKind::InitialSearch => DEFAULT_FOCUS_INSTRUCTION,
            RequestKind::Refinement => match self.instruction.as_deref() {
                Some(instruction) if !instruction.trim().is_empty() => instruction,
                _ => DEFAULT_FOCUS_INSTRUCTION,
            },
        }
    }
}
