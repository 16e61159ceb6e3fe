//! Tolerant handling of model-authored text.
//!
//! Chat models frequently wrap JSON answers in markdown code fences even
//! when told not to. Callers strip fences before parsing and treat any
//! remaining parse failure as a signal to fall back, never as a crash.

/// Strip a surrounding markdown code fence (with optional `json` tag) from a
/// model response. Returns the trimmed inner content; input without a fence
/// is returned trimmed.
pub fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}
