//! Materials-list normalization.
//!
//! Rewrites a free-text materials block line by line: list markers are
//! stripped, the term before the first colon is replaced by its canonical
//! form from the dictionary, and the line is recomposed in a fixed shape.
//! Already-normalized input maps to itself, so the operation is idempotent.

use notex_dict::Dictionary;

/// Normalize a raw materials block.
///
/// Each non-empty line is split on the first `:` or `：` into name and
/// amount; the name (list markers removed) is looked up in the dictionary
/// and replaced by its canonical form when known. Lines with an amount
/// become `- <name>: <amount>`, lines without stay bare. An empty block is
/// passed through unchanged.
pub fn normalize_materials(dictionary: &Dictionary, raw: &str) -> String {
    let mut normalized_lines = Vec::new();

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match split_on_colon(line) {
            Some((name_part, amount)) => {
                let name = strip_list_marker(name_part);
                let canonical = dictionary.normalize_term(name);
                normalized_lines.push(format!("- {}: {}", canonical, amount.trim()));
            }
            None => {
                let name = strip_list_marker(line);
                normalized_lines.push(dictionary.normalize_term(name).to_string());
            }
        }
    }

    if normalized_lines.is_empty() {
        raw.to_string()
    } else {
        normalized_lines.join("\n")
    }
}

/// Split on the first ASCII or full-width colon.
fn split_on_colon(line: &str) -> Option<(&str, &str)> {
    let ascii = line.find(':');
    let wide = line.find('：');
    let pos = match (ascii, wide) {
        (Some(a), Some(w)) => a.min(w),
        (Some(a), None) => a,
        (None, Some(w)) => w,
        (None, None) => return None,
    };
    let colon_len = if line[pos..].starts_with('：') { '：'.len_utf8() } else { 1 };
    Some((&line[..pos], &line[pos + colon_len..]))
}

/// Strip leading list markers: bullets, circled digits, decimal indices.
fn strip_list_marker(text: &str) -> &str {
    let text = text.trim_start_matches(|c: char| {
        c == '-' || c == '・' || c == '*' || c.is_whitespace()
    });
    let text = text.trim_start_matches(|c: char| {
        ('①'..='⑨').contains(&c) || c.is_ascii_digit() || c == '.'
    });
    text.trim()
}
