//! Candidate pattern generation for extracted terms.
//!
//! A raw extracted term like `NaOH水溶液` hides several matchable units:
//! the chemical formula, the Japanese suffix, and the whole string. The
//! generator derives those units so variant pre-matching can hit on any of
//! them. Longer patterns sort first; downstream consumers prefer the most
//! specific match.

use std::collections::HashSet;

/// Domain suffixes that commonly terminate compound terms.
const DOMAIN_SUFFIXES: [&str; 8] = ["酸", "塩", "抗体", "試薬", "溶媒", "溶液", "エステル", "化合物"];

/// Derive candidate substrings/patterns from a raw term.
///
/// Always contains the full term. Splits at ASCII-alphanumeric/other
/// boundaries and emits each part plus each adjacent-pair concatenation;
/// for known domain suffixes, the prefix up to and the prefix before the
/// suffix's last occurrence. Fragments shorter than 2 chars are discarded.
/// Output is deduplicated and sorted by descending char length.
pub fn generate_patterns(term: &str) -> Vec<String> {
    let term = term.trim();
    if term.is_empty() {
        return Vec::new();
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut patterns: Vec<String> = Vec::new();

    let mut push = |candidate: &str, patterns: &mut Vec<String>, seen: &mut HashSet<String>| {
        if candidate.chars().count() >= 2 && seen.insert(candidate.to_string()) {
            patterns.push(candidate.to_string());
        }
    };

    // The full term is always a pattern, even below the fragment minimum.
    if seen.insert(term.to_string()) {
        patterns.push(term.to_string());
    }

    let parts = split_segments(term);
    for part in &parts {
        push(part, &mut patterns, &mut seen);
    }
    for pair in parts.windows(2) {
        let joined = format!("{}{}", pair[0], pair[1]);
        push(&joined, &mut patterns, &mut seen);
    }

    for suffix in DOMAIN_SUFFIXES {
        if let Some(pos) = term.rfind(suffix) {
            let head = &term[..pos + suffix.len()];
            push(head, &mut patterns, &mut seen);
            let before = &term[..pos];
            push(before, &mut patterns, &mut seen);
        }
    }

    patterns.sort_by_key(|p| std::cmp::Reverse(p.chars().count()));
    patterns
}

/// Split a term into runs of ASCII-alphanumeric and other characters.
/// `NaOH水溶液` -> `["NaOH", "水溶液"]`, `abc123` -> `["abc123"]`.
fn split_segments(term: &str) -> Vec<String> {
    #[derive(PartialEq, Clone, Copy)]
    enum Class {
        Alnum,
        Other,
    }

    let classify = |c: char| {
        if c.is_ascii_alphanumeric() {
            Class::Alnum
        } else {
            Class::Other
        }
    };

    let mut segments = Vec::new();
    let mut current = String::new();
    let mut current_class = None;

    for c in term.chars() {
        let class = classify(c);
        match current_class {
            Some(prev) if prev == class => current.push(c),
            Some(_) => {
                segments.push(std::mem::take(&mut current));
                current.push(c);
                current_class = Some(class);
            }
            None => {
                current.push(c);
                current_class = Some(class);
            }
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_full_term() {
        let patterns = generate_patterns("NaOH水溶液");
        assert!(patterns.contains(&"NaOH水溶液".to_string()));
    }

    #[test]
    fn test_naoh_aqueous_solution_scenario() {
        let patterns = generate_patterns("NaOH水溶液");
        for expected in ["NaOH水溶液", "NaOH", "水溶液"] {
            assert!(patterns.contains(&expected.to_string()), "missing {}", expected);
        }
        assert!(patterns.iter().all(|p| p.chars().count() >= 2));
    }

    #[test]
    fn test_no_short_fragments() {
        let patterns = generate_patterns("L体");
        assert!(patterns.contains(&"L体".to_string()));
        assert!(!patterns.contains(&"L".to_string()));
        assert!(!patterns.contains(&"体".to_string()));
    }

    #[test]
    fn test_deduplicated() {
        let patterns = generate_patterns("塩酸塩");
        let unique: HashSet<_> = patterns.iter().collect();
        assert_eq!(unique.len(), patterns.len());
    }

    #[test]
    fn test_sorted_by_descending_length() {
        let patterns = generate_patterns("NaOH水溶液");
        for pair in patterns.windows(2) {
            assert!(pair[0].chars().count() >= pair[1].chars().count());
        }
    }

    #[test]
    fn test_suffix_prefix_emitted() {
        // 酢酸エステル: suffix エステル -> head is the full term, before is 酢酸.
        let patterns = generate_patterns("酢酸エステル");
        assert!(patterns.contains(&"酢酸".to_string()));
        assert!(patterns.contains(&"酢酸エステル".to_string()));
    }

    #[test]
    fn test_empty_input() {
        assert!(generate_patterns("  ").is_empty());
    }

    #[test]
    fn test_split_segments() {
        assert_eq!(split_segments("NaOH水溶液"), vec!["NaOH", "水溶液"]);
        assert_eq!(split_segments("abc123"), vec!["abc123"]);
    }
}
