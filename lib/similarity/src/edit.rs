//! Edit-distance similarity
//!
//! Character-based Levenshtein distance normalized to a similarity ratio.
//! Comparison is case-insensitive and Unicode-aware (operates on chars,
//! not bytes), so CJK terms and half-width/full-width mixes compare sanely.

/// Calculate the normalized edit-distance similarity between two strings
///
/// # Arguments
/// * `a` - First term
/// * `b` - Second term
///
/// # Returns
/// Similarity score in [0.0, 1.0] where 1.0 means identical (ignoring case).
/// Two empty strings are identical.
pub fn edit_ratio(a: &str, b: &str) -> f32 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();

    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 1.0;
    }

    let dist = levenshtein(&a, &b);
    1.0 - (dist as f32 / max_len as f32)
}

/// Levenshtein distance over char slices using a rolling single-row buffer.
fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.iter().enumerate() {
        let mut prev_diag = row[0];
        row[0] = i + 1;

        for (j, cb) in b.iter().enumerate() {
            let substitution = if ca == cb { prev_diag } else { prev_diag + 1 };
            prev_diag = row[j + 1];
            row[j + 1] = substitution.min(row[j] + 1).min(prev_diag + 1);
        }
    }

    row[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_strings() {
        assert_eq!(edit_ratio("ethanol", "ethanol"), 1.0);
        assert_eq!(edit_ratio("水酸化ナトリウム", "水酸化ナトリウム"), 1.0);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(edit_ratio("NaOH", "naoh"), 1.0);
    }

    #[test]
    fn test_empty_strings() {
        assert_eq!(edit_ratio("", ""), 1.0);
        assert_eq!(edit_ratio("abc", ""), 0.0);
        assert_eq!(edit_ratio("", "abc"), 0.0);
    }

    #[test]
    fn test_single_char_drop() {
        // エタノール -> エタノル drops one of five chars
        let sim = edit_ratio("エタノール", "エタノル");
        assert!((sim - 0.8).abs() < 1e-6, "got {}", sim);
    }

    #[test]
    fn test_unrelated_terms_score_low() {
        assert!(edit_ratio("ethanol", "sulfuric acid") < 0.4);
    }

    #[test]
    fn test_symmetry() {
        let ab = edit_ratio("メタノール", "エタノール");
        let ba = edit_ratio("エタノール", "メタノール");
        assert_eq!(ab, ba);
    }
}
