//! Query expansion.
//!
//! Asks the LLM for complementary sub-queries and merges them into one
//! combined query string. Parsing is deliberately strict; any deviation is
//! reported so the orchestrator can substitute the deterministic fallback
//! query instead. Model output variance makes the fallback a routine path,
//! not an exceptional one.

use notex_model::{strip_code_fences, CompletionProvider};
use serde::Deserialize;

use crate::error::StageError;

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    queries: Vec<String>,
}

/// Run the query-generation prompt and merge the returned queries.
pub async fn generate_query(
    llm: &dyn CompletionProvider,
    prompt: &str,
) -> Result<String, StageError> {
    let response = llm.complete(prompt).await?;
    parse_combined_query(&response)
}

/// Parse a model response of the shape `{"queries": [...]}` into the
/// space-joined combined query, order preserved. Code fences are tolerated;
/// anything else malformed is an error.
pub fn parse_combined_query(response: &str) -> Result<String, StageError> {
    let content = strip_code_fences(response);
    let parsed: QueryResponse = serde_json::from_str(content)
        .map_err(|err| StageError::MalformedOutput(format!("query JSON: {}", err)))?;

    if parsed.queries.is_empty() {
        return Err(StageError::MalformedOutput("empty query list".to_string()));
    }
    Ok(parsed.queries.join(" "))
}

/// Deterministic combined query used when expansion fails.
pub fn fallback_query(purpose: &str, normalized_materials: &str, focus_instruction: &str) -> String {
    format!("{} {} {}", purpose, normalized_materials, focus_instruction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_joins_in_order() {
        let combined =
            parse_combined_query(r#"{"queries": ["NaOH 滴定", "中和反応", "水酸化ナトリウム"]}"#)
                .unwrap();
        assert_eq!(combined, "NaOH 滴定 中和反応 水酸化ナトリウム");
    }

    #[test]
    fn test_parse_tolerates_code_fence() {
        let combined =
            parse_combined_query("```json\n{\"queries\": [\"q1\", \"q2\"]}\n```").unwrap();
        assert_eq!(combined, "q1 q2");
    }

    #[test]
    fn test_non_json_is_malformed() {
        let err = parse_combined_query("検索クエリは以下の通りです。").unwrap_err();
        assert!(matches!(err, StageError::MalformedOutput(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_empty_list_is_malformed() {
        let err = parse_combined_query(r#"{"queries": []}"#).unwrap_err();
        assert!(matches!(err, StageError::MalformedOutput(_)));
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let err = parse_combined_query(r#"{"answers": ["q"]}"#).unwrap_err();
        assert!(matches!(err, StageError::MalformedOutput(_)));
    }

    #[test]
    fn test_fallback_query_shape() {
        assert_eq!(
            fallback_query("目的", "- 材料: 1g", "指示"),
            "目的 - 材料: 1g 指示"
        );
    }
}
