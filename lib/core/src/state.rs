//! Pipeline state machine.
//!
//! The transition function is a pure mapping `(stage, evaluation_mode) ->
//! next stage`, independent of the stage implementations, so the graph can
//! be tested on its own.

use serde::Serialize;

use crate::request::SearchRequest;

/// Pipeline stages. Entry is always [`Stage::Normalize`]; the single
/// terminal state is [`Stage::Terminal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Normalize,
    GenerateQuery,
    Search,
    Compare,
    Terminal,
}

impl Stage {
    /// Pure transition function. Evaluation mode skips the Compare stage
    /// and terminates straight after Search.
    pub fn next(self, evaluation_mode: bool) -> Stage {
        match self {
            Stage::Normalize => Stage::GenerateQuery,
            Stage::GenerateQuery => Stage::Search,
            Stage::Search => {
                if evaluation_mode {
                    Stage::Terminal
                } else {
                    Stage::Compare
                }
            }
            Stage::Compare => Stage::Terminal,
            Stage::Terminal => Stage::Terminal,
        }
    }
}

/// Mutable record threaded through one pipeline run. Created per request,
/// never shared across requests. Each stage writes only its own output
/// fields; earlier fields are read-only to later stages.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineState {
    pub input_purpose: String,
    pub input_materials: String,
    pub input_methods: String,

    pub normalized_materials: String,
    pub focus_instruction: String,
    pub search_query: String,

    pub retrieved_docs: Vec<String>,
    pub comparison: Option<String>,

    pub iteration: u32,
    /// Set at invocation, immutable thereafter.
    pub evaluation_mode: bool,
}

impl PipelineState {
    pub fn new(request: &SearchRequest, evaluation_mode: bool) -> Self {
        Self {
            input_purpose: request.purpose.clone(),
            input_materials: request.materials.clone(),
            input_methods: request.methods.clone(),
            normalized_materials: String::new(),
            focus_instruction: request.focus_instruction().to_string(),
            search_query: String::new(),
            retrieved_docs: Vec::new(),
            comparison: None,
            iteration: 0,
            evaluation_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestKind;

    #[test]
    fn test_normal_mode_walks_through_compare() {
        let mut stage = Stage::Normalize;
        let mut walk = vec![stage];
        while stage != Stage::Terminal {
            stage = stage.next(false);
            walk.push(stage);
        }
        assert_eq!(
            walk,
            vec![
                Stage::Normalize,
                Stage::GenerateQuery,
                Stage::Search,
                Stage::Compare,
                Stage::Terminal,
            ]
        );
    }

    #[test]
    fn test_evaluation_mode_skips_compare() {
        let mut stage = Stage::Normalize;
        let mut walk = vec![stage];
        while stage != Stage::Terminal {
            stage = stage.next(true);
            walk.push(stage);
        }
        assert!(!walk.contains(&Stage::Compare));
        assert_eq!(*walk.last().unwrap(), Stage::Terminal);
    }

    #[test]
    fn test_terminal_is_absorbing() {
        assert_eq!(Stage::Terminal.next(false), Stage::Terminal);
        assert_eq!(Stage::Terminal.next(true), Stage::Terminal);
    }

    #[test]
    fn test_state_captures_request() {
        let request = SearchRequest {
            kind: RequestKind::InitialSearch,
            purpose: "中和滴定".to_string(),
            materials: "NaOH: 5g".to_string(),
            methods: "滴定".to_string(),
            instruction: None,
        };
        let state = PipelineState::new(&request, true);
        assert!(state.evaluation_mode);
        assert_eq!(state.iteration, 0);
        assert_eq!(state.input_purpose, "中和滴定");
        assert!(!state.focus_instruction.is_empty());
    }
}
