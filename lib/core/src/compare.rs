//! Comparison synthesis.
//!
//! Turns the retrieved documents into a natural-language comparison against
//! the input experiment. Skipped entirely under evaluation mode.

use notex_model::CompletionProvider;

use crate::error::StageError;
use crate::prompts::PromptSet;
use crate::state::PipelineState;

/// Returned verbatim when the search produced no documents to compare.
pub const NO_RESULTS_MESSAGE: &str = "該当するノートが見つかりませんでした。";

/// Synthesize the comparison message for the retrieved documents. With no
/// documents, returns the fixed no-results message without calling the LLM.
pub async fn synthesize_comparison(
    llm: &dyn CompletionProvider,
    prompts: &PromptSet,
    state: &PipelineState,
) -> Result<String, StageError> {
    if state.retrieved_docs.is_empty() {
        return Ok(NO_RESULTS_MESSAGE.to_string());
    }

    let docs = state.retrieved_docs.join("\n\n");
    let prompt = prompts.compare_prompt(state, &docs);
    let response = llm.complete(&prompt).await?;
    Ok(response.trim().to_string())
}
