//! Prompt templates for the LLM-backed stages.
//!
//! Templates use `{placeholder}` markers filled by simple substitution.
//! Callers may override either template; absent overrides fall back to the
//! built-in Japanese defaults.

use serde::{Deserialize, Serialize};

use crate::state::PipelineState;

const DEFAULT_QUERY_GENERATION: &str = "\
あなたは実験ノート検索システムのクエリ生成アシスタントです。
以下の実験情報から、類似する実験ノートを検索するための相補的な検索クエリを3つ生成してください。

# 実験情報
目的: {input_purpose}
材料: {normalized_materials}
方法: {input_methods}

# 検索の観点
{user_focus_instruction}

必ず次のJSON形式のみで回答してください。説明文は不要です。
{\"queries\": [\"クエリ1\", \"クエリ2\", \"クエリ3\"]}";

const DEFAULT_COMPARE: &str = "\
あなたは実験ノートの比較分析アシスタントです。
以下の入力実験と検索された実験ノートを比較し、材料・方法の類似点と相違点を簡潔にまとめてください。

# 入力実験
目的: {input_purpose}
材料: {normalized_materials}
方法: {input_methods}

# 比較の観点
{user_focus_instruction}

# 検索された実験ノート
{retrieved_docs}

各ノートについて、入力実験との類似点と相違点を日本語で説明してください。";

/// Optional prompt overrides for the two LLM stages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptSet {
    #[serde(default)]
    pub query_generation: Option<String>,
    #[serde(default)]
    pub compare: Option<String>,
}

impl PromptSet {
    pub fn query_generation_prompt(&self, state: &PipelineState) -> String {
        let template = self
            .query_generation
            .as_deref()
            .unwrap_or(DEFAULT_QUERY_GENERATION);
        render(template, state, None)
    }

    pub fn compare_prompt(&self, state: &PipelineState, retrieved_docs: &str) -> String {
        let template = self.compare.as_deref().unwrap_or(DEFAULT_COMPARE);
        render(template, state, Some(retrieved_docs))
    }
}

fn render(template: &str, state: &PipelineState, retrieved_docs: Option<&str>) -> String {
    let mut rendered = template
        .replace("{input_purpose}", &state.input_purpose)
        .replace("{normalized_materials}", &state.normalized_materials)
        .replace("{input_methods}", &state.input_methods)
        .replace("{user_focus_instruction}", &state.focus_instruction);
    if let Some(docs) = retrieved_docs {
        rendered = rendered.replace("{retrieved_docs}", docs);
    }
    rendered
}
