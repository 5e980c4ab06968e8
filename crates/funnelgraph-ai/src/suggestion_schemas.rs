use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use funnelgraph_core::Suggestion;

/// The object providers are instructed to return.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SuggestionBatch {
    /// 3-5 prioritized optimization suggestions
    pub suggestions: Vec<Suggestion>,
}

fn schema_to_json_value<T: JsonSchema>() -> Value {
    let schema = schema_for!(T);
    serde_json::to_value(schema).expect("Failed to serialize schema")
}

/// JSON schema for [`SuggestionBatch`], embedded into the system prompt
/// so providers know the exact output shape.
pub fn suggestion_batch_schema() -> Value {
    schema_to_json_value::<SuggestionBatch>()
}

/// Single strict parse step for provider output.
///
/// Tries, in order: the whole payload, the first fenced code block, the
/// outermost-brace slice. A candidate must decode to a non-empty batch
/// (or bare array) of suggestions; anything else yields `None`. No
/// partial or guessed structures are ever returned.
pub fn parse_suggestions(content: &str) -> Option<Vec<Suggestion>> {
    let candidates = [
        Some(content.trim()),
        fenced_block(content),
        brace_slice(content),
    ];

    for candidate in candidates.into_iter().flatten() {
        if let Some(suggestions) = decode(candidate) {
            return Some(suggestions);
        }
    }
    None
}

fn decode(candidate: &str) -> Option<Vec<Suggestion>> {
    if let Ok(batch) = serde_json::from_str::<SuggestionBatch>(candidate) {
        if !batch.suggestions.is_empty() {
            return Some(batch.suggestions);
        }
    }
    if let Ok(list) = serde_json::from_str::<Vec<Suggestion>>(candidate) {
        if !list.is_empty() {
            return Some(list);
        }
    }
    None
}

fn fenced_block(content: &str) -> Option<&str> {
    let start = content
        .find("```json")
        .map(|i| i + "```json".len())
        .or_else(|| content.find("```").map(|i| i + 3))?;
    let rest = &content[start..];
    let end = rest.find("```")?;
    Some(rest[..end].trim())
}

fn brace_slice(content: &str) -> Option<&str> {
    let start = content.find(['{', '['])?;
    let close = if content.as_bytes()[start] == b'{' {
        '}'
    } else {
        ']'
    };
    let end = content.rfind(close)?;
    if end <= start {
        return None;
    }
    Some(content[start..=end].trim())
}
