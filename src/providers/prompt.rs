//! Shared prompt building and response parsing for the LLM providers.
//!
//! OpenAI and Anthropic get the same instructions and the same user payload
//! so their behavior stays comparable; only transport differs.

use serde::Serialize;
use serde_json::Value;

use crate::config::GlossaryTerm;
use crate::error::{VerbiError, VerbiResult};
use crate::providers::TranslationRequest;

/// Build the system prompt for a batch sharing one locale pair.
pub fn build_system_prompt(
    source_locale: &str,
    target_locale: &str,
    glossary: &[GlossaryTerm],
) -> String {
    let mut prompt = format!(
        "You are a professional translator. Translate the given messages \
         from {source_locale} to {target_locale}.\n\
         \n\
         CRITICAL RULES:\n\
         1. Preserve all ICU MessageFormat syntax exactly: {{name}}, {{count, plural, ...}}, {{gender, select, ...}}\n\
         2. Keep every {{placeholder}} identical - never translate, reorder or reformat what is inside curly braces\n\
         3. Match the tone and formality of the source text\n\
         4. Preserve leading and trailing whitespace\n\
         5. Return ONLY valid JSON in exactly this shape: {{\"translations\": [{{\"key\": \"...\", \"text\": \"...\"}}]}}"
    );

    let mut glossary_lines = Vec::new();
    for term in glossary {
        if term.keep == Some(true) {
            glossary_lines.push(format!("- \"{}\": keep untranslated", term.term));
        } else if let Some(translation) = term
            .translation
            .as_ref()
            .and_then(|map| map.get(target_locale))
        {
            glossary_lines.push(format!(
                "- \"{}\": translate as \"{translation}\"",
                term.term
            ));
        }
    }
    if !glossary_lines.is_empty() {
        prompt.push_str("\n\nGLOSSARY:\n");
        prompt.push_str(&glossary_lines.join("\n"));
    }

    prompt
}

#[derive(Serialize)]
struct PromptItem<'a> {
    key: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a str>,
}

/// Build the user prompt: a pretty-printed JSON array of the messages.
pub fn build_user_prompt(requests: &[TranslationRequest]) -> String {
    let items: Vec<PromptItem> = requests
        .iter()
        .map(|request| PromptItem {
            key: &request.key,
            text: &request.source_text,
            context: request.context.as_deref(),
        })
        .collect();
    serde_json::to_string_pretty(&items).unwrap_or_else(|_| "[]".to_string())
}

/// Parse a model's reply into `(key, text)` pairs.
///
/// Models are asked for `{"translations": [...]}` but replies drift, so
/// four shapes are accepted: that object, a `{"results": [...]}` object, a
/// bare array of `{key, text}` items, and a plain `{key: text}` map. Prose
/// around a JSON object is tolerated by slicing the outermost braces.
pub fn parse_model_response(provider: &str, content: &str) -> VerbiResult<Vec<(String, String)>> {
    let trimmed = content.trim();

    let value: Value = match serde_json::from_str(trimmed) {
        Ok(value) => value,
        Err(_) => {
            let start = trimmed.find('{');
            let end = trimmed.rfind('}');
            match (start, end) {
                (Some(start), Some(end)) if end > start => {
                    serde_json::from_str(&trimmed[start..=end]).map_err(|e| {
                        VerbiError::invalid_response(provider, format!("reply is not JSON: {e}"))
                    })?
                }
                _ => {
                    return Err(VerbiError::invalid_response(
                        provider,
                        "reply contains no JSON object",
                    ));
                }
            }
        }
    };

    if let Some(array) = value.as_array() {
        return Ok(collect_items(array));
    }
    if let Some(array) = value.get("translations").and_then(Value::as_array) {
        return Ok(collect_items(array));
    }
    if let Some(array) = value.get("results").and_then(Value::as_array) {
        return Ok(collect_items(array));
    }
    if let Some(object) = value.as_object() {
        return Ok(object
            .iter()
            .filter_map(|(key, value)| {
                value.as_str().map(|text| (key.clone(), text.to_string()))
            })
            .collect());
    }

    Err(VerbiError::invalid_response(
        provider,
        "reply JSON has no recognizable translations",
    ))
}

fn collect_items(array: &[Value]) -> Vec<(String, String)> {
    array
        .iter()
        .filter_map(|item| {
            let key = item.get("key")?.as_str()?;
            let text = item.get("text")?.as_str()?;
            Some((key.to_string(), text.to_string()))
        })
        .collect()
}
