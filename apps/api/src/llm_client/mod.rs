/// LLM Client: the single point of entry for all generation-service calls.
///
/// ARCHITECTURAL RULE: No other module may talk to the generation service directly.
/// Every step goes through `GenerationClient` + `generate_text`, which is also the
/// seam replaced by a scripted stub in tests.
use std::pin::Pin;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use thiserror::Error;
use tracing::debug;

pub mod gemini;
pub mod prompts;

#[cfg(test)]
pub mod testing;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// A finite, non-restartable sequence of text fragments in generation order.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// A streaming text-generation backend.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Submits `prompt` and returns the response as a stream of text fragments.
    async fn generate_stream(&self, prompt: &str, system: &str) -> Result<TextStream, LlmError>;

    fn model_name(&self) -> &str;
}

/// Calls the client, buffers every fragment in order, and strips code fences.
/// Returns `EmptyContent` if nothing but whitespace or fences came back.
pub async fn generate_text(
    client: &dyn GenerationClient,
    prompt: &str,
    system: &str,
) -> Result<String, LlmError> {
    let mut stream = client.generate_stream(prompt, system).await?;

    let mut buffer = String::new();
    let mut chunks = 0usize;
    while let Some(chunk) = stream.next().await {
        buffer.push_str(&chunk?);
        chunks += 1;
    }

    debug!(
        "Generation finished: model={}, chunks={}, chars={}",
        client.model_name(),
        chunks,
        buffer.len()
    );

    let cleaned = strip_code_fences(&buffer);
    if cleaned.is_empty() {
        return Err(LlmError::EmptyContent);
    }
    Ok(cleaned.to_string())
}

/// Language tags the model puts after an opening fence.
const FENCE_TAGS: &[&str] = &["json", "html"];

/// Strips leading ```json / ```html / ``` fences and trailing ``` fences,
/// plus surrounding whitespace, until none are left. Nested fences are
/// removed in one call. Text without fences is only trimmed.
pub fn strip_code_fences(text: &str) -> &str {
    let mut text = text.trim();
    loop {
        let stripped = strip_fence_pair(text);
        if stripped.len() == text.len() {
            return stripped;
        }
        text = stripped;
    }
}

fn strip_fence_pair(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = FENCE_TAGS
            .iter()
            .find_map(|tag| {
                rest.get(..tag.len())
                    .filter(|head| head.eq_ignore_ascii_case(tag))
                    .map(|_| &rest[tag.len()..])
            })
            .unwrap_or(rest);
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }
    text.trim()
}
