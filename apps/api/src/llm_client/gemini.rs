//! Gemini backend: `streamGenerateContent` over server-sent events.

use std::collections::VecDeque;

use async_trait::async_trait;
use futures::{stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{GenerationClient, LlmError, TextStream};

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

/// One SSE event of a streamed response.
#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl StreamChunk {
    /// Concatenated text of the first candidate's parts.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: u16,
    message: String,
}

/// Gemini generation client. Cheap to clone; shares one connection pool.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, api_base: String) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()?;
        Ok(Self {
            client,
            api_key,
            model,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.api_base, self.model
        )
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate_stream(&self, prompt: &str, system: &str) -> Result<TextStream, LlmError> {
        let request_body = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: prompt }],
            }],
            system_instruction: (!system.is_empty()).then(|| Content {
                role: None,
                parts: vec![Part { text: system }],
            }),
        };

        let response = self
            .client
            .post(self.stream_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Gemini API returned {}: {}", status, body);
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        debug!("Gemini stream opened (model: {})", self.model);

        let bytes = response.bytes_stream().boxed();
        let state = (bytes, SseDecoder::default(), VecDeque::new(), false);

        let text_stream = stream::unfold(
            state,
            |(mut bytes, mut decoder, mut pending, mut done)| async move {
                loop {
                    if let Some(item) = pending.pop_front() {
                        return Some((item, (bytes, decoder, pending, done)));
                    }
                    if done {
                        return None;
                    }
                    match bytes.next().await {
                        Some(Ok(chunk)) => pending.extend(decoder.feed(&chunk)),
                        Some(Err(e)) => {
                            warn!("Gemini stream interrupted: {e}");
                            done = true;
                            pending.push_back(Err(LlmError::Stream(e.to_string())));
                        }
                        None => {
                            done = true;
                            pending.extend(decoder.finish());
                        }
                    }
                }
            },
        );

        Ok(Box::pin(text_stream))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Incremental decoder from raw SSE bytes to text fragments.
///
/// Lines are split on `\n` (a trailing `\r` is dropped), `data:` lines are
/// accumulated until a blank line dispatches the event. Bytes are buffered
/// until a full line is available, so multi-byte characters split across
/// network chunks decode correctly.
#[derive(Debug, Default)]
struct SseDecoder {
    line: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    fn feed(&mut self, bytes: &[u8]) -> Vec<Result<String, LlmError>> {
        let mut out = Vec::new();
        for &byte in bytes {
            if byte == b'\n' {
                let line = std::mem::take(&mut self.line);
                if let Some(item) = self.handle_line(&line) {
                    out.push(item);
                }
            } else {
                self.line.push(byte);
            }
        }
        out
    }

    fn finish(&mut self) -> Vec<Result<String, LlmError>> {
        let mut out = Vec::new();
        if !self.line.is_empty() {
            let line = std::mem::take(&mut self.line);
            if let Some(item) = self.handle_line(&line) {
                out.push(item);
            }
        }
        if let Some(item) = self.dispatch() {
            out.push(item);
        }
        out
    }

    fn handle_line(&mut self, raw: &[u8]) -> Option<Result<String, LlmError>> {
        let line = String::from_utf8_lossy(raw);
        let line = line.strip_suffix('\r').unwrap_or(&line);

        if line.is_empty() {
            return self.dispatch();
        }
        if let Some(payload) = line.strip_prefix("data:") {
            self.data.push(payload.trim_start().to_string());
        }
        // Comments, `event:` and `id:` lines carry nothing we need.
        None
    }

    fn dispatch(&mut self) -> Option<Result<String, LlmError>> {
        if self.data.is_empty() {
            return None;
        }
        let payload = std::mem::take(&mut self.data).join("\n");
        if payload == "[DONE]" {
            return None;
        }

        let chunk: StreamChunk = match serde_json::from_str(&payload) {
            Ok(chunk) => chunk,
            Err(e) => return Some(Err(LlmError::Parse(e))),
        };
        if let Some(error) = chunk.error {
            return Some(Err(LlmError::Api {
                status: error.code,
                message: error.message,
            }));
        }

        let text = chunk.text();
        (!text.is_empty()).then_some(Ok(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(text: &str) -> String {
        format!(
            "data: {{\"candidates\":[{{\"content\":{{\"parts\":[{{\"text\":{}}}],\"role\":\"model\"}}}}]}}\r\n\r\n",
            serde_json::to_string(text).unwrap()
        )
    }

    fn texts(items: Vec<Result<String, LlmError>>) -> Vec<String> {
        items.into_iter().map(|r| r.unwrap()).collect()
    }

    #[test]
    fn test_decoder_yields_one_fragment_per_event() {
        let mut decoder = SseDecoder::default();
        let body = format!("{}{}", event("Hello, "), event("world"));
        let out = texts(decoder.feed(body.as_bytes()));
        assert_eq!(out, vec!["Hello, ", "world"]);
        assert!(decoder.finish().is_empty());
    }

    #[test]
    fn test_decoder_handles_events_split_across_chunks() {
        let mut decoder = SseDecoder::default();
        let body = event("{\"full_name\": \"Zoë\"}");
        let bytes = body.as_bytes();
        // Split inside the multi-byte "ë".
        let split = body.find('ë').unwrap() + 1;

        let mut out = texts(decoder.feed(&bytes[..split]));
        assert!(out.is_empty());
        out.extend(texts(decoder.feed(&bytes[split..])));
        assert_eq!(out, vec!["{\"full_name\": \"Zoë\"}"]);
    }

    #[test]
    fn test_decoder_flushes_unterminated_final_event() {
        let mut decoder = SseDecoder::default();
        let body = event("tail");
        let trimmed = body.trim_end();
        assert!(decoder.feed(trimmed.as_bytes()).is_empty());
        assert_eq!(texts(decoder.finish()), vec!["tail"]);
    }

    #[test]
    fn test_decoder_surfaces_in_stream_api_error() {
        let mut decoder = SseDecoder::default();
        let body = "data: {\"error\":{\"code\":429,\"message\":\"quota exceeded\"}}\n\n";
        let out = decoder.feed(body.as_bytes());
        assert_eq!(out.len(), 1);
        assert!(matches!(
            out.into_iter().next().unwrap(),
            Err(LlmError::Api { status: 429, .. })
        ));
    }

    #[test]
    fn test_decoder_rejects_malformed_event() {
        let mut decoder = SseDecoder::default();
        let out = decoder.feed(b"data: {not json}\n\n");
        assert!(matches!(out.as_slice(), [Err(LlmError::Parse(_))]));
    }

    #[test]
    fn test_decoder_skips_events_without_text() {
        let mut decoder = SseDecoder::default();
        let body = "data: {\"candidates\":[],\"usageMetadata\":{\"totalTokenCount\":12}}\n\n: keep-alive\n\n";
        assert!(decoder.feed(body.as_bytes()).is_empty());
    }

    #[test]
    fn test_chunk_text_joins_parts() {
        let chunk: StreamChunk = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"a"},{"text":"b"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(chunk.text(), "ab");
    }

    #[test]
    fn test_stream_url_uses_model_and_sse() {
        let client = GeminiClient::new(
            "key".to_string(),
            DEFAULT_MODEL.to_string(),
            format!("{DEFAULT_API_BASE}/"),
        )
        .unwrap();
        assert_eq!(
            client.stream_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:streamGenerateContent?alt=sse"
        );
    }

    #[test]
    fn test_request_serializes_system_instruction() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: "hi" }],
            }],
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part { text: "json only" }],
            }),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "json only");
        assert!(value["systemInstruction"].get("role").is_none());
    }
}
