use crate::models::CodeSections;
use async_trait::async_trait;
use futures::stream::{self, Stream, StreamExt, TryStreamExt};
use serde::Deserialize;
use serde_json::json;
use std::pin::Pin;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum OpenAiError {
    #[error("HTTP error: {0}")] Http(String),
    #[error("Other: {0}")] Other(String),
}

pub type CompletionStream = Pin<Box<dyn Stream<Item = Result<String, OpenAiError>> + Send>>;

/// Seam between the endpoint handler and the hosted model API.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// One JSON-formatted completion, parsed into named code sections.
    async fn complete(&self, system: &str, user: &str) -> Result<CodeSections, OpenAiError>;

    /// Incremental deltas; concatenating the yielded fragments reproduces
    /// the complete JSON text.
    async fn stream_completion(
        &self,
        system: &str,
        user: &str,
    ) -> Result<CompletionStream, OpenAiError>;
}

// Helper to keep multi-kilobyte code payloads out of the logs
fn preview(text: &str) -> String {
    match text.char_indices().nth(120) {
        Some((index, _)) => format!("{}...[{} chars total]", &text[..index], text.len()),
        None => text.to_string(),
    }
}

pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: String) -> Self {
        let base_url = std::env::var("OPENAI_API_BASE")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
            model,
        }
    }

    fn messages(system: &str, user: &str) -> serde_json::Value {
        json!([
            { "role": "system", "content": system },
            { "role": "user", "content": user }
        ])
    }

    async fn send_chat_request(
        &self,
        request_body: serde_json::Value,
    ) -> Result<reqwest::Response, OpenAiError> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| OpenAiError::Http(e.to_string()))?;

        let status = response.status();
        info!("📥 Response status: {}", status);

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!("❌ API error response: {}", error_body);
            return Err(OpenAiError::Http(format!("status={status} body={error_body}")));
        }
        Ok(response)
    }
}

#[async_trait]
impl CompletionBackend for OpenAiClient {
    async fn complete(&self, system: &str, user: &str) -> Result<CodeSections, OpenAiError> {
        info!("📤 Requesting buffered completion ({})", self.model);
        let request_body = json!({
            "model": self.model,
            "messages": Self::messages(system, user),
            "response_format": { "type": "json_object" }
        });

        let response = self.send_chat_request(request_body).await?;
        let response_text = response
            .text()
            .await
            .map_err(|e| OpenAiError::Other(e.to_string()))?;

        let parsed: ChatResponse = serde_json::from_str(&response_text)
            .map_err(|e| OpenAiError::Other(format!("parse error: {e}")))?;
        let content = parsed
            .choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .unwrap_or("{}");
        info!("✅ Model content: {}", preview(content));

        serde_json::from_str(content)
            .map_err(|e| OpenAiError::Other(format!("model returned malformed JSON: {e}")))
    }

    async fn stream_completion(
        &self,
        system: &str,
        user: &str,
    ) -> Result<CompletionStream, OpenAiError> {
        info!("📤 Requesting streamed completion ({})", self.model);
        let request_body = json!({
            "model": self.model,
            "messages": Self::messages(system, user),
            "stream": true
        });

        let response = self.send_chat_request(request_body).await?;
        let mut decoder = SseDecoder::default();
        let deltas = response
            .bytes_stream()
            .map(move |chunk| match chunk {
                Ok(bytes) => Ok(decoder.feed(&bytes)),
                Err(e) => Err(OpenAiError::Http(e.to_string())),
            })
            .map_ok(|texts| stream::iter(texts.into_iter().map(Ok)))
            .try_flatten();
        Ok(Box::pin(deltas))
    }
}

/// Splits the `data:` lines out of a server-sent-event byte stream and
/// extracts each delta's text. Carries partial lines across chunk
/// boundaries, so the transport may split anywhere.
#[derive(Default)]
struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut deltas = Vec::new();
        while let Some(newline) = self.buf.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=newline).collect();
            let Ok(line) = std::str::from_utf8(&line) else {
                continue;
            };
            let Some(data) = line.trim_end().strip_prefix("data:") else {
                continue;
            };
            let data = data.trim_start();
            if data == "[DONE]" {
                continue;
            }
            match serde_json::from_str::<StreamChunk>(data) {
                Ok(parsed) => {
                    for choice in parsed.choices {
                        if let Some(text) = choice.delta.content {
                            deltas.push(text);
                        }
                    }
                }
                Err(e) => tracing::debug!("Ignoring undecodable stream line: {e}"),
            }
        }
        deltas
    }
}

// --- Response Parsing Helpers ---

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: ChatMessage,
}

#[derive(Debug, Deserialize, Default)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Deserialize, Default)]
struct Delta {
    content: Option<String>,
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted backend for handler and session tests: records every call
    /// and replays canned sections or stream fragments.
    #[derive(Default)]
    pub struct CannedBackend {
        sections: Option<serde_json::Value>,
        fragments: Vec<String>,
        fail: bool,
        pub calls: AtomicUsize,
        pub prompts: Mutex<Vec<(String, String)>>,
    }

    impl CannedBackend {
        pub fn buffered(sections: serde_json::Value) -> Self {
            Self {
                sections: Some(sections),
                ..Default::default()
            }
        }

        pub fn streaming(fragments: Vec<String>) -> Self {
            Self {
                fragments,
                ..Default::default()
            }
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn record(&self, system: &str, user: &str) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts
                .lock()
                .unwrap()
                .push((system.to_string(), user.to_string()));
        }
    }

    #[async_trait]
    impl CompletionBackend for CannedBackend {
        async fn complete(&self, system: &str, user: &str) -> Result<CodeSections, OpenAiError> {
            self.record(system, user);
            if self.fail {
                return Err(OpenAiError::Http("canned failure".into()));
            }
            match self.sections.clone() {
                Some(serde_json::Value::Object(map)) => Ok(map),
                _ => Err(OpenAiError::Other("no canned sections".into())),
            }
        }

        async fn stream_completion(
            &self,
            system: &str,
            user: &str,
        ) -> Result<CompletionStream, OpenAiError> {
            self.record(system, user);
            if self.fail {
                return Err(OpenAiError::Http("canned failure".into()));
            }
            let fragments = self.fragments.clone();
            Ok(Box::pin(stream::iter(fragments.into_iter().map(Ok))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decoder_extracts_deltas_from_complete_events() {
        let mut decoder = SseDecoder::default();
        let deltas = decoder.feed(
            b"data: {\"choices\":[{\"delta\":{\"content\":\"{\\\"En\"}}]}\n\n\
              data: {\"choices\":[{\"delta\":{\"content\":\"tity\\\"\"}}]}\n\n",
        );
        assert_eq!(deltas, vec!["{\"En".to_string(), "tity\"".to_string()]);
    }

    #[test]
    fn decoder_carries_partial_lines_across_chunks() {
        let event = "data: {\"choices\":[{\"delta\":{\"content\":\"héllo\"}}]}\n";
        let bytes = event.as_bytes();
        // Split between the two bytes of 'é'.
        let split = event.find('é').unwrap() + 1;
        let mut decoder = SseDecoder::default();
        let mut collected = Vec::new();
        for chunk in [&bytes[..split], &bytes[split..split + 1], &bytes[split + 1..]] {
            collected.extend(decoder.feed(chunk));
        }
        assert_eq!(collected, vec!["héllo".to_string()]);
    }

    #[test]
    fn decoder_skips_done_marker_and_keepalives() {
        let mut decoder = SseDecoder::default();
        let deltas = decoder.feed(
            b": keepalive\n\
              data: [DONE]\n\
              data: {\"choices\":[{\"delta\":{}}]}\n",
        );
        assert!(deltas.is_empty());
    }

    #[test]
    fn chat_response_content_parses_into_sections() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"{\"Entity\":\"class Book {}\"}"}}]}"#,
        )
        .unwrap();
        let content = parsed.choices.first().unwrap().message.content.as_str();
        let sections: CodeSections = serde_json::from_str(content).unwrap();
        assert_eq!(
            sections.get("Entity").and_then(|v| v.as_str()),
            Some("class Book {}")
        );
    }
}
