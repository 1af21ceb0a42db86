use crate::form::GeneratorForm;
use crate::models::{CodeSections, GenerationRequest};
use crate::viewer::CodeViewer;
use futures::StreamExt;
use thiserror::Error;

/// Upper bound on how much of a streamed response is buffered while waiting
/// for it to parse as JSON. Past this the response is declared malformed.
pub const MAX_STREAM_BUFFER_BYTES: usize = 4 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(String),
    #[error("server returned HTTP {0}")]
    Status(u16),
    #[error("response is not valid JSON: {0}")]
    Parse(String),
}

#[derive(Debug)]
pub enum Progress {
    /// The buffer is a prefix of a JSON document; more bytes may complete it.
    Incomplete,
    Complete(CodeSections),
}

#[derive(Debug, Error)]
pub enum AccumulateError {
    #[error("response is not valid JSON: {0}")]
    Malformed(String),
    #[error("response exceeded the streaming buffer limit")]
    Overflow,
}

/// Rebuilds a JSON object from arbitrarily split byte chunks by reparsing
/// the whole buffer after every append. End-of-input parse errors mean the
/// document is still arriving; any other error cannot be fixed by more
/// bytes and fails immediately.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    buf: Vec<u8>,
}

impl StreamAccumulator {
    pub fn push(&mut self, chunk: &[u8]) -> Result<Progress, AccumulateError> {
        self.buf.extend_from_slice(chunk);
        if self.buf.len() > MAX_STREAM_BUFFER_BYTES {
            return Err(AccumulateError::Overflow);
        }
        match serde_json::from_slice::<CodeSections>(&self.buf) {
            Ok(sections) => Ok(Progress::Complete(sections)),
            Err(e) if e.is_eof() => Ok(Progress::Incomplete),
            Err(e) => Err(AccumulateError::Malformed(e.to_string())),
        }
    }

    /// Called when the stream ends while still incomplete.
    pub fn finish(self) -> Result<CodeSections, AccumulateError> {
        serde_json::from_slice(&self.buf).map_err(|e| AccumulateError::Malformed(e.to_string()))
    }
}

pub struct GeneratorClient {
    http: reqwest::Client,
    endpoint: String,
}

impl GeneratorClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Buffered mode: await the full body and parse it once.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<CodeSections, ClientError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status.as_u16()));
        }
        let text = response
            .text()
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| ClientError::Parse(e.to_string()))
    }

    /// Streaming mode: hand back the open response for incremental reads.
    pub async fn open_stream(
        &self,
        request: &GenerationRequest,
    ) -> Result<reqwest::Response, ClientError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status.as_u16()));
        }
        Ok(response)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    Buffered,
    Streaming,
}

/// One browser-tab's worth of generator state: the form, the viewer, and
/// the submission glue between them.
pub struct GeneratorSession {
    pub form: GeneratorForm,
    pub viewer: CodeViewer,
    pub mode: ResponseMode,
    client: GeneratorClient,
}

impl GeneratorSession {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            form: GeneratorForm::new(),
            viewer: CodeViewer::new(),
            mode: ResponseMode::Buffered,
            client: GeneratorClient::new(endpoint),
        }
    }

    /// Runs one generation cycle. Returns false (and issues no request)
    /// when local validation fails.
    pub async fn submit(&mut self) -> bool {
        if !self.form.validate() {
            return false;
        }
        self.viewer.begin_submission();
        let request = self.form.to_request(self.mode == ResponseMode::Streaming);
        match self.mode {
            ResponseMode::Buffered => self.submit_buffered(&request).await,
            ResponseMode::Streaming => self.submit_streaming(&request).await,
        }
        true
    }

    async fn submit_buffered(&mut self, request: &GenerationRequest) {
        match self.client.generate(request).await {
            Ok(sections) => {
                self.viewer.present(&sections);
                self.viewer.finish();
            }
            Err(e) => self.viewer.show_error(&e.to_string()),
        }
    }

    async fn submit_streaming(&mut self, request: &GenerationRequest) {
        let response = match self.client.open_stream(request).await {
            Ok(response) => response,
            Err(e) => {
                self.viewer.show_error(&e.to_string());
                return;
            }
        };

        let mut stream = response.bytes_stream();
        let mut accumulator = StreamAccumulator::default();
        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    self.viewer.show_error(&format!("request failed: {e}"));
                    return;
                }
            };
            self.viewer.note_first_chunk();
            match accumulator.push(&chunk) {
                Ok(Progress::Incomplete) => {}
                Ok(Progress::Complete(sections)) => {
                    self.viewer.present(&sections);
                    self.viewer.finish();
                    return;
                }
                Err(e) => {
                    self.viewer.show_error(&e.to_string());
                    return;
                }
            }
        }

        // Stream ended without ever parsing: a final attempt decides
        // between a late completion and a malformed response.
        match accumulator.finish() {
            Ok(sections) => {
                self.viewer.present(&sections);
                self.viewer.finish();
            }
            Err(e) => self.viewer.show_error(&e.to_string()),
        }
    }
}
