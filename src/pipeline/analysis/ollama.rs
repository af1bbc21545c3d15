use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::types::{GenerationRequest, LlmClient};
use super::AnalysisError;

/// Ollama HTTP client for local multimodal inference.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaClient {
    /// Create a new OllamaClient pointing at a local Ollama instance.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, AnalysisError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AnalysisError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        })
    }
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<&'a str>,
    format: &'a str,
    stream: bool,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

fn build_request_body(request: &GenerationRequest) -> OllamaGenerateRequest<'_> {
    OllamaGenerateRequest {
        model: &request.model,
        prompt: &request.prompt,
        images: request
            .image
            .iter()
            .map(|image| image.base64_data.as_str())
            .collect(),
        format: "json",
        stream: false,
    }
}

impl LlmClient for OllamaClient {
    fn generate(&self, request: &GenerationRequest) -> Result<String, AnalysisError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = build_request_body(request);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    AnalysisError::Transport(format!(
                        "Cannot connect to Ollama at {}",
                        self.base_url
                    ))
                } else if e.is_timeout() {
                    AnalysisError::Transport(format!(
                        "Request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    AnalysisError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AnalysisError::from_status(status.as_u16(), None, &body));
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .map_err(|e| AnalysisError::Transport(format!("Unreadable response body: {e}")))?;

        if parsed.response.trim().is_empty() {
            return Err(AnalysisError::EmptyResponse);
        }
        Ok(parsed.response)
    }

    fn provider(&self) -> &'static str {
        "ollama"
    }
}

/// Mock LLM client for testing. Plays back a script of outcomes, then
/// keeps answering with the default response.
pub struct MockLlmClient {
    response: String,
    script: Mutex<VecDeque<Result<String, AnalysisError>>>,
    calls: AtomicUsize,
    last_request: Mutex<Option<GenerationRequest>>,
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            script: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Queue outcomes returned, in order, before the default response.
    pub fn with_script(self, script: Vec<Result<String, AnalysisError>>) -> Self {
        if let Ok(mut queue) = self.script.lock() {
            queue.extend(script);
        }
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.last_request.lock().ok().and_then(|r| r.clone())
    }
}

impl LlmClient for MockLlmClient {
    fn generate(&self, request: &GenerationRequest) -> Result<String, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }
        let scripted = self.script.lock().ok().and_then(|mut q| q.pop_front());
        scripted.unwrap_or_else(|| Ok(self.response.clone()))
    }

    fn provider(&self) -> &'static str {
        "mock"
    }
}
