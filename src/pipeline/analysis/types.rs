use std::time::Duration;

use serde::Deserialize;

use super::AnalysisError;

/// Image part attached to a generation request, already base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub base64_data: String,
}

/// One prompt (plus optional image) for the upstream model.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub image: Option<InlineImage>,
}

/// Generative-language client abstraction (allows mocking)
pub trait LlmClient {
    /// Send one request and return the model's raw text answer.
    fn generate(&self, request: &GenerationRequest) -> Result<String, AnalysisError>;

    /// Provider name for logs.
    fn provider(&self) -> &'static str;
}

/// Blocks the calling thread between retry attempts.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Real wall-clock sleeper used in production.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Model answer before normalization. Every field is an optional raw JSON
/// value because upstream output is only loosely shaped; the normalizer
/// decides what a wrongly typed field becomes.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAnalysis {
    #[serde(default)]
    pub analysis: Option<serde_json::Value>,
    #[serde(default)]
    pub confidence: Option<serde_json::Value>,
    #[serde(default)]
    pub urgency: Option<serde_json::Value>,
    #[serde(default)]
    pub recommendations: Option<serde_json::Value>,
    #[serde(default)]
    pub possible_conditions: Option<serde_json::Value>,
    #[serde(default)]
    pub recommended_specialty: Option<serde_json::Value>,
}

impl RawAnalysis {
    /// String content of a field; `None` when absent or not a string.
    pub fn text(field: &Option<serde_json::Value>) -> Option<&str> {
        field.as_ref().and_then(serde_json::Value::as_str)
    }
}
