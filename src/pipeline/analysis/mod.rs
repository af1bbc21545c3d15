pub mod types;
pub mod prompt;
pub mod parser;
pub mod retry;
pub mod fallback;
pub mod normalize;
pub mod gemini;
pub mod ollama;
pub mod orchestrator;

pub use types::*;
pub use prompt::*;
pub use parser::*;
pub use retry::*;
pub use fallback::*;
pub use normalize::*;
pub use gemini::*;
pub use ollama::*;
pub use orchestrator::*;

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Upstream rate limit hit (suggested wait: {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Upstream returned error (status {status}): {body}")]
    Upstream { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Upstream returned an empty response")]
    EmptyResponse,

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("JSON parsing error: {0}")]
    JsonParsing(String),

    #[error("Analysis forced to fail by debug sentinel")]
    ForcedFailure,
}

impl AnalysisError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, AnalysisError::RateLimited { .. })
    }

    /// Response arrived but could not be turned into an analysis.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            AnalysisError::EmptyResponse
                | AnalysisError::MalformedResponse(_)
                | AnalysisError::JsonParsing(_)
        )
    }
}

impl AnalysisError {
    /// Map a non-success upstream HTTP answer to an error.
    ///
    /// 429 (or a `RESOURCE_EXHAUSTED` body) is a rate limit; its wait hint
    /// comes from the `Retry-After` header, else from the body.
    pub fn from_status(status: u16, retry_after_header: Option<&str>, body: &str) -> Self {
        if status == 429 || body.contains("RESOURCE_EXHAUSTED") {
            let retry_after = retry_after_header
                .and_then(|h| h.trim().parse::<f64>().ok())
                .and_then(seconds_to_duration)
                .or_else(|| parse_retry_hint(body));
            return AnalysisError::RateLimited { retry_after };
        }
        AnalysisError::Upstream {
            status,
            body: body.chars().take(500).collect(),
        }
    }
}

/// `"retryDelay": "12s"` in a structured error body.
static RETRY_DELAY_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""retryDelay"\s*:\s*"(\d+(?:\.\d+)?)s""#).expect("valid regex")
});

/// "Please retry in 37.2s" / "retry in 5 seconds" in an error message.
static RETRY_IN_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)retry\s+in\s+(\d+(?:\.\d+)?)\s*s").expect("valid regex")
});

/// Extract the upstream's suggested wait from an error body.
pub fn parse_retry_hint(body: &str) -> Option<Duration> {
    [&*RETRY_DELAY_FIELD, &*RETRY_IN_PHRASE]
        .iter()
        .find_map(|re| re.captures(body))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .and_then(seconds_to_duration)
}

/// `None` for negative, non-finite or out-of-range values.
fn seconds_to_duration(secs: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(secs).ok()
}
