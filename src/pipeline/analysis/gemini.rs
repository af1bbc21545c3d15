use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::types::{GenerationRequest, LlmClient};
use super::AnalysisError;

/// Hosted Generative Language API client (`models/{model}:generateContent`).
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl GeminiClient {
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Result<Self, AnalysisError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AnalysisError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
            timeout_secs,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

/// Request body for `generateContent`
#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData<'a> },
}

#[derive(Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

/// Response body from `generateContent`
#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

fn build_request_body(request: &GenerationRequest) -> GenerateContentRequest<'_> {
    let mut parts = vec![Part::Text {
        text: &request.prompt,
    }];
    if let Some(image) = &request.image {
        parts.push(Part::InlineData {
            inline_data: InlineData {
                mime_type: &image.mime_type,
                data: &image.base64_data,
            },
        });
    }
    GenerateContentRequest {
        contents: vec![Content { parts }],
        generation_config: GenerationConfig { temperature: 0.2 },
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_text(response: GenerateContentResponse) -> Result<String, AnalysisError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(AnalysisError::EmptyResponse);
    }
    Ok(text)
}

impl LlmClient for GeminiClient {
    fn generate(&self, request: &GenerationRequest) -> Result<String, AnalysisError> {
        let body = build_request_body(request);

        let response = self
            .client
            .post(self.endpoint(&request.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
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
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response.text().unwrap_or_default();
            return Err(AnalysisError::from_status(
                status.as_u16(),
                retry_after.as_deref(),
                &body,
            ));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .map_err(|e| AnalysisError::Transport(format!("Unreadable response body: {e}")))?;

        extract_text(parsed)
    }

    fn provider(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    use axum::http::{header, HeaderMap, StatusCode};
    use axum::response::IntoResponse;

    use crate::pipeline::analysis::types::InlineImage;

    /// Serve `router` on a loopback port from its own thread and runtime,
    /// so the blocking client can be driven from a plain test.
    fn spawn_stub(router: axum::Router) -> SocketAddr {
        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
                tx.send(listener.local_addr().unwrap()).unwrap();
                axum::serve(listener, router).await.unwrap();
            });
        });
        rx.recv().unwrap()
    }

    fn client_for(addr: SocketAddr) -> GeminiClient {
        GeminiClient::new(&format!("http://{addr}"), "test-key", 5).unwrap()
    }

    fn request(image: Option<InlineImage>) -> GenerationRequest {
        GenerationRequest {
            model: "gemini-1.5-flash".into(),
            prompt: "Analyze".into(),
            image,
        }
    }

    #[test]
    fn body_has_text_part_only_without_image() {
        let req = request(None);
        let json = serde_json::to_value(build_request_body(&req)).unwrap();
        let parts = json["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0]["text"], "Analyze");
        assert_eq!(json["generationConfig"]["temperature"], 0.2f32 as f64);
    }

    #[test]
    fn body_includes_inline_image_part() {
        let req = request(Some(InlineImage {
            mime_type: "image/jpeg".into(),
            base64_data: "QUJD".into(),
        }));
        let json = serde_json::to_value(build_request_body(&req)).unwrap();
        let parts = json["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/jpeg");
        assert_eq!(parts[1]["inline_data"]["data"], "QUJD");
    }

    #[test]
    fn extract_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"analysis\":"},{"text":"\"ok\"}"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(response).unwrap(), r#"{"analysis":"ok"}"#);
    }

    #[test]
    fn no_candidates_is_empty_response() {
        let response: GenerateContentResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(matches!(
            extract_text(response),
            Err(AnalysisError::EmptyResponse)
        ));
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let client = GeminiClient::new("https://example.test/", "key", 30).unwrap();
        assert_eq!(
            client.endpoint("gemini-1.5-flash"),
            "https://example.test/v1beta/models/gemini-1.5-flash:generateContent"
        );
        assert_eq!(client.timeout_secs, 30);
    }

    #[test]
    fn http_429_with_retry_after_is_rate_limited() {
        let addr = spawn_stub(axum::Router::new().fallback(|| async {
            (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, "30")],
                "Quota exceeded",
            )
        }));

        let err = client_for(addr).generate(&request(None)).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::RateLimited { retry_after: Some(d) } if d == Duration::from_secs(30)
        ));
    }

    #[test]
    fn http_429_hint_falls_back_to_body() {
        let addr = spawn_stub(axum::Router::new().fallback(|| async {
            (
                StatusCode::TOO_MANY_REQUESTS,
                r#"{"error":{"status":"RESOURCE_EXHAUSTED","details":[{"retryDelay":"4s"}]}}"#,
            )
        }));

        let err = client_for(addr).generate(&request(None)).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::RateLimited { retry_after: Some(d) } if d == Duration::from_secs(4)
        ));
    }

    #[test]
    fn server_error_is_upstream_error() {
        let addr = spawn_stub(
            axum::Router::new()
                .fallback(|| async { (StatusCode::SERVICE_UNAVAILABLE, "overloaded") }),
        );

        let err = client_for(addr).generate(&request(None)).unwrap_err();
        assert!(matches!(err, AnalysisError::Upstream { status: 503, .. }));
    }

    #[test]
    fn success_returns_candidate_text_and_sends_key() {
        let addr = spawn_stub(axum::Router::new().fallback(|headers: HeaderMap| async move {
            if headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) != Some("test-key") {
                return StatusCode::UNAUTHORIZED.into_response();
            }
            axum::Json(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "{\"analysis\":\"ok\"}"}]}}]
            }))
            .into_response()
        }));

        let text = client_for(addr).generate(&request(None)).unwrap();
        assert_eq!(text, r#"{"analysis":"ok"}"#);
    }
}
