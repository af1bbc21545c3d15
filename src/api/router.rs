//! API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.
//!
//! Middleware stack (outermost → innermost):
//! 1. Rate limiter → 2. Access logger

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;
use crate::models::MAX_IMAGE_BYTES;

/// Symptom submissions carry a base64 image (4/3 expansion) plus the form.
const ANALYZE_BODY_LIMIT: usize = MAX_IMAGE_BYTES / 3 * 4 + 1024 * 1024;

/// Build the API router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn api_router(core: Arc<CoreState>) -> Router {
    build_router(ApiContext::new(core))
}

/// Build router from pre-constructed `ApiContext` (custom rate limits in tests).
pub(crate) fn build_router(ctx: ApiContext) -> Router {
    // Layers are applied from bottom (innermost) to top (outermost):
    //   Extension (outermost) → Rate limit → Access log (innermost) → Handler
    //
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let routes = Router::new()
        .route("/health", get(endpoints::health::check))
        .route(
            "/symptoms/analyze",
            post(endpoints::symptoms::analyze).layer(DefaultBodyLimit::max(ANALYZE_BODY_LIMIT)),
        )
        .route("/symptoms/:id", get(endpoints::symptoms::detail))
        .route(
            "/practitioners",
            get(endpoints::practitioners::list).post(endpoints::practitioners::create),
        )
        .route(
            "/clinics",
            get(endpoints::clinics::list).post(endpoints::clinics::create),
        )
        .route(
            "/clinics/:id/queue",
            get(endpoints::clinics::queue_status).post(endpoints::clinics::join),
        )
        .route("/clinics/:id/queue/next", post(endpoints::clinics::serve_next))
        .route("/patients", post(endpoints::patients::create))
        .route("/patients/:id/qr", get(endpoints::patients::qr))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::rate::limit))
        // Extension must be outermost so middleware can extract ApiContext
        .layer(axum::Extension(ctx));

    Router::new().nest("/api", routes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::api::test_support::test_core;
    use crate::api::types::RateLimiter;

    const DERM_RESPONSE: &str = r#"{"analysis":"Looks like eczema","confidence":81,
        "urgency":"routine","recommendations":"See a dermatologist",
        "possibleConditions":["Eczema"],"recommendedSpecialty":"Dermatology"}"#;

    struct TestApp {
        router: Router,
        _dir: tempfile::TempDir,
    }

    impl TestApp {
        fn new(response: &str) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let core = test_core(dir.path(), response);
            Self {
                router: api_router(core),
                _dir: dir,
            }
        }

        async fn send(&self, req: Request<Body>) -> (StatusCode, serde_json::Value) {
            let response = self.router.clone().oneshot(req).await.unwrap();
            let status = response.status();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
            (status, json)
        }

        async fn get(&self, uri: &str) -> (StatusCode, serde_json::Value) {
            self.send(Request::get(uri).body(Body::empty()).unwrap()).await
        }

        async fn post(&self, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
            self.send(
                Request::post(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
        }

        async fn clinic(&self, name: &str, avg: u32) -> String {
            let (status, json) = self
                .post("/api/clinics", serde_json::json!({"name": name, "avgConsultMinutes": avg}))
                .await;
            assert_eq!(status, StatusCode::CREATED);
            json["id"].as_str().unwrap().to_string()
        }
    }

    #[tokio::test]
    async fn health_reports_model() {
        let app = TestApp::new("{}");
        let (status, json) = app.get("/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["model"], "test-model");
    }

    #[tokio::test]
    async fn analyze_returns_model_result_and_practitioner() {
        let app = TestApp::new(DERM_RESPONSE);
        let (status, _) = app
            .post(
                "/api/practitioners",
                serde_json::json!({"name": "Dr. Skin", "specialty": "dermatology"}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, json) = app
            .post(
                "/api/symptoms/analyze",
                serde_json::json!({"description": "Itchy dry patches", "severity": "mild"}),
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["source"], "model");
        assert_eq!(json["result"]["confidence"], 81);
        assert_eq!(json["result"]["recommendedSpecialty"], "Dermatology");
        assert_eq!(json["practitioner"]["name"], "Dr. Skin");

        let report_id = json["reportId"].as_str().unwrap();
        let (status, stored) = app.get(&format!("/api/symptoms/{report_id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stored["report"]["description"], "Itchy dry patches");
        assert_eq!(stored["analysis"]["source"], "model");
    }

    #[tokio::test]
    async fn failure_sentinel_yields_fallback() {
        let app = TestApp::new(DERM_RESPONSE);
        let (status, json) = app
            .post(
                "/api/symptoms/analyze",
                serde_json::json!({"description": "FAIL_API", "severity": "moderate"}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["source"], "fallback");
        assert_eq!(json["result"]["recommendedSpecialty"], "General Medicine");
        assert!(json["practitioner"].is_null());
    }

    #[tokio::test]
    async fn analyze_accepts_multi_megabyte_image() {
        use base64::Engine as _;

        let app = TestApp::new(DERM_RESPONSE);
        let image = base64::engine::general_purpose::STANDARD.encode(vec![7u8; 3 * 1024 * 1024]);
        let (status, json) = app
            .post(
                "/api/symptoms/analyze",
                serde_json::json!({
                    "description": "Spreading rash on my back",
                    "severity": "moderate",
                    "image": image,
                    "imageMimeType": "image/jpeg",
                }),
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["source"], "model");
        assert_eq!(json["result"]["recommendedSpecialty"], "Dermatology");
    }

    #[tokio::test]
    async fn analyze_rejects_blank_description() {
        let app = TestApp::new("{}");
        let (status, json) = app
            .post(
                "/api/symptoms/analyze",
                serde_json::json!({"description": "  ", "severity": "mild"}),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn analyze_rejects_unknown_severity() {
        let app = TestApp::new("{}");
        let (status, json) = app
            .post(
                "/api/symptoms/analyze",
                serde_json::json!({"description": "Cough", "severity": "extreme"}),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn symptom_detail_validates_id() {
        let app = TestApp::new("{}");
        let (status, _) = app.get("/api/symptoms/not-a-uuid").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, json) = app
            .get(&format!("/api/symptoms/{}", uuid::Uuid::new_v4()))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn practitioners_filter_by_specialty() {
        let app = TestApp::new("{}");
        app.post(
            "/api/practitioners",
            serde_json::json!({"name": "Dr. Heart", "specialty": "Cardiology"}),
        )
        .await;
        app.post(
            "/api/practitioners",
            serde_json::json!({"name": "Dr. General", "specialty": "General Medicine"}),
        )
        .await;

        let (status, json) = app.get("/api/practitioners?specialty=Cardiology").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["name"], "Dr. Heart");

        let (status, _) = app.get("/api/practitioners?specialty=Astrology").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn queue_flow_over_http() {
        let app = TestApp::new("{}");
        let clinic_id = app.clinic("Riverside", 10).await;

        let (status, first) = app
            .post(
                &format!("/api/clinics/{clinic_id}/queue"),
                serde_json::json!({"patientName": "Ann"}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(first["ticketNumber"], 1);
        assert_eq!(first["estimatedWaitMinutes"], 0);

        let (_, second) = app
            .post(
                &format!("/api/clinics/{clinic_id}/queue"),
                serde_json::json!({"patientName": "Ben"}),
            )
            .await;
        assert_eq!(second["position"], 2);
        assert_eq!(second["estimatedWaitMinutes"], 10);

        let (status, snapshot) = app.get(&format!("/api/clinics/{clinic_id}/queue")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(snapshot["waiting"].as_array().unwrap().len(), 2);
        assert_eq!(snapshot["estimatedWaitMinutes"], 20);

        let (status, served) = app
            .post(&format!("/api/clinics/{clinic_id}/queue/next"), serde_json::json!({}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(served["served"]["patientName"], "Ann");

        let (_, clinics) = app.get("/api/clinics").await;
        assert_eq!(clinics[0]["name"], "Riverside");
    }

    #[tokio::test]
    async fn queue_for_unknown_clinic_is_404() {
        let app = TestApp::new("{}");
        let (status, _) = app
            .post(
                &format!("/api/clinics/{}/queue", uuid::Uuid::new_v4()),
                serde_json::json!({"patientName": "Ann"}),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn patient_qr_is_svg() {
        let app = TestApp::new("{}");
        let (status, patient) = app
            .post("/api/patients", serde_json::json!({"fullName": "Amina Yusuf"}))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = patient["id"].as_str().unwrap();

        let response = app
            .router
            .clone()
            .oneshot(
                Request::get(format!("/api/patients/{id}/qr"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("content-type").unwrap(), "image/svg+xml");
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(String::from_utf8_lossy(&bytes).contains("<svg"));
    }

    #[tokio::test]
    async fn rate_limit_returns_429_per_client() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ApiContext::with_rate_limiter(
            test_core(dir.path(), "{}"),
            RateLimiter::with_limits(1, 100),
        );
        let router = build_router(ctx);

        let request = |ip: &str| {
            Request::get("/api/health")
                .header("X-Forwarded-For", ip)
                .body(Body::empty())
                .unwrap()
        };

        let ok = router.clone().oneshot(request("198.51.100.1")).await.unwrap();
        assert_eq!(ok.status(), StatusCode::OK);

        let limited = router.clone().oneshot(request("198.51.100.1")).await.unwrap();
        assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(limited.headers().get("Retry-After").unwrap(), "60");

        let other = router.oneshot(request("198.51.100.2")).await.unwrap();
        assert_eq!(other.status(), StatusCode::OK);
    }
}
