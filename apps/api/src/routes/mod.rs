pub mod health;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::ocr::handlers::handle_extract_text;
use crate::proposal::handlers::handle_generate_proposal;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/ocr/extract", post(handle_extract_text))
        .route("/api/proposal/generate", post(handle_generate_proposal))
        .layer(body_limit)
        .with_state(state)
}

/// CORS policy for the configured browser origins. `*` allows any origin.
///
/// Credentials are allowed, so methods and headers are mirrored from the
/// preflight rather than wildcarded.
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    if origins.iter().any(|o| o == "*") {
        return Ok(CorsLayer::permissive());
    }

    let origins = origins
        .iter()
        .map(|o| HeaderValue::from_str(o).with_context(|| format!("Invalid CORS origin '{o}'")))
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use image::{DynamicImage, ImageFormat, RgbImage};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::llm_client::{LlmError, TextGenerator};
    use crate::ocr::detector::{BoundingRegion, DetectedRegion, DetectionError, TextDetector};

    const BOUNDARY: &str = "----upfreelance-test-boundary";

    struct EchoGenerator;

    #[async_trait]
    impl TextGenerator for EchoGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
            Ok(format!("**Generated** for: {}", prompt.lines().nth(2).unwrap_or("")))
        }
    }

    struct DownGenerator;

    #[async_trait]
    impl TextGenerator for DownGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
            Err(LlmError::Api {
                status: 401,
                message: "API key not valid".to_string(),
            })
        }
    }

    struct StaticDetector(Vec<(&'static str, f64)>);

    #[async_trait]
    impl TextDetector for StaticDetector {
        async fn detect(
            &self,
            _image: Arc<RgbImage>,
        ) -> Result<Vec<DetectedRegion>, DetectionError> {
            Ok(self
                .0
                .iter()
                .map(|(text, confidence)| DetectedRegion {
                    bounding_region: BoundingRegion {
                        left: 0,
                        top: 0,
                        width: 1,
                        height: 1,
                    },
                    text: text.to_string(),
                    confidence: *confidence,
                })
                .collect())
        }
    }

    fn test_config(max_upload_bytes: usize) -> Config {
        let mut config = Config::from_lookup(|key| match key {
            "GEMINI_API_KEY" => Some("test-key".to_string()),
            _ => None,
        })
        .unwrap();
        config.max_upload_bytes = max_upload_bytes;
        config
    }

    fn app_with(generator: Arc<dyn TextGenerator>, detector: Arc<dyn TextDetector>) -> Router {
        build_router(AppState {
            config: test_config(1024 * 1024),
            generator,
            detector,
        })
    }

    fn default_app() -> Router {
        app_with(
            Arc::new(EchoGenerator),
            Arc::new(StaticDetector(vec![("a", 0.9), ("b", 0.5)])),
        )
    }

    fn png_bytes() -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(4, 4))
            .write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn multipart_request(field_name: &str, payload: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{field_name}\"; filename=\"scan.png\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
        body.extend_from_slice(payload);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method(Method::POST)
            .uri("/api/ocr/extract")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn proposal_request(body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/proposal/generate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_ok() {
        let response = default_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_ocr_extract_returns_aggregated_result() {
        let response = default_app()
            .oneshot(multipart_request("file", &png_bytes()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["text"], "a b");
        assert!((body["confidence"].as_f64().unwrap() - 0.7).abs() < 1e-9);
        assert_eq!(body["lowConfidenceWords"], json!(["b"]));
        assert_eq!(body["error"], Value::Null);
    }

    #[tokio::test]
    async fn test_ocr_extract_non_image_is_reported_in_body() {
        let response = default_app()
            .oneshot(multipart_request("file", b"plain text, not pixels"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("Failed to process image"));
        assert_eq!(body["confidence"], Value::Null);
        assert_eq!(body["lowConfidenceWords"], json!([]));
    }

    #[tokio::test]
    async fn test_ocr_extract_blank_image_reports_no_text() {
        let app = app_with(Arc::new(EchoGenerator), Arc::new(StaticDetector(vec![])));

        let response = app
            .oneshot(multipart_request("file", &png_bytes()))
            .await
            .unwrap();

        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["text"], Value::Null);
        assert_eq!(body["confidence"], Value::Null);
        assert_eq!(body["error"], "No text could be extracted from the image");
    }

    #[tokio::test]
    async fn test_ocr_extract_without_file_field_is_bad_request() {
        let response = default_app()
            .oneshot(multipart_request("attachment", &png_bytes()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_ocr_extract_non_multipart_body_is_rejected() {
        let response = default_app()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/ocr/extract")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "REJECTED_REQUEST");
        assert!(body["error"]["message"].is_string());
    }

    #[tokio::test]
    async fn test_ocr_extract_over_limit_is_rejected() {
        let app = build_router(AppState {
            config: test_config(64),
            generator: Arc::new(EchoGenerator),
            detector: Arc::new(StaticDetector(vec![])),
        });

        let response = app
            .oneshot(multipart_request("file", &[0u8; 4096]))
            .await
            .unwrap();

        assert_ne!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["error"]["code"], "REJECTED_REQUEST");
    }

    #[tokio::test]
    async fn test_proposal_generate_strips_markup() {
        let response = default_app()
            .oneshot(proposal_request(json!({
                "jobTitle": "Logo Design",
                "jobDescription": "Need a logo",
                "includePortfolio": true
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["proposal"], "Generated for: Title: Logo Design");
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn test_proposal_generate_failure_is_reported_in_body() {
        let app = app_with(Arc::new(DownGenerator), Arc::new(StaticDetector(vec![])));

        let response = app
            .oneshot(proposal_request(json!({
                "jobTitle": "Logo Design",
                "jobDescription": "Need a logo"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "API error (status 401): API key not valid");
        assert!(body.get("proposal").is_none());
    }

    #[tokio::test]
    async fn test_proposal_generate_malformed_json_is_rejected() {
        let response = default_app()
            .oneshot(proposal_request(json!({ "jobTitle": "Logo Design" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json_body(response).await["error"]["code"], "REJECTED_REQUEST");
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origin_with_credentials() {
        let origins = vec!["http://localhost:3000".to_string()];
        let app = default_app().layer(cors_layer(&origins).unwrap());

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/proposal/generate")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:3000"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    }

    #[tokio::test]
    async fn test_cors_ignores_unknown_origin() {
        let origins = vec!["http://localhost:3000".to_string()];
        let app = default_app().layer(cors_layer(&origins).unwrap());

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/proposal/generate")
                    .header(header::ORIGIN, "https://evil.example")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[test]
    fn test_cors_rejects_invalid_origin() {
        assert!(cors_layer(&["bad\norigin".to_string()]).is_err());
    }
}
