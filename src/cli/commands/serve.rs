//! HTTP API server.
//!
//! Exposes the analysis pipeline as `POST /analyze` plus a health check.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::AnalyzerError;
use crate::orchestrator::{AnalyzeRequest, Orchestrator};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, warn};

/// Shared application state.
pub struct AppState {
    pub orchestrator: Orchestrator,
}

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Serve, &settings) {
        Output::warning(&e.to_string());
    }

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);

    let state = Arc::new(AppState {
        orchestrator: Orchestrator::new(settings)?,
    });

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("YouTube Video Analyzer API");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Analyze", "POST /analyze");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, router(state)).await?;

    Ok(())
}

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/analyze", post(analyze))
        .layer(cors)
        .with_state(state)
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(ErrorResponse { error: message })).into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true }))
}

async fn analyze(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!("Rejected request body: {}", rejection.body_text());
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    match state.orchestrator.analyze(&request).await {
        Ok(response) => Json(response).into_response(),
        Err(AnalyzerError::InvalidInput(msg)) => error_response(StatusCode::BAD_REQUEST, msg),
        Err(e) => {
            error!("Analysis failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::{CompletionClient, CompletionRequest};
    use crate::subtitles::{
        ExtractionOutcome, ExtractionTier, FailureReason, PipelineStatus, SubtitleExtractor,
    };
    use async_trait::async_trait;
    use std::path::Path;

    struct StaticExtractor {
        payload: Option<&'static str>,
    }

    #[async_trait]
    impl SubtitleExtractor for StaticExtractor {
        async fn extract(&self, _url: &str, tier: &ExtractionTier, _workdir: &Path) -> ExtractionOutcome {
            match self.payload {
                Some(text) => ExtractionOutcome {
                    tier: tier.clone(),
                    payload: Some(text.to_string()),
                    diagnostics: String::new(),
                    reason: None,
                    command: Vec::new(),
                },
                None => ExtractionOutcome::failed(tier.clone(), FailureReason::NoTrack, "", Vec::new()),
            }
        }
    }

    struct EchoCompletion;

    #[async_trait]
    impl CompletionClient for EchoCompletion {
        async fn complete(&self, _request: CompletionRequest) -> crate::Result<String> {
            Ok("summary".to_string())
        }
    }

    fn state(payload: Option<&'static str>, temp: &Path) -> Arc<AppState> {
        let mut settings = Settings::default();
        settings.general.temp_dir = temp.to_string_lossy().into_owned();
        let orchestrator = Orchestrator::with_components(
            settings,
            Arc::new(StaticExtractor { payload }),
            Arc::new(EchoCompletion),
        )
        .unwrap();
        Arc::new(AppState { orchestrator })
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = health().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!({ "ok": true }));
    }

    #[tokio::test]
    async fn test_analyze_ok() {
        let dir = tempfile::tempdir().unwrap();
        let request = AnalyzeRequest::new("https://youtube.com/watch?v=X");

        let response = analyze(State(state(Some("WEBVTT\n\nHello"), dir.path())), Ok(Json(request))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["url"], "https://youtube.com/watch?v=X");
        assert_eq!(body["status"], "ok");
        assert_eq!(body["transcript"], "Hello");
        assert_eq!(body["answer"], "summary");
        assert!(body.get("error").is_none());
        assert!(body.get("debug").is_none());
    }

    #[tokio::test]
    async fn test_analyze_failure_status_is_200() {
        let dir = tempfile::tempdir().unwrap();
        let request = AnalyzeRequest::new("https://youtube.com/watch?v=X");

        let response = analyze(State(state(None, dir.path())), Ok(Json(request))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], PipelineStatus::NoSubtitles.as_str());
        assert!(body.get("transcript").is_none());
        assert!(body.get("answer").is_none());
    }

    #[tokio::test]
    async fn test_analyze_invalid_url_is_400() {
        let dir = tempfile::tempdir().unwrap();
        let request = AnalyzeRequest::new("   ");

        let response = analyze(State(state(None, dir.path())), Ok(Json(request))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_malformed_body_is_400() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(state(None, dir.path()));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = reqwest::Client::new();
        let base = format!("http://{}", addr);

        let response = client
            .post(format!("{}/analyze", base))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
        let body: serde_json::Value = response.json().await.unwrap();
        assert!(body["error"].is_string());

        let response = client
            .post(format!("{}/analyze", base))
            .json(&serde_json::json!({ "lang": "ru" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);

        let response = client.get(format!("{}/health", base)).send().await.unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }
}
