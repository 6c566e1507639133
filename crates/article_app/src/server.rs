use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use article_engine::{
    ArticlePipeline, BatchError, BatchReport, BatchSettings, ChatCompletionsBridge, ExtractError,
    ExtractionResult, LlmBridge, LlmError, LlmRequest,
};
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use extract_logging::{extract_info, extract_warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pipeline: ArticlePipeline,
    llm: Option<Arc<dyn LlmBridge>>,
    batch: BatchSettings,
}

impl AppState {
    pub fn new(
        pipeline: ArticlePipeline,
        llm: Option<Arc<dyn LlmBridge>>,
        batch: BatchSettings,
    ) -> Self {
        Self {
            pipeline,
            llm,
            batch,
        }
    }

    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let pipeline = ArticlePipeline::new(config.fetch_settings(), &config.extraction)
            .context("invalid extraction settings")?;
        let llm = match &config.llm {
            Some(settings) => {
                let bridge = ChatCompletionsBridge::new(settings.clone())
                    .context("could not build llm client")?;
                Some(Arc::new(bridge) as Arc<dyn LlmBridge>)
            }
            None => None,
        };
        Ok(Self::new(pipeline, llm, config.batch_settings()))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/extract", post(extract_handler))
        .route("/batch-extract", post(batch_handler))
        .route("/process", post(process_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    pub urls: Vec<String>,
    /// Per-URL timeout in milliseconds.
    pub timeout: Option<u64>,
    pub max_concurrent: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    pub prompt: String,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub result: String,
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

async fn extract_handler(
    State(state): State<AppState>,
    Json(request): Json<ExtractRequest>,
) -> Result<Json<ExtractionResult>, ApiError> {
    let url = request.url.trim();
    if url.is_empty() {
        return Err(ApiError::BadRequest("URL is required".to_string()));
    }
    extract_info!("extract request for {url}");
    // Dropping this future on client disconnect also drops the outbound fetch.
    let result = state.pipeline.extract(url).await?;
    Ok(Json(result))
}

async fn batch_handler(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<BatchReport>, ApiError> {
    let mut settings = state.batch.clone();
    if let Some(ms) = request.timeout {
        settings.per_url_timeout = Duration::from_millis(ms);
    }
    if let Some(max) = request.max_concurrent {
        settings.max_concurrent = max.clamp(1, settings.max_urls.max(1));
    }
    let report = state
        .pipeline
        .extract_batch(&request.urls, &settings)
        .await?;
    Ok(Json(report))
}

async fn process_handler(
    State(state): State<AppState>,
    Json(request): Json<ProcessRequest>,
) -> Result<Json<ProcessResponse>, ApiError> {
    let bridge = state.llm.as_ref().ok_or(ApiError::LlmUnavailable)?;
    let result = bridge
        .complete(&LlmRequest {
            system_prompt: request.prompt,
            user_content: request.content,
        })
        .await?;
    Ok(Json(ProcessResponse { result }))
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Fetch(String),
    Processing(String),
    Llm(String),
    LlmUnavailable,
}

impl From<ExtractError> for ApiError {
    fn from(err: ExtractError) -> Self {
        if err.is_fetch_failure() {
            ApiError::Fetch(err.to_string())
        } else {
            ApiError::Processing(err.to_string())
        }
    }
}

impl From<BatchError> for ApiError {
    fn from(err: BatchError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<LlmError> for ApiError {
    fn from(err: LlmError) -> Self {
        ApiError::Llm(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            ApiError::BadRequest(details) => (StatusCode::BAD_REQUEST, "Invalid request", details),
            ApiError::Fetch(details) => {
                (StatusCode::BAD_REQUEST, "Failed to fetch content", details)
            }
            ApiError::Processing(details) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to process content",
                details,
            ),
            ApiError::Llm(details) => (StatusCode::BAD_GATEWAY, "LLM request failed", details),
            ApiError::LlmUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "LLM not configured",
                "set LLM_API_KEY or the llm section of the config".to_string(),
            ),
        };
        extract_warn!("{} {}: {}", status.as_u16(), error, details);
        (status, Json(json!({ "error": error, "details": details }))).into_response()
    }
}
