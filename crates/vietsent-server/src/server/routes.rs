use crate::server::app::AppState;
use crate::service::ClassifyError;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, warn};
use vietsent_classifiers::ClassificationResult;
use vietsent_core::{HistoryRecord, Sentiment};

// ============================================================================
// Health and metrics
// ============================================================================

pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
    }))
}

pub async fn metrics(State(state): State<AppState>) -> String {
    state.metrics.render()
}

// ============================================================================
// Classification
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SentimentRequest {
    pub text: String,
}

/// Recorded classification as returned to clients
#[derive(Debug, Serialize, Deserialize)]
pub struct SentimentResponse {
    pub text: String,
    pub sentiment: Sentiment,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

pub async fn classify(
    State(state): State<AppState>,
    payload: Result<Json<SentimentRequest>, JsonRejection>,
) -> Result<Json<SentimentResponse>, AppError> {
    let Json(req) = payload.map_err(|rejection| AppError::InvalidRequest(rejection.body_text()))?;

    let classified = state.service.classify(&req.text).await?;
    let record = classified.record;

    Ok(Json(SentimentResponse {
        text: record.text,
        sentiment: record.sentiment,
        confidence: record.confidence,
        created_at: record.created_at,
        warning: classified.warning.map(|reason| format!("model unavailable: {reason}")),
    }))
}

// ============================================================================
// History
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

pub async fn list_history(
    State(state): State<AppState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<Vec<HistoryRecord>>, AppError> {
    let Query(query) = query.map_err(|rejection| AppError::InvalidRequest(rejection.body_text()))?;

    let max = state.history_max_limit;
    let limit = match query.limit {
        None => state.history_default_limit,
        Some(limit) => usize::try_from(limit)
            .ok()
            .filter(|limit| (1..=max).contains(limit))
            .ok_or_else(|| {
                AppError::InvalidRequest(format!("limit must be between 1 and {max}"))
            })?,
    };

    let records = state.service.list_recent(limit).await.map_err(|e| {
        error!(error = %e, "Failed to list history");
        AppError::InternalError(e.to_string())
    })?;
    Ok(Json(records))
}

pub async fn clear_history(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.service.clear().await.map_err(|e| {
        error!(error = %e, "Failed to clear history");
        AppError::InternalError(e.to_string())
    })?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Errors
// ============================================================================

pub enum AppError {
    InvalidRequest(String),
    /// Classified but not recorded
    Unpersisted {
        result: ClassificationResult,
        message: String,
    },
    InternalError(String),
}

impl From<ClassifyError> for AppError {
    fn from(err: ClassifyError) -> Self {
        match err {
            ClassifyError::Validation(msg) => AppError::InvalidRequest(msg),
            ClassifyError::Persistence { result, source } => {
                warn!(error = %source, "Returning unrecorded classification");
                AppError::Unpersisted {
                    result,
                    message: source.to_string(),
                }
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::InvalidRequest(msg) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": {
                        "message": msg,
                        "type": "invalid_request_error",
                    }
                }),
            ),
            AppError::Unpersisted { result, message } => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({
                    "error": {
                        "message": message,
                        "type": "storage_error",
                    },
                    "result": result,
                }),
            ),
            AppError::InternalError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": {
                        "message": msg,
                        "type": "internal_error",
                    }
                }),
            ),
        };

        (status, Json(body)).into_response()
    }
}
