use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or malformed request parameters.
    #[error("Bad request: {0}")]
    Validation(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation(_) => "BAD_REQUEST",
            AppError::ExtractionFailed(_) => "EXTRACTION_FAILED",
            AppError::JobNotFound(_) => "JOB_NOT_FOUND",
            AppError::AnalysisFailed(_) => "ANALYSIS_FAILED",
            AppError::MissingFields(_) => "MISSING_FIELDS",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::RateLimited { .. } => "RATE_LIMITED",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) | AppError::JobNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::MissingFields(_) => StatusCode::BAD_REQUEST,
            AppError::ExtractionFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::AnalysisFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Extractor rejections are reported in the same envelope as every other error.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                "A database error occurred, please try again".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "An internal server error occurred".to_string()
            }
            AppError::ExtractionFailed(msg) => {
                tracing::warn!("CV extraction failed: {msg}");
                format!("Failed to extract CV data: {msg}")
            }
            AppError::AnalysisFailed(msg) => {
                tracing::warn!("Match analysis failed: {msg}");
                format!("Failed to generate analysis: {msg}")
            }
            AppError::Unauthorized => "Authentication required".to_string(),
            other => other.to_string(),
        };

        let body = Json(json!({
            "ok": false,
            "error": message,
            "code": code,
        }));

        let mut response = (status, body).into_response();
        if let AppError::RateLimited { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }
        response
    }
}
