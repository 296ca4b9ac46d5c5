use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Request, State,
    },
    http::header,
    middleware::Next,
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::applicant::{ApplicantRow, ApplicantStatus, ApplicantWithJobRow};
use crate::models::null_as_default;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ApplicantListResponse {
    pub ok: bool,
    pub applicants: Vec<ApplicantWithJobRow>,
}

#[derive(Deserialize)]
pub struct StatusUpdate {
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
}

#[derive(Serialize)]
pub struct StatusUpdateResponse {
    pub ok: bool,
    pub applicant: ApplicantRow,
}

/// Guards the admin routes with the static bearer token.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    match presented {
        Some(token) if token_matches(token, &state.config.admin_api_token) => {
            Ok(next.run(request).await)
        }
        _ => {
            warn!("Admin token missing or invalid on {}", request.uri().path());
            Err(AppError::Unauthorized)
        }
    }
}

/// Compares SHA-256 digests in constant time so neither content nor length leaks through timing.
fn token_matches(presented: &str, expected: &str) -> bool {
    if presented.is_empty() || expected.is_empty() {
        return false;
    }
    let presented = Sha256::digest(presented.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    presented.ct_eq(&expected).into()
}

/// GET /api/v1/admin/applicants
pub async fn handle_list_applicants(
    State(state): State<AppState>,
) -> Result<Json<ApplicantListResponse>, AppError> {
    let applicants = state.applicants.list_with_jobs().await?;
    Ok(Json(ApplicantListResponse {
        ok: true,
        applicants,
    }))
}

/// PATCH /api/v1/admin/applicants/:id/status
pub async fn handle_update_status(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<StatusUpdate>, JsonRejection>,
) -> Result<Json<StatusUpdateResponse>, AppError> {
    let Path(id) = path?;
    let Json(req) = payload?;
    let status = ApplicantStatus::parse(&req.status).ok_or_else(|| {
        AppError::Validation(format!(
            "status must be one of review, interview, hired, rejected (got '{}')",
            req.status
        ))
    })?;

    let applicant = state
        .applicants
        .update_status(id, status)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Applicant {id} not found")))?;

    info!("Applicant {id} moved to {}", status.as_str());
    Ok(Json(StatusUpdateResponse {
        ok: true,
        applicant,
    }))
}
