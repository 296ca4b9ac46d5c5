use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::header,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::applicant::ApplicantRow;
use crate::models::null_as_default;
use crate::screening::extractor::PDF_MEDIA_TYPE;
use crate::screening::models::{CvData, MatchAnalysis};
use crate::screening::pipeline::SubmitApplicationRequest;
use crate::state::AppState;
use crate::storage::StorageError;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractRequest {
    #[serde(default, alias = "cvUrl", deserialize_with = "null_as_default")]
    pub storage_key: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default, alias = "cvUrl", deserialize_with = "null_as_default")]
    pub storage_key: String,
    #[serde(default, alias = "job_id", deserialize_with = "null_as_default")]
    pub job_id: String,
}

#[derive(Deserialize)]
pub struct DownloadQuery {
    #[serde(default, deserialize_with = "null_as_default")]
    pub key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractResponse {
    pub ok: bool,
    pub cv_data: CvData,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub ok: bool,
    pub cv_data: CvData,
    pub analysis: MatchAnalysis,
}

#[derive(Serialize)]
pub struct SubmitResponse {
    pub ok: bool,
    pub application: ApplicantRow,
}

/// POST /api/v1/cv/extract
pub async fn handle_extract(
    State(state): State<AppState>,
    payload: Result<Json<ExtractRequest>, JsonRejection>,
) -> Result<Json<ExtractResponse>, AppError> {
    let Json(req) = payload?;
    let cv_data = state.screening().extract(&req.storage_key).await?;
    Ok(Json(ExtractResponse { ok: true, cv_data }))
}

/// POST /api/v1/cv/analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let Json(req) = payload?;
    let (cv_data, analysis) = state
        .screening()
        .analyze(&req.storage_key, &req.job_id)
        .await?;
    Ok(Json(AnalyzeResponse {
        ok: true,
        cv_data,
        analysis,
    }))
}

/// POST /api/v1/applications
pub async fn handle_submit(
    State(state): State<AppState>,
    payload: Result<Json<SubmitApplicationRequest>, JsonRejection>,
) -> Result<Json<SubmitResponse>, AppError> {
    let Json(req) = payload?;
    let application = state.screening().submit(req).await?;
    Ok(Json(SubmitResponse {
        ok: true,
        application,
    }))
}

/// GET /api/v1/cv/download?key=
pub async fn handle_download(
    State(state): State<AppState>,
    query: Result<Query<DownloadQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(params) = query?;
    let key = params.key.trim();
    if key.is_empty() {
        return Err(AppError::Validation("key is required".to_string()));
    }

    let bytes = state.storage.get_object(key).await.map_err(|e| match e {
        StorageError::NotFound(k) => AppError::NotFound(format!("CV '{k}' not found")),
        other => AppError::Internal(anyhow::anyhow!(other)),
    })?;

    let file_name = key.rsplit('/').next().unwrap_or(key).replace('"', "");
    Ok((
        [
            (header::CONTENT_TYPE, PDF_MEDIA_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{file_name}\""),
            ),
        ],
        bytes,
    ))
}
