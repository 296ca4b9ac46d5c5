use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::job::{JobDescription, JobPostRow};
use crate::state::AppState;

#[derive(Serialize)]
pub struct JobListResponse {
    pub ok: bool,
    pub jobs: Vec<JobPostRow>,
}

#[derive(Serialize)]
pub struct JobResponse {
    pub ok: bool,
    pub job: JobDescription,
}

/// GET /api/v1/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
) -> Result<Json<JobListResponse>, AppError> {
    let jobs = state.jobs.list_open().await?;
    Ok(Json(JobListResponse { ok: true, jobs }))
}

/// GET /api/v1/jobs/:job_id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobResponse>, AppError> {
    let job = state
        .jobs
        .find_description(&job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;
    Ok(Json(JobResponse { ok: true, job }))
}
