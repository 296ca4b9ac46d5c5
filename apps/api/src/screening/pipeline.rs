//! Application Submission Orchestrator.
//!
//! Flow: validate input → fetch CV → extract CvData → load job → analyze match →
//!       completeness check → persist applicant.
//!
//! Nothing is persisted until every earlier step has succeeded, so a failure at
//! any point leaves no trace. No step is retried here; the caller resubmits.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::applicants::store::ApplicantStore;
use crate::errors::AppError;
use crate::jobs::store::JobStore;
use crate::llm_client::TextGenerator;
use crate::models::applicant::{ApplicantRow, NewApplicant};
use crate::models::job::JobDescription;
use crate::models::null_as_default;
use crate::screening::analyzer::analyze_match;
use crate::screening::extractor::extract_cv_data;
use crate::screening::model_output::ModelOutputError;
use crate::screening::models::{CvData, MatchAnalysis};
use crate::storage::{fetch_pdf_base64, ObjectStore, StorageError};

/// Request body for submitting an application.
/// Missing or null fields deserialize as empty so that the pipeline, not the JSON
/// extractor, decides what is missing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmitApplicationRequest {
    #[serde(alias = "cvUrl", deserialize_with = "null_as_default")]
    pub storage_key: String,
    #[serde(alias = "job_id", deserialize_with = "null_as_default")]
    pub job_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(deserialize_with = "null_as_default")]
    pub phone: String,
    pub cover_letter: Option<String>,
}

#[derive(Debug, Error)]
pub enum ScreeningError {
    #[error("{0}")]
    BadRequest(String),

    #[error("could not fetch CV: {0}")]
    Storage(#[from] StorageError),

    #[error("CV extraction failed: {0}")]
    Extraction(ModelOutputError),

    #[error("job '{0}' not found")]
    JobNotFound(String),

    #[error("match analysis failed: {0}")]
    Analysis(ModelOutputError),

    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("persistence failed: {0}")]
    Persistence(#[from] sqlx::Error),
}

impl From<ScreeningError> for AppError {
    fn from(err: ScreeningError) -> Self {
        match err {
            ScreeningError::BadRequest(msg) => AppError::Validation(msg),
            ScreeningError::Storage(e) => AppError::ExtractionFailed(storage_reason(&e)),
            ScreeningError::Extraction(e) => AppError::ExtractionFailed(public_reason(&e)),
            ScreeningError::JobNotFound(id) => AppError::JobNotFound(id),
            ScreeningError::Analysis(e) => AppError::AnalysisFailed(public_reason(&e)),
            ScreeningError::MissingFields(fields) => {
                AppError::MissingFields(fields.into_iter().map(String::from).collect())
            }
            ScreeningError::Persistence(e) => AppError::Database(e),
        }
    }
}

/// Client-facing reason for a CV fetch failure. Storage backend details stay in the logs.
fn storage_reason(err: &StorageError) -> String {
    match err {
        StorageError::NotFound(_) => "the uploaded CV could not be found".to_string(),
        other => {
            tracing::error!("CV fetch failed: {other}");
            "the uploaded CV could not be retrieved".to_string()
        }
    }
}

/// Client-facing reason for a model stage failure. Transport details stay in the logs.
fn public_reason(err: &ModelOutputError) -> String {
    match err {
        ModelOutputError::Model(e) => {
            tracing::error!("Model call failed: {e}");
            "the model service is unavailable".to_string()
        }
        ModelOutputError::Encode(e) => {
            tracing::error!("Prompt encoding failed: {e}");
            "the request could not be prepared".to_string()
        }
        other => other.to_string(),
    }
}

/// Borrowed collaborators for one screening request.
pub struct Screening<'a> {
    pub storage: &'a dyn ObjectStore,
    pub model: &'a dyn TextGenerator,
    pub jobs: &'a dyn JobStore,
    pub applicants: &'a dyn ApplicantStore,
    pub model_timeout: Duration,
}

impl Screening<'_> {
    /// Fetch + extract only. Nothing is persisted.
    pub async fn extract(&self, storage_key: &str) -> Result<CvData, ScreeningError> {
        let storage_key = storage_key.trim();
        if storage_key.is_empty() {
            return Err(ScreeningError::BadRequest(
                "storageKey is required".to_string(),
            ));
        }
        self.fetch_and_extract(storage_key).await
    }

    /// Fetch + extract + analyze against a job. Nothing is persisted.
    pub async fn analyze(
        &self,
        storage_key: &str,
        job_id: &str,
    ) -> Result<(CvData, MatchAnalysis), ScreeningError> {
        let (storage_key, job_id) = require_key_and_job(storage_key, job_id)?;
        self.extract_and_analyze(storage_key, job_id).await
    }

    /// Runs the full pipeline and persists exactly one applicant row on success.
    pub async fn submit(
        &self,
        request: SubmitApplicationRequest,
    ) -> Result<ApplicantRow, ScreeningError> {
        // Step 1: input presence
        let (storage_key, job_id) = require_key_and_job(&request.storage_key, &request.job_id)?;
        info!("Screening application for job {job_id} (cv '{storage_key}')");

        // Steps 2–5: fetch, extract, load job, analyze
        let (cv_data, analysis) = self.extract_and_analyze(storage_key, job_id).await?;

        // Step 6: completeness
        let missing = missing_fields(&request);
        if !missing.is_empty() {
            return Err(ScreeningError::MissingFields(missing));
        }

        // Step 7: persist
        let applicant = NewApplicant {
            job_id: job_id.to_string(),
            name: request.name.trim().to_string(),
            email: request.email.trim().to_string(),
            phone: request.phone.trim().to_string(),
            cv_link: storage_key.to_string(),
            cover_letter: request
                .cover_letter
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(String::from),
            analysis,
            cv_data,
        };
        let row = self.applicants.insert(applicant).await?;

        info!(
            "Application {} submitted for job {} (overall match {})",
            row.id, row.job_id, row.analysis_data.0.overall_match
        );
        Ok(row)
    }

    async fn fetch_and_extract(&self, storage_key: &str) -> Result<CvData, ScreeningError> {
        let pdf_base64 = fetch_pdf_base64(self.storage, storage_key).await?;
        extract_cv_data(self.model, &pdf_base64, self.model_timeout)
            .await
            .map_err(ScreeningError::Extraction)
    }

    async fn load_job(&self, job_id: &str) -> Result<JobDescription, ScreeningError> {
        self.jobs
            .find_description(job_id)
            .await?
            .ok_or_else(|| ScreeningError::JobNotFound(job_id.to_string()))
    }

    async fn extract_and_analyze(
        &self,
        storage_key: &str,
        job_id: &str,
    ) -> Result<(CvData, MatchAnalysis), ScreeningError> {
        let cv_data = self.fetch_and_extract(storage_key).await?;
        let job = self.load_job(job_id).await?;
        let analysis = analyze_match(self.model, &cv_data, &job, self.model_timeout)
            .await
            .map_err(ScreeningError::Analysis)?;
        Ok((cv_data, analysis))
    }
}

fn require_key_and_job<'r>(
    storage_key: &'r str,
    job_id: &'r str,
) -> Result<(&'r str, &'r str), ScreeningError> {
    let (storage_key, job_id) = (storage_key.trim(), job_id.trim());
    if storage_key.is_empty() || job_id.is_empty() {
        return Err(ScreeningError::BadRequest(
            "storageKey and jobId are required".to_string(),
        ));
    }
    Ok((storage_key, job_id))
}

fn missing_fields(request: &SubmitApplicationRequest) -> Vec<&'static str> {
    [
        ("jobId", &request.job_id),
        ("name", &request.name),
        ("email", &request.email),
        ("phone", &request.phone),
        ("storageKey", &request.storage_key),
    ]
    .into_iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(name, _)| name)
    .collect()
}
