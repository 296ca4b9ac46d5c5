use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::job::JobDescription;
use crate::screening::models::{CvData, MatchAnalysis};

/// Review state of an application. New rows start in `Review`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicantStatus {
    #[default]
    Review,
    Interview,
    Hired,
    Rejected,
}

impl ApplicantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicantStatus::Review => "review",
            ApplicantStatus::Interview => "interview",
            ApplicantStatus::Hired => "hired",
            ApplicantStatus::Rejected => "rejected",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "review" => Some(ApplicantStatus::Review),
            "interview" => Some(ApplicantStatus::Interview),
            "hired" => Some(ApplicantStatus::Hired),
            "rejected" => Some(ApplicantStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicantRow {
    pub id: Uuid,
    pub job_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Object storage key of the uploaded CV.
    pub cv_link: String,
    pub cover_letter: Option<String>,
    pub analysis_data: Json<MatchAnalysis>,
    pub cv_data: Json<CvData>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Applicant joined with the description of the job applied for (admin listing).
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ApplicantWithJobRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub applicant: ApplicantRow,
    pub job_description: Json<JobDescription>,
}

/// Everything needed to insert one applicant row. Built only after extraction,
/// analysis and the completeness check have all passed.
#[derive(Debug, Clone)]
pub struct NewApplicant {
    pub job_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub cv_link: String,
    pub cover_letter: Option<String>,
    pub analysis: MatchAnalysis,
    pub cv_data: CvData,
}
