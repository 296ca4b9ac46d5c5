use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use crate::models::null_as_default;

/// A job post's description as authored by the admin dashboard.
///
/// Stored rows come from more than one version of the dashboard, so decoding is
/// lenient: missing or null fields fall back to empty values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescription {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub department: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub job_type: String,
    /// Required experience level, free text.
    #[serde(default, deserialize_with = "null_as_default")]
    pub experience: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub responsibilities: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub requirements: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub preferred: Vec<String>,
    #[serde(default)]
    pub salary: Option<Salary>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub benefits: Vec<String>,
}

/// Older posts carry salary as free text ("100,000 - 120,000 BDT"), newer ones as a range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Salary {
    Range(SalaryRange),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryRange {
    #[serde(default, deserialize_with = "null_as_default")]
    pub min: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub max: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobPostRow {
    pub job_id: String,
    /// Open for applications.
    pub status: bool,
    pub description: Json<JobDescription>,
    pub created_at: DateTime<Utc>,
}
