use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::job::{JobDescription, JobPostRow};

/// Read access to job posts. Job descriptions are immutable inputs to the pipeline.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn find_description(&self, job_id: &str) -> Result<Option<JobDescription>, sqlx::Error>;

    /// Open posts, newest first.
    async fn list_open(&self) -> Result<Vec<JobPostRow>, sqlx::Error>;
}

#[derive(Clone)]
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn find_description(&self, job_id: &str) -> Result<Option<JobDescription>, sqlx::Error> {
        let description: Option<Json<JobDescription>> =
            sqlx::query_scalar("SELECT description FROM job_post WHERE job_id = $1")
                .bind(job_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(description.map(|Json(d)| d))
    }

    async fn list_open(&self) -> Result<Vec<JobPostRow>, sqlx::Error> {
        sqlx::query_as::<_, JobPostRow>(
            r#"
            SELECT job_id, status, description, created_at
            FROM job_post
            WHERE status = TRUE
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }
}
