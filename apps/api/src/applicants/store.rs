use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::applicant::{ApplicantRow, ApplicantStatus, ApplicantWithJobRow, NewApplicant};

#[async_trait]
pub trait ApplicantStore: Send + Sync {
    /// Writes one applicant row with status `review` and returns it.
    async fn insert(&self, applicant: NewApplicant) -> Result<ApplicantRow, sqlx::Error>;

    /// All applicants with their job description, newest first.
    async fn list_with_jobs(&self) -> Result<Vec<ApplicantWithJobRow>, sqlx::Error>;

    /// Returns `None` when no applicant has this id.
    async fn update_status(
        &self,
        id: Uuid,
        status: ApplicantStatus,
    ) -> Result<Option<ApplicantRow>, sqlx::Error>;
}

#[derive(Clone)]
pub struct PgApplicantStore {
    pool: PgPool,
}

impl PgApplicantStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApplicantStore for PgApplicantStore {
    async fn insert(&self, applicant: NewApplicant) -> Result<ApplicantRow, sqlx::Error> {
        let id = Uuid::new_v4();
        let row = sqlx::query_as::<_, ApplicantRow>(
            r#"
            INSERT INTO applicants
                (id, job_id, name, email, phone, cv_link, cover_letter,
                 analysis_data, cv_data, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&applicant.job_id)
        .bind(&applicant.name)
        .bind(&applicant.email)
        .bind(&applicant.phone)
        .bind(&applicant.cv_link)
        .bind(&applicant.cover_letter)
        .bind(Json(&applicant.analysis))
        .bind(Json(&applicant.cv_data))
        .bind(ApplicantStatus::default().as_str())
        .fetch_one(&self.pool)
        .await?;

        info!("Inserted applicant {id} for job {}", applicant.job_id);
        Ok(row)
    }

    async fn list_with_jobs(&self) -> Result<Vec<ApplicantWithJobRow>, sqlx::Error> {
        sqlx::query_as::<_, ApplicantWithJobRow>(
            r#"
            SELECT a.id, a.job_id, a.name, a.email, a.phone, a.cv_link, a.cover_letter,
                   a.analysis_data, a.cv_data, a.status, a.created_at,
                   j.description AS job_description
            FROM applicants AS a
            JOIN job_post AS j ON a.job_id = j.job_id
            ORDER BY a.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: ApplicantStatus,
    ) -> Result<Option<ApplicantRow>, sqlx::Error> {
        sqlx::query_as::<_, ApplicantRow>(
            "UPDATE applicants SET status = $1 WHERE id = $2 RETURNING *",
        )
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }
}
