//! In-memory stand-ins for the external services, shared by unit and router tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use serde_json::json;
use sqlx::types::Json;
use uuid::Uuid;

use crate::applicants::store::ApplicantStore;
use crate::config::Config;
use crate::jobs::store::JobStore;
use crate::llm_client::{GenerationRequest, LlmError, TextGenerator};
use crate::models::applicant::{ApplicantRow, ApplicantStatus, ApplicantWithJobRow, NewApplicant};
use crate::models::job::{JobDescription, JobPostRow};
use crate::rate_limit::{RateDecision, RateLimiter};
use crate::screening::models::CvData;
use crate::state::AppState;
use crate::storage::{ObjectStore, StorageError};

// ── object storage ──────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: HashMap<String, Bytes>,
    transient_failures: AtomicU32,
    fetches: AtomicUsize,
}

impl InMemoryObjectStore {
    pub fn with_object(key: &str, data: &[u8]) -> Self {
        let mut store = Self::default();
        store
            .objects
            .insert(key.to_string(), Bytes::copy_from_slice(data));
        store
    }

    /// The next `n` fetches fail with a transient fault.
    pub fn failing_transiently(self, n: u32) -> Self {
        self.transient_failures.store(n, Ordering::SeqCst);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn get_object(&self, key: &str) -> Result<Bytes, StorageError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let remaining = self.transient_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.transient_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(StorageError::Transient("connection reset".to_string()));
        }
        self.objects
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }
}

// ── model ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub prompt: String,
    pub document_base64: Option<String>,
    pub document_media_type: Option<String>,
}

/// Replies with canned texts in order. Runs dry with `EmptyContent`.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<RecordedCall>>,
    delay: Option<Duration>,
    unavailable: bool,
}

impl ScriptedModel {
    pub fn replying<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedModel {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(RecordedCall {
            prompt: request.prompt.to_string(),
            document_base64: request.document.map(|d| d.base64.to_string()),
            document_media_type: request.document.map(|d| d.media_type.to_string()),
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.unavailable {
            return Err(LlmError::Api {
                status: 529,
                message: "overloaded".to_string(),
            });
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(LlmError::EmptyContent)
    }
}

// ── jobs ────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: Vec<(String, JobDescription)>,
}

impl InMemoryJobStore {
    pub fn with_job(job_id: &str, description: JobDescription) -> Self {
        Self {
            jobs: vec![(job_id.to_string(), description)],
        }
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn find_description(&self, job_id: &str) -> Result<Option<JobDescription>, sqlx::Error> {
        Ok(self
            .jobs
            .iter()
            .find(|(id, _)| id == job_id)
            .map(|(_, d)| d.clone()))
    }

    async fn list_open(&self) -> Result<Vec<JobPostRow>, sqlx::Error> {
        Ok(self
            .jobs
            .iter()
            .map(|(id, d)| JobPostRow {
                job_id: id.clone(),
                status: true,
                description: Json(d.clone()),
                created_at: Utc::now(),
            })
            .collect())
    }
}

// ── applicants ──────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryApplicantStore {
    rows: Mutex<Vec<ApplicantRow>>,
    broken: bool,
}

impl InMemoryApplicantStore {
    /// Every call fails as if the pool were exhausted.
    pub fn failing() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    pub fn rows(&self) -> Vec<ApplicantRow> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl ApplicantStore for InMemoryApplicantStore {
    async fn insert(&self, applicant: NewApplicant) -> Result<ApplicantRow, sqlx::Error> {
        if self.broken {
            return Err(sqlx::Error::PoolTimedOut);
        }
        let row = ApplicantRow {
            id: Uuid::new_v4(),
            job_id: applicant.job_id,
            name: applicant.name,
            email: applicant.email,
            phone: applicant.phone,
            cv_link: applicant.cv_link,
            cover_letter: applicant.cover_letter,
            analysis_data: Json(applicant.analysis),
            cv_data: Json(applicant.cv_data),
            status: ApplicantStatus::default().as_str().to_string(),
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn list_with_jobs(&self) -> Result<Vec<ApplicantWithJobRow>, sqlx::Error> {
        if self.broken {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(self
            .rows()
            .into_iter()
            .rev()
            .map(|applicant| ApplicantWithJobRow {
                applicant,
                job_description: Json(sample_job()),
            })
            .collect())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: ApplicantStatus,
    ) -> Result<Option<ApplicantRow>, sqlx::Error> {
        if self.broken {
            return Err(sqlx::Error::PoolTimedOut);
        }
        let mut rows = self.rows.lock().unwrap();
        Ok(rows.iter_mut().find(|r| r.id == id).map(|row| {
            row.status = status.as_str().to_string();
            row.clone()
        }))
    }
}

// ── rate limiting ───────────────────────────────────────────────────────────

/// Counts per client without any window; enough to trip the limit in a test.
pub struct CountingRateLimiter {
    limit: u64,
    retry_after_secs: u64,
    counts: Mutex<HashMap<String, u64>>,
}

impl CountingRateLimiter {
    pub fn new(limit: u64) -> Self {
        Self {
            limit,
            retry_after_secs: 37,
            counts: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RateLimiter for CountingRateLimiter {
    async fn check(&self, client: &str) -> Result<RateDecision, redis::RedisError> {
        let mut counts = self.counts.lock().unwrap();
        let count = counts.entry(client.to_string()).or_insert(0);
        *count += 1;
        if *count > self.limit {
            Ok(RateDecision::Limited {
                retry_after_secs: self.retry_after_secs,
            })
        } else {
            Ok(RateDecision::Allowed)
        }
    }
}

pub struct UnreachableRateLimiter;

#[async_trait]
impl RateLimiter for UnreachableRateLimiter {
    async fn check(&self, _client: &str) -> Result<RateDecision, redis::RedisError> {
        Err(redis::RedisError::from((
            redis::ErrorKind::IoError,
            "connection refused",
        )))
    }
}

// ── fixtures ────────────────────────────────────────────────────────────────

pub const ADMIN_TOKEN: &str = "test-admin-token";

pub fn sample_cv() -> CvData {
    serde_json::from_value(json!({
        "basicInfo": {
            "fullName": "Jane Doe",
            "email": "jane@example.com",
            "location": "Berlin"
        },
        "skills": ["React", "TypeScript", "SQL"],
        "experience": [
            { "company": "Acme", "role": "Frontend Developer", "duration": "2019-2024" }
        ]
    }))
    .unwrap()
}

pub fn sample_job() -> JobDescription {
    serde_json::from_value(json!({
        "title": "Frontend Engineer",
        "department": "Product",
        "location": "Remote",
        "type": "Full-time",
        "experience": "3+ years",
        "description": "Build the careers dashboard.",
        "requirements": ["React", "TypeScript"],
        "preferred": ["GraphQL"]
    }))
    .unwrap()
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/careers_test".to_string(),
        redis_url: "redis://localhost:6379".to_string(),
        s3_bucket: "cvs".to_string(),
        s3_endpoint: "http://localhost:9000".to_string(),
        aws_access_key_id: "minio".to_string(),
        aws_secret_access_key: "minio-secret".to_string(),
        anthropic_api_key: "sk-test".to_string(),
        admin_api_token: ADMIN_TOKEN.to_string(),
        port: 0,
        rust_log: "debug".to_string(),
        llm_timeout: Duration::from_secs(30),
        cv_rate_limit: 5,
        cv_rate_window: Duration::from_secs(60),
        trust_forwarded_for: false,
    }
}

/// Collaborators for a router test; each field can be swapped before `build`.
pub struct TestServices {
    pub storage: Arc<InMemoryObjectStore>,
    pub model: Arc<ScriptedModel>,
    pub jobs: Arc<InMemoryJobStore>,
    pub applicants: Arc<InMemoryApplicantStore>,
    pub rate_limiter: Arc<dyn RateLimiter>,
    pub config: Config,
}

impl TestServices {
    pub fn new(model: ScriptedModel) -> Self {
        Self {
            storage: Arc::new(InMemoryObjectStore::with_object(
                "cv-123",
                b"%PDF-1.4 jane",
            )),
            model: Arc::new(model),
            jobs: Arc::new(InMemoryJobStore::with_job("job-1", sample_job())),
            applicants: Arc::new(InMemoryApplicantStore::default()),
            rate_limiter: Arc::new(CountingRateLimiter::new(100)),
            config: test_config(),
        }
    }

    pub fn state(&self) -> AppState {
        AppState {
            storage: self.storage.clone(),
            model: self.model.clone(),
            jobs: self.jobs.clone(),
            applicants: self.applicants.clone(),
            rate_limiter: self.rate_limiter.clone(),
            config: self.config.clone(),
        }
    }
}
