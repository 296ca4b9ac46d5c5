use std::sync::Arc;

use crate::applicants::store::ApplicantStore;
use crate::config::Config;
use crate::jobs::store::JobStore;
use crate::llm_client::TextGenerator;
use crate::rate_limit::RateLimiter;
use crate::screening::pipeline::Screening;
use crate::storage::ObjectStore;

/// Shared application state injected into all route handlers via Axum extractors.
/// External services sit behind traits so the router can run against fakes.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn ObjectStore>,
    pub model: Arc<dyn TextGenerator>,
    pub jobs: Arc<dyn JobStore>,
    pub applicants: Arc<dyn ApplicantStore>,
    pub rate_limiter: Arc<dyn RateLimiter>,
    pub config: Config,
}

impl AppState {
    pub fn screening(&self) -> Screening<'_> {
        Screening {
            storage: self.storage.as_ref(),
            model: self.model.as_ref(),
            jobs: self.jobs.as_ref(),
            applicants: self.applicants.as_ref(),
            model_timeout: self.config.llm_timeout,
        }
    }
}
