pub mod health;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};

use crate::applicants::handlers as applicants;
use crate::jobs::handlers as jobs;
use crate::rate_limit::limit_cv_requests;
use crate::screening::handlers as screening;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    // Each of these costs one or two model calls
    let cv_routes = Router::new()
        .route("/api/v1/cv/extract", post(screening::handle_extract))
        .route("/api/v1/cv/analyze", post(screening::handle_analyze))
        .route("/api/v1/applications", post(screening::handle_submit))
        .route_layer(from_fn_with_state(state.clone(), limit_cv_requests));

    let admin_routes = Router::new()
        .route(
            "/api/v1/admin/applicants",
            get(applicants::handle_list_applicants),
        )
        .route(
            "/api/v1/admin/applicants/:id/status",
            patch(applicants::handle_update_status),
        )
        .route_layer(from_fn_with_state(state.clone(), applicants::require_admin));

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/jobs", get(jobs::handle_list_jobs))
        .route("/api/v1/jobs/:job_id", get(jobs::handle_get_job))
        .route("/api/v1/cv/download", get(screening::handle_download))
        .merge(cv_routes)
        .merge(admin_routes)
        .with_state(state)
}
