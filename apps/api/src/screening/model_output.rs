//! The shared "call → sanitize → parse → validate" step used by every pipeline stage
//! that consumes model output.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::llm_client::{sanitize_model_text, GenerationRequest, LlmError, TextGenerator};
use crate::screening::schema::SchemaError;

/// Why a model-backed stage produced no usable value.
/// Parse and schema failures are kept apart even though callers surface both the same way.
#[derive(Debug, Error)]
pub enum ModelOutputError {
    #[error("could not encode prompt input: {0}")]
    Encode(serde_json::Error),

    #[error("model call failed: {0}")]
    Model(#[from] LlmError),

    #[error("model did not respond within {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("model output is not valid JSON: {0}")]
    Parse(serde_json::Error),

    #[error("model output does not match the expected shape: {0}")]
    Schema(#[from] SchemaError),
}

/// Runs one bounded model call and validates its output into `T`.
pub async fn generate_validated<T>(
    model: &dyn TextGenerator,
    request: GenerationRequest<'_>,
    timeout: Duration,
    validate: fn(&Value) -> Result<T, SchemaError>,
) -> Result<T, ModelOutputError> {
    let raw = tokio::time::timeout(timeout, model.generate(request))
        .await
        .map_err(|_| ModelOutputError::Timeout(timeout))??;

    info!("Model responded with {} chars", raw.len());
    debug!("Raw model output: {raw}");

    let cleaned = sanitize_model_text(&raw);
    let value: Value = serde_json::from_str(cleaned).map_err(ModelOutputError::Parse)?;

    Ok(validate(&value)?)
}
