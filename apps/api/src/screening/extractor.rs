//! CV Extractor: turns a base64 PDF into validated `CvData` with one model call.

use std::time::Duration;

use tracing::info;

use crate::llm_client::prompts::NO_INVENTION_INSTRUCTION;
use crate::llm_client::{GenerationRequest, InlineDocument, TextGenerator};
use crate::screening::model_output::{generate_validated, ModelOutputError};
use crate::screening::models::CvData;
use crate::screening::prompts::{CV_EXTRACTION_PROMPT, CV_EXTRACTION_SYSTEM};
use crate::screening::schema::validate_cv_data;

pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Extracts structured CV data from a base64-encoded PDF.
///
/// Single turn, no retry, no memoization: calling twice re-invokes the model.
pub async fn extract_cv_data(
    model: &dyn TextGenerator,
    pdf_base64: &str,
    timeout: Duration,
) -> Result<CvData, ModelOutputError> {
    let prompt = format!("{CV_EXTRACTION_PROMPT}\n\n{NO_INVENTION_INSTRUCTION}");
    let request = GenerationRequest {
        prompt: &prompt,
        system: CV_EXTRACTION_SYSTEM,
        document: Some(InlineDocument {
            media_type: PDF_MEDIA_TYPE,
            base64: pdf_base64,
        }),
    };

    let cv = generate_validated(model, request, timeout, validate_cv_data).await?;
    info!(
        "Extracted CV data: {} skills, {} experience entries",
        cv.skills.len(),
        cv.experience.as_ref().map_or(0, Vec::len)
    );
    Ok(cv)
}
