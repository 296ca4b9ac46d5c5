//! Match Analyzer: scores validated CV data against a job description with one model call.

use std::time::Duration;

use tracing::{info, warn};

use crate::llm_client::prompts::NO_INVENTION_INSTRUCTION;
use crate::llm_client::{GenerationRequest, TextGenerator};
use crate::models::job::JobDescription;
use crate::screening::model_output::{generate_validated, ModelOutputError};
use crate::screening::models::{CvData, MatchAnalysis};
use crate::screening::prompts::{MATCH_ANALYSIS_PROMPT_TEMPLATE, MATCH_ANALYSIS_SYSTEM};
use crate::screening::schema::validate_match_analysis;

const MIN_SCORE: f64 = 0.0;
const MAX_SCORE: f64 = 100.0;

pub async fn analyze_match(
    model: &dyn TextGenerator,
    cv: &CvData,
    job: &JobDescription,
    timeout: Duration,
) -> Result<MatchAnalysis, ModelOutputError> {
    let prompt = build_analysis_prompt(cv, job)?;
    let request = GenerationRequest {
        prompt: &prompt,
        system: MATCH_ANALYSIS_SYSTEM,
        document: None,
    };

    let analysis = generate_validated(model, request, timeout, validate_match_analysis).await?;
    let analysis = clamp_scores(analysis);

    info!(
        "Match analysis for '{}' against '{}': overall={}, skills={}",
        cv.basic_info.full_name, job.title, analysis.overall_match, analysis.skills_match
    );
    Ok(analysis)
}

fn build_analysis_prompt(cv: &CvData, job: &JobDescription) -> Result<String, ModelOutputError> {
    let cv_json = serde_json::to_string_pretty(cv).map_err(ModelOutputError::Encode)?;
    let job_json = serde_json::to_string_pretty(job).map_err(ModelOutputError::Encode)?;

    let prompt = MATCH_ANALYSIS_PROMPT_TEMPLATE
        .replace("{cv_data}", &cv_json)
        .replace("{job_description}", &job_json);
    Ok(format!("{prompt}\n\n{NO_INVENTION_INSTRUCTION}"))
}

/// Scores are pinned to 0–100 and counts floored at zero; the model is asked to
/// stay in range but nothing binds it to.
fn clamp_scores(mut analysis: MatchAnalysis) -> MatchAnalysis {
    let before = analysis.clone();

    analysis.overall_match = analysis.overall_match.clamp(MIN_SCORE, MAX_SCORE);
    analysis.skills_match = analysis.skills_match.clamp(MIN_SCORE, MAX_SCORE);
    analysis.year_of_experience = analysis.year_of_experience.max(0.0);
    analysis.num_of_skills = analysis.num_of_skills.max(0.0);

    if analysis != before {
        warn!(
            "Model reported out-of-range scores (overall={}, skills={}, years={}, skills_count={}); clamped",
            before.overall_match, before.skills_match, before.year_of_experience, before.num_of_skills
        );
    }
    analysis
}
