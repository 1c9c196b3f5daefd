//! Compatibility Scoring: the generation service compares a structured resume
//! with a job description and answers with a score and the missing skills.

use crate::errors::AppError;
use crate::llm_client::GenerationClient;
use crate::models::resume::AtsAssessment;
use crate::pipeline::prompts::SCORE_COMPATIBILITY;
use crate::pipeline::step::{PromptedStep, TypedJson};

const STEP: PromptedStep<TypedJson<AtsAssessment>> = PromptedStep::new(&SCORE_COMPATIBILITY);

/// Both inputs must already be validated as present by the caller.
pub async fn score_compatibility(
    llm: &dyn GenerationClient,
    resume_json: &str,
    job_description: &str,
) -> Result<AtsAssessment, AppError> {
    let assessment = STEP
        .run(
            llm,
            &[
                ("resume_json", resume_json),
                ("job_description", job_description),
            ],
        )
        .await?;

    validate_score(&assessment)?;
    Ok(assessment)
}

fn validate_score(assessment: &AtsAssessment) -> Result<(), AppError> {
    match assessment.ats_score.as_f64() {
        Some(score) if (0.0..=100.0).contains(&score) => Ok(()),
        _ => Err(AppError::ResultFormat(format!(
            "ats_score {} is outside 0-100",
            assessment.ats_score
        ))),
    }
}
