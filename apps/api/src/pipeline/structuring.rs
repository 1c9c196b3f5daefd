//! Resume Structuring: maps extracted resume text onto the canonical schema.

use crate::errors::AppError;
use crate::llm_client::GenerationClient;
use crate::models::resume::StructuredResume;
use crate::pipeline::prompts::STRUCTURE_RESUME;
use crate::pipeline::step::{PromptedStep, RawJsonObject};

const STEP: PromptedStep<RawJsonObject> = PromptedStep::new(&STRUCTURE_RESUME);

/// Returns the service's JSON text, fences removed, after checking it is a JSON object.
pub async fn structure_resume(
    llm: &dyn GenerationClient,
    resume_text: &str,
) -> Result<String, AppError> {
    let schema = StructuredResume::schema_example();
    STEP.run(llm, &[("schema", schema.as_str()), ("resume_text", resume_text)])
        .await
}
