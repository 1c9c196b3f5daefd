//! Resume Rendering: asks the generation service to fill an HTML template.

use serde_json::Value;

use crate::errors::AppError;
use crate::llm_client::GenerationClient;
use crate::pipeline::prompts::RENDER_RESUME_HTML;
use crate::pipeline::step::{Html, PromptedStep};

const STEP: PromptedStep<Html> = PromptedStep::new(&RENDER_RESUME_HTML);

pub struct RenderInput<'a> {
    pub resume_json: &'a Value,
    pub missing_skills: &'a [String],
    /// Text extracted at upload time; empty when no session was given.
    pub raw_text: &'a str,
    pub html_template: &'a str,
}

pub async fn render_resume_html(
    llm: &dyn GenerationClient,
    input: RenderInput<'_>,
) -> Result<String, AppError> {
    let resume_json = serde_json::to_string_pretty(input.resume_json)
        .map_err(|e| AppError::Internal(e.into()))?;
    let missing_skills = serde_json::to_string_pretty(input.missing_skills)
        .map_err(|e| AppError::Internal(e.into()))?;

    STEP.run(
        llm,
        &[
            ("resume_json", resume_json.as_str()),
            ("missing_skills", missing_skills.as_str()),
            ("raw_text", input.raw_text),
            ("html_template", input.html_template),
        ],
    )
    .await
}
