// All prompt templates for the resume pipeline.
// Placeholders are filled by `PromptTemplate::render`; see step.rs.

use crate::llm_client::prompts::{HTML_ONLY_SYSTEM, JSON_ONLY_SYSTEM};
use crate::pipeline::step::PromptTemplate;

/// Maps free resume text onto the canonical schema.
/// Replace: {schema}, {resume_text}
pub const STRUCTURE_RESUME: PromptTemplate = PromptTemplate {
    name: "structure_resume",
    system: JSON_ONLY_SYSTEM,
    body: r#"You are an AI bot designed to parse resumes. Given the resume text provided below, extract the key details and return them as valid JSON in exactly this shape:

{schema}

Rules:
1. "technical_skills" is an array of short keywords.
2. Use an empty string for any field the resume does not mention.
3. Return ONLY the JSON object, with no extra text.

Resume:
{resume_text}"#,
};

/// Compares a structured resume with a job description.
/// Replace: {resume_json}, {job_description}
pub const SCORE_COMPATIBILITY: PromptTemplate = PromptTemplate {
    name: "score_compatibility",
    system: JSON_ONLY_SYSTEM,
    body: r#"You are an AI assistant that calculates an ATS (Applicant Tracking System) score based on a candidate's resume and a job description.

The candidate's resume is provided as JSON:
{resume_json}

The job description is:
{job_description}

Compare the resume details with the job description requirements.
Calculate an ATS score between 0 and 100, where 100 represents a perfect match.
Identify every skill or qualification the job description requires that the resume does not show.

Return only JSON in this format:
{
  "ats_score": 0,
  "missing_skills": []
}

"missing_skills" holds keywords only."#,
};

/// Fills an HTML template from the structured resume.
/// Replace: {resume_json}, {missing_skills}, {raw_text}, {html_template}
pub const RENDER_RESUME_HTML: PromptTemplate = PromptTemplate {
    name: "render_resume_html",
    system: HTML_ONLY_SYSTEM,
    body: r#"You are an AI assistant that generates professional resumes. Given the structured resume JSON, missing skills, and raw resume text, format the information into a complete, well-structured HTML resume.

Resume Data (Structured JSON):
{resume_json}

Missing Skills:
{missing_skills}

Raw Resume Text (for reference):
{raw_text}

Use the following HTML template and fill in the placeholders accurately.
Ensure the "Technical Skills" section includes both the candidate's existing skills and the missing skills.
Maintain a professional format.

Template:
{html_template}"#,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structure_placeholders() {
        assert_eq!(
            STRUCTURE_RESUME.placeholders(),
            vec!["schema", "resume_text"]
        );
    }

    #[test]
    fn test_score_placeholders_ignore_json_example() {
        assert_eq!(
            SCORE_COMPATIBILITY.placeholders(),
            vec!["resume_json", "job_description"]
        );
    }

    #[test]
    fn test_render_placeholders() {
        assert_eq!(
            RENDER_RESUME_HTML.placeholders(),
            vec!["resume_json", "missing_skills", "raw_text", "html_template"]
        );
    }
}
