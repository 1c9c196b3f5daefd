//! Axum route handlers for the resume pipeline.
//!
//! Each handler validates its input, runs one pipeline step, and maps the
//! outcome onto 200 / 400 / 500. Nothing here talks to the generation
//! service directly.

use std::collections::BTreeMap;

use axum::{
    extract::{Multipart, State},
    http::header::CONTENT_TYPE,
    response::{Html, IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extraction::extract_text;
use crate::models::resume::CompatibilityResult;
use crate::pipeline::rendering::{render_resume_html, RenderInput};
use crate::pipeline::scoring::score_compatibility;
use crate::pipeline::structuring::structure_resume;
use crate::routes::body::JsonOrForm;
use crate::state::AppState;

/// Multipart field carrying the uploaded resume.
pub const UPLOAD_FIELD: &str = "pdf_doc";

/// Response header carrying the id to pass back as `session_id`.
pub const SESSION_HEADER: &str = "x-session-id";

const INDEX_HTML: &str = include_str!("../../templates/index.html");

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

struct PdfUpload {
    filename: String,
    bytes: Bytes,
}

#[derive(Debug, Deserialize)]
pub struct AtsRequest {
    /// A JSON string (form or JSON body) or an inline object (JSON body).
    #[serde(default)]
    pub resume_json: Option<Value>,
    #[serde(default)]
    pub job_description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    #[serde(default)]
    pub resume_json: Option<String>,
    #[serde(default)]
    pub missing_skills: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /
pub async fn handle_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// POST /process
///
/// Upload → extract → structure. Returns the structured resume's JSON text as
/// produced by the service, and a session id header for `/generate_resume_html`.
pub async fn handle_process(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let upload = read_pdf_upload(&mut multipart).await?;
    info!(
        "Processing upload '{}' ({} bytes)",
        upload.filename,
        upload.bytes.len()
    );

    let bytes = upload.bytes;
    let raw_text = tokio::task::spawn_blocking(move || extract_text(&bytes))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("PDF extraction task failed: {e}")))?;

    if raw_text.trim().is_empty() {
        warn!("No text extracted from '{}'", upload.filename);
        return Err(AppError::ExtractionEmpty);
    }

    let resume_json = structure_resume(state.llm.as_ref(), &raw_text).await?;
    debug!("Structured resume JSON:\n{resume_json}");

    let session_id = state.sessions.create(raw_text).await;

    Ok((
        [
            (CONTENT_TYPE.as_str(), "application/json".to_string()),
            (SESSION_HEADER, session_id.to_string()),
        ],
        resume_json,
    )
        .into_response())
}

/// POST /submit
///
/// Echoes the submitted form fields back as a JSON object.
pub async fn handle_submit(
    JsonOrForm(fields): JsonOrForm<BTreeMap<String, String>>,
) -> Json<BTreeMap<String, String>> {
    info!("User-submitted details: {} fields", fields.len());
    Json(fields)
}

/// POST /ats
///
/// Scores a structured resume against a job description. Both fields are
/// required and an empty resume object counts as missing; the parsed resume
/// is echoed back under `resume_json`.
pub async fn handle_ats(
    State(state): State<AppState>,
    JsonOrForm(request): JsonOrForm<AtsRequest>,
) -> Result<Json<CompatibilityResult>, AppError> {
    let missing = || AppError::Validation("Missing resume data or job description".to_string());

    let resume_json = request
        .resume_json
        .filter(|v| !is_blank(v))
        .ok_or_else(missing)?;
    let job_description = request
        .job_description
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(missing)?;

    let (resume_text, resume_value) = normalize_resume_json(resume_json)?;
    if resume_value.as_object().is_some_and(|fields| fields.is_empty()) {
        return Err(missing());
    }

    let assessment =
        score_compatibility(state.llm.as_ref(), &resume_text, &job_description).await?;
    info!(
        "ATS score {} with {} missing skills",
        assessment.ats_score,
        assessment.missing_skills.len()
    );

    Ok(Json(CompatibilityResult::with_resume(
        assessment,
        resume_value,
    )))
}

/// POST /generate_resume_html
///
/// Fills the HTML resume template from the structured resume, the ATS missing
/// skills, and the text extracted for `session_id`.
pub async fn handle_generate_resume_html(
    State(state): State<AppState>,
    JsonOrForm(request): JsonOrForm<RenderRequest>,
) -> Result<Html<String>, AppError> {
    let resume_json = request
        .resume_json
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::Validation("No resume data provided".to_string()))?;
    let missing_skills = request
        .missing_skills
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::Validation("No missing skills provided".to_string()))?;

    let resume_value: Value = serde_json::from_str(&resume_json)
        .map_err(|e| AppError::Validation(format!("resume_json is not valid JSON: {e}")))?;
    let missing_skills: Vec<String> = serde_json::from_str(&missing_skills).map_err(|e| {
        AppError::Validation(format!("missing_skills is not a JSON array of strings: {e}"))
    })?;

    let raw_text = match request.session_id.filter(|s| !s.trim().is_empty()) {
        Some(id) => lookup_session(&state, &id).await?,
        None => {
            warn!("No session_id given; rendering without the original resume text");
            String::new()
        }
    };

    let html = render_resume_html(
        state.llm.as_ref(),
        RenderInput {
            resume_json: &resume_value,
            missing_skills: &missing_skills,
            raw_text: &raw_text,
            html_template: &state.resume_template,
        },
    )
    .await?;

    Ok(Html(html))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Finds the `pdf_doc` field. The extension check is case-sensitive and runs
/// before the body of the field is read.
async fn read_pdf_upload(multipart: &mut Multipart) -> Result<PdfUpload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        if !filename.ends_with(".pdf") {
            return Err(AppError::Validation(
                "Only PDF files are allowed".to_string(),
            ));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
        return Ok(PdfUpload { filename, bytes });
    }

    Err(AppError::Validation("No file uploaded".to_string()))
}

/// Returns the resume as JSON text for the prompt plus its parsed value.
/// Strings must contain a JSON object; inline objects are serialized.
fn normalize_resume_json(value: Value) -> Result<(String, Value), AppError> {
    match value {
        Value::String(text) => {
            let parsed: Value = serde_json::from_str(&text).map_err(|e| {
                AppError::Validation(format!("resume_json is not valid JSON: {e}"))
            })?;
            if !parsed.is_object() {
                return Err(AppError::Validation(
                    "resume_json must be a JSON object".to_string(),
                ));
            }
            Ok((text, parsed))
        }
        Value::Object(_) => Ok((value.to_string(), value)),
        _ => Err(AppError::Validation(
            "resume_json must be a JSON object".to_string(),
        )),
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

async fn lookup_session(state: &AppState, id: &str) -> Result<String, AppError> {
    let session_id =
        Uuid::parse_str(id.trim()).map_err(|_| AppError::SessionNotFound(id.to_string()))?;
    state
        .sessions
        .raw_text(session_id)
        .await
        .ok_or_else(|| AppError::SessionNotFound(id.to_string()))
}
