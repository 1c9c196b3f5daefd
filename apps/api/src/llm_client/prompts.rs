// Shared prompt constants used by more than one step.
// Each step's own templates live in pipeline/prompts.rs.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// System prompt fragment for steps that answer with an HTML document.
pub const HTML_ONLY_SYSTEM: &str = "You are a professional resume writer and front-end \
    developer. You MUST respond with a complete HTML document only. \
    Do NOT include any text before or after the HTML. \
    Do NOT include explanations or apologies.";
