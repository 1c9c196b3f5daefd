//! Prompted Step: the one pattern every generation call follows:
//! render a template with context, call the generation client, shape the text.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::errors::AppError;
use crate::llm_client::{generate_text, GenerationClient};

/// A prompt with `{placeholder}` variables and the system prompt it is sent with.
#[derive(Debug)]
pub struct PromptTemplate {
    pub name: &'static str,
    pub system: &'static str,
    pub body: &'static str,
}

impl PromptTemplate {
    /// Substitutes `{name}` for each provided variable in a single pass.
    ///
    /// Substituted values are never rescanned, so user text containing
    /// `{resume_text}` or `%` is embedded verbatim. Braces that do not form a
    /// known placeholder (JSON examples in the body) are kept as-is.
    pub fn render(&self, vars: &[(&str, &str)]) -> String {
        let extra: usize = vars.iter().map(|(_, v)| v.len()).sum();
        let mut out = String::with_capacity(self.body.len() + extra);
        let mut rest = self.body;

        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let name = placeholder_name(after);

            if !name.is_empty() && after[name.len()..].starts_with('}') {
                if let Some((_, value)) = vars.iter().find(|(key, _)| *key == name) {
                    out.push_str(value);
                    rest = &after[name.len() + 1..];
                    continue;
                }
            }

            out.push('{');
            rest = after;
        }

        out.push_str(rest);
        out
    }

    /// Names of every `{placeholder}` in the body, in order of appearance.
    #[cfg(test)]
    pub fn placeholders(&self) -> Vec<&'static str> {
        let body: &'static str = self.body;
        let mut names = Vec::new();
        let mut rest = body;
        while let Some(start) = rest.find('{') {
            let after = &rest[start + 1..];
            let name = placeholder_name(after);
            if !name.is_empty() && after[name.len()..].starts_with('}') {
                names.push(name);
            }
            rest = after;
        }
        names
    }
}

fn placeholder_name(text: &str) -> &str {
    let len = text
        .find(|c: char| !(c.is_ascii_lowercase() || c == '_'))
        .unwrap_or(text.len());
    &text[..len]
}

/// How a step turns the cleaned service text into its result.
pub trait OutputShape {
    type Output;

    fn parse(text: String) -> Result<Self::Output, AppError>;
}

/// A JSON object, returned as the validated raw text.
pub struct RawJsonObject;

impl OutputShape for RawJsonObject {
    type Output = String;

    fn parse(text: String) -> Result<String, AppError> {
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(_)) => Ok(text),
            Ok(other) => Err(AppError::ResultFormat(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
            Err(e) => Err(AppError::ResultFormat(format!("invalid JSON: {e}"))),
        }
    }
}

/// JSON deserialized into `T`.
pub struct TypedJson<T>(PhantomData<fn() -> T>);

impl<T: DeserializeOwned> OutputShape for TypedJson<T> {
    type Output = T;

    fn parse(text: String) -> Result<T, AppError> {
        serde_json::from_str(&text)
            .map_err(|e| AppError::ResultFormat(format!("unexpected JSON shape: {e}")))
    }
}

/// Markup passed through unchanged.
pub struct Html;

impl OutputShape for Html {
    type Output = String;

    fn parse(text: String) -> Result<String, AppError> {
        Ok(text)
    }
}

/// A template bound to an output shape.
pub struct PromptedStep<S> {
    template: &'static PromptTemplate,
    _shape: PhantomData<fn() -> S>,
}

impl<S: OutputShape> PromptedStep<S> {
    pub const fn new(template: &'static PromptTemplate) -> Self {
        Self {
            template,
            _shape: PhantomData,
        }
    }

    /// Service failures become `AppError::Generation`; shape failures
    /// become `AppError::ResultFormat`.
    pub async fn run(
        &self,
        llm: &dyn GenerationClient,
        vars: &[(&str, &str)],
    ) -> Result<S::Output, AppError> {
        let prompt = self.template.render(vars);
        debug!(
            step = self.template.name,
            prompt_chars = prompt.len(),
            "Running prompted step"
        );

        let text = generate_text(llm, &prompt, self.template.system)
            .await
            .map_err(|e| AppError::Generation(format!("{} failed: {e}", self.template.name)))?;

        S::parse(text)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
