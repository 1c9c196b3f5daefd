use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Canonical structured-resume schema the structuring step asks for.
///
/// The service's answer is validated as a JSON object and returned verbatim;
/// this type only defines the shape shown to the model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructuredResume {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub github: String,
    #[serde(default)]
    pub linkedin: String,
    /// Free-form: the model may answer with a string or a list of roles.
    #[serde(default)]
    pub employment: Value,
    #[serde(default)]
    pub technical_skills: Vec<String>,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub profile: String,
}

impl StructuredResume {
    /// Empty instance rendered as the target shape inside the prompt.
    pub fn schema_example() -> String {
        let example = StructuredResume {
            employment: Value::String(String::new()),
            ..Default::default()
        };
        serde_json::to_string_pretty(&example).unwrap_or_default()
    }
}

/// Raw scoring answer as produced by the generation service.
#[derive(Debug, Clone, Deserialize)]
pub struct AtsAssessment {
    pub ats_score: Number,
    pub missing_skills: Vec<String>,
}

/// Result of comparing a structured resume against a job description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatibilityResult {
    /// 0 – 100, computed by the generation service. Kept as the original
    /// JSON number so `50` stays `50` on the way back out.
    pub ats_score: Number,
    pub missing_skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_json: Option<Value>,
}

impl CompatibilityResult {
    pub fn with_resume(assessment: AtsAssessment, resume_json: Value) -> Self {
        Self {
            ats_score: assessment.ats_score,
            missing_skills: assessment.missing_skills,
            resume_json: Some(resume_json),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_example_lists_canonical_keys() {
        let example: Value = serde_json::from_str(&StructuredResume::schema_example()).unwrap();
        let keys: Vec<&str> = example
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        for key in [
            "full_name",
            "email",
            "github",
            "linkedin",
            "employment",
            "technical_skills",
            "phone",
            "address",
            "profile",
        ] {
            assert!(keys.contains(&key), "missing {key}");
        }
        assert_eq!(example["technical_skills"], json!([]));
        assert_eq!(example["employment"], json!(""));
    }

    #[test]
    fn test_structured_resume_tolerates_partial_answers() {
        let resume: StructuredResume = serde_json::from_value(json!({
            "full_name": "Jane Doe",
            "employment": [{"company": "Acme", "role": "Engineer"}]
        }))
        .unwrap();
        assert_eq!(resume.full_name, "Jane Doe");
        assert!(resume.employment.is_array());
        assert!(resume.technical_skills.is_empty());
    }

    #[test]
    fn test_compatibility_result_preserves_integer_score() {
        let assessment: AtsAssessment =
            serde_json::from_str(r#"{"ats_score":50,"missing_skills":["Go"]}"#).unwrap();
        let result =
            CompatibilityResult::with_resume(assessment, json!({"technical_skills": ["Python"]}));
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "ats_score": 50,
                "missing_skills": ["Go"],
                "resume_json": {"technical_skills": ["Python"]}
            })
        );
    }
}
