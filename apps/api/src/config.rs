use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::llm_client::gemini::{DEFAULT_API_BASE, DEFAULT_MODEL};

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const DEFAULT_SESSION_TTL_SECS: i64 = 3600;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Fails at startup if the generation-service credential cannot be found.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_api_base: String,
    pub port: u16,
    pub rust_log: String,
    pub template_dir: PathBuf,
    pub session_ttl_secs: i64,
    pub max_upload_bytes: usize,
    pub cors_allowed_origin: Option<String>,
}

/// Shape of the optional YAML credentials file.
#[derive(Debug, Deserialize)]
struct FileConfig {
    #[serde(rename = "GEMINI_API_KEY")]
    gemini_api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let config_path = std::env::var("CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        Ok(Config {
            gemini_api_key: resolve_api_key(&config_path)?,
            gemini_model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            gemini_api_base: std::env::var("GEMINI_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            port: parse_env("PORT", 8000)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            template_dir: std::env::var("TEMPLATE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("templates")),
            session_ttl_secs: parse_env("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            cors_allowed_origin: std::env::var("CORS_ALLOWED_ORIGIN")
                .ok()
                .filter(|s| !s.trim().is_empty()),
        })
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Config {
            gemini_api_key: "test-key".to_string(),
            gemini_model: DEFAULT_MODEL.to_string(),
            gemini_api_base: DEFAULT_API_BASE.to_string(),
            port: 0,
            rust_log: "debug".to_string(),
            template_dir: PathBuf::from("templates"),
            session_ttl_secs: 600,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            cors_allowed_origin: None,
        }
    }
}

/// The environment wins; the YAML file is the fallback.
fn resolve_api_key(config_path: &Path) -> Result<String> {
    if let Ok(key) = std::env::var("GEMINI_API_KEY") {
        if !key.trim().is_empty() {
            return Ok(key);
        }
    }
    read_key_from_file(config_path)?.with_context(|| {
        format!(
            "GEMINI_API_KEY is not set and was not found in {}",
            config_path.display()
        )
    })
}

fn read_key_from_file(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file: FileConfig = serde_yaml::from_str(&raw)
        .with_context(|| format!("{} is not valid YAML", path.display()))?;
    Ok(file.gemini_api_key.filter(|k| !k.trim().is_empty()))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        Err(_) => Ok(default),
    }
}
