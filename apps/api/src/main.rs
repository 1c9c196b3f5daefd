mod config;
mod errors;
mod extraction;
mod llm_client;
mod models;
mod pipeline;
mod routes;
mod session;
mod state;

use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::gemini::GeminiClient;
use crate::llm_client::GenerationClient;
use crate::routes::build_router;
use crate::session::SessionStore;
use crate::state::AppState;

const RESUME_TEMPLATE_FILE: &str = "generate_resume_html.html";

#[tokio::main]
async fn main() -> Result<()> {
    // Fails fast when no API key can be found
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log,
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume API v{}", env!("CARGO_PKG_VERSION"));

    let llm = GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
        config.gemini_api_base.clone(),
    )?;
    info!("Generation client initialized (model: {})", llm.model_name());

    let template_path = config.template_dir.join(RESUME_TEMPLATE_FILE);
    let resume_template = tokio::fs::read_to_string(&template_path)
        .await
        .with_context(|| {
            format!(
                "Failed to load resume template from {}",
                template_path.display()
            )
        })?;
    info!("Loaded resume template from {}", template_path.display());

    let sessions = SessionStore::new(chrono::Duration::seconds(config.session_ttl_secs));

    let cors = build_cors(&config)?;

    let state = AppState {
        llm: Arc::new(llm),
        sessions,
        resume_template: Arc::from(resume_template),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Permissive unless `CORS_ALLOWED_ORIGIN` pins a single origin.
fn build_cors(config: &Config) -> Result<CorsLayer> {
    match &config.cors_allowed_origin {
        Some(origin) => {
            let origin = HeaderValue::from_str(origin)
                .with_context(|| format!("CORS_ALLOWED_ORIGIN is not a valid origin: '{origin}'"))?;
            info!("CORS restricted to {:?}", origin);
            Ok(CorsLayer::new()
                .allow_origin(origin)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(Any)
                .expose_headers([axum::http::HeaderName::from_static(
                    crate::pipeline::handlers::SESSION_HEADER,
                )]))
        }
        None => Ok(CorsLayer::permissive()),
    }
}
