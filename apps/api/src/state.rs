use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::GenerationClient;
use crate::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The only handle to the generation service. Swapped for a stub in tests.
    pub llm: Arc<dyn GenerationClient>,
    pub sessions: SessionStore,
    /// HTML template filled by the rendering step, loaded once at startup.
    pub resume_template: Arc<str>,
    pub config: Config,
}
