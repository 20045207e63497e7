use std::sync::Arc;

use crate::classifier::ModelState;
use crate::config::Config;
use crate::handoff::HandoffStore;
use crate::llm_client::LlmClient;
use crate::rate_limit::RateLimiter;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Pre-loaded artifacts; read-only after startup.
    pub models: ModelState,
    pub llm: LlmClient,
    /// In-memory by default, Redis when `REDIS_URL` is set.
    pub rate_limiter: Arc<dyn RateLimiter>,
    pub handoff: Arc<dyn HandoffStore>,
}
