use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::CompletionService;
use crate::rate_limit::RateLimiter;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Completion backend. `LlmClient` in production, a stub in tests.
    pub completion: Arc<dyn CompletionService>,
    /// Per-client counters for the tailoring endpoint.
    pub rate_limiter: Arc<RateLimiter>,
    pub config: Config,
}
