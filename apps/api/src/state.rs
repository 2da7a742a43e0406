use std::sync::Arc;

use crate::cache::{CacheInvalidator, ResponseCache};
use crate::config::Config;
use crate::recommendations::Recommender;
use crate::store::DocumentStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub cache: ResponseCache,
    pub invalidator: CacheInvalidator,
    /// Pluggable recommender. Claude-backed when an API key is configured,
    /// deterministic skill-overlap otherwise.
    pub recommender: Arc<dyn Recommender>,
    pub config: Config,
}
