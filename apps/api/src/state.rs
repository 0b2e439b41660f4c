use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::candidates::store::CandidateStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Backend chosen at startup from `STORE_BACKEND`.
    pub store: Arc<dyn CandidateStore>,
    pub verifier: Arc<dyn TokenVerifier>,
}
