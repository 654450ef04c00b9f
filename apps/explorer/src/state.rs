use std::sync::Arc;

use crate::api_client::CareerApi;
use crate::explorer::session::SessionRegistry;
use crate::persistence::SavedSearchBook;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Career backend. `HttpCareerApi` in production, swapped out in tests.
    pub api: Arc<dyn CareerApi>,
    pub sessions: SessionRegistry,
    pub searches: Arc<SavedSearchBook>,
}
