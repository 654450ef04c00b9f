pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::catalog::handlers as catalog;
use crate::explorer::handlers as explorer;
use crate::persistence::handlers as saved;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Explorer sessions
        .route("/api/v1/sessions", post(explorer::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(explorer::handle_get_session).delete(explorer::handle_delete_session),
        )
        .route("/api/v1/sessions/:id/events", post(explorer::handle_event))
        .route("/api/v1/sessions/:id/export", get(explorer::handle_export))
        .route("/api/v1/sessions/:id/import", post(explorer::handle_import))
        .route(
            "/api/v1/sessions/:id/node-search",
            get(explorer::handle_node_search),
        )
        .route(
            "/api/v1/sessions/:id/recommendations",
            get(explorer::handle_recommendations),
        )
        .route(
            "/api/v1/sessions/:id/similar-profiles",
            get(explorer::handle_similar_profiles),
        )
        // Catalog pass-through
        .route("/api/v1/universities", get(catalog::handle_list_universities))
        .route("/api/v1/statistics", get(catalog::handle_statistics))
        .route(
            "/api/v1/university-stats",
            post(catalog::handle_university_stats),
        )
        .route("/api/v1/career-paths", post(catalog::handle_career_paths))
        .route("/api/v1/profiles/:id", get(catalog::handle_get_profile))
        // Saved searches
        .route(
            "/api/v1/saved-searches",
            get(saved::handle_list_saved_searches).post(saved::handle_save_search),
        )
        .route(
            "/api/v1/saved-searches/:id",
            delete(saved::handle_delete_saved_search),
        )
        .with_state(state)
}
