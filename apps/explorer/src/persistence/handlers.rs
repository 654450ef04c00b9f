use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::errors::AppError;
use crate::models::SavedSearch;
use crate::state::AppState;

const MAX_NAME_LEN: usize = 120;

#[derive(Deserialize)]
pub struct SaveSearchRequest {
    pub name: String,
    #[serde(default)]
    pub filters: Map<String, Value>,
}

/// GET /api/v1/saved-searches
pub async fn handle_list_saved_searches(State(state): State<AppState>) -> Json<Vec<SavedSearch>> {
    Json(state.searches.load().await)
}

/// POST /api/v1/saved-searches
pub async fn handle_save_search(
    State(state): State<AppState>,
    Json(req): Json<SaveSearchRequest>,
) -> Result<(StatusCode, Json<SavedSearch>), AppError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Search name is required".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::Validation(format!(
            "Search name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    let saved = state.searches.save(name, req.filters).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

/// DELETE /api/v1/saved-searches/:id
pub async fn handle_delete_saved_search(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if state.searches.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Saved search {id} does not exist")))
    }
}
