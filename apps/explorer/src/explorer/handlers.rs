use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::api_client::{NodeQuery, DEFAULT_PROFILE_LIMIT, DEFAULT_RECOMMENDATIONS};
use crate::errors::AppError;
use crate::explorer::controller::ExplorerEvent;
use crate::explorer::session::{NodeSearch, Session};
use crate::models::{NextStepCandidate, NodeRecord, NodeType, ProfileSummary};
use crate::persistence::snapshot::{ImportParseError, Snapshot};
use crate::render::RenderTree;
use crate::state::AppState;

#[derive(Serialize)]
pub struct SessionCreated {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub view: RenderTree,
}

#[derive(Serialize)]
pub struct ExportResponse {
    pub file_name: String,
    pub snapshot: Snapshot,
}

#[derive(Deserialize)]
pub struct NodeSearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default, rename = "type")]
    pub node_type: Option<NodeType>,
    #[serde(default)]
    pub min_profiles: Option<u64>,
}

#[derive(Serialize)]
pub struct NodeSearchResponse {
    /// True when a newer keystroke replaced this query; `results` is empty.
    pub superseded: bool,
    pub results: Vec<NodeRecord>,
}

#[derive(Deserialize)]
pub struct RecommendationParams {
    #[serde(default)]
    pub count: Option<usize>,
}

#[derive(Deserialize)]
pub struct SimilarProfilesParams {
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct SimilarProfilesResponse {
    pub similar_profiles: Vec<ProfileSummary>,
    pub count: usize,
}

async fn find_session(state: &AppState, id: Uuid) -> Result<Arc<Session>, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {id} does not exist")))
}

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionCreated>) {
    let session = state.sessions.create().await;
    let view = session.render().await;
    (
        StatusCode::CREATED,
        Json(SessionCreated {
            session_id: session.id,
            created_at: session.created_at,
            view,
        }),
    )
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RenderTree>, AppError> {
    let session = find_session(&state, id).await?;
    Ok(Json(session.render().await))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Session {id} does not exist")))
    }
}

/// POST /api/v1/sessions/:id/events
///
/// Fetch failures do not fail the request; they come back as the error panel
/// of the returned view.
pub async fn handle_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(event): Json<ExplorerEvent>,
) -> Result<Json<RenderTree>, AppError> {
    let session = find_session(&state, id).await?;
    Ok(Json(session.dispatch(state.api.as_ref(), event).await))
}

/// GET /api/v1/sessions/:id/export
pub async fn handle_export(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExportResponse>, AppError> {
    let session = find_session(&state, id).await?;
    let snapshot = session.export().await;
    if snapshot.path.is_empty() {
        return Err(AppError::Validation(
            "Select at least one step before exporting".to_string(),
        ));
    }
    Ok(Json(ExportResponse {
        file_name: snapshot.file_name(),
        snapshot,
    }))
}

/// POST /api/v1/sessions/:id/import
///
/// Takes the raw file bytes so malformed input, including text that is not
/// UTF-8, is reported as an import error rather than an extractor rejection.
pub async fn handle_import(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<RenderTree>, AppError> {
    let session = find_session(&state, id).await?;
    let document = std::str::from_utf8(&body)
        .map_err(|e| ImportParseError::Syntax(format!("file is not UTF-8 text: {e}")))?;
    let view = session.import(state.api.as_ref(), document).await?;
    Ok(Json(view))
}

/// GET /api/v1/sessions/:id/node-search
pub async fn handle_node_search(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<NodeSearchParams>,
) -> Result<Json<NodeSearchResponse>, AppError> {
    let session = find_session(&state, id).await?;
    let query = NodeQuery {
        search: params.q,
        node_type: params.node_type,
        min_profiles: params.min_profiles,
    };
    let response = match session.search_nodes(state.api.as_ref(), query).await? {
        NodeSearch::Superseded => NodeSearchResponse {
            superseded: true,
            results: Vec::new(),
        },
        NodeSearch::Results(results) => NodeSearchResponse {
            superseded: false,
            results,
        },
    };
    Ok(Json(response))
}

/// GET /api/v1/sessions/:id/recommendations
pub async fn handle_recommendations(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<RecommendationParams>,
) -> Result<Json<Vec<NextStepCandidate>>, AppError> {
    let session = find_session(&state, id).await?;
    let count = params.count.unwrap_or(DEFAULT_RECOMMENDATIONS).clamp(1, 50);
    let recommendations = session
        .recommendations(state.api.as_ref(), count)
        .await?;
    Ok(Json(recommendations))
}

/// GET /api/v1/sessions/:id/similar-profiles
pub async fn handle_similar_profiles(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<SimilarProfilesParams>,
) -> Result<Json<SimilarProfilesResponse>, AppError> {
    let session = find_session(&state, id).await?;
    let limit = params.limit.unwrap_or(DEFAULT_PROFILE_LIMIT).clamp(1, 100);
    let similar_profiles = session
        .similar_profiles(state.api.as_ref(), limit)
        .await?;
    Ok(Json(SimilarProfilesResponse {
        count: similar_profiles.len(),
        similar_profiles,
    }))
}
