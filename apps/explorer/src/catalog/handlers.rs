use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api_client::{DEFAULT_CAREER_PATH_DEPTH, MAX_CAREER_PATH_DEPTH};
use crate::errors::AppError;
use crate::models::{
    ranked, CareerPathsFromUniversity, GraphStatistics, ProfileDetail, RankedNode, University,
};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UniversityListParams {
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct UniversityStatsRequest {
    pub university_name: String,
}

#[derive(Deserialize)]
pub struct CareerPathsRequest {
    pub university: String,
    #[serde(default)]
    pub max_depth: Option<u8>,
}

/// Per-university breakdown with each counter already ranked.
#[derive(Serialize)]
pub struct UniversityStatsResponse {
    pub university: String,
    pub total_profiles: u64,
    pub top_companies: Vec<RankedNode>,
    pub top_titles: Vec<RankedNode>,
    pub top_industries: Vec<RankedNode>,
}

/// GET /api/v1/universities
pub async fn handle_list_universities(
    State(state): State<AppState>,
    Query(params): Query<UniversityListParams>,
) -> Result<Json<Vec<University>>, AppError> {
    let universities = state.api.list_popular_universities(params.limit).await?;
    Ok(Json(universities))
}

/// GET /api/v1/statistics
pub async fn handle_statistics(
    State(state): State<AppState>,
) -> Result<Json<GraphStatistics>, AppError> {
    Ok(Json(state.api.fetch_statistics().await?))
}

/// POST /api/v1/university-stats
pub async fn handle_university_stats(
    State(state): State<AppState>,
    Json(req): Json<UniversityStatsRequest>,
) -> Result<Json<UniversityStatsResponse>, AppError> {
    let name = req.university_name.trim();
    if name.is_empty() {
        return Err(AppError::Validation(
            "university_name is required".to_string(),
        ));
    }
    let stats = state.api.fetch_university_statistics(name).await?;
    Ok(Json(UniversityStatsResponse {
        top_companies: ranked(&stats.top_companies),
        top_titles: ranked(&stats.top_titles),
        top_industries: ranked(&stats.top_industries),
        university: stats.university,
        total_profiles: stats.total_profiles,
    }))
}

/// GET /api/v1/profiles/:id
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProfileDetail>, AppError> {
    Ok(Json(state.api.fetch_profile(id).await?))
}

/// POST /api/v1/career-paths
pub async fn handle_career_paths(
    State(state): State<AppState>,
    Json(req): Json<CareerPathsRequest>,
) -> Result<Json<CareerPathsFromUniversity>, AppError> {
    let university = req.university.trim();
    if university.is_empty() {
        return Err(AppError::Validation("university is required".to_string()));
    }
    let max_depth = req.max_depth.unwrap_or(DEFAULT_CAREER_PATH_DEPTH);
    if !(1..=MAX_CAREER_PATH_DEPTH).contains(&max_depth) {
        return Err(AppError::Validation(format!(
            "max_depth must be between 1 and {MAX_CAREER_PATH_DEPTH}"
        )));
    }
    let paths = state.api.fetch_career_paths(university, max_depth).await?;
    Ok(Json(paths))
}
