// Paths and wire envelopes of the career graph backend.
// Every path is relative to `CAREER_API_URL` and keeps the trailing slash
// the backend routes expect.

use serde::{Deserialize, Serialize};

use crate::models::{NextStepCandidate, PathNode, ProfileSummary, SimilarPath, UserProfile};

pub const POPULAR_UNIVERSITIES: &str = "/api/popular-universities/";
pub const NEXT_STEPS: &str = "/api/next-steps/";
pub const PROFILE_SEARCH: &str = "/api/profile-search/";
pub const GRAPH_STATISTICS: &str = "/api/graph/statistics/";
pub const SIMILAR_PATHS: &str = "/api/similar-paths/";
pub const RECOMMENDATIONS: &str = "/api/recommendations/";
pub const UNIVERSITY_STATS: &str = "/api/university-stats/";
pub const NODES: &str = "/api/nodes/";
pub const CAREER_PATHS: &str = "/api/career-paths/";
pub const SIMILAR_PROFILES: &str = "/api/similar-profiles/";

pub fn profile_detail(id: i64) -> String {
    format!("/api/profiles/{id}/")
}

/// Body shared by every path-keyed POST.
#[derive(Debug, Serialize)]
pub struct PathQuery<'a> {
    pub selected_nodes: &'a [PathNode],
    pub limit: usize,
}

#[derive(Debug, Serialize)]
pub struct RecommendationQuery<'a> {
    pub user_profile: &'a UserProfile,
    pub num_recommendations: usize,
}

#[derive(Debug, Serialize)]
pub struct UniversityStatsQuery<'a> {
    pub university_name: &'a str,
}

#[derive(Debug, Serialize)]
pub struct CareerPathsQuery<'a> {
    pub university: &'a str,
    pub max_depth: u8,
}

#[derive(Debug, Serialize)]
pub struct SimilarProfilesQuery<'a> {
    pub user_profile: &'a UserProfile,
    pub limit: usize,
}

#[derive(Debug, Deserialize)]
pub struct NextStepsEnvelope {
    #[serde(default)]
    pub next_steps: Vec<NextStepCandidate>,
}

#[derive(Debug, Deserialize)]
pub struct SimilarPathsEnvelope {
    #[serde(default)]
    pub similar_paths: Vec<SimilarPath>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationsEnvelope {
    #[serde(default)]
    pub recommendations: Vec<NextStepCandidate>,
}

#[derive(Debug, Deserialize)]
pub struct SimilarProfilesEnvelope {
    #[serde(default)]
    pub similar_profiles: Vec<ProfileSummary>,
}
