//! Career API client: the single point of entry for calls to the career graph backend.
//!
//! Every call carries the client-wide timeout and fails with a typed `ApiError`
//! so callers can tell an unreachable backend from a rejected or failing one.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{
    CareerPathsFromUniversity, GraphStatistics, NextStepCandidate, NodeRecord, NodeType, Paginated,
    PathNode, ProfileDetail, ProfileSearchResult, ProfileSummary, SimilarPath, University,
    UniversityStatistics, UserProfile,
};

pub mod endpoints;
#[cfg(test)]
pub mod fake;

pub const DEFAULT_NEXT_STEPS_LIMIT: usize = 12;
pub const DEFAULT_PROFILE_LIMIT: usize = 20;
pub const DEFAULT_SIMILAR_LIMIT: usize = 5;
pub const DEFAULT_RECOMMENDATIONS: usize = 10;
pub const DEFAULT_CAREER_PATH_DEPTH: u8 = 5;
pub const MAX_CAREER_PATH_DEPTH: u8 = 10;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    #[error("Network error: {message}")]
    Network { message: String, timed_out: bool },

    #[error("Request rejected (status {status}): {message}")]
    Client { status: u16, message: String },

    #[error("Server error (status {status}): {message}")]
    Server { status: u16, message: String },

    #[error("Unexpected response body: {0}")]
    Decode(String),
}

/// Coarse error class shown to the user and used for HTTP mapping.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    Client,
    Server,
    Decode,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Network { .. } => ErrorKind::Network,
            ApiError::Client { .. } => ErrorKind::Client,
            ApiError::Server { .. } => ErrorKind::Server,
            ApiError::Decode(_) => ErrorKind::Decode,
        }
    }

    /// Message for the error panel. Never includes raw response bodies.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network {
                timed_out: true, ..
            } => "The career data service took too long to respond. Please try again.".to_string(),
            ApiError::Network { .. } => {
                "Unable to reach the career data service. Check your connection and retry."
                    .to_string()
            }
            ApiError::Client { status: 404, .. } => {
                "No career data was found for this path.".to_string()
            }
            ApiError::Client { message, .. } => format!("The request was rejected: {message}"),
            ApiError::Server { .. } => {
                "The career data service hit an error. Please retry in a moment.".to_string()
            }
            ApiError::Decode(_) => {
                "The career data service sent an unexpected response.".to_string()
            }
        }
    }

    fn from_transport(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return ApiError::Decode(err.to_string());
        }
        ApiError::Network {
            timed_out: err.is_timeout(),
            message: err.to_string(),
        }
    }
}

/// Filters for the node autocomplete list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeQuery {
    pub search: String,
    #[serde(default, rename = "type")]
    pub node_type: Option<NodeType>,
    #[serde(default)]
    pub min_profiles: Option<u64>,
}

/// The career backend contract. `AppState` carries it as `Arc<dyn CareerApi>`
/// so sessions and tests can swap the transport.
#[async_trait]
pub trait CareerApi: Send + Sync {
    async fn list_popular_universities(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<University>, ApiError>;

    async fn fetch_next_steps(
        &self,
        nodes: &[PathNode],
        limit: usize,
    ) -> Result<Vec<NextStepCandidate>, ApiError>;

    async fn search_profiles(
        &self,
        nodes: &[PathNode],
        limit: usize,
    ) -> Result<ProfileSearchResult, ApiError>;

    async fn fetch_statistics(&self) -> Result<GraphStatistics, ApiError>;

    async fn fetch_similar_paths(
        &self,
        nodes: &[PathNode],
        limit: usize,
    ) -> Result<Vec<SimilarPath>, ApiError>;

    async fn fetch_recommendations(
        &self,
        profile: &UserProfile,
        count: usize,
    ) -> Result<Vec<NextStepCandidate>, ApiError>;

    async fn fetch_profile(&self, id: i64) -> Result<ProfileDetail, ApiError>;

    async fn fetch_university_statistics(
        &self,
        university: &str,
    ) -> Result<UniversityStatistics, ApiError>;

    async fn search_nodes(&self, query: &NodeQuery) -> Result<Paginated<NodeRecord>, ApiError>;

    async fn fetch_career_paths(
        &self,
        university: &str,
        max_depth: u8,
    ) -> Result<CareerPathsFromUniversity, ApiError>;

    async fn fetch_similar_profiles(
        &self,
        profile: &UserProfile,
        limit: usize,
    ) -> Result<Vec<ProfileSummary>, ApiError>;
}

/// reqwest-backed `CareerApi`.
#[derive(Clone)]
pub struct HttpCareerApi {
    client: Client,
    base_url: String,
}

impl HttpCareerApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends a request and decodes a 2xx JSON body, classifying every failure.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await.map_err(ApiError::from_transport)?;
        let status = response.status();
        let url = response.url().path().to_string();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = extract_error_message(&body);
            warn!("Career API {} returned {}: {}", url, status, message);
            return Err(if status.is_client_error() {
                ApiError::Client {
                    status: status.as_u16(),
                    message,
                }
            } else {
                ApiError::Server {
                    status: status.as_u16(),
                    message,
                }
            });
        }

        let body = response.text().await.map_err(ApiError::from_transport)?;
        debug!("Career API {} succeeded ({} bytes)", url, body.len());
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn post_path<T: DeserializeOwned>(
        &self,
        path: &str,
        nodes: &[PathNode],
        limit: usize,
    ) -> Result<T, ApiError> {
        let body = endpoints::PathQuery {
            selected_nodes: nodes,
            limit,
        };
        self.send(self.client.post(self.url(path)).json(&body)).await
    }
}

#[async_trait]
impl CareerApi for HttpCareerApi {
    async fn list_popular_universities(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<University>, ApiError> {
        let mut request = self.client.get(self.url(endpoints::POPULAR_UNIVERSITIES));
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        self.send(request).await
    }

    async fn fetch_next_steps(
        &self,
        nodes: &[PathNode],
        limit: usize,
    ) -> Result<Vec<NextStepCandidate>, ApiError> {
        let envelope: endpoints::NextStepsEnvelope =
            self.post_path(endpoints::NEXT_STEPS, nodes, limit).await?;
        Ok(envelope.next_steps)
    }

    async fn search_profiles(
        &self,
        nodes: &[PathNode],
        limit: usize,
    ) -> Result<ProfileSearchResult, ApiError> {
        self.post_path(endpoints::PROFILE_SEARCH, nodes, limit).await
    }

    async fn fetch_statistics(&self) -> Result<GraphStatistics, ApiError> {
        self.send(self.client.get(self.url(endpoints::GRAPH_STATISTICS)))
            .await
    }

    async fn fetch_similar_paths(
        &self,
        nodes: &[PathNode],
        limit: usize,
    ) -> Result<Vec<SimilarPath>, ApiError> {
        let envelope: endpoints::SimilarPathsEnvelope =
            self.post_path(endpoints::SIMILAR_PATHS, nodes, limit).await?;
        Ok(envelope.similar_paths)
    }

    async fn fetch_recommendations(
        &self,
        profile: &UserProfile,
        count: usize,
    ) -> Result<Vec<NextStepCandidate>, ApiError> {
        let body = endpoints::RecommendationQuery {
            user_profile: profile,
            num_recommendations: count,
        };
        let envelope: endpoints::RecommendationsEnvelope = self
            .send(
                self.client
                    .post(self.url(endpoints::RECOMMENDATIONS))
                    .json(&body),
            )
            .await?;
        Ok(envelope.recommendations)
    }

    async fn fetch_profile(&self, id: i64) -> Result<ProfileDetail, ApiError> {
        self.send(self.client.get(self.url(&endpoints::profile_detail(id))))
            .await
    }

    async fn fetch_university_statistics(
        &self,
        university: &str,
    ) -> Result<UniversityStatistics, ApiError> {
        let body = endpoints::UniversityStatsQuery {
            university_name: university,
        };
        self.send(
            self.client
                .post(self.url(endpoints::UNIVERSITY_STATS))
                .json(&body),
        )
        .await
    }

    async fn search_nodes(&self, query: &NodeQuery) -> Result<Paginated<NodeRecord>, ApiError> {
        let mut params: Vec<(&str, String)> = vec![("search", query.search.clone())];
        if let Some(node_type) = query.node_type {
            params.push(("type", node_type.as_str().to_string()));
        }
        if let Some(min) = query.min_profiles {
            params.push(("min_profiles", min.to_string()));
        }
        self.send(self.client.get(self.url(endpoints::NODES)).query(&params))
            .await
    }

    async fn fetch_career_paths(
        &self,
        university: &str,
        max_depth: u8,
    ) -> Result<CareerPathsFromUniversity, ApiError> {
        let body = endpoints::CareerPathsQuery {
            university,
            max_depth,
        };
        self.send(self.client.post(self.url(endpoints::CAREER_PATHS)).json(&body))
            .await
    }

    async fn fetch_similar_profiles(
        &self,
        profile: &UserProfile,
        limit: usize,
    ) -> Result<Vec<ProfileSummary>, ApiError> {
        let body = endpoints::SimilarProfilesQuery {
            user_profile: profile,
            limit,
        };
        let envelope: endpoints::SimilarProfilesEnvelope = self
            .send(
                self.client
                    .post(self.url(endpoints::SIMILAR_PROFILES))
                    .json(&body),
            )
            .await?;
        Ok(envelope.similar_profiles)
    }
}

/// Pulls a readable message out of a backend error body.
///
/// The views answer `{"error": "..."}`, DRF itself answers `{"detail": "..."}`,
/// and serializer validation answers a field → messages map.
fn extract_error_message(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => {
            for key in ["error", "detail"] {
                if let Some(Value::String(msg)) = map.get(key) {
                    return msg.clone();
                }
            }
            map.iter()
                .map(|(field, errors)| match errors {
                    Value::Array(items) => {
                        let joined = items
                            .iter()
                            .map(|i| i.as_str().map(str::to_string).unwrap_or_else(|| i.to_string()))
                            .collect::<Vec<_>>()
                            .join(" ");
                        format!("{field}: {joined}")
                    }
                    other => format!("{field}: {other}"),
                })
                .collect::<Vec<_>>()
                .join("; ")
        }
        _ => trimmed.chars().take(200).collect(),
    }
}
