use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::path::{NodeType, PathNode};

// ────────────────────────────────────────────────────────────────────────────
// Graph exploration payloads
// ────────────────────────────────────────────────────────────────────────────

/// Entry of `GET /api/popular-universities/`, in server order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct University {
    pub name: String,
    pub profiles_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

/// A candidate continuation of the current path, ranked by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NextStepCandidate {
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub value: String,
    pub profiles_count: u64,
    /// 0 to 100, only present on recommendation results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_weight: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matching_profiles: Vec<i64>,
}

impl NextStepCandidate {
    pub fn node(&self) -> PathNode {
        PathNode::new(self.node_type, self.value.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EducationSummary {
    pub university: String,
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub major: String,
    #[serde(default)]
    pub years: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperienceSummary {
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub is_current: bool,
}

/// Profile row returned by path search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileSummary {
    pub id: i64,
    pub full_name: String,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub education: Vec<EducationSummary>,
    #[serde(default)]
    pub experience: Vec<ExperienceSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileSearchResult {
    #[serde(default)]
    pub profiles: Vec<ProfileSummary>,
    #[serde(default)]
    pub total_matches: u64,
}

/// An alternate trajectory returned for side-by-side comparison.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimilarPath {
    pub nodes: Vec<PathNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profiles_count: Option<u64>,
}

/// One edge of a trajectory that starts at a university.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CareerPathStep {
    pub from: PathNode,
    pub to: PathNode,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub profiles_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UniversityCareerPath {
    pub steps: Vec<CareerPathStep>,
    #[serde(default)]
    pub total_profiles: u64,
    #[serde(default)]
    pub path_length: usize,
    #[serde(default)]
    pub strength_score: f64,
}

/// Strongest trajectories out of one university, best first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CareerPathsFromUniversity {
    pub university: String,
    #[serde(default)]
    pub total_paths: u64,
    #[serde(default)]
    pub paths: Vec<UniversityCareerPath>,
}

// ────────────────────────────────────────────────────────────────────────────
// Statistics
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedNode {
    #[serde(alias = "name")]
    pub value: String,
    pub profiles_count: u64,
}

/// `GET /api/graph/statistics/`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphStatistics {
    pub total_profiles: u64,
    pub total_universities: u64,
    pub total_companies: u64,
    pub total_connections: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_nodes: Option<u64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub node_types: BTreeMap<String, u64>,
    #[serde(default)]
    pub top_universities: Vec<RankedNode>,
    #[serde(default)]
    pub top_companies: Vec<RankedNode>,
}

/// `POST /api/university-stats/`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UniversityStatistics {
    pub university: String,
    pub total_profiles: u64,
    #[serde(default)]
    pub top_companies: BTreeMap<String, u64>,
    #[serde(default)]
    pub top_titles: BTreeMap<String, u64>,
    #[serde(default)]
    pub top_industries: BTreeMap<String, u64>,
}

/// Orders a counter map by descending count, ties by name.
pub fn ranked(counts: &BTreeMap<String, u64>) -> Vec<RankedNode> {
    let mut out: Vec<RankedNode> = counts
        .iter()
        .map(|(value, &profiles_count)| RankedNode {
            value: value.clone(),
            profiles_count,
        })
        .collect();
    out.sort_by(|a, b| b.profiles_count.cmp(&a.profiles_count));
    out
}

// ────────────────────────────────────────────────────────────────────────────
// Node search (DRF paginated list)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeRecord {
    pub id: i64,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub value: String,
    pub profiles_count: u64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

// ────────────────────────────────────────────────────────────────────────────
// Profile detail
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UniversityRecord {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompanyRecord {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamedRecord {
    pub id: i64,
    pub name: String,
    #[serde(default, alias = "type", alias = "field")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EducationDetail {
    pub id: i64,
    pub university: UniversityRecord,
    #[serde(default)]
    pub degree: Option<NamedRecord>,
    #[serde(default)]
    pub major: Option<NamedRecord>,
    #[serde(default)]
    pub start_year: Option<i32>,
    #[serde(default)]
    pub end_year: Option<i32>,
    #[serde(default)]
    pub gpa: Option<String>,
    #[serde(default)]
    pub activities: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperienceDetail {
    pub id: i64,
    pub company: CompanyRecord,
    pub title: String,
    #[serde(default)]
    pub employment_type: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub description: Option<String>,
}

/// `GET /api/profiles/{id}/`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileDetail {
    pub id: i64,
    #[serde(default)]
    pub linkedin_id: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    pub full_name: String,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub educations: Vec<EducationDetail>,
    #[serde(default)]
    pub experiences: Vec<ExperienceDetail>,
    #[serde(default)]
    pub scraped_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

// ────────────────────────────────────────────────────────────────────────────
// Recommendations input
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct EducationClaim {
    pub university: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ExperienceClaim {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// The `user_profile` body the recommender expects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UserProfile {
    pub education: Vec<EducationClaim>,
    pub experience: Vec<ExperienceClaim>,
}

impl UserProfile {
    /// Folds a path into education and experience entries. A title directly
    /// after a company belongs to that company's experience.
    pub fn from_path(nodes: &[PathNode]) -> Self {
        let mut profile = UserProfile::default();
        for node in nodes {
            match node.node_type {
                NodeType::University => profile.education.push(EducationClaim {
                    university: node.value.clone(),
                }),
                NodeType::Company => profile.experience.push(ExperienceClaim {
                    company: Some(node.value.clone()),
                    title: None,
                }),
                NodeType::Title => match profile.experience.last_mut() {
                    Some(open) if open.title.is_none() => open.title = Some(node.value.clone()),
                    _ => profile.experience.push(ExperienceClaim {
                        company: None,
                        title: Some(node.value.clone()),
                    }),
                },
            }
        }
        profile
    }
}
