// In-memory `CareerApi` for session and route tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::api_client::{ApiError, CareerApi, NodeQuery};
use crate::models::{
    CareerPathStep, CareerPathsFromUniversity, CompanyRecord, ExperienceDetail, GraphStatistics, NextStepCandidate, NodeRecord, NodeType,
    Paginated, PathNode, ProfileDetail, ProfileSearchResult, ProfileSummary, RankedNode,
    SimilarPath, University, UniversityCareerPath, UniversityStatistics, UserProfile,
};

#[derive(Default)]
pub struct FakeCareerApi {
    next_steps: Mutex<HashMap<String, Vec<NextStepCandidate>>>,
    delays: Mutex<HashMap<String, Duration>>,
    failure: Mutex<Option<ApiError>>,
    calls: Mutex<Vec<String>>,
}

pub fn step(node: PathNode, profiles_count: u64) -> NextStepCandidate {
    NextStepCandidate {
        node_type: node.node_type,
        value: node.value,
        profiles_count,
        confidence: None,
        total_weight: None,
        matching_profiles: Vec::new(),
    }
}

impl FakeCareerApi {
    /// Next steps served when the path ends at `last`.
    pub fn with_steps(self, last: &str, steps: Vec<NextStepCandidate>) -> Self {
        self.next_steps
            .lock()
            .unwrap()
            .insert(last.to_string(), steps);
        self
    }

    /// Delay before answering any path-keyed call for a path ending at `last`.
    pub fn with_delay(self, last: &str, delay: Duration) -> Self {
        self.delays
            .lock()
            .unwrap()
            .insert(last.to_string(), delay);
        self
    }

    /// Every call fails with `err` until `recover` is called.
    pub fn fail_with(&self, err: ApiError) {
        *self.failure.lock().unwrap() = Some(err);
    }

    pub fn recover(&self) {
        *self.failure.lock().unwrap() = None;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn enter(&self, call: &str, nodes: &[PathNode]) -> Result<(), ApiError> {
        let last = nodes.last().map(|n| n.value.clone()).unwrap_or_default();
        self.calls.lock().unwrap().push(format!("{call}:{last}"));
        let delay = self.delays.lock().unwrap().get(&last).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.failure.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn steps_for(&self, nodes: &[PathNode]) -> Vec<NextStepCandidate> {
        let last = nodes.last().map(|n| n.value.as_str()).unwrap_or_default();
        self.next_steps
            .lock()
            .unwrap()
            .get(last)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl CareerApi for FakeCareerApi {
    async fn list_popular_universities(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<University>, ApiError> {
        self.enter("universities", &[]).await?;
        let all = vec![
            University {
                name: "Stanford University".into(),
                profiles_count: 120,
                id: Some(1),
            },
            University {
                name: "MIT".into(),
                profiles_count: 90,
                id: Some(2),
            },
        ];
        Ok(all.into_iter().take(limit.unwrap_or(usize::MAX)).collect())
    }

    async fn fetch_next_steps(
        &self,
        nodes: &[PathNode],
        limit: usize,
    ) -> Result<Vec<NextStepCandidate>, ApiError> {
        self.enter("next_steps", nodes).await?;
        Ok(self.steps_for(nodes).into_iter().take(limit).collect())
    }

    async fn search_profiles(
        &self,
        nodes: &[PathNode],
        _limit: usize,
    ) -> Result<ProfileSearchResult, ApiError> {
        self.enter("profiles", nodes).await?;
        Ok(ProfileSearchResult {
            total_matches: 1,
            profiles: vec![ProfileSummary {
                id: 1,
                full_name: "Ada Lovelace".into(),
                headline: Some("Engineer".into()),
                location: None,
                linkedin_url: None,
                education: Vec::new(),
                experience: Vec::new(),
            }],
        })
    }

    async fn fetch_statistics(&self) -> Result<GraphStatistics, ApiError> {
        self.enter("statistics", &[]).await?;
        Ok(GraphStatistics {
            total_profiles: 210,
            total_universities: 2,
            total_companies: 14,
            total_connections: 300,
            total_nodes: None,
            node_types: BTreeMap::new(),
            top_universities: vec![RankedNode {
                value: "Stanford University".into(),
                profiles_count: 120,
            }],
            top_companies: Vec::new(),
        })
    }

    async fn fetch_similar_paths(
        &self,
        nodes: &[PathNode],
        _limit: usize,
    ) -> Result<Vec<SimilarPath>, ApiError> {
        self.enter("similar_paths", nodes).await?;
        let mut alternate = nodes.to_vec();
        alternate.push(PathNode::company("Apple"));
        Ok(vec![SimilarPath {
            nodes: alternate,
            profiles_count: Some(3),
        }])
    }

    async fn fetch_recommendations(
        &self,
        profile: &UserProfile,
        count: usize,
    ) -> Result<Vec<NextStepCandidate>, ApiError> {
        let last = profile
            .education
            .last()
            .map(|e| PathNode::university(e.university.clone()));
        let nodes: Vec<PathNode> = last.into_iter().collect();
        self.enter("recommendations", &nodes).await?;
        Ok(self
            .steps_for(&nodes)
            .into_iter()
            .take(count)
            .map(|mut s| {
                s.confidence = Some(50.0);
                s
            })
            .collect())
    }

    async fn fetch_profile(&self, id: i64) -> Result<ProfileDetail, ApiError> {
        self.enter("profile", &[]).await?;
        if id != 1 {
            return Err(ApiError::Client {
                status: 404,
                message: "Not found.".into(),
            });
        }
        Ok(ProfileDetail {
            id,
            linkedin_id: None,
            linkedin_url: None,
            full_name: "Ada Lovelace".into(),
            headline: None,
            location: None,
            summary: None,
            profile_image_url: None,
            is_premium: false,
            educations: Vec::new(),
            experiences: vec![ExperienceDetail {
                id: 1,
                company: CompanyRecord {
                    id: 1,
                    name: "Analytical Engines".into(),
                    industry: None,
                    size: None,
                    website: None,
                    linkedin_url: None,
                },
                title: "Programmer".into(),
                employment_type: None,
                location: None,
                start_date: None,
                end_date: None,
                is_current: true,
                description: None,
            }],
            scraped_at: None,
            created_at: None,
        })
    }

    async fn fetch_university_statistics(
        &self,
        university: &str,
    ) -> Result<UniversityStatistics, ApiError> {
        self.enter("university_stats", &[PathNode::university(university)])
            .await?;
        let mut top_companies = BTreeMap::new();
        top_companies.insert("Google".to_string(), 12);
        Ok(UniversityStatistics {
            university: university.to_string(),
            total_profiles: 12,
            top_companies,
            top_titles: BTreeMap::new(),
            top_industries: BTreeMap::new(),
        })
    }

    async fn search_nodes(&self, query: &NodeQuery) -> Result<Paginated<NodeRecord>, ApiError> {
        self.enter("nodes", &[PathNode::title(query.search.clone())])
            .await?;
        let catalog = [
            (1, NodeType::Company, "Google"),
            (2, NodeType::Company, "GoDaddy"),
            (3, NodeType::University, "Georgia Tech"),
        ];
        let needle = query.search.to_lowercase();
        let results: Vec<NodeRecord> = catalog
            .iter()
            .filter(|(_, t, v)| {
                v.to_lowercase().contains(&needle) && query.node_type.map_or(true, |q| q == *t)
            })
            .map(|&(id, node_type, value)| NodeRecord {
                id,
                node_type,
                value: value.to_string(),
                profiles_count: 10,
                created_at: None,
            })
            .collect();
        Ok(Paginated {
            count: results.len() as u64,
            next: None,
            previous: None,
            results,
        })
    }

    /// One single-step path per configured next step; unknown universities 404.
    async fn fetch_career_paths(
        &self,
        university: &str,
        _max_depth: u8,
    ) -> Result<CareerPathsFromUniversity, ApiError> {
        let start = PathNode::university(university);
        self.enter("career_paths", &[start.clone()]).await?;
        let steps = self.steps_for(&[start.clone()]);
        if steps.is_empty() {
            return Err(ApiError::Client {
                status: 404,
                message: format!("University not found: {university}"),
            });
        }
        let paths: Vec<UniversityCareerPath> = steps
            .into_iter()
            .map(|s| UniversityCareerPath {
                total_profiles: s.profiles_count,
                path_length: 1,
                strength_score: s.profiles_count as f64,
                steps: vec![CareerPathStep {
                    from: start.clone(),
                    weight: s.profiles_count as f64,
                    profiles_count: s.profiles_count,
                    to: s.node(),
                }],
            })
            .collect();
        Ok(CareerPathsFromUniversity {
            university: university.to_string(),
            total_paths: paths.len() as u64,
            paths,
        })
    }

    async fn fetch_similar_profiles(
        &self,
        profile: &UserProfile,
        limit: usize,
    ) -> Result<Vec<ProfileSummary>, ApiError> {
        let last = profile
            .education
            .last()
            .map(|e| PathNode::university(e.university.clone()));
        let nodes: Vec<PathNode> = last.into_iter().collect();
        self.enter("similar_profiles", &nodes).await?;
        let all = vec![
            ProfileSummary {
                id: 2,
                full_name: "Grace Hopper".into(),
                headline: Some("Rear Admiral".into()),
                location: None,
                linkedin_url: None,
                education: Vec::new(),
                experience: Vec::new(),
            },
            ProfileSummary {
                id: 3,
                full_name: "Katherine Johnson".into(),
                headline: None,
                location: None,
                linkedin_url: None,
                education: Vec::new(),
                experience: Vec::new(),
            },
        ];
        Ok(all.into_iter().take(limit).collect())
    }
}
