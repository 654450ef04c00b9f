//! Explorer sessions: one controller per browser tab.
//!
//! A session owns its controller behind an async mutex but never holds the
//! lock across a network call: the commands returned by `dispatch` are run
//! unlocked and their results fed back through `resolve`. Two overlapping
//! events on the same session therefore race on the wire, and the
//! controller's tickets decide which response lands.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::api_client::{ApiError, CareerApi, NodeQuery};
use crate::explorer::controller::{
    Command, ExplorerController, ExplorerEvent, FetchKind, FetchLimits, FetchOutcome, Resolution,
};
use crate::explorer::debounce::{Debouncer, DEFAULT_QUIET_PERIOD};
use crate::explorer::path_state::{PathState, DEFAULT_HISTORY_CAP};
use crate::models::{NextStepCandidate, NodeRecord, ProfileSummary, UserProfile};
use crate::persistence::snapshot::{ImportParseError, Snapshot};
use crate::render::RenderTree;

/// Node search queries shorter than this never reach the backend.
pub const MIN_SEARCH_LEN: usize = 2;

pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub history_cap: usize,
    pub limits: FetchLimits,
    pub search_quiet: Duration,
    /// Sessions untouched for longer than this are dropped by `evict_idle`.
    pub idle_ttl: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            history_cap: DEFAULT_HISTORY_CAP,
            limits: FetchLimits::default(),
            search_quiet: DEFAULT_QUIET_PERIOD,
            idle_ttl: DEFAULT_IDLE_TTL,
        }
    }
}

/// Result of a debounced node search.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeSearch {
    /// A newer keystroke arrived during the quiet period.
    Superseded,
    Results(Vec<NodeRecord>),
}

pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    controller: Mutex<ExplorerController>,
    search_input: Debouncer,
    /// Millis since the registry epoch at the last lookup.
    last_seen: AtomicU64,
}

impl Session {
    fn new(settings: &SessionSettings, now_ms: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            controller: Mutex::new(ExplorerController::new(
                PathState::with_history_cap(settings.history_cap),
                settings.limits,
            )),
            search_input: Debouncer::new(settings.search_quiet),
            last_seen: AtomicU64::new(now_ms),
        }
    }

    pub async fn render(&self) -> RenderTree {
        self.controller.lock().await.render()
    }

    pub async fn dispatch(&self, api: &dyn CareerApi, event: ExplorerEvent) -> RenderTree {
        let commands = self.controller.lock().await.dispatch(event);
        self.run(api, commands).await
    }

    pub async fn export(&self) -> Snapshot {
        self.controller.lock().await.export_snapshot()
    }

    /// Imports a snapshot document and loads next steps for its path.
    pub async fn import(
        &self,
        api: &dyn CareerApi,
        document: &str,
    ) -> Result<RenderTree, ImportParseError> {
        let commands = self.controller.lock().await.import_snapshot(document)?;
        Ok(self.run(api, commands).await)
    }

    /// Debounced autocomplete. Only the last of a burst of calls hits the
    /// backend; the rest come back `Superseded`.
    pub async fn search_nodes(
        &self,
        api: &dyn CareerApi,
        query: NodeQuery,
    ) -> Result<NodeSearch, ApiError> {
        if !self.search_input.settle().await {
            return Ok(NodeSearch::Superseded);
        }
        if query.search.trim().chars().count() < MIN_SEARCH_LEN {
            return Ok(NodeSearch::Results(Vec::new()));
        }
        let page = api.search_nodes(&query).await?;
        debug!(
            "Node search '{}' matched {} of {}",
            query.search,
            page.results.len(),
            page.count
        );
        Ok(NodeSearch::Results(page.results))
    }

    /// Recommendations for the current path. An empty path yields nothing.
    pub async fn recommendations(
        &self,
        api: &dyn CareerApi,
        count: usize,
    ) -> Result<Vec<NextStepCandidate>, ApiError> {
        match self.profile().await {
            Some(profile) => api.fetch_recommendations(&profile, count).await,
            None => Ok(Vec::new()),
        }
    }

    /// Profiles resembling the current path, read as a user profile.
    pub async fn similar_profiles(
        &self,
        api: &dyn CareerApi,
        limit: usize,
    ) -> Result<Vec<ProfileSummary>, ApiError> {
        match self.profile().await {
            Some(profile) => api.fetch_similar_profiles(&profile, limit).await,
            None => Ok(Vec::new()),
        }
    }

    async fn profile(&self) -> Option<UserProfile> {
        let controller = self.controller.lock().await;
        if controller.path().is_empty() {
            return None;
        }
        Some(UserProfile::from_path(controller.path().nodes()))
    }

    async fn run(&self, api: &dyn CareerApi, commands: Vec<Command>) -> RenderTree {
        for command in commands {
            let result = execute(api, &command).await;
            let resolution = self.controller.lock().await.resolve(command.ticket, result);
            if resolution == Resolution::Stale {
                debug!(
                    "Session {} dropped a superseded {:?} result",
                    self.id, command.ticket.kind
                );
            }
        }
        self.render().await
    }
}

/// Performs one controller command against the career API.
pub async fn execute(api: &dyn CareerApi, command: &Command) -> Result<FetchOutcome, ApiError> {
    match command.ticket.kind {
        FetchKind::NextSteps => api
            .fetch_next_steps(&command.nodes, command.limit)
            .await
            .map(FetchOutcome::NextSteps),
        FetchKind::Profiles => api
            .search_profiles(&command.nodes, command.limit)
            .await
            .map(FetchOutcome::Profiles),
        FetchKind::SimilarPaths => api
            .fetch_similar_paths(&command.nodes, command.limit)
            .await
            .map(FetchOutcome::SimilarPaths),
    }
}

/// In-memory session table shared by all handlers.
///
/// A tab that reloads or closes without deleting its session stops touching
/// it, so idle sessions are swept after `SessionSettings::idle_ttl`.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Session>>>>,
    settings: SessionSettings,
    epoch: Instant,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(SessionSettings::default())
    }
}

impl SessionRegistry {
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            sessions: Arc::default(),
            settings,
            epoch: Instant::now(),
        }
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    pub async fn create(&self) -> Arc<Session> {
        let session = Arc::new(Session::new(&self.settings, self.now_ms()));
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id, session.clone());
        info!("Created session {} ({} live)", session.id, sessions.len());
        session
    }

    /// Looks a session up and marks it as seen.
    pub async fn get(&self, id: Uuid) -> Option<Arc<Session>> {
        let session = self.sessions.read().await.get(&id).cloned()?;
        session.last_seen.store(self.now_ms(), Ordering::Relaxed);
        Some(session)
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            info!("Closed session {id}");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops every session idle for longer than the TTL. Returns how many went.
    pub async fn evict_idle(&self) -> usize {
        let ttl = self.settings.idle_ttl.as_millis() as u64;
        let now = self.now_ms();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| now.saturating_sub(s.last_seen.load(Ordering::Relaxed)) <= ttl);
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(
                "Evicted {} idle sessions ({} live)",
                evicted,
                sessions.len()
            );
        }
        evicted
    }

    /// Runs `evict_idle` every `period` until the runtime shuts down.
    pub fn spawn_sweeper(&self, period: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                registry.evict_idle().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_client::fake::{step, FakeCareerApi};
    use crate::explorer::controller::Phase;
    use crate::models::{NodeType, PathNode};
    use crate::render::MainPanel;

    fn stanford() -> PathNode {
        PathNode::university("Stanford University")
    }

    fn api() -> FakeCareerApi {
        FakeCareerApi::default()
            .with_steps(
                "Stanford University",
                vec![
                    step(PathNode::company("Google"), 40),
                    step(PathNode::company("Meta"), 12),
                ],
            )
            .with_steps("Google", vec![step(PathNode::title("Software Engineer"), 30)])
    }

    async fn phase_of(session: &Session) -> Phase {
        session.controller.lock().await.phase()
    }

    #[tokio::test]
    async fn test_dispatch_runs_fetch_and_renders_tiles() {
        let api = api();
        let registry = SessionRegistry::default();
        let session = registry.create().await;

        let view = session
            .dispatch(&api, ExplorerEvent::SelectRoot { node: stanford() })
            .await;

        assert_eq!(view.phase, Phase::Exploring);
        match view.main {
            MainPanel::NextSteps { tiles, .. } => assert_eq!(tiles.len(), 2),
            other => panic!("expected next steps, got {other:?}"),
        }
        assert_eq!(api.calls(), vec!["next_steps:Stanford University"]);
    }

    #[tokio::test]
    async fn test_path_without_continuations_renders_terminal() {
        let api = api();
        let session = SessionRegistry::default().create().await;
        session
            .dispatch(&api, ExplorerEvent::SelectRoot { node: stanford() })
            .await;
        session
            .dispatch(
                &api,
                ExplorerEvent::AppendStep {
                    node: PathNode::company("Meta"),
                },
            )
            .await;
        assert_eq!(phase_of(&session).await, Phase::Terminal);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_response_for_abandoned_path_is_ignored() {
        let api = Arc::new(
            api()
                .with_steps("MIT", vec![step(PathNode::company("Intel"), 8)])
                .with_delay("Stanford University", Duration::from_millis(500))
                .with_delay("MIT", Duration::from_millis(10)),
        );
        let session = SessionRegistry::default().create().await;

        let slow = {
            let (api, session) = (api.clone(), session.clone());
            tokio::spawn(async move {
                session
                    .dispatch(api.as_ref(), ExplorerEvent::SelectRoot { node: stanford() })
                    .await
            })
        };
        tokio::task::yield_now().await;
        session
            .dispatch(
                api.as_ref(),
                ExplorerEvent::SelectRoot {
                    node: PathNode::university("MIT"),
                },
            )
            .await;
        slow.await.unwrap();

        let controller = session.controller.lock().await;
        assert_eq!(controller.path().nodes(), &[PathNode::university("MIT")]);
        let shown: Vec<_> = controller
            .next_steps()
            .unwrap()
            .iter()
            .map(|s| s.value.as_str())
            .collect();
        assert_eq!(shown, vec!["Intel"]);
    }

    #[tokio::test]
    async fn test_failure_renders_error_then_retry_recovers() {
        let api = api();
        let session = SessionRegistry::default().create().await;
        api.fail_with(ApiError::Server {
            status: 500,
            message: "boom".into(),
        });

        let view = session
            .dispatch(&api, ExplorerEvent::SelectRoot { node: stanford() })
            .await;
        assert_eq!(view.phase, Phase::Error);
        assert!(matches!(view.main, MainPanel::Error(_)));

        api.recover();
        let view = session.dispatch(&api, ExplorerEvent::Retry).await;
        assert_eq!(view.phase, Phase::Exploring);
        assert_eq!(
            api.calls(),
            vec![
                "next_steps:Stanford University",
                "next_steps:Stanford University"
            ]
        );
    }

    #[tokio::test]
    async fn test_import_fetches_for_imported_path() {
        let api = api();
        let session = SessionRegistry::default().create().await;
        let view = session
            .import(
                &api,
                r#"{"path":[{"type":"university","value":"Stanford University"},
                            {"type":"company","value":"Google"}]}"#,
            )
            .await
            .unwrap();
        assert_eq!(view.breadcrumbs.len(), 2);
        assert_eq!(api.calls(), vec!["next_steps:Google"]);

        let snapshot = session.export().await;
        assert_eq!(snapshot.path.len(), 2);
        assert_eq!(snapshot.recommendations.len(), 1);
    }

    #[tokio::test]
    async fn test_bad_import_is_reported_without_fetching() {
        let api = api();
        let session = SessionRegistry::default().create().await;
        assert!(session.import(&api, "[1,2").await.is_err());
        assert!(api.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_node_search_burst_only_queries_once() {
        let api = Arc::new(api());
        let session = SessionRegistry::default().create().await;

        let mut handles = Vec::new();
        for text in ["G", "Go", "Goo"] {
            let (api, session) = (api.clone(), session.clone());
            let query = NodeQuery {
                search: text.to_string(),
                ..NodeQuery::default()
            };
            handles.push(tokio::spawn(async move {
                session.search_nodes(api.as_ref(), query).await
            }));
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        let mut outcomes = Vec::new();
        for handle in handles {
            outcomes.push(handle.await.unwrap().unwrap());
        }
        assert_eq!(outcomes[0], NodeSearch::Superseded);
        assert_eq!(outcomes[1], NodeSearch::Superseded);
        match &outcomes[2] {
            NodeSearch::Results(nodes) => {
                assert_eq!(nodes.len(), 1);
                assert_eq!(nodes[0].value, "Google");
            }
            other => panic!("expected results, got {other:?}"),
        }
        assert_eq!(api.calls(), vec!["nodes:Goo"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_node_search_skips_backend() {
        let api = api();
        let session = SessionRegistry::default().create().await;
        let result = session
            .search_nodes(
                &api,
                NodeQuery {
                    search: "G".into(),
                    node_type: Some(NodeType::Company),
                    min_profiles: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(result, NodeSearch::Results(Vec::new()));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_recommendations_use_current_path() {
        let api = api();
        let session = SessionRegistry::default().create().await;
        assert!(session.recommendations(&api, 5).await.unwrap().is_empty());

        session
            .dispatch(&api, ExplorerEvent::SelectRoot { node: stanford() })
            .await;
        let recs = session.recommendations(&api, 1).await.unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].value, "Google");
    }

    #[tokio::test]
    async fn test_similar_profiles_follow_current_path() {
        let api = api();
        let session = SessionRegistry::default().create().await;
        assert!(session.similar_profiles(&api, 5).await.unwrap().is_empty());
        assert!(api.calls().is_empty());

        session
            .dispatch(&api, ExplorerEvent::SelectRoot { node: stanford() })
            .await;
        let profiles = session.similar_profiles(&api, 1).await.unwrap();
        assert_eq!(profiles.len(), 1);
        assert!(api
            .calls()
            .contains(&"similar_profiles:Stanford University".to_string()));
    }

    #[tokio::test]
    async fn test_registry_create_get_remove() {
        let registry = SessionRegistry::new(SessionSettings {
            history_cap: 3,
            ..SessionSettings::default()
        });
        let session = registry.create().await;
        assert_eq!(registry.len().await, 1);
        assert!(registry.get(session.id).await.is_some());
        assert!(registry.remove(session.id).await);
        assert!(!registry.remove(session.id).await);
        assert!(registry.get(session.id).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_sessions_are_evicted_and_active_ones_kept() {
        let registry = SessionRegistry::new(SessionSettings {
            idle_ttl: Duration::from_secs(60),
            ..SessionSettings::default()
        });
        let active = registry.create().await;
        let idle = registry.create().await;

        tokio::time::advance(Duration::from_secs(40)).await;
        assert!(registry.get(active.id).await.is_some());
        tokio::time::advance(Duration::from_secs(30)).await;

        assert_eq!(registry.evict_idle().await, 1);
        assert!(registry.get(active.id).await.is_some());
        assert!(registry.get(idle.id).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_empties_abandoned_registry() {
        let registry = SessionRegistry::new(SessionSettings {
            idle_ttl: Duration::from_secs(60),
            ..SessionSettings::default()
        });
        registry.create().await;
        registry.create().await;
        let sweeper = registry.spawn_sweeper(Duration::from_secs(10));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(registry.len().await, 2);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(registry.len().await, 0);
        sweeper.abort();
    }
}
