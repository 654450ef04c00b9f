//! Explorer controller, the exploration state machine.
//!
//! The controller never performs I/O. `dispatch` applies a user event and
//! returns the fetches it wants issued; `resolve` applies a fetch result.
//! Each fetch carries a `Ticket`; only the most recently issued ticket of a
//! kind is accepted, so a slow response for an older path can never
//! overwrite the result for the current one.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api_client::{
    ApiError, DEFAULT_NEXT_STEPS_LIMIT, DEFAULT_PROFILE_LIMIT, DEFAULT_SIMILAR_LIMIT,
};
use crate::explorer::path_state::{PathError, PathState};
use crate::models::{NextStepCandidate, PathNode, ProfileSearchResult, SimilarPath};
use crate::persistence::snapshot::{self, ImportParseError, Snapshot};
use crate::render::{self, RenderInput, RenderTree};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No root selected.
    Idle,
    /// Root selected; next steps loaded or loading.
    Exploring,
    /// The last next-steps fetch came back empty.
    Terminal,
    /// Similar-paths panel open. The path is frozen until it closes.
    Comparing,
    /// The last fetch failed. The path is unchanged.
    Error,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FetchKind {
    NextSteps,
    Profiles,
    SimilarPaths,
}

impl FetchKind {
    fn slot(self) -> usize {
        match self {
            FetchKind::NextSteps => 0,
            FetchKind::Profiles => 1,
            FetchKind::SimilarPaths => 2,
        }
    }
}

/// Issuer token stamped on a fetch when it is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub kind: FetchKind,
    pub seq: u64,
}

/// A fetch the controller wants performed against the career API.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub ticket: Ticket,
    pub nodes: Vec<PathNode>,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    NextSteps(Vec<NextStepCandidate>),
    Profiles(ProfileSearchResult),
    SimilarPaths(Vec<SimilarPath>),
}

impl FetchOutcome {
    fn kind(&self) -> FetchKind {
        match self {
            FetchOutcome::NextSteps(_) => FetchKind::NextSteps,
            FetchOutcome::Profiles(_) => FetchKind::Profiles,
            FetchOutcome::SimilarPaths(_) => FetchKind::SimilarPaths,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied,
    Stale,
}

/// Every user action the explorer understands.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExplorerEvent {
    SelectRoot { node: PathNode },
    AppendStep { node: PathNode },
    Undo,
    Redo,
    Clear,
    /// Keyboard cancel: clears from any phase.
    Escape,
    Retry,
    DismissError,
    OpenComparison,
    CloseComparison,
    SearchProfiles,
}

#[derive(Debug, Clone, Copy)]
pub struct FetchLimits {
    pub next_steps: usize,
    pub profiles: usize,
    pub similar_paths: usize,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            next_steps: DEFAULT_NEXT_STEPS_LIMIT,
            profiles: DEFAULT_PROFILE_LIMIT,
            similar_paths: DEFAULT_SIMILAR_LIMIT,
        }
    }
}

/// Per-kind issued and outstanding tickets.
#[derive(Debug, Default)]
struct TicketBook {
    issued: [u64; 3],
    pending: [Option<u64>; 3],
}

impl TicketBook {
    fn issue(&mut self, kind: FetchKind) -> Ticket {
        let slot = kind.slot();
        self.issued[slot] += 1;
        self.pending[slot] = Some(self.issued[slot]);
        Ticket {
            kind,
            seq: self.issued[slot],
        }
    }

    /// Forgets any outstanding ticket so its response will be discarded.
    fn invalidate(&mut self, kind: FetchKind) {
        let slot = kind.slot();
        self.issued[slot] += 1;
        self.pending[slot] = None;
    }

    fn accept(&mut self, ticket: Ticket) -> bool {
        let slot = ticket.kind.slot();
        if self.pending[slot] == Some(ticket.seq) {
            self.pending[slot] = None;
            true
        } else {
            false
        }
    }

    fn is_pending(&self, kind: FetchKind) -> bool {
        self.pending[kind.slot()].is_some()
    }
}

#[derive(Debug)]
pub struct ExplorerController {
    path: PathState,
    phase: Phase,
    /// Exploration phase (`Exploring` or `Terminal`) to fall back to when a
    /// comparison closes or an error is dismissed.
    resume: Phase,
    next_steps: Option<Vec<NextStepCandidate>>,
    profiles: Option<ProfileSearchResult>,
    similar_paths: Option<Vec<SimilarPath>>,
    error: Option<ApiError>,
    failed: Option<FetchKind>,
    tickets: TicketBook,
    limits: FetchLimits,
    render_epoch: u64,
}

impl ExplorerController {
    pub fn new(path: PathState, limits: FetchLimits) -> Self {
        Self {
            path,
            phase: Phase::Idle,
            resume: Phase::Exploring,
            next_steps: None,
            profiles: None,
            similar_paths: None,
            error: None,
            failed: None,
            tickets: TicketBook::default(),
            limits,
            render_epoch: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn path(&self) -> &PathState {
        &self.path
    }

    pub fn next_steps(&self) -> Option<&[NextStepCandidate]> {
        self.next_steps.as_deref()
    }

    pub fn profiles(&self) -> Option<&ProfileSearchResult> {
        self.profiles.as_ref()
    }

    pub fn similar_paths(&self) -> Option<&[SimilarPath]> {
        self.similar_paths.as_deref()
    }

    pub fn error(&self) -> Option<&ApiError> {
        self.error.as_ref()
    }

    pub fn is_loading(&self, kind: FetchKind) -> bool {
        self.tickets.is_pending(kind)
    }

    /// Number of re-render requests raised so far.
    pub fn render_epoch(&self) -> u64 {
        self.render_epoch
    }

    pub fn dispatch(&mut self, event: ExplorerEvent) -> Vec<Command> {
        debug!("Explorer event {:?} in phase {:?}", event, self.phase);
        match event {
            ExplorerEvent::SelectRoot { node } => {
                if self.phase == Phase::Comparing {
                    return self.reject("select_root while comparing");
                }
                self.path.select_root(node);
                self.path_changed()
            }
            ExplorerEvent::AppendStep { node } => {
                if self.phase != Phase::Exploring {
                    return self.reject("append_step outside exploring");
                }
                match self.path.append_step(node) {
                    Ok(()) => self.path_changed(),
                    Err(e) => self.reject_path(e),
                }
            }
            ExplorerEvent::Undo => {
                if self.phase == Phase::Comparing {
                    return self.reject("undo while comparing");
                }
                match self.path.undo() {
                    Ok(()) => self.path_changed(),
                    Err(e) => self.reject_path(e),
                }
            }
            ExplorerEvent::Redo => {
                if self.phase == Phase::Comparing {
                    return self.reject("redo while comparing");
                }
                match self.path.redo() {
                    Ok(()) => self.path_changed(),
                    Err(e) => self.reject_path(e),
                }
            }
            ExplorerEvent::Clear => {
                if self.phase == Phase::Comparing {
                    return self.reject("clear while comparing");
                }
                self.reset()
            }
            ExplorerEvent::Escape => self.reset(),
            ExplorerEvent::Retry => self.retry(),
            ExplorerEvent::DismissError => {
                if self.phase != Phase::Error {
                    return self.reject("dismiss without error");
                }
                self.error = None;
                self.phase = self.resume;
                self.render_epoch += 1;
                Vec::new()
            }
            ExplorerEvent::OpenComparison => {
                if !self.in_exploration() {
                    return self.reject("open_comparison outside exploration");
                }
                self.resume = self.phase;
                self.phase = Phase::Comparing;
                self.similar_paths = None;
                self.render_epoch += 1;
                vec![self.issue(FetchKind::SimilarPaths)]
            }
            ExplorerEvent::CloseComparison => {
                if self.phase != Phase::Comparing {
                    return self.reject("close_comparison while not comparing");
                }
                self.tickets.invalidate(FetchKind::SimilarPaths);
                self.similar_paths = None;
                self.phase = self.resume;
                self.render_epoch += 1;
                Vec::new()
            }
            ExplorerEvent::SearchProfiles => {
                if !self.in_exploration() {
                    return self.reject("search_profiles outside exploration");
                }
                self.profiles = None;
                self.render_epoch += 1;
                vec![self.issue(FetchKind::Profiles)]
            }
        }
    }

    /// Applies a fetch result if its ticket is still the current one.
    pub fn resolve(
        &mut self,
        ticket: Ticket,
        result: Result<FetchOutcome, ApiError>,
    ) -> Resolution {
        if let Ok(outcome) = &result {
            if outcome.kind() != ticket.kind {
                warn!(
                    "Discarding {:?} outcome delivered for a {:?} ticket",
                    outcome.kind(),
                    ticket.kind
                );
                return Resolution::Stale;
            }
        }
        if !self.tickets.accept(ticket) {
            debug!(
                "Discarding stale {:?} response (seq {})",
                ticket.kind, ticket.seq
            );
            return Resolution::Stale;
        }

        self.render_epoch += 1;
        match result {
            Ok(outcome) => {
                if self.failed == Some(ticket.kind) {
                    self.failed = None;
                }
                match outcome {
                    FetchOutcome::NextSteps(steps) => {
                        let target = if steps.is_empty() {
                            Phase::Terminal
                        } else {
                            Phase::Exploring
                        };
                        self.next_steps = Some(steps);
                        self.resume = target;
                        if self.in_exploration() {
                            self.phase = target;
                        }
                    }
                    FetchOutcome::Profiles(result) => self.profiles = Some(result),
                    FetchOutcome::SimilarPaths(paths) => self.similar_paths = Some(paths),
                }
            }
            Err(err) => {
                warn!("{:?} fetch failed: {}", ticket.kind, err);
                self.error = Some(err);
                self.failed = Some(ticket.kind);
                self.phase = Phase::Error;
            }
        }
        Resolution::Applied
    }

    pub fn export_snapshot(&self) -> Snapshot {
        Snapshot::capture(
            self.path.nodes(),
            self.next_steps.clone().unwrap_or_default(),
        )
    }

    /// Replaces the path with an imported one. On a parse error nothing changes.
    pub fn import_snapshot(&mut self, document: &str) -> Result<Vec<Command>, ImportParseError> {
        let snapshot = snapshot::parse(document)?;
        self.tickets.invalidate(FetchKind::SimilarPaths);
        self.similar_paths = None;
        self.path.replace(snapshot.path);
        Ok(self.path_changed())
    }

    pub fn render(&self) -> RenderTree {
        render::render(&RenderInput {
            phase: self.phase,
            path: &self.path,
            next_steps: self.next_steps.as_deref(),
            error: self.error.as_ref(),
            failed: self.failed,
            profiles: self.profiles.as_ref(),
            similar_paths: self.similar_paths.as_deref(),
            loading_next_steps: self.is_loading(FetchKind::NextSteps),
            loading_profiles: self.is_loading(FetchKind::Profiles),
            loading_similar: self.is_loading(FetchKind::SimilarPaths),
        })
    }

    fn in_exploration(&self) -> bool {
        matches!(self.phase, Phase::Exploring | Phase::Terminal)
    }

    fn issue(&mut self, kind: FetchKind) -> Command {
        let limit = match kind {
            FetchKind::NextSteps => self.limits.next_steps,
            FetchKind::Profiles => self.limits.profiles,
            FetchKind::SimilarPaths => self.limits.similar_paths,
        };
        Command {
            ticket: self.tickets.issue(kind),
            nodes: self.path.nodes().to_vec(),
            limit,
        }
    }

    /// Common tail of every path mutation: one render, and one next-steps
    /// fetch unless the path is now empty.
    fn path_changed(&mut self) -> Vec<Command> {
        self.render_epoch += 1;
        self.tickets.invalidate(FetchKind::Profiles);
        self.profiles = None;
        self.error = None;
        self.failed = None;
        self.next_steps = None;

        if self.path.is_empty() {
            self.tickets.invalidate(FetchKind::NextSteps);
            self.phase = Phase::Idle;
            return Vec::new();
        }
        self.phase = Phase::Exploring;
        self.resume = Phase::Exploring;
        vec![self.issue(FetchKind::NextSteps)]
    }

    fn reset(&mut self) -> Vec<Command> {
        if self.path.is_empty() && self.phase == Phase::Idle {
            return Vec::new();
        }
        self.path.clear();
        for kind in [
            FetchKind::NextSteps,
            FetchKind::Profiles,
            FetchKind::SimilarPaths,
        ] {
            self.tickets.invalidate(kind);
        }
        self.next_steps = None;
        self.profiles = None;
        self.similar_paths = None;
        self.error = None;
        self.failed = None;
        self.phase = Phase::Idle;
        self.resume = Phase::Exploring;
        self.render_epoch += 1;
        Vec::new()
    }

    fn retry(&mut self) -> Vec<Command> {
        let Some(kind) = self.failed else {
            return self.reject("retry without a failed fetch");
        };
        if self.phase == Phase::Comparing && kind != FetchKind::SimilarPaths {
            return self.reject("retry while comparing");
        }
        self.error = None;
        self.phase = match kind {
            FetchKind::NextSteps => Phase::Exploring,
            FetchKind::Profiles => self.resume,
            FetchKind::SimilarPaths => Phase::Comparing,
        };
        self.render_epoch += 1;
        vec![self.issue(kind)]
    }

    fn reject(&self, what: &str) -> Vec<Command> {
        debug!("Ignoring {} (phase {:?})", what, self.phase);
        Vec::new()
    }

    fn reject_path(&self, err: PathError) -> Vec<Command> {
        debug!("Ignoring path operation: {}", err);
        Vec::new()
    }
}
