//! Render layer: maps explorer state to a toolkit-independent instruction tree.
//!
//! `render` is pure: identical input always yields an identical tree, and it
//! never touches the controller. The tree is what the session endpoints
//! return; any front end (browser, TUI, test) paints it as it likes.

pub mod flow;

use serde::Serialize;

use crate::api_client::{ApiError, ErrorKind};
use crate::explorer::controller::{FetchKind, Phase};
use crate::explorer::path_state::PathState;
use crate::models::{
    EducationSummary, ExperienceSummary, NextStepCandidate, NodeType, ProfileSearchResult,
    ProfileSummary, SimilarPath,
};

pub use flow::PathFlow;

/// Everything the render layer reads.
pub struct RenderInput<'a> {
    pub phase: Phase,
    pub path: &'a PathState,
    pub next_steps: Option<&'a [NextStepCandidate]>,
    pub error: Option<&'a ApiError>,
    /// Kind of the fetch that last failed, if it has not since succeeded.
    pub failed: Option<FetchKind>,
    pub profiles: Option<&'a ProfileSearchResult>,
    pub similar_paths: Option<&'a [SimilarPath]>,
    pub loading_next_steps: bool,
    pub loading_profiles: bool,
    pub loading_similar: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RenderTree {
    pub phase: Phase,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub main: MainPanel,
    pub profiles: ProfilePanel,
    pub flow: PathFlow,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<ComparisonPanel>,
    pub controls: Controls,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Breadcrumb {
    pub index: usize,
    pub node_type: NodeType,
    pub type_label: &'static str,
    pub value: String,
    pub current: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorNotice {
    pub error_kind: ErrorKind,
    pub message: String,
    pub retryable: bool,
    pub dismissible: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Tile {
    pub node_type: NodeType,
    pub type_label: &'static str,
    pub value: String,
    pub profiles_count: u64,
    /// Share of all candidate profiles, one decimal place.
    pub share_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub selectable: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MainPanel {
    Welcome { message: String },
    Loading { message: String },
    NextSteps { heading: String, tiles: Vec<Tile> },
    Terminal { message: String },
    Error(ErrorNotice),
    /// A failed load was dismissed without retrying.
    Unavailable { message: String },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProfileCard {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
    pub education: Vec<String>,
    pub experience: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProfilePanel {
    Hidden,
    Loading,
    Error(ErrorNotice),
    Empty { message: String },
    Results {
        total_matches: u64,
        shown: usize,
        cards: Vec<ProfileCard>,
    },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ComparedPath {
    pub flow: PathFlow,
    pub shared_steps: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profiles_count: Option<u64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComparisonPanel {
    Loading,
    Error(ErrorNotice),
    Empty { message: String },
    Paths { paths: Vec<ComparedPath> },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Controls {
    pub can_undo: bool,
    pub can_redo: bool,
    pub can_clear: bool,
    pub can_compare: bool,
    pub can_search_profiles: bool,
    pub can_export: bool,
}

pub fn render(input: &RenderInput<'_>) -> RenderTree {
    let exploring = matches!(input.phase, Phase::Exploring | Phase::Terminal);
    RenderTree {
        phase: input.phase,
        breadcrumbs: breadcrumbs(input.path),
        main: main_panel(input),
        profiles: profile_panel(input),
        flow: flow::layout(input.path.nodes(), None),
        comparison: comparison_panel(input),
        controls: Controls {
            can_undo: input.phase != Phase::Comparing && input.path.can_undo(),
            can_redo: input.phase != Phase::Comparing && input.path.can_redo(),
            can_clear: !input.path.is_empty(),
            can_compare: exploring,
            can_search_profiles: exploring,
            can_export: !input.path.is_empty(),
        },
    }
}

fn breadcrumbs(path: &PathState) -> Vec<Breadcrumb> {
    let last = path.len().saturating_sub(1);
    path.nodes()
        .iter()
        .enumerate()
        .map(|(index, node)| Breadcrumb {
            index,
            node_type: node.node_type,
            type_label: node.node_type.label(),
            value: node.value.clone(),
            current: index == last,
        })
        .collect()
}

/// The error notice for `kind`, if the outstanding failure belongs to it.
fn notice_for(input: &RenderInput<'_>, kind: FetchKind) -> Option<ErrorNotice> {
    let err = input.error?;
    (input.failed == Some(kind)).then(|| ErrorNotice {
        error_kind: err.kind(),
        message: err.user_message(),
        retryable: true,
        dismissible: true,
    })
}

fn main_panel(input: &RenderInput<'_>) -> MainPanel {
    let Some(last) = input.path.last() else {
        return MainPanel::Welcome {
            message: "Select a university to start exploring career paths.".to_string(),
        };
    };
    if input.loading_next_steps {
        return MainPanel::Loading {
            message: format!("Finding where people went after {}...", last.value),
        };
    }
    if let Some(notice) = notice_for(input, FetchKind::NextSteps) {
        return MainPanel::Error(notice);
    }
    match input.next_steps {
        None => MainPanel::Unavailable {
            message: "Next steps could not be loaded for this path. Retry to try again."
                .to_string(),
        },
        Some([]) => MainPanel::Terminal {
            message: format!(
                "No profiles in the dataset continue past {}. Go back a step or start over.",
                last.value
            ),
        },
        Some(steps) => MainPanel::NextSteps {
            heading: format!("Where people went after {}", last.value),
            tiles: tiles(steps, input.phase == Phase::Exploring),
        },
    }
}

fn tiles(steps: &[NextStepCandidate], selectable: bool) -> Vec<Tile> {
    let total = steps
        .iter()
        .map(|s| s.profiles_count)
        .fold(0u64, u64::saturating_add);
    steps
        .iter()
        .map(|step| Tile {
            node_type: step.node_type,
            type_label: step.node_type.label(),
            value: step.value.clone(),
            profiles_count: step.profiles_count,
            share_percent: share(step.profiles_count, total),
            confidence: step.confidence.map(|c| c.clamp(0.0, 100.0)),
            selectable,
        })
        .collect()
}

fn share(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 * 1000.0 / total as f64).round() / 10.0
}

fn profile_panel(input: &RenderInput<'_>) -> ProfilePanel {
    if input.loading_profiles {
        return ProfilePanel::Loading;
    }
    if let Some(notice) = notice_for(input, FetchKind::Profiles) {
        return ProfilePanel::Error(notice);
    }
    match input.profiles {
        None => ProfilePanel::Hidden,
        Some(result) if result.profiles.is_empty() => ProfilePanel::Empty {
            message: "No profiles match this exact path.".to_string(),
        },
        Some(result) => ProfilePanel::Results {
            total_matches: result.total_matches,
            shown: result.profiles.len(),
            cards: result.profiles.iter().map(profile_card).collect(),
        },
    }
}

fn profile_card(profile: &ProfileSummary) -> ProfileCard {
    ProfileCard {
        id: profile.id,
        name: profile.full_name.clone(),
        headline: non_blank(profile.headline.as_deref()),
        location: non_blank(profile.location.as_deref()),
        linkedin_url: non_blank(profile.linkedin_url.as_deref()),
        education: profile.education.iter().map(education_line).collect(),
        experience: profile.experience.iter().map(experience_line).collect(),
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn education_line(edu: &EducationSummary) -> String {
    let credential = [edu.degree.trim(), edu.major.trim()]
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    let mut line = if credential.is_empty() {
        edu.university.clone()
    } else {
        format!("{credential} · {}", edu.university)
    };
    // The backend formats missing years as a bare "-".
    let years = edu.years.trim();
    if !years.is_empty() && years != "-" {
        line.push_str(&format!(" ({years})"));
    }
    line
}

fn experience_line(exp: &ExperienceSummary) -> String {
    let mut line = format!("{} at {}", exp.title, exp.company);
    let duration = exp.duration.trim();
    if exp.is_current {
        line.push_str(" (current)");
    } else if !duration.is_empty() && duration != "-" {
        line.push_str(&format!(" ({duration})"));
    }
    line
}

fn comparison_panel(input: &RenderInput<'_>) -> Option<ComparisonPanel> {
    if let Some(notice) = notice_for(input, FetchKind::SimilarPaths) {
        return Some(ComparisonPanel::Error(notice));
    }
    if input.phase != Phase::Comparing {
        return None;
    }
    if input.loading_similar {
        return Some(ComparisonPanel::Loading);
    }
    let current = input.path.nodes();
    Some(match input.similar_paths {
        None | Some([]) => ComparisonPanel::Empty {
            message: "No similar paths were found.".to_string(),
        },
        Some(paths) => ComparisonPanel::Paths {
            paths: paths
                .iter()
                .map(|p| {
                    let flow = flow::layout(&p.nodes, Some(current));
                    let shared_steps = flow.nodes.iter().filter(|n| n.shared).count();
                    ComparedPath {
                        flow,
                        shared_steps,
                        profiles_count: p.profiles_count,
                    }
                })
                .collect(),
        },
    })
}
