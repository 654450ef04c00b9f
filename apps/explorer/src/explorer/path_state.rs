use std::collections::VecDeque;

use thiserror::Error;

use crate::models::PathNode;

pub const DEFAULT_HISTORY_CAP: usize = 50;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("No root selected; choose a starting point first")]
    EmptyPath,

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,
}

/// The ordered career steps of one exploration session.
///
/// Normal exploration only touches the tail. `replace` swaps the whole
/// sequence for imports. Undo and clear push the prior sequence onto a
/// bounded history so it can be restored with `redo`; forward mutations
/// discard that history.
#[derive(Debug, Clone)]
pub struct PathState {
    nodes: Vec<PathNode>,
    history: VecDeque<Vec<PathNode>>,
    history_cap: usize,
}

impl Default for PathState {
    fn default() -> Self {
        Self::with_history_cap(DEFAULT_HISTORY_CAP)
    }
}

impl PathState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history_cap(history_cap: usize) -> Self {
        Self {
            nodes: Vec::new(),
            history: VecDeque::new(),
            history_cap: history_cap.max(1),
        }
    }

    pub fn nodes(&self) -> &[PathNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<&PathNode> {
        self.nodes.first()
    }

    pub fn last(&self) -> Option<&PathNode> {
        self.nodes.last()
    }

    pub fn can_undo(&self) -> bool {
        self.nodes.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn select_root(&mut self, node: PathNode) {
        self.history.clear();
        self.nodes = vec![node];
    }

    pub fn append_step(&mut self, node: PathNode) -> Result<(), PathError> {
        if self.nodes.is_empty() {
            return Err(PathError::EmptyPath);
        }
        self.history.clear();
        self.nodes.push(node);
        Ok(())
    }

    pub fn undo(&mut self) -> Result<(), PathError> {
        if !self.can_undo() {
            return Err(PathError::NothingToUndo);
        }
        self.remember(self.nodes.clone());
        self.nodes.pop();
        Ok(())
    }

    pub fn redo(&mut self) -> Result<(), PathError> {
        let snapshot = self.history.pop_back().ok_or(PathError::NothingToRedo)?;
        self.nodes = snapshot;
        Ok(())
    }

    /// Empties the path. Clearing an already empty path records nothing.
    pub fn clear(&mut self) {
        if self.nodes.is_empty() {
            return;
        }
        let prior = std::mem::take(&mut self.nodes);
        self.remember(prior);
    }

    pub fn replace(&mut self, nodes: Vec<PathNode>) {
        self.history.clear();
        self.nodes = nodes;
    }

    fn remember(&mut self, snapshot: Vec<PathNode>) {
        if self.history.len() == self.history_cap {
            self.history.pop_front();
        }
        self.history.push_back(snapshot);
    }
}
