use serde::{Deserialize, Serialize};

/// Kind of step in a career trajectory.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    University,
    Company,
    Title,
}

impl NodeType {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::University => "university",
            NodeType::Company => "company",
            NodeType::Title => "title",
        }
    }

    /// Human-facing label used by the render layer.
    pub fn label(self) -> &'static str {
        match self {
            NodeType::University => "University",
            NodeType::Company => "Company",
            NodeType::Title => "Job Title",
        }
    }
}

/// One selected step in a path. Value equality only; a path may repeat nodes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PathNode {
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub value: String,
}

impl PathNode {
    pub fn new(node_type: NodeType, value: impl Into<String>) -> Self {
        Self {
            node_type,
            value: value.into(),
        }
    }

    pub fn university(value: impl Into<String>) -> Self {
        Self::new(NodeType::University, value)
    }

    pub fn company(value: impl Into<String>) -> Self {
        Self::new(NodeType::Company, value)
    }

    pub fn title(value: impl Into<String>) -> Self {
        Self::new(NodeType::Title, value)
    }
}
