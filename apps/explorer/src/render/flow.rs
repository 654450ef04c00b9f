use std::collections::HashSet;

use serde::Serialize;

use crate::models::{NodeType, PathNode};

pub const NODE_WIDTH: u32 = 160;
pub const NODE_HEIGHT: u32 = 48;
pub const NODE_GAP: u32 = 40;
/// Longer paths switch to a top-to-bottom layout.
pub const MAX_HORIZONTAL_NODES: usize = 5;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Right,
    Down,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FlowNode {
    pub index: usize,
    pub node_type: NodeType,
    pub type_label: &'static str,
    pub value: String,
    pub x: u32,
    pub y: u32,
    /// Also present in the path being compared against.
    pub shared: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Connector {
    pub from: usize,
    pub to: usize,
    pub direction: Direction,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PathFlow {
    pub orientation: Orientation,
    pub width: u32,
    pub height: u32,
    pub nodes: Vec<FlowNode>,
    pub connectors: Vec<Connector>,
}

/// Positions `nodes` in traversal order with a connector between neighbours.
/// `reference`, when given, marks nodes it also contains as shared.
pub fn layout(nodes: &[PathNode], reference: Option<&[PathNode]>) -> PathFlow {
    let orientation = if nodes.len() <= MAX_HORIZONTAL_NODES {
        Orientation::Horizontal
    } else {
        Orientation::Vertical
    };
    let reference: HashSet<&PathNode> = reference.unwrap_or_default().iter().collect();
    let step = match orientation {
        Orientation::Horizontal => NODE_WIDTH + NODE_GAP,
        Orientation::Vertical => NODE_HEIGHT + NODE_GAP,
    };

    let flow_nodes = nodes
        .iter()
        .enumerate()
        .map(|(index, node)| {
            let offset = index as u32 * step;
            let (x, y) = match orientation {
                Orientation::Horizontal => (offset, 0),
                Orientation::Vertical => (0, offset),
            };
            FlowNode {
                index,
                node_type: node.node_type,
                type_label: node.node_type.label(),
                value: node.value.clone(),
                x,
                y,
                shared: reference.contains(node),
            }
        })
        .collect();

    let direction = match orientation {
        Orientation::Horizontal => Direction::Right,
        Orientation::Vertical => Direction::Down,
    };
    let connectors = (1..nodes.len())
        .map(|to| Connector {
            from: to - 1,
            to,
            direction,
        })
        .collect();

    let (width, height) = extent(nodes.len(), orientation);
    PathFlow {
        orientation,
        width,
        height,
        nodes: flow_nodes,
        connectors,
    }
}

fn extent(count: usize, orientation: Orientation) -> (u32, u32) {
    if count == 0 {
        return (0, 0);
    }
    let n = count as u32;
    match orientation {
        Orientation::Horizontal => (n * NODE_WIDTH + (n - 1) * NODE_GAP, NODE_HEIGHT),
        Orientation::Vertical => (NODE_WIDTH, n * NODE_HEIGHT + (n - 1) * NODE_GAP),
    }
}
