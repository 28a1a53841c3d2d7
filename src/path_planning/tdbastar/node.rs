//! Search nodes, the node arena and the open set
//!
//! Nodes are never moved or freed while a search runs: a [`NodeId`] is the
//! slot of the node in the [`NodeStore`] and stays valid for parent links
//! and queue handles until the store is dropped.

use std::cmp::Reverse;
use std::ops::{Index, IndexMut};

use ordered_float::NotNan;
use priority_queue::PriorityQueue;

use crate::common::error::ensure_consistent;
use crate::common::{PlanningError, PlanningResult, State};

/// Stable identity of a node inside its [`NodeStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Handle of a node in the [`OpenSet`], valid only while the node is open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueueHandle(NodeId);

/// One state reached during the search
#[derive(Debug, Clone)]
pub struct Node {
    pub state: State,
    pub g_score: f64,
    pub h_score: f64,
    pub f_score: f64,
    pub came_from: Option<NodeId>,
    /// Library index of the primitive used to reach this node
    pub used_motion: Option<usize>,
    /// Rollout index at which the parent primitive was cut because an
    /// intermediate state reached the goal
    pub intermediate_state: Option<usize>,
    pub handle: Option<QueueHandle>,
}

impl Node {
    pub fn start(state: State, h_score: f64) -> Self {
        Self {
            state,
            g_score: 0.0,
            h_score,
            f_score: h_score,
            came_from: None,
            used_motion: None,
            intermediate_state: None,
            handle: None,
        }
    }

    pub fn child(
        state: State,
        g_score: f64,
        h_score: f64,
        came_from: NodeId,
        used_motion: usize,
        intermediate_state: Option<usize>,
    ) -> Self {
        Self {
            state,
            g_score,
            h_score,
            f_score: g_score + h_score,
            came_from: Some(came_from),
            used_motion: Some(used_motion),
            intermediate_state,
            handle: None,
        }
    }

    /// Update the cost-to-come, keeping `f == g + h`
    pub fn set_g_score(&mut self, g_score: f64) {
        self.g_score = g_score;
        self.f_score = g_score + self.h_score;
    }

    pub fn is_in_open(&self) -> bool {
        self.handle.is_some()
    }
}

/// Arena owning every node created during a search
#[derive(Debug, Default)]
pub struct NodeStore {
    nodes: Vec<Node>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Node ids from the start to `id`, following parent links
    pub fn path_to(&self, id: NodeId) -> PlanningResult<Vec<NodeId>> {
        let mut path = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            ensure_consistent!(
                path.len() < self.nodes.len(),
                "parent links of node {} form a cycle",
                id.0
            );
            let node = self.get(node_id).ok_or_else(|| {
                PlanningError::Consistency(format!("node {} is not in the store", node_id.0))
            })?;
            path.push(node_id);
            current = node.came_from;
        }
        path.reverse();
        Ok(path)
    }
}

impl Index<NodeId> for NodeStore {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }
}

impl IndexMut<NodeId> for NodeStore {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }
}

/// Lowest `f` first, ties broken by highest `g`
type Priority = (Reverse<NotNan<f64>>, NotNan<f64>);

fn priority(node: &Node) -> PlanningResult<Priority> {
    let f = NotNan::new(node.f_score)
        .map_err(|_| PlanningError::Consistency("f_score is NaN".to_string()))?;
    let g = NotNan::new(node.g_score)
        .map_err(|_| PlanningError::Consistency("g_score is NaN".to_string()))?;
    Ok((Reverse(f), g))
}

/// Indexed priority queue with decrease-key
#[derive(Debug)]
pub struct OpenSet {
    queue: PriorityQueue<NodeId, Priority>,
}

impl OpenSet {
    pub fn new() -> Self {
        Self {
            queue: PriorityQueue::new(),
        }
    }

    pub fn push(&mut self, id: NodeId, node: &Node) -> PlanningResult<QueueHandle> {
        let previous = self.queue.push(id, priority(node)?);
        ensure_consistent!(previous.is_none(), "node {} was already open", id.0);
        Ok(QueueHandle(id))
    }

    /// Remove and return the best node
    pub fn pop(&mut self) -> Option<NodeId> {
        self.queue.pop().map(|(id, _)| id)
    }

    /// Re-order an open node after its scores changed
    pub fn update(&mut self, handle: QueueHandle, node: &Node) -> PlanningResult<()> {
        let previous = self.queue.change_priority(&handle.0, priority(node)?);
        ensure_consistent!(previous.is_some(), "stale queue handle for node {}", (handle.0).0);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
