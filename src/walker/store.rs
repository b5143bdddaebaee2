//! In-memory store of the materialized (visible) part of the graph.
//!
//! Alongside the node and edge maps the store keeps two indexes:
//! `origin id → child ids` for subtree removal and `node id → incident edge
//! ids` for dropping the edges of removed nodes. Insertion order is kept so
//! the presentation layer sees a stable listing.

use std::collections::{HashMap, HashSet};

use super::ids::reverse_edge_id;
use super::model::{VisualEdge, VisualNode};

/// Outcome of [`MaterializedGraph::remove_subtree`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubtreeRemoval {
    /// Ids of every removed node, in removal order.
    pub nodes: Vec<String>,
    /// Ids of every removed edge.
    pub edges: Vec<String>,
    /// The selected node was removed and selection moved to the root.
    pub selection_moved: bool,
}

impl SubtreeRemoval {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

// ---------------------------------------------------------------------------
// MaterializedGraph
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct MaterializedGraph {
    nodes: HashMap<String, VisualNode>,
    node_order: Vec<String>,
    edges: HashMap<String, VisualEdge>,
    edge_order: Vec<String>,
    children: HashMap<String, Vec<String>>,
    incident: HashMap<String, HashSet<String>>,
    root_id: Option<String>,
    selected_id: Option<String>,
}

impl MaterializedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every node and edge, the selection included.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    // -------------------------------------------------------------------
    // Nodes
    // -------------------------------------------------------------------

    /// Insert `node` unless a node with the same id exists.
    ///
    /// A node with an empty origin becomes the root. Inserted nodes are
    /// never selected; use [`select`](Self::select) for that.
    pub fn add_node_if_absent(&mut self, mut node: VisualNode) -> bool {
        if self.nodes.contains_key(&node.id) {
            return false;
        }
        node.selected = false;
        let id = node.id.clone();
        if node.origin_id.is_empty() {
            self.root_id = Some(id.clone());
        } else {
            self.children
                .entry(node.origin_id.clone())
                .or_default()
                .push(id.clone());
        }
        self.node_order.push(id.clone());
        self.nodes.insert(id, node);
        true
    }

    pub fn node(&self, id: &str) -> Option<&VisualNode> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut VisualNode> {
        self.nodes.get_mut(id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &VisualNode> {
        self.node_order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn root_id(&self) -> Option<&str> {
        self.root_id.as_deref()
    }

    /// Ids of the nodes directly discovered from `origin_id`.
    pub fn children_of(&self, origin_id: &str) -> &[String] {
        self.children
            .get(origin_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    // -------------------------------------------------------------------
    // Edges
    // -------------------------------------------------------------------

    /// Insert `edge` unless an edge with the same id, or the same endpoints
    /// swapped, exists.
    pub fn add_edge_if_absent(&mut self, edge: VisualEdge) -> bool {
        if self.edges.contains_key(&edge.id) {
            return false;
        }
        if let Some(reverse) = reverse_edge_id(&edge.id) {
            if self.edges.contains_key(&reverse) {
                return false;
            }
        }
        for end in [&edge.source_id, &edge.target_id] {
            self.incident
                .entry(end.clone())
                .or_default()
                .insert(edge.id.clone());
        }
        self.edge_order.push(edge.id.clone());
        self.edges.insert(edge.id.clone(), edge);
        true
    }

    pub fn edge(&self, id: &str) -> Option<&VisualEdge> {
        self.edges.get(id)
    }

    pub fn contains_edge(&self, id: &str) -> bool {
        self.edges.contains_key(id)
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &VisualEdge> {
        self.edge_order.iter().filter_map(|id| self.edges.get(id))
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edges having `node_id` as either endpoint.
    pub fn edges_of<'a>(&'a self, node_id: &str) -> impl Iterator<Item = &'a VisualEdge> + 'a {
        self.incident
            .get(node_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.edges.get(id))
    }

    /// Whether `node_id` is linked, in either direction, to any property
    /// group for `predicate_id`, whatever entity that group hangs off.
    pub fn links_property_with_predicate(&self, node_id: &str, predicate_id: i32) -> bool {
        self.edges_of(node_id).any(|edge| {
            edge.other_end(node_id)
                .and_then(|other| self.nodes.get(other))
                .and_then(VisualNode::as_property)
                .is_some_and(|p| p.predicate_id == predicate_id)
        })
    }

    // -------------------------------------------------------------------
    // Subtree removal
    // -------------------------------------------------------------------

    /// Remove every node transitively discovered from `origin_id` (the
    /// origin itself stays), then every edge touching a removed node.
    ///
    /// If the selected node is removed, selection moves to the root.
    pub fn remove_subtree(&mut self, origin_id: &str) -> SubtreeRemoval {
        let mut removal = SubtreeRemoval::default();
        let mut pending = vec![origin_id.to_string()];

        while let Some(current) = pending.pop() {
            let Some(kids) = self.children.remove(&current) else {
                continue;
            };
            for kid in kids {
                let owned = self
                    .nodes
                    .get(&kid)
                    .is_some_and(|n| n.origin_id == current);
                if owned {
                    self.nodes.remove(&kid);
                    pending.push(kid.clone());
                    removal.nodes.push(kid);
                }
            }
        }
        if removal.nodes.is_empty() {
            return removal;
        }

        let removed: HashSet<&str> = removal.nodes.iter().map(String::as_str).collect();
        for node_id in &removal.nodes {
            let Some(edge_ids) = self.incident.remove(node_id) else {
                continue;
            };
            for edge_id in edge_ids {
                let Some(edge) = self.edges.remove(&edge_id) else {
                    continue;
                };
                if let Some(other) = edge.other_end(node_id) {
                    if let Some(set) = self.incident.get_mut(other) {
                        set.remove(&edge_id);
                    }
                }
                removal.edges.push(edge_id);
            }
        }

        self.node_order.retain(|id| !removed.contains(id.as_str()));
        let edges = &self.edges;
        self.edge_order.retain(|id| edges.contains_key(id));

        if self
            .selected_id
            .as_deref()
            .is_some_and(|id| removed.contains(id))
        {
            self.selected_id = None;
            if let Some(root) = self.root_id.clone() {
                if let Some(node) = self.nodes.get_mut(&root) {
                    node.selected = true;
                    self.selected_id = Some(root);
                }
            }
            removal.selection_moved = true;
        }

        removal
    }

    // -------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------

    /// Select `id`, unmarking any previous selection. An unknown id clears
    /// the selection. Returns the newly selected node.
    pub fn select(&mut self, id: &str) -> Option<&VisualNode> {
        if !self.nodes.contains_key(id) {
            self.clear_selection();
            return None;
        }
        if let Some(prev) = self.selected_id.take() {
            if let Some(node) = self.nodes.get_mut(&prev) {
                node.selected = false;
            }
        }
        let node = self.nodes.get_mut(id)?;
        node.selected = true;
        self.selected_id = Some(id.to_string());
        Some(&*node)
    }

    pub fn clear_selection(&mut self) {
        if let Some(prev) = self.selected_id.take() {
            if let Some(node) = self.nodes.get_mut(&prev) {
                node.selected = false;
            }
        }
    }

    pub fn selected(&self) -> Option<&VisualNode> {
        self.selected_id.as_deref().and_then(|id| self.nodes.get(id))
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
