//! Observable state surface.
//!
//! Each published value lives in its own `tokio::sync::watch` channel, so a
//! presentation layer can await changes on just the streams it renders.
//! Values are replaced wholesale; receivers always see the latest state.

use tokio::sync::watch;

use super::model::{SelectedFilters, VisualEdge, VisualNode, WalkerTotals};
use super::store::MaterializedGraph;

/// Sending halves, owned by the walker.
#[derive(Debug)]
pub(crate) struct WalkerChannels {
    nodes: watch::Sender<Vec<VisualNode>>,
    edges: watch::Sender<Vec<VisualEdge>>,
    loading: watch::Sender<bool>,
    error: watch::Sender<Option<String>>,
    selected: watch::Sender<Option<VisualNode>>,
    filters: watch::Sender<SelectedFilters>,
    totals: watch::Sender<WalkerTotals>,
}

impl WalkerChannels {
    pub(crate) fn new() -> Self {
        Self {
            nodes: watch::Sender::new(Vec::new()),
            edges: watch::Sender::new(Vec::new()),
            loading: watch::Sender::new(false),
            error: watch::Sender::new(None),
            selected: watch::Sender::new(None),
            filters: watch::Sender::new(SelectedFilters::default()),
            totals: watch::Sender::new(WalkerTotals::default()),
        }
    }

    pub(crate) fn subscribe(&self) -> WalkerObserver {
        WalkerObserver {
            nodes: self.nodes.subscribe(),
            edges: self.edges.subscribe(),
            loading: self.loading.subscribe(),
            error: self.error.subscribe(),
            selected: self.selected.subscribe(),
            filters: self.filters.subscribe(),
            totals: self.totals.subscribe(),
        }
    }

    /// Republish nodes and edges.
    pub(crate) fn publish_graph(&self, graph: &MaterializedGraph) {
        self.nodes.send_replace(graph.nodes().cloned().collect());
        self.edges.send_replace(graph.edges().cloned().collect());
    }

    /// Republish the selected node with its filters and totals.
    pub(crate) fn publish_selection(&self, graph: &MaterializedGraph) {
        let selected = graph.selected();
        let (filters, totals) = SelectedFilters::for_node(selected);
        self.selected.send_replace(selected.cloned());
        self.filters.send_replace(filters);
        self.totals.send_replace(totals);
    }

    /// Republish everything derived from the graph.
    pub(crate) fn publish_all(&self, graph: &MaterializedGraph) {
        self.publish_graph(graph);
        self.publish_selection(graph);
    }

    pub(crate) fn set_loading(&self, loading: bool) {
        self.loading.send_if_modified(|current| {
            let changed = *current != loading;
            *current = loading;
            changed
        });
    }

    pub(crate) fn set_error(&self, error: Option<String>) {
        self.error.send_replace(error);
    }

    pub(crate) fn loading(&self) -> bool {
        *self.loading.borrow()
    }

    pub(crate) fn error(&self) -> Option<String> {
        self.error.borrow().clone()
    }
}

// ---------------------------------------------------------------------------
// WalkerObserver
// ---------------------------------------------------------------------------

/// Receiving halves handed to the presentation layer.
///
/// Cloning an observer clones every receiver; each clone tracks its own
/// "seen" version.
#[derive(Debug, Clone)]
pub struct WalkerObserver {
    pub nodes: watch::Receiver<Vec<VisualNode>>,
    pub edges: watch::Receiver<Vec<VisualEdge>>,
    pub loading: watch::Receiver<bool>,
    pub error: watch::Receiver<Option<String>>,
    pub selected: watch::Receiver<Option<VisualNode>>,
    pub filters: watch::Receiver<SelectedFilters>,
    pub totals: watch::Receiver<WalkerTotals>,
}

impl WalkerObserver {
    /// Current node ids, in publication order.
    pub fn node_ids(&self) -> Vec<String> {
        self.nodes.borrow().iter().map(|n| n.id.clone()).collect()
    }

    /// Current edge ids, in publication order.
    pub fn edge_ids(&self) -> Vec<String> {
        self.edges.borrow().iter().map(|e| e.id.clone()).collect()
    }

    pub fn selected_id(&self) -> Option<String> {
        self.selected.borrow().as_ref().map(|n| n.id.clone())
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    pub fn last_error(&self) -> Option<String> {
        self.error.borrow().clone()
    }

    pub fn totals(&self) -> WalkerTotals {
        *self.totals.borrow()
    }

    pub fn filters(&self) -> SelectedFilters {
        self.filters.borrow().clone()
    }
}
