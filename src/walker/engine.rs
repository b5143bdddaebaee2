//! The graph walker: expansion engine and selection coordinator.
//!
//! [`GraphWalker`] owns the materialized graph behind a mutex that is only
//! held for synchronous sections, never across an `.await`. Each expansion
//! reads the target's filters under the lock, releases it, runs its queries
//! concurrently with `try_join!`, then re-acquires the lock to merge. A
//! result whose target disappeared in the meantime (collapsed, replaced or
//! reset) is discarded instead of merged.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::schema::WalkerConfig;
use crate::error::{Result, WalkerError};
use crate::filter::{LinkedLiteralFilterPatch, LinkedNodeFilterPatch, TripleFilterPatch};
use crate::observability::WalkerMetrics;
use crate::service::GraphQueryService;
use crate::types::{DataPage, GraphNode, Triple, TripleGroup};

use super::ids::{node_id_from_visual, predicate_id_from_visual};
use super::model::{VisualEdge, VisualNode, VisualNodeData};
use super::state::{WalkerChannels, WalkerObserver};
use super::store::MaterializedGraph;

// ---------------------------------------------------------------------------
// Outcomes and snapshots
// ---------------------------------------------------------------------------

/// What a walker command did to the materialized graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpansionOutcome {
    /// Children were (re)materialized.
    Expanded {
        nodes_added: usize,
        edges_added: usize,
        nodes_replaced: usize,
    },
    /// The node's subtree was removed.
    Collapsed { nodes_removed: usize },
    /// The result arrived after its target left the graph and was dropped.
    Discarded,
    /// Nothing to do (e.g. toggling a literal).
    Unchanged,
}

/// Serializable copy of the materialized graph.
#[derive(Debug, Clone, Serialize)]
pub struct WalkerSnapshot {
    pub nodes: Vec<VisualNode>,
    pub edges: Vec<VisualEdge>,
    pub selected_id: Option<String>,
}

struct WalkerInner {
    graph: MaterializedGraph,
    /// Bumped by every reset; expansions started under an older generation
    /// are discarded.
    generation: u64,
}

// ---------------------------------------------------------------------------
// GraphWalker
// ---------------------------------------------------------------------------

/// Incremental explorer of a semantic graph, rooted at one node.
///
/// Cheap to clone: clones share the same graph, channels and metrics, so
/// expansions of different nodes can run from different tasks.
#[derive(Clone)]
pub struct GraphWalker {
    service: Arc<dyn GraphQueryService>,
    config: Arc<WalkerConfig>,
    inner: Arc<Mutex<WalkerInner>>,
    channels: Arc<WalkerChannels>,
    metrics: Arc<WalkerMetrics>,
}

impl std::fmt::Debug for GraphWalker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("GraphWalker")
            .field("nodes", &inner.graph.node_count())
            .field("edges", &inner.graph.edge_count())
            .field("generation", &inner.generation)
            .finish_non_exhaustive()
    }
}

impl GraphWalker {
    pub fn new(service: Arc<dyn GraphQueryService>, config: WalkerConfig) -> Self {
        Self {
            service,
            config: Arc::new(config),
            inner: Arc::new(Mutex::new(WalkerInner {
                graph: MaterializedGraph::new(),
                generation: 0,
            })),
            channels: Arc::new(WalkerChannels::new()),
            metrics: Arc::new(WalkerMetrics::new()),
        }
    }

    pub fn with_defaults(service: Arc<dyn GraphQueryService>) -> Self {
        Self::new(service, WalkerConfig::default())
    }

    fn lock(&self) -> MutexGuard<'_, WalkerInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    // -------------------------------------------------------------------
    // Observation
    // -------------------------------------------------------------------

    /// Receivers for every published stream.
    pub fn observe(&self) -> WalkerObserver {
        self.channels.subscribe()
    }

    pub fn snapshot(&self) -> WalkerSnapshot {
        let inner = self.lock();
        WalkerSnapshot {
            nodes: inner.graph.nodes().cloned().collect(),
            edges: inner.graph.edges().cloned().collect(),
            selected_id: inner.graph.selected_id().map(str::to_string),
        }
    }

    pub fn node(&self, id: &str) -> Option<VisualNode> {
        self.lock().graph.node(id).cloned()
    }

    pub fn selected(&self) -> Option<VisualNode> {
        self.lock().graph.selected().cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.channels.loading()
    }

    pub fn last_error(&self) -> Option<String> {
        self.channels.error()
    }

    pub fn metrics(&self) -> &WalkerMetrics {
        &self.metrics
    }

    pub fn config(&self) -> &WalkerConfig {
        &self.config
    }

    // -------------------------------------------------------------------
    // reset
    // -------------------------------------------------------------------

    /// Clear the graph and seed it with the node `root_id`.
    ///
    /// When the root cannot be fetched the graph stays empty, the error is
    /// published and returned; calling `reset` again retries.
    pub async fn reset(&self, root_id: i32) -> Result<()> {
        self.metrics.record_reset();
        info!(root_id, "resetting walker");

        let generation = {
            let mut inner = self.lock();
            inner.generation += 1;
            inner.graph.clear();
            self.channels.publish_all(&inner.graph);
            inner.generation
        };
        self.begin_loading();

        let fetched = match self.service.get_node(root_id).await {
            Ok(Some(node)) => Ok(node),
            Ok(None) => Err(WalkerError::NotFound(root_id)),
            Err(err) => Err(err),
        };
        self.channels.set_loading(false);

        let root = match fetched {
            Ok(node) => node,
            Err(err) => {
                warn!(root_id, error = %err, "reset failed");
                self.channels
                    .set_error(Some(format!("Error loading node {root_id}: {err}")));
                return Err(err);
            }
        };

        let root_visual_id = {
            let mut inner = self.lock();
            if inner.generation != generation {
                debug!(root_id, "superseded by a newer reset");
                self.metrics.record_discard();
                return Ok(());
            }
            let node = VisualNode::entity(
                root,
                "",
                self.config.paging.node_page_size,
                self.config.display.colors.entity.as_str(),
            );
            let id = node.id.clone();
            inner.graph.add_node_if_absent(node);
            self.channels.publish_all(&inner.graph);
            id
        };

        if self.config.behavior.auto_expand_root {
            self.expand_node(&root_visual_id, None, None).await?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------

    /// Select a node (or nothing) and republish its filters and totals.
    ///
    /// An unknown id behaves like `None`.
    pub fn select_node(&self, id: Option<&str>) -> Option<VisualNode> {
        let mut inner = self.lock();
        let selected = match id {
            Some(id) => inner.graph.select(id).cloned(),
            None => {
                inner.graph.clear_selection();
                None
            }
        };
        self.channels.publish_all(&inner.graph);
        selected
    }

    // -------------------------------------------------------------------
    // toggle / collapse
    // -------------------------------------------------------------------

    /// Collapse an expanded node, expand a collapsed one. Literals are leaves.
    pub async fn toggle_node(&self, id: &str) -> Result<ExpansionOutcome> {
        let (expanded, is_entity, is_property) = {
            let inner = self.lock();
            let node = inner
                .graph
                .node(id)
                .ok_or_else(|| WalkerError::UnknownNode(id.to_string()))?;
            (
                node.expanded,
                matches!(node.data, VisualNodeData::Entity(_)),
                matches!(node.data, VisualNodeData::PropertyGroup(_)),
            )
        };

        if expanded {
            self.collapse_node(id)
        } else if is_entity {
            self.expand_node(id, None, None).await
        } else if is_property {
            self.expand_property(id, None, None, None).await
        } else {
            Ok(ExpansionOutcome::Unchanged)
        }
    }

    /// Remove everything discovered from `id` and mark it collapsed.
    pub fn collapse_node(&self, id: &str) -> Result<ExpansionOutcome> {
        let mut inner = self.lock();
        if !inner.graph.contains_node(id) {
            return Err(WalkerError::UnknownNode(id.to_string()));
        }
        let removal = inner.graph.remove_subtree(id);
        if let Some(node) = inner.graph.node_mut(id) {
            node.expanded = false;
        }
        debug!(
            id,
            nodes = removal.nodes.len(),
            edges = removal.edges.len(),
            "collapsed node"
        );
        self.publish_change(&inner.graph, id, removal.selection_moved);
        Ok(ExpansionOutcome::Collapsed {
            nodes_removed: removal.nodes.len(),
        })
    }

    // -------------------------------------------------------------------
    // expand_node
    // -------------------------------------------------------------------

    /// Expand an entity node into its outbound and inbound property groups.
    ///
    /// Patches refine the node's stored filters; the subject of the
    /// outbound query and the object of the inbound one are always the
    /// node itself.
    pub async fn expand_node(
        &self,
        id: &str,
        out_patch: Option<TripleFilterPatch>,
        in_patch: Option<TripleFilterPatch>,
    ) -> Result<ExpansionOutcome> {
        let (generation, out_filter, in_filter) = {
            let inner = self.lock();
            let node = inner
                .graph
                .node(id)
                .ok_or_else(|| WalkerError::UnknownNode(id.to_string()))?;
            let data = node.as_entity().ok_or_else(|| WalkerError::UnexpectedKind {
                id: id.to_string(),
                expected: "an entity node",
            })?;
            let node_id = node_id_from_visual(id);

            let mut out_filter = data.out_filter.clone();
            let mut in_filter = data.in_filter.clone();
            if let Some(patch) = &out_patch {
                patch.apply_to(&mut out_filter);
            }
            if let Some(patch) = &in_patch {
                patch.apply_to(&mut in_filter);
            }
            out_filter.subject_id = Some(node_id);
            in_filter.object_id = Some(node_id);
            (inner.generation, out_filter, in_filter)
        };

        self.begin_loading();
        debug!(id, "expanding entity node");
        let fetched = futures::try_join!(
            self.service.get_triple_groups(&out_filter),
            self.service.get_triple_groups(&in_filter),
        );

        let outcome = {
            let mut inner = self.lock();
            let present = inner.generation == generation && inner.graph.contains_node(id);
            match fetched {
                _ if !present => {
                    debug!(id, "target left the graph, dropping expansion result");
                    self.metrics.record_discard();
                    Ok(ExpansionOutcome::Discarded)
                }
                Err(err) => self.fail_expansion(&mut inner.graph, id, err),
                Ok((out_page, in_page)) => {
                    if let Some(node) = inner.graph.node_mut(id) {
                        node.expanded = true;
                        node.error = None;
                        if let Some(data) = node.as_entity_mut() {
                            data.out_filter = out_filter;
                            data.in_filter = in_filter;
                            data.out_total = triple_count(&out_page);
                            data.in_total = triple_count(&in_page);
                        }
                    }
                    let removal = inner.graph.remove_subtree(id);
                    let (nodes_added, edges_added) =
                        self.merge_triple_groups(&mut inner.graph, id, &out_page, &in_page);
                    self.metrics.record_expansion(nodes_added);
                    self.publish_change(&inner.graph, id, removal.selection_moved);
                    Ok(ExpansionOutcome::Expanded {
                        nodes_added,
                        edges_added,
                        nodes_replaced: removal.nodes.len(),
                    })
                }
            }
        };
        self.channels.set_loading(false);
        outcome
    }

    /// Materialize property groups around entity `id`.
    ///
    /// Inbound groups are skipped when `id` is already linked to a property
    /// group of the same predicate, whichever entity that group belongs to.
    /// This keeps a symmetric predicate from sprouting a second bubble, at
    /// the cost of hiding a distinct inbound grouping that happens to share
    /// the predicate.
    fn merge_triple_groups(
        &self,
        graph: &mut MaterializedGraph,
        id: &str,
        out_page: &DataPage<TripleGroup>,
        in_page: &DataPage<TripleGroup>,
    ) -> (usize, usize) {
        let node_id = node_id_from_visual(id);
        let mut nodes_added = 0;
        let mut edges_added = 0;

        for group in &out_page.items {
            let child = self.property_node(group, node_id);
            let child_id = child.id.clone();
            nodes_added += usize::from(graph.add_node_if_absent(child));
            edges_added += usize::from(graph.add_edge_if_absent(VisualEdge::new(
                id,
                child_id,
                group.predicate_uri.as_str(),
                id,
            )));
        }

        for group in &in_page.items {
            if graph.links_property_with_predicate(id, group.predicate_id) {
                debug!(id, predicate_id = group.predicate_id, "inbound group already linked");
                continue;
            }
            let child = self.property_node(group, node_id);
            let child_id = child.id.clone();
            nodes_added += usize::from(graph.add_node_if_absent(child));
            edges_added += usize::from(graph.add_edge_if_absent(VisualEdge::new(
                child_id,
                id,
                group.predicate_uri.as_str(),
                id,
            )));
        }

        (nodes_added, edges_added)
    }

    // -------------------------------------------------------------------
    // expand_property
    // -------------------------------------------------------------------

    /// Expand a property group into its linked entities and literals.
    pub async fn expand_property(
        &self,
        id: &str,
        out_patch: Option<LinkedNodeFilterPatch>,
        in_patch: Option<LinkedNodeFilterPatch>,
        lit_patch: Option<LinkedLiteralFilterPatch>,
    ) -> Result<ExpansionOutcome> {
        let (generation, out_filter, in_filter, lit_filter, predicate_uri) = {
            let inner = self.lock();
            let node = inner
                .graph
                .node(id)
                .ok_or_else(|| WalkerError::UnknownNode(id.to_string()))?;
            let data = node.as_property().ok_or_else(|| WalkerError::UnexpectedKind {
                id: id.to_string(),
                expected: "a property group",
            })?;
            let node_id = node_id_from_visual(id);
            let predicate_id = predicate_id_from_visual(id);

            let mut out_filter = data.out_filter.clone();
            let mut in_filter = data.in_filter.clone();
            let mut lit_filter = data.lit_filter.clone();
            if let Some(patch) = &out_patch {
                patch.apply_to(&mut out_filter);
            }
            if let Some(patch) = &in_patch {
                patch.apply_to(&mut in_filter);
            }
            if let Some(patch) = &lit_patch {
                patch.apply_to(&mut lit_filter);
            }
            for (filter, is_object) in [(&mut out_filter, true), (&mut in_filter, false)] {
                filter.other_node_id = node_id;
                filter.predicate_id = predicate_id;
                filter.is_object = is_object;
            }
            lit_filter.subject_id = node_id;
            lit_filter.predicate_id = predicate_id;
            (
                inner.generation,
                out_filter,
                in_filter,
                lit_filter,
                data.predicate_uri.clone(),
            )
        };

        self.begin_loading();
        debug!(id, "expanding property group");
        let fetched = futures::try_join!(
            self.service.get_linked_nodes(&out_filter),
            self.service.get_linked_nodes(&in_filter),
            self.service.get_linked_literals(&lit_filter),
        );

        let outcome = {
            let mut inner = self.lock();
            let present = inner.generation == generation && inner.graph.contains_node(id);
            match fetched {
                _ if !present => {
                    debug!(id, "target left the graph, dropping expansion result");
                    self.metrics.record_discard();
                    Ok(ExpansionOutcome::Discarded)
                }
                Err(err) => self.fail_expansion(&mut inner.graph, id, err),
                Ok((out_page, in_page, lit_page)) => {
                    if let Some(node) = inner.graph.node_mut(id) {
                        node.expanded = true;
                        node.error = None;
                        if let Some(data) = node.as_property_mut() {
                            data.out_filter = out_filter;
                            data.in_filter = in_filter;
                            data.lit_filter = lit_filter;
                            data.out_total = out_page.total;
                            data.in_total = in_page.total;
                            data.lit_total = lit_page.total;
                        }
                    }
                    let removal = inner.graph.remove_subtree(id);
                    let (nodes_added, edges_added) = self.merge_linked(
                        &mut inner.graph,
                        id,
                        &predicate_uri,
                        &out_page.items,
                        &in_page.items,
                        &lit_page.items,
                    );
                    self.metrics.record_expansion(nodes_added);
                    self.publish_change(&inner.graph, id, removal.selection_moved);
                    Ok(ExpansionOutcome::Expanded {
                        nodes_added,
                        edges_added,
                        nodes_replaced: removal.nodes.len(),
                    })
                }
            }
        };
        self.channels.set_loading(false);
        outcome
    }

    /// Materialize the entities and literals reached from property group `id`.
    fn merge_linked(
        &self,
        graph: &mut MaterializedGraph,
        id: &str,
        label: &str,
        outbound: &[GraphNode],
        inbound: &[GraphNode],
        literals: &[Triple],
    ) -> (usize, usize) {
        let mut nodes_added = 0;
        let mut edges_added = 0;

        for node in outbound {
            let child = self.entity_node(node.clone(), id);
            let child_id = child.id.clone();
            nodes_added += usize::from(graph.add_node_if_absent(child));
            edges_added +=
                usize::from(graph.add_edge_if_absent(VisualEdge::new(id, child_id, label, id)));
        }
        for node in inbound {
            let child = self.entity_node(node.clone(), id);
            let child_id = child.id.clone();
            nodes_added += usize::from(graph.add_node_if_absent(child));
            edges_added +=
                usize::from(graph.add_edge_if_absent(VisualEdge::new(child_id, id, label, id)));
        }
        for triple in literals {
            let Some(child) = VisualNode::literal(
                triple,
                id,
                self.config.display.literal_max_length,
                self.config.display.colors.literal.as_str(),
            ) else {
                debug!(id, triple_id = triple.id, "skipping non-literal triple");
                continue;
            };
            let child_id = child.id.clone();
            nodes_added += usize::from(graph.add_node_if_absent(child));
            edges_added +=
                usize::from(graph.add_edge_if_absent(VisualEdge::new(id, child_id, label, id)));
        }

        (nodes_added, edges_added)
    }

    // -------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------

    /// Republish the graph after `id` changed. The selection streams are
    /// only touched when they can differ: `id` is the selected node or the
    /// selection moved off a removed node.
    fn publish_change(&self, graph: &MaterializedGraph, id: &str, selection_moved: bool) {
        self.channels.publish_graph(graph);
        if selection_moved || graph.selected_id() == Some(id) {
            self.channels.publish_selection(graph);
        }
    }

    fn begin_loading(&self) {
        self.channels.set_loading(true);
        self.channels.set_error(None);
    }

    /// Mark `id` as failed, keeping the rest of the graph as it was.
    fn fail_expansion(
        &self,
        graph: &mut MaterializedGraph,
        id: &str,
        err: WalkerError,
    ) -> Result<ExpansionOutcome> {
        warn!(id, error = %err, "expansion failed");
        self.metrics.record_failure();
        if let Some(node) = graph.node_mut(id) {
            node.error = Some(err.to_string());
        }
        self.channels
            .set_error(Some(format!("Error expanding {id}: {err}")));
        self.channels.publish_all(graph);
        Err(err)
    }

    fn entity_node(&self, node: GraphNode, origin_id: &str) -> VisualNode {
        VisualNode::entity(
            node,
            origin_id,
            self.config.paging.node_page_size,
            self.config.display.colors.entity.as_str(),
        )
    }

    fn property_node(&self, group: &TripleGroup, origin_node_id: i32) -> VisualNode {
        VisualNode::property_group(
            group,
            origin_node_id,
            self.config.paging.property_page_size,
            self.config.paging.literal_page_size,
            self.config.display.colors.property.as_str(),
        )
    }
}

/// Number of triples behind a page of groups. The page's own `total`
/// counts groups, not triples.
fn triple_count(page: &DataPage<TripleGroup>) -> u32 {
    page.items.iter().map(|group| group.count).sum()
}
