//! Shared fixtures for integration tests: a scripted query service and the
//! Petrarca neighbourhood used by the walker scenarios.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use graph_walker::config::schema::WalkerConfig;
use graph_walker::error::{Result, WalkerError};
use graph_walker::filter::{PagedLinkedLiteralFilter, PagedLinkedNodeFilter, PagedTripleFilter};
use graph_walker::service::GraphQueryService;
use graph_walker::types::{DataPage, GraphNode, Literal, Triple, TripleGroup};
use graph_walker::GraphWalker;

// ---------------------------------------------------------------------------
// ScriptedService
// ---------------------------------------------------------------------------

/// Answers from canned pages keyed by the filter fields the walker owns.
/// Anything unscripted is an empty page.
#[derive(Default)]
pub struct ScriptedService {
    nodes: HashMap<i32, GraphNode>,
    outbound: HashMap<i32, (Vec<TripleGroup>, u32)>,
    inbound: HashMap<i32, (Vec<TripleGroup>, u32)>,
    linked: HashMap<(i32, i32, bool), Vec<GraphNode>>,
    literals: HashMap<(i32, i32), Vec<Triple>>,
    failing_outbound: Mutex<HashSet<i32>>,
    failing_nodes: Mutex<HashSet<i32>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
    waiting: AtomicUsize,
    pub triple_filters: Mutex<Vec<PagedTripleFilter>>,
    pub node_filters: Mutex<Vec<PagedLinkedNodeFilter>>,
    pub literal_filters: Mutex<Vec<PagedLinkedLiteralFilter>>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_node(mut self, id: i32, label: &str) -> Self {
        self.nodes
            .insert(id, GraphNode::new(id, label, format!("x:{}", label.to_lowercase())));
        self
    }

    pub fn with_outbound(mut self, node_id: i32, groups: Vec<TripleGroup>, total: u32) -> Self {
        self.outbound.insert(node_id, (groups, total));
        self
    }

    pub fn with_inbound(mut self, node_id: i32, groups: Vec<TripleGroup>, total: u32) -> Self {
        self.inbound.insert(node_id, (groups, total));
        self
    }

    pub fn with_linked(
        mut self,
        other_node_id: i32,
        predicate_id: i32,
        is_object: bool,
        nodes: Vec<GraphNode>,
    ) -> Self {
        self.linked
            .insert((other_node_id, predicate_id, is_object), nodes);
        self
    }

    pub fn with_literals(mut self, subject_id: i32, predicate_id: i32, triples: Vec<Triple>) -> Self {
        self.literals.insert((subject_id, predicate_id), triples);
        self
    }

    /// Make outbound group queries for `node_id` fail from now on.
    pub fn fail_outbound(&self, node_id: i32) {
        self.failing_outbound.lock().unwrap().insert(node_id);
    }

    pub fn recover_outbound(&self, node_id: i32) {
        self.failing_outbound.lock().unwrap().remove(&node_id);
    }

    /// Make node lookups for `id` fail from now on.
    pub fn fail_node(&self, id: i32) {
        self.failing_nodes.lock().unwrap().insert(id);
    }

    pub fn recover_node(&self, id: i32) {
        self.failing_nodes.lock().unwrap().remove(&id);
    }

    /// Hold every later query until permits are added to the returned
    /// semaphore.
    pub fn close_gate(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Queries currently (or formerly) held at the gate.
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    async fn pass_gate(&self) {
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            self.waiting.fetch_add(1, Ordering::SeqCst);
            gate.acquire().await.expect("gate closed").forget();
        }
    }
}

fn page<T>(items: Vec<T>, total: u32, page_number: u32, page_size: u32) -> DataPage<T> {
    DataPage::new(items, total, page_number, page_size)
}

#[async_trait]
impl GraphQueryService for ScriptedService {
    async fn get_node(&self, id: i32) -> Result<Option<GraphNode>> {
        self.pass_gate().await;
        if self.failing_nodes.lock().unwrap().contains(&id) {
            return Err(WalkerError::fetch("connection refused"));
        }
        Ok(self.nodes.get(&id).cloned())
    }

    async fn get_triple_groups(&self, filter: &PagedTripleFilter) -> Result<DataPage<TripleGroup>> {
        self.triple_filters.lock().unwrap().push(filter.clone());
        self.pass_gate().await;

        let scripted = match (filter.subject_id, filter.object_id) {
            (Some(subject), _) => {
                if self.failing_outbound.lock().unwrap().contains(&subject) {
                    return Err(WalkerError::fetch("connection reset by peer"));
                }
                self.outbound.get(&subject)
            }
            (None, Some(object)) => self.inbound.get(&object),
            (None, None) => None,
        };
        let (groups, total) = scripted.cloned().unwrap_or_default();
        Ok(page(groups, total, filter.page_number, filter.page_size))
    }

    async fn get_linked_nodes(&self, filter: &PagedLinkedNodeFilter) -> Result<DataPage<GraphNode>> {
        self.node_filters.lock().unwrap().push(filter.clone());
        self.pass_gate().await;

        let nodes = self
            .linked
            .get(&(filter.other_node_id, filter.predicate_id, filter.is_object))
            .cloned()
            .unwrap_or_default();
        let total = nodes.len() as u32;
        Ok(page(nodes, total, filter.page_number, filter.page_size))
    }

    async fn get_linked_literals(&self, filter: &PagedLinkedLiteralFilter) -> Result<DataPage<Triple>> {
        self.literal_filters.lock().unwrap().push(filter.clone());
        self.pass_gate().await;

        let triples = self
            .literals
            .get(&(filter.subject_id, filter.predicate_id))
            .cloned()
            .unwrap_or_default();
        let total = triples.len() as u32;
        Ok(page(triples, total, filter.page_number, filter.page_size))
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn group(predicate_id: i32, predicate_uri: &str, count: u32) -> TripleGroup {
    TripleGroup {
        predicate_id,
        predicate_uri: predicate_uri.to_string(),
        count,
    }
}

/// Petrarca (10) with two outbound groups: predicate 5 (three triples,
/// reaching N21, N22 and the literal "1304" via triple 99) and predicate 9.
/// N21 in turn has outbound predicate 7 and inbound predicate 5.
pub fn petrarca() -> ScriptedService {
    ScriptedService::new()
        .with_node(10, "Petrarca")
        .with_node(21, "Birth of Petrarca")
        .with_node(22, "Arezzo")
        .with_outbound(
            10,
            vec![group(5, "crm:p98_brought_into_life", 3), group(9, "rdfs:label", 1)],
            2,
        )
        .with_linked(
            10,
            5,
            true,
            vec![
                GraphNode::new(21, "Birth of Petrarca", "x:birth"),
                GraphNode::new(22, "Arezzo", "x:arezzo"),
            ],
        )
        .with_literals(10, 5, vec![Triple::literal(99, 10, 5, Literal::new("1304"))])
        .with_outbound(21, vec![group(7, "crm:p7_took_place_at", 1)], 1)
        .with_inbound(21, vec![group(5, "crm:p98_brought_into_life", 1)], 1)
}

/// Config with root auto-expansion switched off, so tests drive every step.
pub fn manual_config() -> WalkerConfig {
    let mut config = WalkerConfig::default();
    config.behavior.auto_expand_root = false;
    config
}

pub fn walker(service: Arc<ScriptedService>) -> GraphWalker {
    GraphWalker::new(service, manual_config())
}

pub fn node_ids(walker: &GraphWalker) -> Vec<String> {
    walker.snapshot().nodes.into_iter().map(|n| n.id).collect()
}

pub fn edge_ids(walker: &GraphWalker) -> Vec<String> {
    walker.snapshot().edges.into_iter().map(|e| e.id).collect()
}
