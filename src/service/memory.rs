//! In-memory [`GraphQueryService`] over a JSON dataset.
//!
//! Answers the same paged queries a remote graph API would, by scanning a
//! `{ "nodes": [...], "triples": [...] }` dataset held in memory. Good for
//! demos, fixtures and tests; it makes no attempt at indexing.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::GraphQueryService;
use crate::error::{Result, WalkerError};
use crate::filter::{
    LiteralFilter, NodeFilter, PagedLinkedLiteralFilter, PagedLinkedNodeFilter, PagedTripleFilter,
};
use crate::types::{DataPage, GraphNode, Literal, Triple, TripleGroup, TripleObject};

/// URI of the predicate linking an instance to its class.
pub const RDF_TYPE_URI: &str = "rdf:type";

// ---------------------------------------------------------------------------
// GraphDataset
// ---------------------------------------------------------------------------

/// Serialized form of an in-memory graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphDataset {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub triples: Vec<Triple>,
}

// ---------------------------------------------------------------------------
// MemoryGraphService
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct MemoryGraphService {
    nodes: HashMap<i32, GraphNode>,
    triples: Vec<Triple>,
    type_predicate: Option<i32>,
}

impl MemoryGraphService {
    pub fn new(dataset: GraphDataset) -> Self {
        let type_predicate = dataset
            .nodes
            .iter()
            .find(|n| n.uri == RDF_TYPE_URI)
            .map(|n| n.id);
        let nodes = dataset.nodes.into_iter().map(|n| (n.id, n)).collect();
        Self {
            nodes,
            triples: dataset.triples,
            type_predicate,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let dataset: GraphDataset = serde_json::from_str(json)?;
        Ok(Self::new(dataset))
    }

    /// Load a dataset file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let service = Self::from_json_str(&text)?;
        debug!(
            path = %path.display(),
            nodes = service.nodes.len(),
            triples = service.triples.len(),
            "loaded graph dataset"
        );
        Ok(service)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn triple_count(&self) -> usize {
        self.triples.len()
    }

    /// URI of a predicate node, or `#<id>` when the dataset lacks it.
    fn predicate_uri(&self, predicate_id: i32) -> String {
        self.nodes
            .get(&predicate_id)
            .map(|n| n.uri.clone())
            .unwrap_or_else(|| format!("#{predicate_id}"))
    }

    fn class_ids_of(&self, node_id: i32) -> impl Iterator<Item = i32> + '_ {
        let type_predicate = self.type_predicate;
        self.triples.iter().filter_map(move |t| {
            (Some(t.predicate_id) == type_predicate && t.subject_id == node_id)
                .then(|| t.object_id())
                .flatten()
        })
    }

    fn matches_triple(&self, t: &Triple, f: &PagedTripleFilter, pattern: Option<&Regex>) -> bool {
        if f.subject_id.is_some_and(|id| id != t.subject_id) {
            return false;
        }
        if !f.predicate_ids.is_empty() && !f.predicate_ids.contains(&t.predicate_id) {
            return false;
        }
        if f.not_predicate_ids.contains(&t.predicate_id) {
            return false;
        }
        if let Some(id) = f.object_id {
            if t.object_id() != Some(id) {
                return false;
            }
        }
        if let Some(has_literal) = f.has_literal {
            if has_literal != t.object_literal().is_some() {
                return false;
            }
        }
        if !f.literal.is_empty() {
            match t.object_literal() {
                Some(lit) if matches_literal(lit, &f.literal, pattern) => {}
                _ => return false,
            }
        }
        if !matches_sid(t.sid.as_deref(), f.sid.as_deref(), f.is_sid_prefix) {
            return false;
        }
        if f.tag.is_some() && t.tag != f.tag {
            return false;
        }
        true
    }

    fn matches_node(&self, n: &GraphNode, f: &NodeFilter) -> bool {
        if let Some(uid) = &f.uid {
            if !n.uri.contains(uid.as_str()) {
                return false;
            }
        }
        if f.is_class.is_some_and(|c| c != n.is_class) {
            return false;
        }
        if f.tag.is_some() && n.tag != f.tag {
            return false;
        }
        if let Some(label) = &f.label {
            if !n.label.to_lowercase().contains(&label.to_lowercase()) {
                return false;
            }
        }
        if f.source_type.is_some_and(|s| s != n.source_type) {
            return false;
        }
        if !matches_sid(n.sid.as_deref(), f.sid.as_deref(), f.is_sid_prefix) {
            return false;
        }
        if !f.class_ids.is_empty() && !self.class_ids_of(n.id).any(|c| f.class_ids.contains(&c)) {
            return false;
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Matching helpers
// ---------------------------------------------------------------------------

fn compile_pattern(filter: &LiteralFilter) -> Result<Option<Regex>> {
    filter
        .literal_pattern
        .as_deref()
        .map(|p| {
            Regex::new(p).map_err(|e| WalkerError::fetch(format!("invalid literal pattern {p:?}: {e}")))
        })
        .transpose()
}

fn matches_literal(lit: &Literal, f: &LiteralFilter, pattern: Option<&Regex>) -> bool {
    if pattern.is_some_and(|re| !re.is_match(&lit.value)) {
        return false;
    }
    if f.literal_type.is_some() && lit.literal_type != f.literal_type {
        return false;
    }
    if f.literal_language.is_some() && lit.language != f.literal_language {
        return false;
    }
    if f.min_literal_number.is_some() || f.max_literal_number.is_some() {
        let Some(n) = lit.number else {
            return false;
        };
        if f.min_literal_number.is_some_and(|min| n < min)
            || f.max_literal_number.is_some_and(|max| n > max)
        {
            return false;
        }
    }
    true
}

fn matches_sid(actual: Option<&str>, wanted: Option<&str>, is_prefix: bool) -> bool {
    match (wanted, actual) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(w), Some(a)) if is_prefix => a.starts_with(w),
        (Some(w), Some(a)) => a == w,
    }
}

/// Cut one page out of `items`. A page size of 0 returns everything.
fn paginate<T>(items: Vec<T>, page_number: u32, page_size: u32) -> DataPage<T> {
    let total = u32::try_from(items.len()).unwrap_or(u32::MAX);
    if page_size == 0 {
        return DataPage::new(items, total, page_number, page_size);
    }
    let skip = (page_number.max(1) as usize - 1) * page_size as usize;
    let page = items.into_iter().skip(skip).take(page_size as usize).collect();
    DataPage::new(page, total, page_number, page_size)
}

// ---------------------------------------------------------------------------
// GraphQueryService impl
// ---------------------------------------------------------------------------

#[async_trait]
impl GraphQueryService for MemoryGraphService {
    async fn get_node(&self, id: i32) -> Result<Option<GraphNode>> {
        Ok(self.nodes.get(&id).cloned())
    }

    async fn get_triple_groups(&self, filter: &PagedTripleFilter) -> Result<DataPage<TripleGroup>> {
        let pattern = compile_pattern(&filter.literal)?;
        let mut counts: BTreeMap<i32, u32> = BTreeMap::new();
        for t in &self.triples {
            if self.matches_triple(t, filter, pattern.as_ref()) {
                *counts.entry(t.predicate_id).or_default() += 1;
            }
        }

        let mut groups: Vec<TripleGroup> = counts
            .into_iter()
            .map(|(predicate_id, count)| TripleGroup {
                predicate_id,
                predicate_uri: self.predicate_uri(predicate_id),
                count,
            })
            .collect();
        groups.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.predicate_uri.cmp(&b.predicate_uri))
        });

        Ok(paginate(groups, filter.page_number, filter.page_size))
    }

    async fn get_linked_nodes(&self, filter: &PagedLinkedNodeFilter) -> Result<DataPage<GraphNode>> {
        let mut seen = HashSet::new();
        let mut linked = Vec::new();
        for t in &self.triples {
            if t.predicate_id != filter.predicate_id {
                continue;
            }
            let other = match (&t.object, filter.is_object) {
                (TripleObject::Node(object), true) if t.subject_id == filter.other_node_id => *object,
                (TripleObject::Node(object), false) if *object == filter.other_node_id => t.subject_id,
                _ => continue,
            };
            if !seen.insert(other) {
                continue;
            }
            if let Some(node) = self.nodes.get(&other) {
                if self.matches_node(node, &filter.node) {
                    linked.push(node.clone());
                }
            }
        }
        linked.sort_by(|a, b| a.label.cmp(&b.label).then(a.id.cmp(&b.id)));

        Ok(paginate(linked, filter.page_number, filter.page_size))
    }

    async fn get_linked_literals(&self, filter: &PagedLinkedLiteralFilter) -> Result<DataPage<Triple>> {
        let pattern = compile_pattern(&filter.literal)?;
        let mut literals: Vec<Triple> = self
            .triples
            .iter()
            .filter(|t| t.subject_id == filter.subject_id && t.predicate_id == filter.predicate_id)
            .filter(|t| {
                t.object_literal()
                    .is_some_and(|lit| matches_literal(lit, &filter.literal, pattern.as_ref()))
            })
            .cloned()
            .collect();
        literals.sort_by_key(|t| t.id);

        Ok(paginate(literals, filter.page_number, filter.page_size))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
