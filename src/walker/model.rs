//! Visual nodes and edges materialized by the walker.

use serde::Serialize;

use crate::filter::{PagedLinkedLiteralFilter, PagedLinkedNodeFilter, PagedTripleFilter};
use crate::types::{GraphNode, Literal, Triple, TripleGroup};

use super::ids::{build_edge_id, build_literal_id, build_node_id, build_property_id};

// ---------------------------------------------------------------------------
// Node payloads
// ---------------------------------------------------------------------------

/// Payload of an entity node, mirroring one graph node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityData {
    pub node: GraphNode,
    pub out_filter: PagedTripleFilter,
    pub in_filter: PagedTripleFilter,
    pub out_total: u32,
    pub in_total: u32,
}

/// Payload of a property group: "triples via `predicate_id` touching
/// `origin_node_id`".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyGroupData {
    pub predicate_id: i32,
    pub predicate_uri: String,
    pub origin_node_id: i32,
    /// Triple count reported by the group that created this node.
    pub count: u32,
    pub out_filter: PagedLinkedNodeFilter,
    pub in_filter: PagedLinkedNodeFilter,
    pub lit_filter: PagedLinkedLiteralFilter,
    pub out_total: u32,
    pub in_total: u32,
    pub lit_total: u32,
}

/// Payload of a literal node, mirroring one literal-valued triple.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiteralData {
    pub triple_id: i32,
    pub value: String,
    pub literal_type: Option<String>,
    pub language: Option<String>,
    pub number: Option<f64>,
}

/// Kind-specific part of a [`VisualNode`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VisualNodeData {
    Entity(EntityData),
    PropertyGroup(PropertyGroupData),
    Literal(LiteralData),
}

impl VisualNodeData {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Entity(_) => "entity",
            Self::PropertyGroup(_) => "property",
            Self::Literal(_) => "literal",
        }
    }
}

// ---------------------------------------------------------------------------
// VisualNode
// ---------------------------------------------------------------------------

/// A node of the materialized graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualNode {
    pub id: String,
    pub label: String,
    /// Id of the node whose expansion produced this one; empty for the root.
    pub origin_id: String,
    pub expanded: bool,
    pub selected: bool,
    pub error: Option<String>,
    pub color: String,
    pub data: VisualNodeData,
}

impl VisualNode {
    /// Entity node for `node`, with fresh outbound/inbound filters.
    pub fn entity(
        node: GraphNode,
        origin_id: impl Into<String>,
        page_size: u32,
        color: impl Into<String>,
    ) -> Self {
        let id = build_node_id(node.id);
        let label = node.display_label().to_string();
        let out_filter = PagedTripleFilter::outbound(node.id, page_size);
        let in_filter = PagedTripleFilter::inbound(node.id, page_size);
        Self {
            id,
            label,
            origin_id: origin_id.into(),
            expanded: false,
            selected: false,
            error: None,
            color: color.into(),
            data: VisualNodeData::Entity(EntityData {
                node,
                out_filter,
                in_filter,
                out_total: 0,
                in_total: 0,
            }),
        }
    }

    /// Property group for `group` hanging off entity `origin_node_id`.
    pub fn property_group(
        group: &TripleGroup,
        origin_node_id: i32,
        page_size: u32,
        literal_page_size: u32,
        color: impl Into<String>,
    ) -> Self {
        let pid = group.predicate_id;
        Self {
            id: build_property_id(pid, origin_node_id),
            label: group.predicate_uri.clone(),
            origin_id: build_node_id(origin_node_id),
            expanded: false,
            selected: false,
            error: None,
            color: color.into(),
            data: VisualNodeData::PropertyGroup(PropertyGroupData {
                predicate_id: pid,
                predicate_uri: group.predicate_uri.clone(),
                origin_node_id,
                count: group.count,
                out_filter: PagedLinkedNodeFilter::new(origin_node_id, pid, true, page_size),
                in_filter: PagedLinkedNodeFilter::new(origin_node_id, pid, false, page_size),
                lit_filter: PagedLinkedLiteralFilter::new(origin_node_id, pid, literal_page_size),
                out_total: 0,
                in_total: 0,
                lit_total: 0,
            }),
        }
    }

    /// Literal node for a literal-valued triple. Returns `None` when the
    /// triple's object is a node.
    pub fn literal(
        triple: &Triple,
        origin_id: impl Into<String>,
        max_label_len: usize,
        color: impl Into<String>,
    ) -> Option<Self> {
        let Literal {
            value,
            literal_type,
            language,
            number,
        } = triple.object_literal()?.clone();
        Some(Self {
            id: build_literal_id(triple.id),
            label: truncate_label(&value, max_label_len),
            origin_id: origin_id.into(),
            expanded: false,
            selected: false,
            error: None,
            color: color.into(),
            data: VisualNodeData::Literal(LiteralData {
                triple_id: triple.id,
                value,
                literal_type,
                language,
                number,
            }),
        })
    }

    pub fn is_root(&self) -> bool {
        self.origin_id.is_empty()
    }

    pub fn as_entity(&self) -> Option<&EntityData> {
        match &self.data {
            VisualNodeData::Entity(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_entity_mut(&mut self) -> Option<&mut EntityData> {
        match &mut self.data {
            VisualNodeData::Entity(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_property(&self) -> Option<&PropertyGroupData> {
        match &self.data {
            VisualNodeData::PropertyGroup(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_property_mut(&mut self) -> Option<&mut PropertyGroupData> {
        match &mut self.data {
            VisualNodeData::PropertyGroup(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&LiteralData> {
        match &self.data {
            VisualNodeData::Literal(d) => Some(d),
            _ => None,
        }
    }
}

/// Shorten `value` to at most `max_len` characters, marking the cut with `…`.
/// A `max_len` of 0 disables truncation.
pub fn truncate_label(value: &str, max_len: usize) -> String {
    if max_len == 0 || value.chars().count() <= max_len {
        return value.to_string();
    }
    let mut out: String = value.chars().take(max_len.saturating_sub(1)).collect();
    out.push('…');
    out
}

// ---------------------------------------------------------------------------
// VisualEdge
// ---------------------------------------------------------------------------

/// A directed edge of the materialized graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisualEdge {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    pub label: String,
    pub origin_id: String,
}

impl VisualEdge {
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        label: impl Into<String>,
        origin_id: impl Into<String>,
    ) -> Self {
        let source_id = source_id.into();
        let target_id = target_id.into();
        Self {
            id: build_edge_id(&source_id, &target_id),
            source_id,
            target_id,
            label: label.into(),
            origin_id: origin_id.into(),
        }
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source_id == node_id || self.target_id == node_id
    }

    /// The endpoint opposite to `node_id`, if the edge touches it.
    pub fn other_end(&self, node_id: &str) -> Option<&str> {
        if self.source_id == node_id {
            Some(&self.target_id)
        } else if self.target_id == node_id {
            Some(&self.source_id)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Published selection state
// ---------------------------------------------------------------------------

/// Totals relevant to the selected node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct WalkerTotals {
    pub outbound_count: u32,
    pub inbound_count: u32,
    pub property_outbound_count: u32,
    pub property_inbound_count: u32,
    pub literal_count: u32,
}

/// Filters relevant to the selected node. Entity slots and property slots
/// are never filled at the same time.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SelectedFilters {
    pub node_out: Option<PagedTripleFilter>,
    pub node_in: Option<PagedTripleFilter>,
    pub property_out: Option<PagedLinkedNodeFilter>,
    pub property_in: Option<PagedLinkedNodeFilter>,
    pub literal: Option<PagedLinkedLiteralFilter>,
}

impl SelectedFilters {
    /// Filters and totals to publish for `node` (or for no selection).
    pub fn for_node(node: Option<&VisualNode>) -> (Self, WalkerTotals) {
        let Some(node) = node else {
            return (Self::default(), WalkerTotals::default());
        };
        match &node.data {
            VisualNodeData::Entity(d) => (
                Self {
                    node_out: Some(d.out_filter.clone()),
                    node_in: Some(d.in_filter.clone()),
                    ..Self::default()
                },
                WalkerTotals {
                    outbound_count: d.out_total,
                    inbound_count: d.in_total,
                    ..WalkerTotals::default()
                },
            ),
            VisualNodeData::PropertyGroup(d) => (
                Self {
                    property_out: Some(d.out_filter.clone()),
                    property_in: Some(d.in_filter.clone()),
                    literal: Some(d.lit_filter.clone()),
                    ..Self::default()
                },
                WalkerTotals {
                    property_outbound_count: d.out_total,
                    property_inbound_count: d.in_total,
                    literal_count: d.lit_total,
                    ..WalkerTotals::default()
                },
            ),
            VisualNodeData::Literal(_) => (Self::default(), WalkerTotals::default()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
