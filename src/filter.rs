//! Paged query filters and the patches used to refine them.
//!
//! Each visual node keeps its own filters so it can be re-queried
//! independently. A patch carries only the fields a caller wants to change
//! (typically the page number); applying it leaves every other field alone.

use serde::{Deserialize, Serialize};

use crate::types::NodeSourceType;

/// Page number used for every freshly created filter.
pub const FIRST_PAGE: u32 = 1;

// ---------------------------------------------------------------------------
// LiteralFilter
// ---------------------------------------------------------------------------

/// Literal-matching fields shared by triple and linked-literal filters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LiteralFilter {
    /// Regular expression the literal value must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub literal_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub literal_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub literal_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_literal_number: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_literal_number: Option<f64>,
}

impl LiteralFilter {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ---------------------------------------------------------------------------
// NodeFilter
// ---------------------------------------------------------------------------

/// Node-matching fields of a linked-node filter.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeFilter {
    /// Substring the node URI must contain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_class: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Substring the node label must contain (case-insensitive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<NodeSourceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    #[serde(default)]
    pub is_sid_prefix: bool,
    /// Node must be an instance of one of these classes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub class_ids: Vec<i32>,
}

// ---------------------------------------------------------------------------
// PagedTripleFilter
// ---------------------------------------------------------------------------

/// Filter for triple-group queries issued by entity nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedTripleFilter {
    pub page_number: u32,
    pub page_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub predicate_ids: Vec<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_predicate_ids: Vec<i32>,
    /// `Some(true)` keeps only literal triples, `Some(false)` only node links.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_literal: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<i32>,
    #[serde(flatten)]
    pub literal: LiteralFilter,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    #[serde(default)]
    pub is_sid_prefix: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl PagedTripleFilter {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_number: FIRST_PAGE,
            page_size,
            subject_id: None,
            predicate_ids: Vec::new(),
            not_predicate_ids: Vec::new(),
            has_literal: None,
            object_id: None,
            literal: LiteralFilter::default(),
            sid: None,
            is_sid_prefix: false,
            tag: None,
        }
    }

    /// Outbound filter: triples having `node_id` as subject.
    pub fn outbound(node_id: i32, page_size: u32) -> Self {
        Self {
            subject_id: Some(node_id),
            ..Self::new(page_size)
        }
    }

    /// Inbound filter: triples having `node_id` as object.
    pub fn inbound(node_id: i32, page_size: u32) -> Self {
        Self {
            object_id: Some(node_id),
            ..Self::new(page_size)
        }
    }
}

// ---------------------------------------------------------------------------
// PagedLinkedNodeFilter
// ---------------------------------------------------------------------------

/// Filter for nodes linked to `other_node_id` via `predicate_id`.
///
/// With `is_object` set the matched nodes are the objects of
/// `other_node_id predicate ?`; otherwise they are the subjects of
/// `? predicate other_node_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedLinkedNodeFilter {
    pub page_number: u32,
    pub page_size: u32,
    pub other_node_id: i32,
    pub predicate_id: i32,
    pub is_object: bool,
    #[serde(flatten)]
    pub node: NodeFilter,
}

impl PagedLinkedNodeFilter {
    pub fn new(other_node_id: i32, predicate_id: i32, is_object: bool, page_size: u32) -> Self {
        Self {
            page_number: FIRST_PAGE,
            page_size,
            other_node_id,
            predicate_id,
            is_object,
            node: NodeFilter::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// PagedLinkedLiteralFilter
// ---------------------------------------------------------------------------

/// Filter for literal objects of `subject_id predicate_id ?`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedLinkedLiteralFilter {
    pub page_number: u32,
    pub page_size: u32,
    pub subject_id: i32,
    pub predicate_id: i32,
    #[serde(flatten)]
    pub literal: LiteralFilter,
}

impl PagedLinkedLiteralFilter {
    pub fn new(subject_id: i32, predicate_id: i32, page_size: u32) -> Self {
        Self {
            page_number: FIRST_PAGE,
            page_size,
            subject_id,
            predicate_id,
            literal: LiteralFilter::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Patches
// ---------------------------------------------------------------------------

/// Partial update of a [`PagedTripleFilter`].
///
/// Nullable fields use `Option<Option<T>>`: `Some(None)` clears the field.
/// Subject and object ids are absent on purpose, the walker owns them.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct TripleFilterPatch {
    pub page_number: Option<u32>,
    pub page_size: Option<u32>,
    pub predicate_ids: Option<Vec<i32>>,
    pub not_predicate_ids: Option<Vec<i32>>,
    pub has_literal: Option<Option<bool>>,
    pub literal: Option<LiteralFilter>,
    pub sid: Option<Option<String>>,
    pub is_sid_prefix: Option<bool>,
    pub tag: Option<Option<String>>,
}

impl TripleFilterPatch {
    /// Patch that only moves to another page.
    pub fn page(page_number: u32) -> Self {
        Self {
            page_number: Some(page_number),
            ..Self::default()
        }
    }

    pub fn apply_to(&self, filter: &mut PagedTripleFilter) {
        if let Some(n) = self.page_number {
            filter.page_number = n.max(FIRST_PAGE);
        }
        if let Some(n) = self.page_size {
            filter.page_size = n;
        }
        if let Some(ids) = &self.predicate_ids {
            filter.predicate_ids = ids.clone();
        }
        if let Some(ids) = &self.not_predicate_ids {
            filter.not_predicate_ids = ids.clone();
        }
        if let Some(v) = self.has_literal {
            filter.has_literal = v;
        }
        if let Some(lit) = &self.literal {
            filter.literal = lit.clone();
        }
        if let Some(sid) = &self.sid {
            filter.sid = sid.clone();
        }
        if let Some(v) = self.is_sid_prefix {
            filter.is_sid_prefix = v;
        }
        if let Some(tag) = &self.tag {
            filter.tag = tag.clone();
        }
    }
}

/// Partial update of a [`PagedLinkedNodeFilter`]. The walker owns the
/// endpoint, predicate and direction.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct LinkedNodeFilterPatch {
    pub page_number: Option<u32>,
    pub page_size: Option<u32>,
    pub node: Option<NodeFilter>,
}

impl LinkedNodeFilterPatch {
    pub fn page(page_number: u32) -> Self {
        Self {
            page_number: Some(page_number),
            ..Self::default()
        }
    }

    pub fn apply_to(&self, filter: &mut PagedLinkedNodeFilter) {
        if let Some(n) = self.page_number {
            filter.page_number = n.max(FIRST_PAGE);
        }
        if let Some(n) = self.page_size {
            filter.page_size = n;
        }
        if let Some(node) = &self.node {
            filter.node = node.clone();
        }
    }
}

/// Partial update of a [`PagedLinkedLiteralFilter`].
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct LinkedLiteralFilterPatch {
    pub page_number: Option<u32>,
    pub page_size: Option<u32>,
    pub literal: Option<LiteralFilter>,
}

impl LinkedLiteralFilterPatch {
    pub fn page(page_number: u32) -> Self {
        Self {
            page_number: Some(page_number),
            ..Self::default()
        }
    }

    pub fn apply_to(&self, filter: &mut PagedLinkedLiteralFilter) {
        if let Some(n) = self.page_number {
            filter.page_number = n.max(FIRST_PAGE);
        }
        if let Some(n) = self.page_size {
            filter.page_size = n;
        }
        if let Some(lit) = &self.literal {
            filter.literal = lit.clone();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
