//! Core domain types for the graph walker.
//!
//! These mirror the payloads served by the graph query service: graph
//! nodes, triples (whose object is either a node or a literal), predicate
//! groups and result pages.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// NodeSourceType
// ---------------------------------------------------------------------------

/// Where a graph node came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeSourceType {
    /// Entered manually by a user.
    #[default]
    User,
    /// Derived from an item.
    Item,
    /// Derived from a part of an item.
    Part,
    /// Derived from a thesaurus entry.
    Thesaurus,
    /// Created implicitly by mapping rules.
    Implicit,
}

impl NodeSourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Item => "item",
            Self::Part => "part",
            Self::Thesaurus => "thesaurus",
            Self::Implicit => "implicit",
        }
    }

    /// Parse from a loose string (case-insensitive, numeric codes accepted).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "user" | "0" => Some(Self::User),
            "item" | "1" => Some(Self::Item),
            "part" | "2" => Some(Self::Part),
            "thesaurus" | "3" => Some(Self::Thesaurus),
            "implicit" | "4" => Some(Self::Implicit),
            _ => None,
        }
    }
}

impl std::fmt::Display for NodeSourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// GraphNode
// ---------------------------------------------------------------------------

/// A node of the semantic graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: i32,
    pub label: String,
    pub uri: String,
    #[serde(default)]
    pub source_type: NodeSourceType,
    #[serde(default)]
    pub is_class: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Provenance id of the source that generated this node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
}

impl GraphNode {
    /// Minimal user node, mostly handy for tests and datasets.
    pub fn new(id: i32, label: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            uri: uri.into(),
            source_type: NodeSourceType::User,
            is_class: false,
            tag: None,
            sid: None,
        }
    }

    /// The text shown for this node: its label, or its URI when unlabeled.
    pub fn display_label(&self) -> &str {
        if self.label.trim().is_empty() {
            &self.uri
        } else {
            &self.label
        }
    }
}

// ---------------------------------------------------------------------------
// Literal / TripleObject / Triple
// ---------------------------------------------------------------------------

/// A literal triple object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Literal {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub literal_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Numeric projection of the value, when it has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<f64>,
}

impl Literal {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }
}

/// The object of a triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripleObject {
    Node(i32),
    Literal(Literal),
}

/// A subject–predicate–object fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triple {
    pub id: i32,
    pub subject_id: i32,
    pub predicate_id: i32,
    pub object: TripleObject,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl Triple {
    /// Triple whose object is another node.
    pub fn linking(id: i32, subject_id: i32, predicate_id: i32, object_id: i32) -> Self {
        Self {
            id,
            subject_id,
            predicate_id,
            object: TripleObject::Node(object_id),
            sid: None,
            tag: None,
        }
    }

    /// Triple whose object is a literal.
    pub fn literal(id: i32, subject_id: i32, predicate_id: i32, literal: Literal) -> Self {
        Self {
            id,
            subject_id,
            predicate_id,
            object: TripleObject::Literal(literal),
            sid: None,
            tag: None,
        }
    }

    pub fn object_id(&self) -> Option<i32> {
        match self.object {
            TripleObject::Node(id) => Some(id),
            TripleObject::Literal(_) => None,
        }
    }

    pub fn object_literal(&self) -> Option<&Literal> {
        match &self.object {
            TripleObject::Node(_) => None,
            TripleObject::Literal(lit) => Some(lit),
        }
    }
}

// ---------------------------------------------------------------------------
// TripleGroup
// ---------------------------------------------------------------------------

/// "`count` triples via predicate `predicate_id`" touching a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripleGroup {
    pub predicate_id: i32,
    pub predicate_uri: String,
    pub count: u32,
}

// ---------------------------------------------------------------------------
// DataPage
// ---------------------------------------------------------------------------

/// One page of results from the query service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPage<T> {
    pub items: Vec<T>,
    pub total: u32,
    pub page_number: u32,
    pub page_size: u32,
    pub page_count: u32,
}

impl<T> DataPage<T> {
    /// Build a page, deriving `page_count` from `total` and `page_size`.
    pub fn new(items: Vec<T>, total: u32, page_number: u32, page_size: u32) -> Self {
        let page_count = if page_size == 0 {
            0
        } else {
            total.div_ceil(page_size)
        };
        Self {
            items,
            total,
            page_number,
            page_size,
            page_count,
        }
    }

    /// An empty first page.
    pub fn empty(page_size: u32) -> Self {
        Self::new(Vec::new(), 0, 1, page_size)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
