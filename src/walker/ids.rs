//! Visual id codec.
//!
//! Visual nodes and edges carry composite string ids derived from domain ids:
//!
//! | kind           | shape                       |
//! |----------------|-----------------------------|
//! | entity node    | `N<nodeId>`                 |
//! | property group | `P<predicateId>N<nodeId>`   |
//! | literal        | `L<tripleId>`               |
//! | edge           | `E<sourceId>_<targetId>`    |
//!
//! The walker dispatches on [`VisualNodeData`](super::model::VisualNodeData),
//! not on these prefixes; ids only need to be unique and reversible. Every
//! reverse mapping yields 0 for a malformed id.

const ENTITY_PREFIX: char = 'N';
const PROPERTY_PREFIX: char = 'P';
const LITERAL_PREFIX: char = 'L';
const EDGE_PREFIX: char = 'E';
const EDGE_SEPARATOR: char = '_';

/// `N<id>`
pub fn build_node_id(node_id: i32) -> String {
    format!("{ENTITY_PREFIX}{node_id}")
}

/// Domain node id of an entity or property-group visual id: the text after
/// the last `N`.
pub fn node_id_from_visual(visual_id: &str) -> i32 {
    visual_id
        .rfind(ENTITY_PREFIX)
        .and_then(|i| visual_id[i + 1..].parse().ok())
        .unwrap_or(0)
}

/// `P<predicateId>N<nodeId>`
pub fn build_property_id(predicate_id: i32, node_id: i32) -> String {
    format!("{PROPERTY_PREFIX}{predicate_id}{ENTITY_PREFIX}{node_id}")
}

/// Predicate id of a property-group visual id: the text between `P` and `N`.
pub fn predicate_id_from_visual(visual_id: &str) -> i32 {
    let Some(rest) = visual_id.strip_prefix(PROPERTY_PREFIX) else {
        return 0;
    };
    rest.find(ENTITY_PREFIX)
        .and_then(|i| rest[..i].parse().ok())
        .unwrap_or(0)
}

/// `L<tripleId>`
pub fn build_literal_id(triple_id: i32) -> String {
    format!("{LITERAL_PREFIX}{triple_id}")
}

pub fn triple_id_from_visual(visual_id: &str) -> i32 {
    visual_id
        .strip_prefix(LITERAL_PREFIX)
        .and_then(|rest| rest.parse().ok())
        .unwrap_or(0)
}

/// `E<sourceId>_<targetId>`
pub fn build_edge_id(source_id: &str, target_id: &str) -> String {
    format!("{EDGE_PREFIX}{source_id}{EDGE_SEPARATOR}{target_id}")
}

/// Split an edge id into `(source, target)` on the first `_`.
///
/// Visual node ids never contain `_`, so the first separator is the only one.
pub fn split_edge_id(edge_id: &str) -> Option<(&str, &str)> {
    edge_id.strip_prefix(EDGE_PREFIX)?.split_once(EDGE_SEPARATOR)
}

/// Id of the same edge with its endpoints swapped.
pub fn reverse_edge_id(edge_id: &str) -> Option<String> {
    split_edge_id(edge_id).map(|(a, b)| build_edge_id(b, a))
}

// ---------------------------------------------------------------------------
// VisualKey
// ---------------------------------------------------------------------------

/// Typed reading of a visual node id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualKey {
    Entity { node_id: i32 },
    Property { predicate_id: i32, node_id: i32 },
    Literal { triple_id: i32 },
}

impl VisualKey {
    /// The visual id this key stands for.
    pub fn to_visual_id(self) -> String {
        match self {
            Self::Entity { node_id } => build_node_id(node_id),
            Self::Property {
                predicate_id,
                node_id,
            } => build_property_id(predicate_id, node_id),
            Self::Literal { triple_id } => build_literal_id(triple_id),
        }
    }
}

/// Classify a visual node id, rejecting anything that does not round-trip.
pub fn parse_visual_id(visual_id: &str) -> Option<VisualKey> {
    let key = match visual_id.chars().next()? {
        ENTITY_PREFIX => VisualKey::Entity {
            node_id: visual_id[1..].parse().ok()?,
        },
        PROPERTY_PREFIX => {
            let (predicate, node) = visual_id[1..].split_once(ENTITY_PREFIX)?;
            VisualKey::Property {
                predicate_id: predicate.parse().ok()?,
                node_id: node.parse().ok()?,
            }
        }
        LITERAL_PREFIX => VisualKey::Literal {
            triple_id: visual_id[1..].parse().ok()?,
        },
        _ => return None,
    };
    Some(key)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
