//! Interactive graph walker.
//!
//! - [`ids`]: visual identifier codec
//! - [`model`]: visual nodes, edges, and the published selection state
//! - [`store`]: the materialized graph with its adjacency indexes
//! - [`state`]: `watch` channels observed by a presentation layer
//! - [`engine`]: [`GraphWalker`], the expansion engine and selection coordinator

pub mod engine;
pub mod ids;
pub mod model;
pub mod state;
pub mod store;

pub use engine::{ExpansionOutcome, GraphWalker, WalkerSnapshot};
pub use ids::{parse_visual_id, VisualKey};
pub use model::{SelectedFilters, VisualEdge, VisualNode, VisualNodeData, WalkerTotals};
pub use state::WalkerObserver;
pub use store::{MaterializedGraph, SubtreeRemoval};
