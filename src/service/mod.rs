//! Graph query service seam.
//!
//! The walker never talks to storage directly: every page it materializes
//! comes through [`GraphQueryService`]. Production deployments back it with
//! a remote API; [`memory::MemoryGraphService`] answers from an in-memory
//! dataset for the CLI and tests.

pub mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::filter::{PagedLinkedLiteralFilter, PagedLinkedNodeFilter, PagedTripleFilter};
use crate::types::{DataPage, GraphNode, Triple, TripleGroup};

/// Paged read access to a semantic graph.
///
/// Page number and size travel inside each filter. Implementations report
/// transport or backend failures as [`WalkerError::Fetch`](crate::error::WalkerError::Fetch).
#[async_trait]
pub trait GraphQueryService: Send + Sync {
    /// A single node by id, `None` when absent.
    async fn get_node(&self, id: i32) -> Result<Option<GraphNode>>;

    /// Triples matching `filter`, grouped by predicate with counts.
    async fn get_triple_groups(&self, filter: &PagedTripleFilter) -> Result<DataPage<TripleGroup>>;

    /// Nodes linked to `filter.other_node_id` through `filter.predicate_id`.
    async fn get_linked_nodes(&self, filter: &PagedLinkedNodeFilter) -> Result<DataPage<GraphNode>>;

    /// Literal-valued triples of `filter.subject_id` via `filter.predicate_id`.
    async fn get_linked_literals(&self, filter: &PagedLinkedLiteralFilter) -> Result<DataPage<Triple>>;
}
