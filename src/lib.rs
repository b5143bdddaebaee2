//! Graph Walker: incremental exploration of a semantic (triple-store) graph.
//!
//! Starting from one root node, the walker materializes paginated
//! neighbourhoods on demand: entity nodes expand into property groups,
//! property groups expand into linked entities and literals. Results are
//! published through `watch` channels for a presentation layer to render.

pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod observability;
pub mod service;
pub mod types;
pub mod walker;

pub use error::{Result, WalkerError};
pub use service::GraphQueryService;
pub use walker::GraphWalker;
