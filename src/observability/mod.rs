//! Structured logging and walker metrics.
//!
//! This module provides:
//! - [`init_logging`]: one-time structured logging setup with `RUST_LOG` support
//! - [`WalkerMetrics`]: lock-free counters for resets and expansions

use std::sync::atomic::{AtomicU64, Ordering};

use tracing_subscriber::EnvFilter;

/// Initialize structured logging with `RUST_LOG` environment variable support.
///
/// Defaults to `graph_walker=info` when `RUST_LOG` is not set. Logs go to
/// stderr so they never interleave with CLI output on stdout. Subsequent
/// calls are silently ignored.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("graph_walker=info"));

    // try_init so double-init in tests doesn't panic
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

/// Counters describing what a walker has done since it was created.
///
/// Shared between clones of a walker; every counter is updated with
/// relaxed atomics, so readings are approximate while expansions race.
#[derive(Debug, Default)]
pub struct WalkerMetrics {
    resets: AtomicU64,
    expansions: AtomicU64,
    failed_expansions: AtomicU64,
    discarded_results: AtomicU64,
    nodes_materialized: AtomicU64,
}

impl WalkerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_reset(&self) {
        self.resets.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_expansion(&self, nodes_added: usize) {
        self.expansions.fetch_add(1, Ordering::Relaxed);
        self.nodes_materialized
            .fetch_add(nodes_added as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failed_expansions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_discard(&self) {
        self.discarded_results.fetch_add(1, Ordering::Relaxed);
    }

    pub fn resets(&self) -> u64 {
        self.resets.load(Ordering::Relaxed)
    }

    pub fn expansions(&self) -> u64 {
        self.expansions.load(Ordering::Relaxed)
    }

    pub fn failed_expansions(&self) -> u64 {
        self.failed_expansions.load(Ordering::Relaxed)
    }

    pub fn discarded_results(&self) -> u64 {
        self.discarded_results.load(Ordering::Relaxed)
    }

    pub fn nodes_materialized(&self) -> u64 {
        self.nodes_materialized.load(Ordering::Relaxed)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "resets": self.resets(),
            "expansions": self.expansions(),
            "failed_expansions": self.failed_expansions(),
            "discarded_results": self.discarded_results(),
            "nodes_materialized": self.nodes_materialized(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
