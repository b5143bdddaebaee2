//! Command-line interface.
//!
//! `explore` loads a JSON dataset into a [`MemoryGraphService`] and drives a
//! [`GraphWalker`] from an interactive prompt; `config` prints the effective
//! configuration.

pub mod repl;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use crate::config::load_config;
use crate::error::Result;
use crate::service::memory::MemoryGraphService;
use crate::walker::GraphWalker;

#[derive(Debug, Parser)]
#[command(name = "graph-walker")]
#[command(about = "Walk a semantic graph one neighbourhood at a time", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Explore a JSON dataset interactively
    Explore {
        /// Dataset file (`{ "nodes": [...], "triples": [...] }`)
        #[arg(long)]
        data: PathBuf,

        /// Domain id of the root node
        #[arg(long)]
        root: i32,

        /// Config file (defaults to discovery)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the effective configuration as YAML
    Config {
        /// Config file (defaults to discovery)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Dispatch a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Explore { data, root, config } => {
            let config = load_config(config.as_deref())?;
            let service = MemoryGraphService::from_path(&data)?;
            info!(
                nodes = service.node_count(),
                triples = service.triple_count(),
                "dataset loaded"
            );
            let walker = GraphWalker::new(Arc::new(service), config);
            repl::run_stdin(walker, root).await
        }
        Commands::Config { config } => {
            let config = load_config(config.as_deref())?;
            print!("{}", serde_yaml::to_string(&config)?);
            Ok(())
        }
    }
}
