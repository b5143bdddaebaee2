//! Graph Walker CLI entrypoint.

use clap::Parser;
use graph_walker::cli::{self, Cli};

#[tokio::main]
async fn main() {
    graph_walker::observability::init_logging();

    let cli = Cli::parse();
    if let Err(err) = cli::run(cli).await {
        eprintln!("{} {err}", console::style("error:").red().bold());
        std::process::exit(1);
    }
}
