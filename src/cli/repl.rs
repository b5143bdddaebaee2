//! Line-oriented prompt driving a [`GraphWalker`].
//!
//! Node arguments accept visual ids (`N10`, `P5N10`, `L99`) or a bare
//! number, read as an entity id.

use std::collections::HashMap;
use std::io::Write;

use console::style;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::error::{Result, WalkerError};
use crate::filter::{LinkedLiteralFilterPatch, LinkedNodeFilterPatch, TripleFilterPatch};
use crate::walker::ids::build_node_id;
use crate::walker::{parse_visual_id, ExpansionOutcome, GraphWalker, VisualKey, VisualNode};

const HELP: &str = "\
commands:
  show                          list materialized nodes
  select <id>|none              select a node (or clear the selection)
  toggle <id>                   expand a collapsed node, collapse an expanded one
  expand <id>                   (re)expand a node
  collapse <id>                 remove everything discovered from a node
  page <id> <out|in|lit> <n>    re-expand a node showing page n of one direction
  filters                       filters and totals of the selection
  json                          dump the materialized graph as JSON
  stats                         walker counters
  reset <id>                    start over from another root
  help                          this text
  quit                          leave";

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Which page of an expanded node a `page` command moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageDirection {
    Outbound,
    Inbound,
    Literals,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Show,
    Select(Option<String>),
    Toggle(String),
    Expand(String),
    Collapse(String),
    Page {
        id: String,
        direction: PageDirection,
        page: u32,
    },
    Filters,
    Json,
    Stats,
    Reset(i32),
    Help,
    Quit,
}

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<ReplCommand>> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&verb, args)) = words.split_first() else {
        return Ok(None);
    };

    let command = match (verb, args) {
        ("show" | "ls", []) => ReplCommand::Show,
        ("select", ["none"]) | ("deselect", []) => ReplCommand::Select(None),
        ("select", [id]) => ReplCommand::Select(Some(parse_node_arg(id)?)),
        ("toggle", [id]) => ReplCommand::Toggle(parse_node_arg(id)?),
        ("expand", [id]) => ReplCommand::Expand(parse_node_arg(id)?),
        ("collapse", [id]) => ReplCommand::Collapse(parse_node_arg(id)?),
        ("page", [id, direction, page]) => ReplCommand::Page {
            id: parse_node_arg(id)?,
            direction: match *direction {
                "out" => PageDirection::Outbound,
                "in" => PageDirection::Inbound,
                "lit" => PageDirection::Literals,
                other => return Err(usage(format!("unknown direction '{other}'"))),
            },
            page: page
                .parse()
                .map_err(|_| usage(format!("not a page number: {page}")))?,
        },
        ("filters", []) => ReplCommand::Filters,
        ("json", []) => ReplCommand::Json,
        ("stats", []) => ReplCommand::Stats,
        ("reset", [id]) => ReplCommand::Reset(match parse_visual_id(id) {
            Some(VisualKey::Entity { node_id }) => node_id,
            _ => id
                .parse()
                .map_err(|_| usage(format!("not a node id: {id}")))?,
        }),
        ("help" | "?", []) => ReplCommand::Help,
        ("quit" | "exit" | "q", []) => ReplCommand::Quit,
        _ => return Err(usage(format!("cannot parse '{}' (try help)", line.trim()))),
    };
    Ok(Some(command))
}

fn parse_node_arg(raw: &str) -> Result<String> {
    if let Ok(node_id) = raw.parse::<i32>() {
        return Ok(build_node_id(node_id));
    }
    parse_visual_id(raw)
        .map(VisualKey::to_visual_id)
        .ok_or_else(|| usage(format!("not a node id: {raw}")))
}

fn usage(message: String) -> WalkerError {
    WalkerError::Other(message)
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Run `command` against `walker`, writing human output to `out`.
///
/// Returns `Ok(false)` when the session should end.
pub async fn execute<W: Write>(
    walker: &GraphWalker,
    command: ReplCommand,
    out: &mut W,
) -> Result<bool> {
    match command {
        ReplCommand::Show => write_graph(walker, out)?,
        ReplCommand::Select(id) => match walker.select_node(id.as_deref()) {
            Some(node) => writeln!(out, "selected {}", describe(&node))?,
            None => writeln!(out, "selection cleared")?,
        },
        ReplCommand::Toggle(id) => {
            let outcome = walker.toggle_node(&id).await?;
            write_outcome(out, &id, &outcome)?;
        }
        ReplCommand::Expand(id) => {
            let outcome = expand(walker, &id).await?;
            write_outcome(out, &id, &outcome)?;
        }
        ReplCommand::Collapse(id) => {
            let outcome = walker.collapse_node(&id)?;
            write_outcome(out, &id, &outcome)?;
        }
        ReplCommand::Page {
            id,
            direction,
            page,
        } => {
            let outcome = expand_page(walker, &id, direction, page).await?;
            write_outcome(out, &id, &outcome)?;
        }
        ReplCommand::Filters => {
            let observer = walker.observe();
            let value = serde_json::json!({
                "filters": observer.filters(),
                "totals": observer.totals(),
            });
            writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
        }
        ReplCommand::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(&walker.snapshot())?)?;
        }
        ReplCommand::Stats => {
            let snapshot = walker.snapshot();
            let mut value = walker.metrics().to_json();
            value["nodes"] = snapshot.nodes.len().into();
            value["edges"] = snapshot.edges.len().into();
            writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
        }
        ReplCommand::Reset(root_id) => {
            walker.reset(root_id).await?;
            write_graph(walker, out)?;
        }
        ReplCommand::Help => writeln!(out, "{HELP}")?,
        ReplCommand::Quit => return Ok(false),
    }
    Ok(true)
}

async fn expand(walker: &GraphWalker, id: &str) -> Result<ExpansionOutcome> {
    match parse_visual_id(id) {
        Some(VisualKey::Property { .. }) => walker.expand_property(id, None, None, None).await,
        Some(VisualKey::Literal { .. }) => Ok(ExpansionOutcome::Unchanged),
        _ => walker.expand_node(id, None, None).await,
    }
}

async fn expand_page(
    walker: &GraphWalker,
    id: &str,
    direction: PageDirection,
    page: u32,
) -> Result<ExpansionOutcome> {
    match (parse_visual_id(id), direction) {
        (Some(VisualKey::Entity { .. }), PageDirection::Outbound) => {
            walker
                .expand_node(id, Some(TripleFilterPatch::page(page)), None)
                .await
        }
        (Some(VisualKey::Entity { .. }), PageDirection::Inbound) => {
            walker
                .expand_node(id, None, Some(TripleFilterPatch::page(page)))
                .await
        }
        (Some(VisualKey::Property { .. }), PageDirection::Outbound) => {
            walker
                .expand_property(id, Some(LinkedNodeFilterPatch::page(page)), None, None)
                .await
        }
        (Some(VisualKey::Property { .. }), PageDirection::Inbound) => {
            walker
                .expand_property(id, None, Some(LinkedNodeFilterPatch::page(page)), None)
                .await
        }
        (Some(VisualKey::Property { .. }), PageDirection::Literals) => {
            walker
                .expand_property(id, None, None, Some(LinkedLiteralFilterPatch::page(page)))
                .await
        }
        _ => Err(usage(format!("{id} has no such page"))),
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn describe(node: &VisualNode) -> String {
    format!("{} ({}) {}", node.id, node.data.kind_name(), node.label)
}

fn write_outcome<W: Write>(out: &mut W, id: &str, outcome: &ExpansionOutcome) -> Result<()> {
    match outcome {
        ExpansionOutcome::Expanded {
            nodes_added,
            edges_added,
            nodes_replaced,
        } => writeln!(
            out,
            "expanded {id}: +{nodes_added} nodes, +{edges_added} edges ({nodes_replaced} replaced)"
        )?,
        ExpansionOutcome::Collapsed { nodes_removed } => {
            writeln!(out, "collapsed {id}: -{nodes_removed} nodes")?
        }
        ExpansionOutcome::Discarded => writeln!(out, "{id} left the graph, result dropped")?,
        ExpansionOutcome::Unchanged => writeln!(out, "{id}: nothing to do")?,
    }
    Ok(())
}

/// Print nodes as a tree following origins, in insertion order.
fn write_graph<W: Write>(walker: &GraphWalker, out: &mut W) -> Result<()> {
    let snapshot = walker.snapshot();
    if snapshot.nodes.is_empty() {
        writeln!(out, "{}", style("(empty graph)").dim())?;
        return Ok(());
    }

    let origins: HashMap<&str, &str> = snapshot
        .nodes
        .iter()
        .map(|n| (n.id.as_str(), n.origin_id.as_str()))
        .collect();
    let depth = |id: &str| {
        let mut depth = 0;
        let mut current = id;
        while let Some(origin) = origins.get(current).filter(|o| !o.is_empty()) {
            depth += 1;
            current = *origin;
            if depth > origins.len() {
                break;
            }
        }
        depth
    };

    let mut children: HashMap<&str, Vec<&VisualNode>> = HashMap::new();
    let mut roots = Vec::new();
    for node in &snapshot.nodes {
        if node.origin_id.is_empty() || !origins.contains_key(node.origin_id.as_str()) {
            roots.push(node);
        } else {
            children.entry(node.origin_id.as_str()).or_default().push(node);
        }
    }

    let mut stack: Vec<&VisualNode> = roots.into_iter().rev().collect();
    while let Some(node) = stack.pop() {
        let marker = if node.expanded { "-" } else { "+" };
        let id = if node.selected {
            style(node.id.as_str()).bold().underlined()
        } else {
            style(node.id.as_str()).bold()
        };
        let label = match node.data.kind_name() {
            "entity" => style(node.label.as_str()).cyan(),
            "property" => style(node.label.as_str()).yellow(),
            _ => style(node.label.as_str()).green(),
        };
        write!(out, "{}{marker} {id} {label}", "  ".repeat(depth(node.id.as_str())))?;
        if let Some(error) = &node.error {
            write!(out, " {}", style(format!("[{error}]")).red())?;
        }
        writeln!(out)?;
        if let Some(kids) = children.get(node.id.as_str()) {
            stack.extend(kids.iter().rev());
        }
    }
    writeln!(
        out,
        "{}",
        style(format!("{} nodes, {} edges", snapshot.nodes.len(), snapshot.edges.len())).dim()
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Reset to `root_id`, then read commands from stdin until `quit` or EOF.
pub async fn run_stdin(walker: GraphWalker, root_id: i32) -> Result<()> {
    let mut stdout = std::io::stdout();
    match walker.reset(root_id).await {
        Ok(()) => write_graph(&walker, &mut stdout)?,
        Err(err) => eprintln!("{} {err}", style("error:").red().bold()),
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", style("walker>").magenta());
        stdout.flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                eprintln!("{} {err}", style("error:").red().bold());
                continue;
            }
        };
        match execute(&walker, command, &mut stdout).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) => eprintln!("{} {err}", style("error:").red().bold()),
        }
    }
    Ok(())
}
