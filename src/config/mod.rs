//! Configuration loading.
//!
//! Sources, first match wins for the file:
//! 1. an explicit path (CLI `--config`),
//! 2. `./graph-walker.yaml`,
//! 3. `graph-walker.yaml` in the platform config directory,
//! 4. built-in defaults.
//!
//! Environment variables are applied on top of whichever source was used.

pub mod schema;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, WalkerError};
use schema::WalkerConfig;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// File name looked up in the working directory and the config directory.
pub const CONFIG_FILE_NAME: &str = "graph-walker.yaml";

/// Overrides every page size.
pub const ENV_PAGE_SIZE: &str = "GRAPH_WALKER_PAGE_SIZE";
/// Overrides `display.literal_max_length`.
pub const ENV_LITERAL_MAX: &str = "GRAPH_WALKER_LITERAL_MAX";
/// Overrides `behavior.auto_expand_root` (`true`/`false`/`1`/`0`).
pub const ENV_AUTO_EXPAND: &str = "GRAPH_WALKER_AUTO_EXPAND";

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load the effective configuration.
pub fn load_config(explicit: Option<&Path>) -> Result<WalkerConfig> {
    let mut config = match explicit {
        Some(path) => load_from_path(path)?,
        None => match discover_config_file() {
            Some(path) => load_from_path(&path)?,
            None => WalkerConfig::default(),
        },
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    Ok(config)
}

/// Parse a YAML config file.
pub fn load_from_path(path: &Path) -> Result<WalkerConfig> {
    if !path.exists() {
        return Err(WalkerError::Config(format!(
            "config file not found: {}",
            path.display()
        )));
    }
    let contents = std::fs::read_to_string(path)?;
    let config: WalkerConfig = serde_yaml::from_str(&contents)
        .map_err(|e| WalkerError::Config(format!("failed to parse {}: {e}", path.display())))?;
    debug!(path = %path.display(), "loaded walker config");
    Ok(config)
}

fn discover_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }
    let dirs = directories::ProjectDirs::from("", "", "graph-walker")?;
    let user = dirs.config_dir().join(CONFIG_FILE_NAME);
    user.is_file().then_some(user)
}

/// Apply environment overrides read through `lookup`.
pub fn apply_env_overrides<F>(config: &mut WalkerConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(ENV_PAGE_SIZE) {
        let size = raw
            .trim()
            .parse::<u32>()
            .map_err(|_| WalkerError::Config(format!("{ENV_PAGE_SIZE}: not a page size: {raw}")))?;
        config.paging.set_all(size);
    }
    if let Some(raw) = lookup(ENV_LITERAL_MAX) {
        config.display.literal_max_length = raw
            .trim()
            .parse()
            .map_err(|_| WalkerError::Config(format!("{ENV_LITERAL_MAX}: not a length: {raw}")))?;
    }
    if let Some(raw) = lookup(ENV_AUTO_EXPAND) {
        config.behavior.auto_expand_root = parse_bool(&raw)
            .ok_or_else(|| WalkerError::Config(format!("{ENV_AUTO_EXPAND}: not a boolean: {raw}")))?;
    }
    Ok(())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
