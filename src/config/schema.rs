//! Configuration data structures for the graph walker.
//!
//! Defines the YAML config format: page sizes for each kind of query,
//! display settings for visual nodes, and walker behaviour toggles. Every
//! section has defaults so a partial file (or none at all) is valid.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration for the walker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkerConfig {
    /// Config format version (currently "1.0").
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub paging: PagingConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub behavior: BehaviorConfig,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            paging: PagingConfig::default(),
            display: DisplayConfig::default(),
            behavior: BehaviorConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// PagingConfig
// ---------------------------------------------------------------------------

/// Initial page sizes of the filters attached to new visual nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagingConfig {
    /// Triple groups per page when expanding an entity node.
    #[serde(default = "default_page_size")]
    pub node_page_size: u32,

    /// Linked nodes per page when expanding a property group.
    #[serde(default = "default_page_size")]
    pub property_page_size: u32,

    /// Linked literals per page when expanding a property group.
    #[serde(default = "default_page_size")]
    pub literal_page_size: u32,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            node_page_size: default_page_size(),
            property_page_size: default_page_size(),
            literal_page_size: default_page_size(),
        }
    }
}

impl PagingConfig {
    /// Set every page size at once.
    pub fn set_all(&mut self, page_size: u32) {
        self.node_page_size = page_size;
        self.property_page_size = page_size;
        self.literal_page_size = page_size;
    }
}

// ---------------------------------------------------------------------------
// DisplayConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Literal labels longer than this are cut with an ellipsis (0 = never).
    #[serde(default = "default_literal_max_length")]
    pub literal_max_length: usize,

    #[serde(default)]
    pub colors: ColorConfig,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            literal_max_length: default_literal_max_length(),
            colors: ColorConfig::default(),
        }
    }
}

/// Fill colors handed to the renderer for each node kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorConfig {
    #[serde(default = "default_entity_color")]
    pub entity: String,
    #[serde(default = "default_property_color")]
    pub property: String,
    #[serde(default = "default_literal_color")]
    pub literal: String,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            entity: default_entity_color(),
            property: default_property_color(),
            literal: default_literal_color(),
        }
    }
}

// ---------------------------------------------------------------------------
// BehaviorConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorConfig {
    /// Expand the root right after `reset` seeds it.
    #[serde(default = "default_true")]
    pub auto_expand_root: bool,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            auto_expand_root: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_version() -> String {
    "1.0".to_string()
}

fn default_page_size() -> u32 {
    20
}

fn default_literal_max_length() -> usize {
    50
}

fn default_entity_color() -> String {
    "#4a90d9".to_string()
}

fn default_property_color() -> String {
    "#f5a623".to_string()
}

fn default_literal_color() -> String {
    "#7ed321".to_string()
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
