use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileTreeConfig {
    pub domain_x: f32,
    pub feature_x: f32,
    pub external_x: f32,
    /// Offset of the trailing orphan column from `external_x`.
    pub orphan_offset_x: f32,
    pub start_y: f32,
    pub row_gap: f32,
    pub external_row_gap: f32,
    /// Extra vertical room added under a feature per placed external.
    pub external_extra_gap: f32,
    pub block_tail: f32,
}

impl Default for FileTreeConfig {
    fn default() -> Self {
        Self {
            domain_x: 140.0,
            feature_x: 420.0,
            external_x: 740.0,
            orphan_offset_x: 180.0,
            start_y: 70.0,
            row_gap: 72.0,
            external_row_gap: 48.0,
            external_extra_gap: 20.0,
            block_tail: 26.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BreadthFirstConfig {
    pub spacing_factor: f32,
    pub avoid_overlap_padding: f32,
    pub origin_x: f32,
    pub origin_y: f32,
}

impl Default for BreadthFirstConfig {
    fn default() -> Self {
        Self {
            spacing_factor: 1.35,
            avoid_overlap_padding: 30.0,
            origin_x: 80.0,
            origin_y: 60.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ForceConfig {
    pub node_repulsion: f32,
    pub ideal_edge_length: f32,
    pub edge_elasticity: f32,
    pub gravity: f32,
    /// Extra repulsion applied while two boxes intersect.
    pub node_overlap: f32,
    pub max_iterations: usize,
    /// Stop once the largest per-iteration displacement falls below this.
    pub convergence_threshold: f32,
    pub initial_temperature: f32,
    pub cooling_factor: f32,
    pub min_temperature: f32,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            node_repulsion: 14_000.0,
            ideal_edge_length: 210.0,
            edge_elasticity: 110.0,
            gravity: 0.7,
            node_overlap: 10.0,
            max_iterations: 1000,
            convergence_threshold: 0.5,
            initial_temperature: 120.0,
            cooling_factor: 0.97,
            min_temperature: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OverlapConfig {
    pub layout_iterations: usize,
    pub layout_padding: f32,
    pub restore_iterations: usize,
    pub restore_padding: f32,
    pub min_push: f32,
    /// Seed for the jitter used when two boxes share a center.
    pub seed: u64,
}

impl Default for OverlapConfig {
    fn default() -> Self {
        Self {
            layout_iterations: 180,
            layout_padding: 16.0,
            restore_iterations: 120,
            restore_padding: 14.0,
            min_push: 2.0,
            seed: 0x5eed,
        }
    }
}

/// Size rules for one node type; wrap widths differ per layout mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeStyleConfig {
    pub font_size: f32,
    pub padding: f32,
    pub min_width: f32,
    pub min_height: f32,
    pub wrap_free: f32,
    pub wrap_tree: f32,
    pub wrap_file_tree: f32,
}

impl Default for NodeStyleConfig {
    fn default() -> Self {
        Self {
            font_size: 10.0,
            padding: 12.0,
            min_width: 54.0,
            min_height: 54.0,
            wrap_free: 150.0,
            wrap_tree: 210.0,
            wrap_file_tree: 260.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeStylesConfig {
    pub domain: NodeStyleConfig,
    pub feature: NodeStyleConfig,
    pub external: NodeStyleConfig,
    pub line_height: f32,
}

impl Default for NodeStylesConfig {
    fn default() -> Self {
        Self {
            domain: NodeStyleConfig {
                font_size: 11.0,
                padding: 14.0,
                min_width: 130.0,
                min_height: 54.0,
                wrap_free: 210.0,
                wrap_tree: 210.0,
                wrap_file_tree: 210.0,
            },
            feature: NodeStyleConfig::default(),
            external: NodeStyleConfig {
                font_size: 9.0,
                padding: 10.0,
                min_width: 48.0,
                min_height: 48.0,
                wrap_free: 120.0,
                wrap_tree: 190.0,
                wrap_file_tree: 230.0,
            },
            line_height: 1.25,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub file_tree: FileTreeConfig,
    pub breadth_first: BreadthFirstConfig,
    pub force: ForceConfig,
    pub overlap: OverlapConfig,
    pub nodes: NodeStylesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub viewport_debounce_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            layout: LayoutConfig::default(),
            viewport_debounce_ms: 120,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    file_tree: Option<FileTreeConfig>,
    breadth_first: Option<BreadthFirstConfig>,
    force: Option<ForceConfig>,
    overlap: Option<OverlapConfig>,
    nodes: Option<NodeStylesConfig>,
    viewport_debounce_ms: Option<u64>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = serde_json::from_str(&contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        match Theme::from_name(theme_name) {
            Some(theme) => config.theme = theme,
            None => warn!(theme = theme_name, "unknown theme, keeping default"),
        }
    }
    if let Some(v) = parsed.file_tree {
        config.layout.file_tree = v;
    }
    if let Some(v) = parsed.breadth_first {
        config.layout.breadth_first = v;
    }
    if let Some(v) = parsed.force {
        config.layout.force = v;
    }
    if let Some(v) = parsed.overlap {
        config.layout.overlap = v;
    }
    if let Some(v) = parsed.nodes {
        config.layout.nodes = v;
    }
    if let Some(v) = parsed.viewport_debounce_ms {
        config.viewport_debounce_ms = v;
    }

    Ok(config)
}
