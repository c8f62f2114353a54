mod breadth_first;
mod file_tree;
mod force;
pub mod overlap;
mod text;
pub(crate) mod types;
pub use overlap::{OverlapNode, OverlapParams, OverlapReport, resolve_overlaps};
pub use types::*;
use breadth_first::compute_breadth_first_positions;
use file_tree::compute_file_tree_positions;
use force::compute_force_positions;

use std::collections::HashSet;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{LayoutConfig, NodeStylesConfig};
use crate::ir::Graph;
use crate::order::OrderMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum LayoutMode {
    /// Force-directed, seeded from the file-tree columns.
    #[default]
    Free,
    /// Breadth-first tree rooted at domains, growing left to right.
    TreeHorizontal,
    /// Fixed domain / feature / external columns.
    TreeFile,
}

impl LayoutMode {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "free" | "cose" => Some(Self::Free),
            "tree_horizontal" => Some(Self::TreeHorizontal),
            "tree_file" => Some(Self::TreeFile),
            _ => None,
        }
    }

    pub fn is_tree(self) -> bool {
        matches!(self, Self::TreeHorizontal | Self::TreeFile)
    }
}

pub fn node_geometries(graph: &Graph, mode: LayoutMode, styles: &NodeStylesConfig) -> NodeGeometries {
    graph
        .nodes()
        .iter()
        .map(|node| (node.id.clone(), text::node_geometry(node, mode, styles)))
        .collect()
}

/// Raw positions for `mode`, before overlap resolution.
///
/// Entries in `pinned` are kept verbatim; the force simulation also treats
/// them as fixed bodies.
pub fn compute_positions(
    graph: &Graph,
    mode: LayoutMode,
    order: OrderMode,
    geometries: &NodeGeometries,
    pinned: &Positions,
    config: &LayoutConfig,
) -> Positions {
    debug!(?mode, ?order, nodes = graph.nodes().len(), "computing layout");
    let mut positions = match mode {
        LayoutMode::TreeFile => compute_file_tree_positions(graph, order, &config.file_tree),
        LayoutMode::TreeHorizontal => {
            compute_breadth_first_positions(graph, order, geometries, &config.breadth_first)
        }
        LayoutMode::Free => {
            let seed = compute_file_tree_positions(graph, order, &config.file_tree);
            compute_force_positions(graph, &seed, geometries, pinned, &config.force).0
        }
    };
    for (id, pos) in pinned {
        if positions.contains_key(id) {
            positions.insert(id.clone(), *pos);
        }
    }
    positions
}

/// Which nodes the overlap pass may move or must skip.
#[derive(Debug, Clone, Copy)]
pub struct OverlapScope<'a> {
    pub locked: &'a HashSet<String>,
    pub hidden: &'a HashSet<String>,
}

/// Runs the overlap pass over `positions` in graph order, writing results back.
pub fn resolve_positions(
    graph: &Graph,
    positions: &mut Positions,
    geometries: &NodeGeometries,
    scope: OverlapScope<'_>,
    params: OverlapParams,
    seed: u64,
) -> OverlapReport {
    let mut nodes: Vec<OverlapNode> = graph
        .nodes()
        .iter()
        .filter_map(|node| {
            let center = *positions.get(&node.id)?;
            let (width, height) = geometries
                .get(&node.id)
                .map(|g| (g.width, g.height))
                .unwrap_or((0.0, 0.0));
            let mut item = OverlapNode::new(node.id.clone(), center, width, height);
            item.locked = scope.locked.contains(&node.id);
            item.visible = !scope.hidden.contains(&node.id);
            Some(item)
        })
        .collect();
    let mut rng = StdRng::seed_from_u64(seed);
    let report = resolve_overlaps(&mut nodes, params, &mut rng);
    for node in nodes {
        positions.insert(node.id, node.center);
    }
    report
}
