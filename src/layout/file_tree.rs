use std::collections::HashSet;

use crate::config::FileTreeConfig;
use crate::ir::{EdgeKind, Graph, Node, NodeKind};
use crate::order::{OrderMode, sort_nodes};

use super::{Position, Positions};

/// Deterministic three-column layout: domains, their features, and the
/// external nodes related to each feature. Nodes reached by none of those
/// paths go to a trailing fourth column in graph order.
///
/// A node is placed at most once; later paths that reach it leave it alone.
pub(crate) fn compute_file_tree_positions(
    graph: &Graph,
    order: OrderMode,
    config: &FileTreeConfig,
) -> Positions {
    let mut positions = Positions::new();
    let mut placed: HashSet<&str> = HashSet::new();
    let mut y = config.start_y;

    let mut domains: Vec<&Node> = graph.nodes_of_kind(NodeKind::Domain).collect();
    sort_nodes(&mut domains, order);

    for domain in domains {
        if placed.insert(domain.id.as_str()) {
            positions.insert(domain.id.clone(), Position::new(config.domain_x, y));
        }
        let mut deepest = y;
        let mut local_y = y + config.row_gap;

        let mut features = contained_features(graph, &domain.id);
        sort_nodes(&mut features, order);

        for feature in features {
            if placed.insert(feature.id.as_str()) {
                positions.insert(feature.id.clone(), Position::new(config.feature_x, local_y));
                deepest = deepest.max(local_y);
            }

            let mut externals = related_externals(graph, &feature.id);
            sort_nodes(&mut externals, order);

            let mut ext_count = 0usize;
            for ext in externals {
                if !placed.insert(ext.id.as_str()) {
                    continue;
                }
                let ext_y = local_y + ext_count as f32 * config.external_row_gap;
                positions.insert(ext.id.clone(), Position::new(config.external_x, ext_y));
                deepest = deepest.max(ext_y);
                ext_count += 1;
            }

            local_y += config.row_gap + ext_count as f32 * config.external_extra_gap;
            if ext_count > 0 {
                // Long external stacks must not run into the next feature's row.
                local_y = local_y.max(deepest + config.external_row_gap);
            }
        }

        y = (local_y + config.block_tail)
            .max(y + config.row_gap * 2.0)
            .max(deepest + config.row_gap);
    }

    let orphan_x = config.external_x + config.orphan_offset_x;
    let mut orphan_y = y;
    for node in graph.nodes() {
        if placed.contains(node.id.as_str()) {
            continue;
        }
        positions.insert(node.id.clone(), Position::new(orphan_x, orphan_y));
        orphan_y += config.row_gap;
    }

    positions
}

/// Distinct targets of the domain's `contains` edges, in edge order.
fn contained_features<'a>(graph: &'a Graph, domain_id: &str) -> Vec<&'a Node> {
    let mut seen = HashSet::new();
    graph
        .edges_of_kind(EdgeKind::Contains)
        .filter(|edge| edge.source == domain_id)
        .filter_map(|edge| graph.node(&edge.target))
        .filter(|node| seen.insert(node.id.as_str()))
        .collect()
}

/// External nodes joined to `feature_id` by a relation edge in either direction.
fn related_externals<'a>(graph: &'a Graph, feature_id: &str) -> Vec<&'a Node> {
    let mut seen = HashSet::new();
    graph
        .edges_of_kind(EdgeKind::Relation)
        .filter_map(|edge| {
            if edge.source == feature_id {
                Some(edge.target.as_str())
            } else if edge.target == feature_id {
                Some(edge.source.as_str())
            } else {
                None
            }
        })
        .filter_map(|id| graph.node(id))
        .filter(|node| node.kind == NodeKind::External)
        .filter(|node| seen.insert(node.id.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_graph;
    use crate::document::CatalogDocument;
    use serde_json::json;

    fn graph(value: serde_json::Value) -> Graph {
        build_graph(&CatalogDocument::from_value(value).unwrap())
    }

    #[test]
    fn domains_share_column_and_descend_in_sorted_order() {
        let g = graph(json!({
            "domains": [
                { "id": "zeta", "label": "Zeta", "features": [{ "id": "z1" }, { "id": "z2" }] },
                { "id": "alpha", "label": "Alpha", "features": [{ "id": "a1" }, { "id": "a2" }] }
            ],
            "relationships": [{ "from": "a1", "to": "ext" }]
        }));
        let config = FileTreeConfig::default();
        let pos = compute_file_tree_positions(&g, OrderMode::AlphaAsc, &config);
        let alpha = pos["domain__alpha"];
        let zeta = pos["domain__zeta"];
        assert_eq!(alpha.x, config.domain_x);
        assert_eq!(zeta.x, config.domain_x);
        assert_eq!(alpha.y, config.start_y);
        assert!(zeta.y > alpha.y);
        assert_eq!(pos["a1"].x, config.feature_x);
        assert_eq!(pos["ext"], Position::new(config.external_x, pos["a1"].y));
        assert_eq!(pos.len(), g.nodes().len());
    }

    #[test]
    fn descending_order_flips_domain_rows() {
        let g = graph(json!({
            "domains": [{ "id": "a" }, { "id": "b" }]
        }));
        let pos = compute_file_tree_positions(&g, OrderMode::AlphaDesc, &FileTreeConfig::default());
        assert!(pos["domain__b"].y < pos["domain__a"].y);
    }

    #[test]
    fn shared_external_is_placed_once() {
        let g = graph(json!({
            "domains": [{ "id": "d", "features": [{ "id": "f1" }, { "id": "f2" }] }],
            "relationships": [{ "from": "f1", "to": "api" }, { "from": "f2", "to": "api" }]
        }));
        let pos = compute_file_tree_positions(&g, OrderMode::AlphaAsc, &FileTreeConfig::default());
        assert_eq!(pos["api"].y, pos["f1"].y);
    }

    #[test]
    fn feature_named_as_external_is_not_moved() {
        let g = graph(json!({
            "domains": [
                { "id": "a", "features": [{ "id": "f1" }] },
                { "id": "b", "features": [{ "id": "f2" }] }
            ],
            "relationships": [{ "from": "f1", "to": "f2" }]
        }));
        let config = FileTreeConfig::default();
        let pos = compute_file_tree_positions(&g, OrderMode::AlphaAsc, &config);
        assert_eq!(pos["f2"].x, config.feature_x);
    }

    #[test]
    fn orphans_go_to_trailing_column() {
        let g = graph(json!({
            "domains": [{ "id": "d", "features": [{ "id": "f" }] }],
            "relationships": [{ "from": "left", "to": "right" }]
        }));
        let config = FileTreeConfig::default();
        let pos = compute_file_tree_positions(&g, OrderMode::AlphaAsc, &config);
        let orphan_x = config.external_x + config.orphan_offset_x;
        assert_eq!(pos["left"].x, orphan_x);
        assert_eq!(pos["right"].x, orphan_x);
        assert_eq!(pos["right"].y - pos["left"].y, config.row_gap);
        assert!(pos["left"].y > pos["f"].y);
    }

    #[test]
    fn domain_blocks_never_collide_with_long_external_stacks() {
        let relationships: Vec<_> = (0..8)
            .map(|i| json!({ "from": "f", "to": format!("ext{i}") }))
            .collect();
        let g = graph(json!({
            "domains": [
                { "id": "a", "features": [{ "id": "f" }, { "id": "g" }] },
                { "id": "b", "features": [{ "id": "h" }] }
            ],
            "relationships": relationships
        }));
        let config = FileTreeConfig::default();
        let pos = compute_file_tree_positions(&g, OrderMode::AlphaAsc, &config);
        let deepest_ext = (0..8).map(|i| pos[&format!("ext{i}")].y).fold(0.0, f32::max);
        assert!(pos["g"].y > deepest_ext);
        assert!(pos["domain__b"].y > pos["g"].y);
    }
}
