use std::collections::HashMap;

use tracing::debug;

use crate::config::ForceConfig;
use crate::ir::Graph;

use super::{NodeGeometries, Position, Positions};

const MIN_DISTANCE: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ForceOutcome {
    pub iterations: usize,
    pub converged: bool,
}

/// Spring-electrical simulation starting from `seed`.
///
/// Every pair repels with `node_repulsion / d²` (plus `node_overlap` while
/// their boxes intersect), every edge pulls toward `ideal_edge_length`
/// scaled by `edge_elasticity`, and a constant `gravity` pulls toward the
/// centroid. Per-step movement is capped by a cooling temperature. Ids in
/// `fixed` keep their seed position.
pub(crate) fn compute_force_positions(
    graph: &Graph,
    seed: &Positions,
    geometries: &NodeGeometries,
    fixed: &Positions,
    config: &ForceConfig,
) -> (Positions, ForceOutcome) {
    let ids: Vec<&str> = graph.nodes().iter().map(|node| node.id.as_str()).collect();
    let index: HashMap<&str, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    let mut pos: Vec<Position> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            fixed
                .get(*id)
                .or_else(|| seed.get(*id))
                .copied()
                .unwrap_or_else(|| Position::new(i as f32 * 10.0, 0.0))
        })
        .collect();
    let pinned: Vec<bool> = ids.iter().map(|id| fixed.contains_key(*id)).collect();
    let radius: Vec<f32> = ids
        .iter()
        .map(|id| {
            geometries
                .get(*id)
                .map(|g| (g.width.max(g.height)) / 2.0)
                .unwrap_or(0.0)
        })
        .collect();
    let springs: Vec<(usize, usize)> = graph
        .edges()
        .iter()
        .filter_map(|edge| Some((*index.get(edge.source.as_str())?, *index.get(edge.target.as_str())?)))
        .filter(|(a, b)| a != b)
        .collect();

    let n = ids.len();
    let mut outcome = ForceOutcome {
        iterations: 0,
        converged: n < 2,
    };
    if n < 2 {
        return (collect(&ids, &pos), outcome);
    }

    let mut temperature = config.initial_temperature;
    for iteration in 0..config.max_iterations {
        let mut disp = vec![(0.0f32, 0.0f32); n];

        for i in 0..n {
            for j in (i + 1)..n {
                let (mut dx, mut dy) = (pos[i].x - pos[j].x, pos[i].y - pos[j].y);
                if dx == 0.0 && dy == 0.0 {
                    // Coincident centers: split along a direction derived from the pair.
                    let angle = (i * 7 + j * 13) as f32;
                    dx = angle.cos();
                    dy = angle.sin();
                }
                let dist = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);
                let mut force = config.node_repulsion / (dist * dist);
                let reach = radius[i] + radius[j];
                if dist < reach {
                    force += config.node_overlap * (reach - dist) / reach;
                }
                let (fx, fy) = (dx / dist * force, dy / dist * force);
                disp[i].0 += fx;
                disp[i].1 += fy;
                disp[j].0 -= fx;
                disp[j].1 -= fy;
            }
        }

        for &(a, b) in &springs {
            let (dx, dy) = (pos[b].x - pos[a].x, pos[b].y - pos[a].y);
            let dist = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);
            let force = (dist - config.ideal_edge_length) / config.edge_elasticity.max(1.0);
            let (fx, fy) = (dx / dist * force, dy / dist * force);
            disp[a].0 += fx;
            disp[a].1 += fy;
            disp[b].0 -= fx;
            disp[b].1 -= fy;
        }

        let (cx, cy) = centroid(&pos);
        for (i, p) in pos.iter().enumerate() {
            let (dx, dy) = (cx - p.x, cy - p.y);
            let dist = (dx * dx + dy * dy).sqrt();
            if dist > MIN_DISTANCE {
                disp[i].0 += dx / dist * config.gravity;
                disp[i].1 += dy / dist * config.gravity;
            }
        }

        let mut max_move = 0.0f32;
        for i in 0..n {
            if pinned[i] {
                continue;
            }
            let (dx, dy) = disp[i];
            let len = (dx * dx + dy * dy).sqrt();
            if len == 0.0 || !len.is_finite() {
                continue;
            }
            let step = len.min(temperature);
            pos[i].x += dx / len * step;
            pos[i].y += dy / len * step;
            max_move = max_move.max(step);
        }

        temperature = (temperature * config.cooling_factor).max(config.min_temperature);
        outcome.iterations = iteration + 1;
        if max_move < config.convergence_threshold {
            outcome.converged = true;
            break;
        }
    }

    debug!(
        iterations = outcome.iterations,
        converged = outcome.converged,
        "force simulation finished"
    );
    (collect(&ids, &pos), outcome)
}

fn centroid(pos: &[Position]) -> (f32, f32) {
    let n = pos.len().max(1) as f32;
    let (sx, sy) = pos.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    (sx / n, sy / n)
}

fn collect(ids: &[&str], pos: &[Position]) -> Positions {
    ids.iter()
        .zip(pos)
        .map(|(id, p)| ((*id).to_string(), *p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_graph;
    use crate::config::NodeStylesConfig;
    use crate::document::CatalogDocument;
    use crate::layout::{LayoutMode, node_geometries};
    use serde_json::json;

    fn setup() -> (Graph, NodeGeometries) {
        let graph = build_graph(
            &CatalogDocument::from_value(json!({
                "domains": [{ "id": "d", "features": [{ "id": "a" }, { "id": "b" }, { "id": "c" }] }],
                "relationships": [{ "from": "a", "to": "x" }]
            }))
            .unwrap(),
        );
        let geoms = node_geometries(&graph, LayoutMode::Free, &NodeStylesConfig::default());
        (graph, geoms)
    }

    fn distance(a: Position, b: Position) -> f32 {
        ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
    }

    #[test]
    fn separates_coincident_nodes_and_stays_bounded() {
        let (graph, geoms) = setup();
        let seed: Positions = graph
            .nodes()
            .iter()
            .map(|n| (n.id.clone(), Position::new(100.0, 100.0)))
            .collect();
        let config = ForceConfig::default();
        let (pos, outcome) = compute_force_positions(&graph, &seed, &geoms, &Positions::new(), &config);
        assert!(outcome.iterations <= config.max_iterations);
        assert_eq!(pos.len(), graph.nodes().len());
        assert!(pos.values().all(Position::is_finite));
        assert!(distance(pos["a"], pos["b"]) > 20.0);
    }

    #[test]
    fn is_deterministic() {
        let (graph, geoms) = setup();
        let seed = Positions::new();
        let config = ForceConfig::default();
        let first = compute_force_positions(&graph, &seed, &geoms, &Positions::new(), &config);
        let second = compute_force_positions(&graph, &seed, &geoms, &Positions::new(), &config);
        assert_eq!(first.0, second.0);
        assert_eq!(first.1, second.1);
    }

    #[test]
    fn pinned_nodes_do_not_move() {
        let (graph, geoms) = setup();
        let mut fixed = Positions::new();
        fixed.insert("a".to_string(), Position::new(5.0, 5.0));
        let (pos, _) = compute_force_positions(
            &graph,
            &Positions::new(),
            &geoms,
            &fixed,
            &ForceConfig::default(),
        );
        assert_eq!(pos["a"], Position::new(5.0, 5.0));
    }
}
