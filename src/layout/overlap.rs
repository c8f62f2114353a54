//! Iterative pairwise declumping.
//!
//! Every iteration checks all pairs of visible nodes; overlapping pairs are
//! pushed apart along the line between their box centers. The pass stops on
//! the first iteration that moves nothing, or when the iteration budget runs
//! out. It is best-effort: residual overlap after the budget is reported,
//! not treated as an error.

use std::f32::consts::TAU;

use rand::Rng;
use tracing::debug;

use super::{Bounds, Position};

#[derive(Debug, Clone, PartialEq)]
pub struct OverlapNode {
    pub id: String,
    pub center: Position,
    pub width: f32,
    pub height: f32,
    /// Pinned by the user: counts as an obstacle but never moves.
    pub locked: bool,
    pub visible: bool,
}

impl OverlapNode {
    pub fn new(id: impl Into<String>, center: Position, width: f32, height: f32) -> Self {
        Self {
            id: id.into(),
            center,
            width,
            height,
            locked: false,
            visible: true,
        }
    }

    fn bounds(&self) -> Bounds {
        Bounds::around(self.center, self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlapReport {
    pub iterations: usize,
    /// False when the budget ran out before an iteration moved nothing.
    pub converged: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct OverlapParams {
    pub max_iterations: usize,
    pub padding: f32,
    pub min_push: f32,
}

pub fn resolve_overlaps<R: Rng>(
    nodes: &mut [OverlapNode],
    params: OverlapParams,
    rng: &mut R,
) -> OverlapReport {
    let active: Vec<usize> = (0..nodes.len()).filter(|&i| nodes[i].visible).collect();
    if active.len() < 2 {
        return OverlapReport {
            iterations: 0,
            converged: true,
        };
    }

    for iteration in 0..params.max_iterations {
        let mut moved_any = false;
        for (pos, &i) in active.iter().enumerate() {
            for &j in &active[pos + 1..] {
                if nodes[i].locked && nodes[j].locked {
                    continue;
                }
                if push_apart(nodes, i, j, params, rng) {
                    moved_any = true;
                }
            }
        }
        if !moved_any {
            let report = OverlapReport {
                iterations: iteration + 1,
                converged: true,
            };
            debug!(iterations = report.iterations, "overlap pass converged");
            return report;
        }
    }

    debug!(
        iterations = params.max_iterations,
        "overlap pass stopped at iteration budget"
    );
    OverlapReport {
        iterations: params.max_iterations,
        converged: false,
    }
}

fn push_apart<R: Rng>(
    nodes: &mut [OverlapNode],
    i: usize,
    j: usize,
    params: OverlapParams,
    rng: &mut R,
) -> bool {
    let b1 = nodes[i].bounds();
    let b2 = nodes[j].bounds();
    if !b1.overlaps(&b2, params.padding) {
        return false;
    }

    let c1 = b1.center();
    let c2 = b2.center();
    let (mut dx, mut dy) = (c2.x - c1.x, c2.y - c1.y);
    if dx == 0.0 && dy == 0.0 {
        let angle = rng.gen_range(0.0..TAU);
        dx = angle.cos();
        dy = angle.sin();
    }

    let overlap_x = (b1.x2 - b2.x1).min(b2.x2 - b1.x1);
    let overlap_y = (b1.y2 - b2.y1).min(b2.y2 - b1.y1);
    let push = (overlap_x.min(overlap_y) + params.padding).max(params.min_push);
    let length = (dx * dx + dy * dy).sqrt();
    let length = if length > 0.0 { length } else { 1.0 };
    let (ux, uy) = (dx / length, dy / length);

    match (nodes[i].locked, nodes[j].locked) {
        (false, false) => {
            let shift = push / 2.0;
            shift_node(&mut nodes[i], -ux * shift, -uy * shift);
            shift_node(&mut nodes[j], ux * shift, uy * shift);
        }
        (true, false) => shift_node(&mut nodes[j], ux * push, uy * push),
        (false, true) => shift_node(&mut nodes[i], -ux * push, -uy * push),
        (true, true) => return false,
    }
    true
}

fn shift_node(node: &mut OverlapNode, dx: f32, dy: f32) {
    node.center.x += dx;
    node.center.y += dy;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn params(max_iterations: usize) -> OverlapParams {
        OverlapParams {
            max_iterations,
            padding: 16.0,
            min_push: 2.0,
        }
    }

    fn any_overlap(nodes: &[OverlapNode], padding: f32) -> bool {
        for (i, a) in nodes.iter().enumerate() {
            for b in &nodes[i + 1..] {
                if a.bounds().overlaps(&b.bounds(), padding) {
                    return true;
                }
            }
        }
        false
    }

    #[test]
    fn separated_layout_is_left_alone() {
        let mut nodes = vec![
            OverlapNode::new("a", Position::new(0.0, 0.0), 50.0, 50.0),
            OverlapNode::new("b", Position::new(200.0, 0.0), 50.0, 50.0),
            OverlapNode::new("c", Position::new(0.0, 200.0), 50.0, 50.0),
        ];
        let before = nodes.clone();
        let mut rng = StdRng::seed_from_u64(1);
        let report = resolve_overlaps(&mut nodes, params(180), &mut rng);
        assert_eq!(report, OverlapReport { iterations: 1, converged: true });
        assert_eq!(nodes, before);
    }

    #[test]
    fn second_run_is_idempotent() {
        let mut nodes = vec![
            OverlapNode::new("a", Position::new(0.0, 0.0), 60.0, 40.0),
            OverlapNode::new("b", Position::new(10.0, 5.0), 60.0, 40.0),
            OverlapNode::new("c", Position::new(20.0, -5.0), 60.0, 40.0),
        ];
        let mut rng = StdRng::seed_from_u64(2);
        let first = resolve_overlaps(&mut nodes, params(180), &mut rng);
        assert!(first.converged);
        assert!(!any_overlap(&nodes, 16.0));
        let settled = nodes.clone();
        let second = resolve_overlaps(&mut nodes, params(180), &mut rng);
        assert_eq!(second.iterations, 1);
        assert_eq!(nodes, settled);
    }

    #[test]
    fn identical_positions_terminate_within_budget() {
        let mut nodes: Vec<OverlapNode> = (0..12)
            .map(|i| OverlapNode::new(format!("n{i}"), Position::new(50.0, 50.0), 40.0, 40.0))
            .collect();
        let mut rng = StdRng::seed_from_u64(3);
        let report = resolve_overlaps(&mut nodes, params(120), &mut rng);
        assert!(report.iterations <= 120);
        assert!(nodes.iter().all(|n| n.center.is_finite()));
        assert!(nodes.iter().any(|n| n.center != Position::new(50.0, 50.0)));
    }

    #[test]
    fn budget_exhaustion_is_reported() {
        let mut nodes: Vec<OverlapNode> = (0..6)
            .map(|i| OverlapNode::new(format!("n{i}"), Position::new(0.0, 0.0), 100.0, 100.0))
            .collect();
        let mut rng = StdRng::seed_from_u64(4);
        let report = resolve_overlaps(&mut nodes, params(1), &mut rng);
        assert_eq!(report, OverlapReport { iterations: 1, converged: false });
    }

    #[test]
    fn locked_nodes_never_move_but_still_block() {
        let mut nodes = vec![
            OverlapNode::new("pinned", Position::new(0.0, 0.0), 50.0, 50.0),
            OverlapNode::new("free", Position::new(10.0, 0.0), 50.0, 50.0),
        ];
        nodes[0].locked = true;
        let mut rng = StdRng::seed_from_u64(5);
        let report = resolve_overlaps(&mut nodes, params(50), &mut rng);
        assert!(report.converged);
        assert_eq!(nodes[0].center, Position::new(0.0, 0.0));
        assert!(nodes[1].center.x > 10.0);
        assert!(!any_overlap(&nodes, 16.0));
    }

    #[test]
    fn hidden_nodes_are_ignored() {
        let mut nodes = vec![
            OverlapNode::new("a", Position::new(0.0, 0.0), 50.0, 50.0),
            OverlapNode::new("b", Position::new(0.0, 0.0), 50.0, 50.0),
        ];
        nodes[1].visible = false;
        let mut rng = StdRng::seed_from_u64(6);
        let report = resolve_overlaps(&mut nodes, params(50), &mut rng);
        assert_eq!(report.iterations, 0);
        assert_eq!(nodes[0].center, nodes[1].center);
    }
}
