use std::collections::{HashMap, HashSet, VecDeque};

use crate::config::BreadthFirstConfig;
use crate::ir::{Graph, Node, NodeKind};
use crate::order::{OrderMode, sort_nodes};

use super::{NodeGeometries, Position, Positions};

/// Left-to-right tree rooted at the domain nodes.
///
/// Columns are graph distance from the nearest root along edge direction;
/// siblings are visited in `order`. Nodes no root reaches start their own
/// trees afterwards, sources before cycle members. Slots are sized from the largest node plus the
/// avoid-overlap padding, then inflated by the spacing factor.
pub(crate) fn compute_breadth_first_positions(
    graph: &Graph,
    order: OrderMode,
    geometries: &NodeGeometries,
    config: &BreadthFirstConfig,
) -> Positions {
    let mut outgoing: HashMap<&str, Vec<&Node>> = HashMap::new();
    for edge in graph.edges() {
        if let Some(target) = graph.node(&edge.target) {
            outgoing.entry(edge.source.as_str()).or_default().push(target);
        }
    }
    for children in outgoing.values_mut() {
        let mut seen = HashSet::new();
        children.retain(|node| seen.insert(node.id.as_str()));
        sort_nodes(children, order);
    }

    let mut roots: Vec<&Node> = graph.nodes_of_kind(NodeKind::Domain).collect();
    sort_nodes(&mut roots, order);

    let mut visited: HashSet<&str> = HashSet::new();
    let mut columns: Vec<Vec<&str>> = Vec::new();
    walk(&roots, &outgoing, &mut visited, &mut columns);

    let targets: HashSet<&str> = graph.edges().iter().map(|edge| edge.target.as_str()).collect();
    let mut leftovers: Vec<&Node> = graph
        .nodes()
        .iter()
        .filter(|node| !visited.contains(node.id.as_str()))
        .collect();
    sort_nodes(&mut leftovers, order);
    // Unreached sources first, then whatever only cycles reach.
    let sources: Vec<&Node> = leftovers
        .iter()
        .copied()
        .filter(|node| !targets.contains(node.id.as_str()))
        .collect();
    walk(&sources, &outgoing, &mut visited, &mut columns);
    for node in leftovers {
        if !visited.contains(node.id.as_str()) {
            walk(&[node], &outgoing, &mut visited, &mut columns);
        }
    }

    let (max_w, max_h) = geometries
        .values()
        .fold((0.0f32, 0.0f32), |(w, h), geom| (w.max(geom.width), h.max(geom.height)));
    let slot_w = (max_w + config.avoid_overlap_padding) * config.spacing_factor;
    let slot_h = (max_h + config.avoid_overlap_padding) * config.spacing_factor;
    let tallest = columns.iter().map(Vec::len).max().unwrap_or(0) as f32 * slot_h;

    let mut positions = Positions::new();
    for (depth, column) in columns.iter().enumerate() {
        let x = config.origin_x + depth as f32 * slot_w;
        let offset = (tallest - column.len() as f32 * slot_h) / 2.0;
        for (row, id) in column.iter().enumerate() {
            let y = config.origin_y + offset + (row as f32 + 0.5) * slot_h;
            positions.insert((*id).to_string(), Position::new(x, y));
        }
    }
    positions
}

/// Multi-source BFS appending each newly reached node to its depth column.
fn walk<'a>(
    roots: &[&'a Node],
    outgoing: &HashMap<&str, Vec<&'a Node>>,
    visited: &mut HashSet<&'a str>,
    columns: &mut Vec<Vec<&'a str>>,
) {
    let mut queue: VecDeque<(&'a str, usize)> = VecDeque::new();
    for root in roots {
        if visited.insert(root.id.as_str()) {
            queue.push_back((root.id.as_str(), 0));
        }
    }
    while let Some((id, depth)) = queue.pop_front() {
        if columns.len() <= depth {
            columns.resize_with(depth + 1, Vec::new);
        }
        columns[depth].push(id);
        let Some(children) = outgoing.get(id) else {
            continue;
        };
        for child in children {
            if visited.insert(child.id.as_str()) {
                queue.push_back((child.id.as_str(), depth + 1));
            }
        }
    }
}
