use std::collections::HashMap;

use tracing::debug;

use crate::document::CatalogDocument;
use crate::ir::{CROSS_DOMAIN_CLUSTER, Edge, EdgeKind, Graph, Node, NodeKind, NodeStatus};

/// Accumulates nodes and edges during a single construction pass.
///
/// The first `ensure_node` for an id wins; later calls are no-ops.
#[derive(Default)]
struct GraphAccumulator {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    edges: Vec<Edge>,
    contains_count: usize,
    relation_count: usize,
}

impl GraphAccumulator {
    fn ensure_node(&mut self, id: &str, label: &str, kind: NodeKind, status: NodeStatus, domain: &str) {
        if self.index.contains_key(id) {
            return;
        }
        self.index.insert(id.to_string(), self.nodes.len());
        self.nodes.push(Node {
            id: id.to_string(),
            label: label.to_string(),
            kind,
            status,
            domain: domain.to_string(),
        });
    }

    fn domain_of(&self, id: &str) -> &str {
        self.index
            .get(id)
            .map(|idx| self.nodes[*idx].domain.as_str())
            .unwrap_or("")
    }

    fn push_edge(&mut self, kind: EdgeKind, source: &str, target: &str, relation: &str, cluster: &str) {
        let counter = match kind {
            EdgeKind::Contains => &mut self.contains_count,
            EdgeKind::Relation => &mut self.relation_count,
        };
        let id = format!("{}__{}", kind.as_str(), *counter);
        *counter += 1;
        self.edges.push(Edge {
            id,
            source: source.to_string(),
            target: target.to_string(),
            relation: relation.to_string(),
            kind,
            cluster: cluster.to_string(),
        });
    }

    fn finish(self) -> Graph {
        Graph::from_parts(self.nodes, self.edges)
    }
}

/// Converts the hierarchical catalog into a flat node/edge set.
///
/// Relationships are processed after every domain and feature node exists, so
/// a relationship endpoint that names a feature inherits that feature's domain
/// for cluster coloring.
pub fn build_graph(document: &CatalogDocument) -> Graph {
    let mut acc = GraphAccumulator::default();

    for domain in document.entries() {
        acc.ensure_node(
            &domain.node_id,
            &domain.label,
            NodeKind::Domain,
            domain.status,
            &domain.id,
        );
        for feature in &domain.features {
            acc.ensure_node(
                &feature.id,
                &feature.label,
                NodeKind::Feature,
                feature.status,
                &domain.id,
            );
            acc.push_edge(
                EdgeKind::Contains,
                &domain.node_id,
                &feature.id,
                EdgeKind::Contains.as_str(),
                &domain.id,
            );
        }
    }

    for rel in document.relationships() {
        acc.ensure_node(&rel.from, &rel.from, NodeKind::External, NodeStatus::Unknown, "");
        acc.ensure_node(&rel.to, &rel.to, NodeKind::External, NodeStatus::Unknown, "");
        let cluster = [acc.domain_of(&rel.from), acc.domain_of(&rel.to)]
            .into_iter()
            .find(|domain| !domain.is_empty())
            .unwrap_or(CROSS_DOMAIN_CLUSTER)
            .to_string();
        acc.push_edge(EdgeKind::Relation, &rel.from, &rel.to, &rel.relation, &cluster);
    }

    let graph = acc.finish();
    let summary = graph.summary();
    debug!(nodes = summary.nodes, edges = summary.edges, "graph built");
    graph
}
