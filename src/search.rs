use std::collections::BTreeSet;

use crate::ir::Graph;

/// Elements kept in focus by a search query; everything else is faded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Focus {
    pub query: String,
    pub nodes: BTreeSet<String>,
    pub edges: BTreeSet<String>,
}

impl Focus {
    /// An empty query fades nothing.
    pub fn is_active(&self) -> bool {
        !self.query.is_empty()
    }

    pub fn is_node_faded(&self, id: &str) -> bool {
        self.is_active() && !self.nodes.contains(id)
    }

    pub fn is_edge_faded(&self, id: &str) -> bool {
        self.is_active() && !self.edges.contains(id)
    }
}

/// Nodes match on label, id or domain; edges match on relation. Matches
/// pull in their incident edges and endpoints.
pub fn focus(graph: &Graph, query: &str) -> Focus {
    let query = query.trim().to_lowercase();
    let mut result = Focus {
        query: query.clone(),
        ..Focus::default()
    };
    if query.is_empty() {
        return result;
    }

    let matched_nodes: BTreeSet<&str> = graph
        .nodes()
        .iter()
        .filter(|node| {
            node.label.to_lowercase().contains(&query)
                || node.id.to_lowercase().contains(&query)
                || node.domain.to_lowercase().contains(&query)
        })
        .map(|node| node.id.as_str())
        .collect();

    for edge in graph.edges() {
        let touches_match =
            matched_nodes.contains(edge.source.as_str()) || matched_nodes.contains(edge.target.as_str());
        let relation_match = edge.relation.to_lowercase().contains(&query);
        if touches_match || relation_match {
            result.edges.insert(edge.id.clone());
        }
        if relation_match {
            result.nodes.insert(edge.source.clone());
            result.nodes.insert(edge.target.clone());
        }
    }
    result
        .nodes
        .extend(matched_nodes.into_iter().map(str::to_string));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_graph;
    use crate::document::CatalogDocument;
    use serde_json::json;

    fn graph() -> Graph {
        build_graph(
            &CatalogDocument::from_value(json!({
                "domains": [
                    { "id": "auth", "features": [{ "id": "login", "label": "Sign In" }] },
                    { "id": "billing", "features": [{ "id": "invoice" }] }
                ],
                "relationships": [
                    { "from": "invoice", "to": "ledger", "type": "writes_to" },
                    { "from": "login", "to": "sso" }
                ]
            }))
            .unwrap(),
        )
    }

    #[test]
    fn blank_query_fades_nothing() {
        let result = focus(&graph(), "   ");
        assert!(!result.is_active());
        assert!(!result.is_node_faded("login"));
        assert!(!result.is_edge_faded("contains__0"));
    }

    #[test]
    fn label_match_keeps_incident_edges() {
        let result = focus(&graph(), "  SIGN ");
        assert!(result.nodes.contains("login"));
        assert!(result.edges.contains("contains__0"));
        assert!(result.edges.contains("relation__1"));
        assert!(result.is_node_faded("invoice"));
        // Endpoints of incident edges are not pulled in.
        assert!(result.is_node_faded("sso"));
    }

    #[test]
    fn relation_match_keeps_endpoints() {
        let result = focus(&graph(), "writes");
        assert_eq!(
            result.nodes,
            BTreeSet::from(["invoice".to_string(), "ledger".to_string()])
        );
        assert_eq!(result.edges, BTreeSet::from(["relation__0".to_string()]));
    }

    #[test]
    fn domain_match_covers_whole_block() {
        let result = focus(&graph(), "billing");
        assert!(result.nodes.contains("domain__billing"));
        assert!(result.nodes.contains("invoice"));
        assert!(result.is_node_faded("login"));
    }
}
