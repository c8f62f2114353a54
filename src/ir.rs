use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Reserved prefix for domain node ids so they never collide with
/// user-authored feature ids.
pub const DOMAIN_ID_PREFIX: &str = "domain__";

/// Cluster used for relation edges whose endpoints both lack a domain.
pub const CROSS_DOMAIN_CLUSTER: &str = "cross_domain";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Domain,
    Feature,
    External,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Feature => "feature",
            Self::External => "external",
        }
    }

    pub fn is_editable(self) -> bool {
        matches!(self, Self::Domain | Self::Feature)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    #[default]
    Unknown,
    Implemented,
    Partial,
    Placeholder,
}

impl NodeStatus {
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "implemented" => Self::Implemented,
            "partial" => Self::Partial,
            "placeholder" => Self::Placeholder,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Contains,
    Relation,
}

impl EdgeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::Relation => "relation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    pub status: NodeStatus,
    /// Owning domain id (not the prefixed node id); empty for externals.
    pub domain: String,
}

impl Node {
    /// Text shown on the diagram: the label, or the id when the label is empty.
    pub fn display_text(&self) -> &str {
        if self.label.is_empty() {
            &self.id
        } else {
            &self.label
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub relation: String,
    pub kind: EdgeKind,
    pub cluster: String,
}

/// Flat node/edge set produced once per document load.
///
/// Nodes keep insertion order; `index` maps ids to positions in `nodes`.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    index: HashMap<String, usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphSummary {
    pub nodes: usize,
    pub edges: usize,
}

impl Graph {
    pub(crate) fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        let index = nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (node.id.clone(), idx))
            .collect();
        Self {
            nodes,
            edges,
            index,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|idx| &self.nodes[*idx])
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter().filter(move |node| node.kind == kind)
    }

    pub fn edges_of_kind(&self, kind: EdgeKind) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.iter().filter(move |edge| edge.kind == kind)
    }

    pub fn set_label(&mut self, id: &str, label: &str) -> bool {
        let Some(idx) = self.index.get(id).copied() else {
            return false;
        };
        self.nodes[idx].label = label.to_string();
        true
    }

    pub fn summary(&self) -> GraphSummary {
        GraphSummary {
            nodes: self.nodes.len(),
            edges: self.edges.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

pub fn domain_node_id(domain_id: &str) -> String {
    format!("{DOMAIN_ID_PREFIX}{}", escape_for_id(domain_id))
}

fn escape_for_id(raw: &str) -> String {
    raw.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_ids_are_prefixed_and_escaped() {
        assert_eq!(domain_node_id("core"), "domain__core");
        assert_eq!(domain_node_id("Billing & Pay"), "domain__Billing___Pay");
    }

    #[test]
    fn status_tokens_fall_back_to_unknown() {
        assert_eq!(NodeStatus::from_token("Implemented"), NodeStatus::Implemented);
        assert_eq!(NodeStatus::from_token("partial"), NodeStatus::Partial);
        assert_eq!(NodeStatus::from_token("wip"), NodeStatus::Unknown);
    }

    #[test]
    fn display_text_prefers_label() {
        let mut node = Node {
            id: "auth.login".to_string(),
            label: String::new(),
            kind: NodeKind::Feature,
            status: NodeStatus::Unknown,
            domain: "auth".to_string(),
        };
        assert_eq!(node.display_text(), "auth.login");
        node.label = "Login".to_string();
        assert_eq!(node.display_text(), "Login");
    }
}
