use crate::ir::{EdgeKind, NodeKind, NodeStatus};
use crate::layout::{Bounds, LayoutMode, NodeGeometries};
use crate::order::OrderMode;
use crate::session::Session;
use crate::surface::GraphStore;
use crate::theme::Theme;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Element list plus coordinates, as handed to a renderer.
#[derive(Debug, Serialize)]
pub struct LayoutDump {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout_mode: Option<LayoutMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_mode: Option<OrderMode>,
    pub theme: Theme,
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    pub status: NodeStatus,
    pub domain: String,
    pub shape: String,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub width: f32,
    pub height: f32,
    pub label_lines: Vec<String>,
    pub locked: bool,
    pub hidden: bool,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub id: String,
    pub source: String,
    pub target: String,
    pub relation: String,
    pub kind: EdgeKind,
    pub cluster: String,
    pub color: String,
    pub visible: bool,
}

impl LayoutDump {
    /// Dump of whatever `store` holds; nodes without a position get null coordinates.
    pub fn from_store<S: GraphStore + ?Sized>(
        store: &S,
        geometries: &NodeGeometries,
        theme: Theme,
    ) -> Self {
        let mut extent: Option<Bounds> = None;
        let nodes = store
            .nodes()
            .iter()
            .map(|node| {
                let geometry = geometries.get(&node.id);
                let (width, height) = geometry.map(|g| (g.width, g.height)).unwrap_or((0.0, 0.0));
                let position = store.position(&node.id);
                if let Some(center) = position {
                    let bounds = Bounds::around(center, width, height);
                    extent = Some(match extent {
                        Some(acc) => Bounds {
                            x1: acc.x1.min(bounds.x1),
                            y1: acc.y1.min(bounds.y1),
                            x2: acc.x2.max(bounds.x2),
                            y2: acc.y2.max(bounds.y2),
                        },
                        None => bounds,
                    });
                }
                NodeDump {
                    id: node.id.clone(),
                    label: node.display_text().to_string(),
                    kind: node.kind,
                    status: node.status,
                    domain: node.domain.clone(),
                    shape: geometry
                        .map(|g| format!("{:?}", g.shape))
                        .unwrap_or_default(),
                    x: position.map(|p| p.x),
                    y: position.map(|p| p.y),
                    width,
                    height,
                    label_lines: geometry.map(|g| g.label.lines.clone()).unwrap_or_default(),
                    locked: false,
                    hidden: false,
                }
            })
            .collect();

        let edges = store
            .edges()
            .iter()
            .map(|edge| EdgeDump {
                id: edge.id.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                relation: edge.relation.clone(),
                kind: edge.kind,
                cluster: edge.cluster.clone(),
                color: theme.edge_color(&edge.cluster),
                visible: true,
            })
            .collect();

        let (width, height) = extent
            .map(|b| (b.x2 - b.x1, b.y2 - b.y1))
            .unwrap_or((0.0, 0.0));
        LayoutDump {
            layout_mode: None,
            order_mode: None,
            theme,
            width,
            height,
            nodes,
            edges,
        }
    }

    /// Dump of a session, including modes, locks and edge visibility.
    pub fn from_session(session: &Session) -> Self {
        let geometries = session.geometries();
        let mut dump = Self::from_store(session, &geometries, session.config().theme);
        dump.layout_mode = Some(session.layout_mode());
        dump.order_mode = Some(session.order_mode());
        for node in &mut dump.nodes {
            node.locked = session.is_locked(&node.id);
            node.hidden = session.is_hidden(&node.id);
        }
        for edge in &mut dump.edges {
            edge.visible = session.show_containment() || edge.kind != EdgeKind::Contains;
        }
        dump
    }
}

pub fn write_layout_dump(path: &Path, dump: &LayoutDump) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, dump)?;
    Ok(())
}
