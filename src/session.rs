use std::collections::{HashMap, HashSet};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::builder::build_graph;
use crate::config::Config;
use crate::document::{CatalogDocument, EntryLocation};
use crate::error::{DocumentError, EditError, LayoutError};
use crate::ir::{Edge, EdgeKind, Graph, Node};
use crate::layout::{
    LayoutMode, NodeGeometries, OverlapParams, OverlapReport, OverlapScope, Position, Positions,
    compute_positions, node_geometries, resolve_positions,
};
use crate::order::OrderMode;
use crate::persist::{PersistedState, Viewport, ViewportDebouncer};
use crate::search::{Focus, focus};
use crate::surface::{GraphStore, RenderSurface};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelEdit {
    Updated,
    /// The trimmed label equals the current one; nothing was written.
    Unchanged,
}

/// Result of the overlap pass that closes a layout run.
#[derive(Debug, Clone)]
pub struct LayoutOutcome {
    pub report: OverlapReport,
    /// Viewport from a restore, to be applied once the layout has settled.
    pub viewport: Option<Viewport>,
}

#[derive(Debug)]
struct PendingLayout {
    mode: LayoutMode,
    geometries: NodeGeometries,
}

/// Everything belonging to one loaded document.
///
/// Built on load, dropped on reload. All mutation goes through `&mut self`
/// between discrete events (user input, layout completion).
#[derive(Debug)]
pub struct Session {
    document: CatalogDocument,
    graph: Graph,
    /// Backing entry of each editable node, fixed at load.
    locations: HashMap<String, EntryLocation>,
    config: Config,
    positions: Positions,
    locked: HashSet<String>,
    hidden: HashSet<String>,
    layout_mode: LayoutMode,
    order_mode: OrderMode,
    show_containment: bool,
    pending_layout: Option<PendingLayout>,
    pending_viewport: Option<Viewport>,
    focus: Focus,
}

impl Session {
    pub fn load(document: CatalogDocument, config: Config) -> Self {
        let graph = build_graph(&document);
        let locations = document.entry_locations();
        let summary = graph.summary();
        info!(nodes = summary.nodes, edges = summary.edges, "catalog loaded");
        Self {
            document,
            graph,
            locations,
            config,
            positions: Positions::new(),
            locked: HashSet::new(),
            hidden: HashSet::new(),
            layout_mode: LayoutMode::default(),
            order_mode: OrderMode::default(),
            show_containment: true,
            pending_layout: None,
            pending_viewport: None,
            focus: Focus::default(),
        }
    }

    pub fn from_text(text: &str, config: Config) -> Result<Self, DocumentError> {
        Ok(Self::load(CatalogDocument::parse(text)?, config))
    }

    pub fn document(&self) -> &CatalogDocument {
        &self.document
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn positions(&self) -> &Positions {
        &self.positions
    }

    pub fn layout_mode(&self) -> LayoutMode {
        self.layout_mode
    }

    pub fn set_layout_mode(&mut self, mode: LayoutMode) {
        self.layout_mode = mode;
    }

    pub fn order_mode(&self) -> OrderMode {
        self.order_mode
    }

    pub fn set_order_mode(&mut self, mode: OrderMode) {
        self.order_mode = mode;
    }

    /// Node boxes for the current layout mode.
    pub fn geometries(&self) -> NodeGeometries {
        node_geometries(&self.graph, self.layout_mode, &self.config.layout.nodes)
    }

    /// True until every node has a coordinate.
    pub fn needs_layout(&self) -> bool {
        !covers_all_nodes(&self.graph, &self.positions)
    }

    /// Applies persisted modes, viewport and positions.
    ///
    /// Positions only count when every current node has one; a partial hit is
    /// dropped and the caller must run a fresh layout. On a full hit the
    /// overlap pass runs with the restore budget and its report is returned.
    pub fn restore(&mut self, state: PersistedState) -> Option<OverlapReport> {
        if let Some(mode) = state.layout_mode {
            self.layout_mode = mode;
        }
        if let Some(mode) = state.order_mode {
            self.order_mode = mode;
        }
        self.pending_viewport = state.viewport;

        let usable: Positions = state
            .positions
            .into_iter()
            .filter(|(id, pos)| self.graph.contains_node(id) && pos.is_finite())
            .collect();
        if self.graph.is_empty() || !covers_all_nodes(&self.graph, &usable) {
            info!(
                restored = usable.len(),
                nodes = self.graph.nodes().len(),
                "saved positions incomplete, fresh layout required"
            );
            return None;
        }

        self.positions = usable;
        let overlap = &self.config.layout.overlap;
        let params = OverlapParams {
            max_iterations: overlap.restore_iterations,
            padding: overlap.restore_padding,
            min_push: overlap.min_push,
        };
        let geometries = self.geometries();
        let report = self.resolve_with(&geometries, params);
        info!(
            iterations = report.iterations,
            converged = report.converged,
            "positions restored"
        );
        Some(report)
    }

    /// Computes raw positions for the current mode and hands them to `surface`.
    ///
    /// Locked nodes keep their coordinates. The overlap pass waits for
    /// `finish_layout`.
    pub fn begin_layout(&mut self, surface: &mut dyn RenderSurface) -> Result<(), LayoutError> {
        let mode = self.layout_mode;
        let geometries = node_geometries(&self.graph, mode, &self.config.layout.nodes);
        let pinned: Positions = self
            .locked
            .iter()
            .filter_map(|id| Some((id.clone(), *self.positions.get(id)?)))
            .collect();
        let raw = compute_positions(
            &self.graph,
            mode,
            self.order_mode,
            &geometries,
            &pinned,
            &self.config.layout,
        );
        surface.apply_layout(mode, &raw).map_err(|reason| {
            warn!(%reason, "render surface rejected layout");
            LayoutError::SurfaceRejected(reason)
        })?;
        self.positions = raw;
        self.pending_layout = Some(PendingLayout { mode, geometries });
        Ok(())
    }

    /// Layout-complete signal: runs the overlap pass over the pending layout.
    pub fn finish_layout(&mut self) -> Result<LayoutOutcome, LayoutError> {
        let pending = self
            .pending_layout
            .take()
            .ok_or(LayoutError::NoPendingLayout)?;
        let overlap = &self.config.layout.overlap;
        let params = OverlapParams {
            max_iterations: overlap.layout_iterations,
            padding: overlap.layout_padding,
            min_push: overlap.min_push,
        };
        let report = self.resolve_with(&pending.geometries, params);
        info!(
            mode = ?pending.mode,
            iterations = report.iterations,
            converged = report.converged,
            "layout finished"
        );
        Ok(LayoutOutcome {
            report,
            viewport: self.pending_viewport.take(),
        })
    }

    /// `begin_layout` followed by `finish_layout`, for surfaces that apply
    /// positions synchronously.
    pub fn run_layout_blocking(
        &mut self,
        surface: &mut dyn RenderSurface,
    ) -> Result<LayoutOutcome, LayoutError> {
        self.begin_layout(surface)?;
        self.finish_layout()
    }

    /// Debouncer for viewport writes, using the configured quiet period.
    pub fn viewport_debouncer(&self) -> ViewportDebouncer {
        ViewportDebouncer::new(Duration::from_millis(self.config.viewport_debounce_ms))
    }

    /// Viewport from the last restore that no layout run has handed out yet.
    pub fn take_pending_viewport(&mut self) -> Option<Viewport> {
        self.pending_viewport.take()
    }

    /// Moves a node, as a drag would.
    pub fn move_node(&mut self, id: &str, position: Position) -> bool {
        if !self.graph.contains_node(id) || !position.is_finite() {
            return false;
        }
        self.positions.insert(id.to_string(), position);
        true
    }

    pub fn lock(&mut self, id: &str) -> bool {
        self.graph.contains_node(id) && self.locked.insert(id.to_string())
    }

    pub fn unlock(&mut self, id: &str) -> bool {
        self.locked.remove(id)
    }

    pub fn is_locked(&self, id: &str) -> bool {
        self.locked.contains(id)
    }

    pub fn set_hidden(&mut self, id: &str, hidden: bool) {
        if hidden {
            if self.graph.contains_node(id) {
                self.hidden.insert(id.to_string());
            }
        } else {
            self.hidden.remove(id);
        }
    }

    pub fn is_hidden(&self, id: &str) -> bool {
        self.hidden.contains(id)
    }

    pub fn show_containment(&self) -> bool {
        self.show_containment
    }

    /// Hiding containment edges affects drawing only; layout still uses them.
    pub fn set_show_containment(&mut self, show: bool) {
        self.show_containment = show;
    }

    pub fn visible_edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.graph
            .edges()
            .iter()
            .filter(move |edge| self.show_containment || edge.kind != EdgeKind::Contains)
    }

    pub fn set_search(&mut self, query: &str) -> &Focus {
        self.focus = focus(&self.graph, query);
        debug!(
            query = %self.focus.query,
            nodes = self.focus.nodes.len(),
            edges = self.focus.edges.len(),
            "search focus updated"
        );
        &self.focus
    }

    pub fn focus(&self) -> &Focus {
        &self.focus
    }

    /// Renames a domain or feature, writing the label back into the document.
    pub fn edit_label(&mut self, node_id: &str, label: &str) -> Result<LabelEdit, EditError> {
        let node = self
            .graph
            .node(node_id)
            .filter(|node| node.kind.is_editable())
            .ok_or_else(|| EditError::UnresolvedLabelTarget(node_id.to_string()))?;
        let label = label.trim();
        if label.is_empty() {
            return Err(EditError::EmptyLabel);
        }
        if node.label == label {
            debug!(node = node_id, "label unchanged");
            return Ok(LabelEdit::Unchanged);
        }

        let location = self
            .locations
            .get(node_id)
            .copied()
            .ok_or_else(|| EditError::UnresolvedLabelTarget(node_id.to_string()))?;
        self.document.set_label(location, node_id, label)?;
        self.graph.set_label(node_id, label);
        info!(node = node_id, label, "label updated");
        Ok(LabelEdit::Updated)
    }

    /// State to persist: current positions and modes.
    pub fn snapshot(&self, viewport: Option<Viewport>) -> PersistedState {
        PersistedState {
            positions: self.snapshot_positions(),
            viewport,
            order_mode: Some(self.order_mode),
            layout_mode: Some(self.layout_mode),
        }
    }

    pub fn snapshot_positions(&self) -> Positions {
        self.positions.clone()
    }

    /// Forgets every position so the next run lays out from scratch.
    pub fn reset_positions(&mut self) {
        self.positions.clear();
        self.pending_layout = None;
        info!("positions reset");
    }

    fn resolve_with(&mut self, geometries: &NodeGeometries, params: OverlapParams) -> OverlapReport {
        let scope = OverlapScope {
            locked: &self.locked,
            hidden: &self.hidden,
        };
        resolve_positions(
            &self.graph,
            &mut self.positions,
            geometries,
            scope,
            params,
            self.config.layout.overlap.seed,
        )
    }
}

impl GraphStore for Session {
    fn nodes(&self) -> &[Node] {
        self.graph.nodes()
    }

    fn edges(&self) -> &[Edge] {
        self.graph.edges()
    }

    fn position(&self, id: &str) -> Option<Position> {
        self.positions.get(id).copied()
    }
}

fn covers_all_nodes(graph: &Graph, positions: &Positions) -> bool {
    graph
        .nodes()
        .iter()
        .all(|node| positions.contains_key(&node.id))
}
