//! Seams between the layout core and whatever draws the diagram.

use crate::ir::{Edge, Node};
use crate::layout::{LayoutMode, Position, Positions};

/// Read access to the current element set and coordinates.
pub trait GraphStore {
    fn nodes(&self) -> &[Node];
    fn edges(&self) -> &[Edge];
    fn position(&self, id: &str) -> Option<Position>;
}

/// A renderer that accepts raw layout positions.
///
/// The surface may animate towards the positions; the caller signals
/// completion separately (see `Session::finish_layout`). A returned error is
/// surfaced to the caller and never retried.
pub trait RenderSurface {
    fn apply_layout(&mut self, mode: LayoutMode, positions: &Positions) -> Result<(), String>;
}

/// Surface that just records what it was given. Used by the CLI and tests.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    applied: Vec<(LayoutMode, Positions)>,
    reject_with: Option<String>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// A surface that refuses every layout with `reason`.
    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self {
            applied: Vec::new(),
            reject_with: Some(reason.into()),
        }
    }

    pub fn applied(&self) -> &[(LayoutMode, Positions)] {
        &self.applied
    }
}

impl RenderSurface for HeadlessSurface {
    fn apply_layout(&mut self, mode: LayoutMode, positions: &Positions) -> Result<(), String> {
        if let Some(reason) = &self.reject_with {
            return Err(reason.clone());
        }
        self.applied.push((mode, positions.clone()));
        Ok(())
    }
}
