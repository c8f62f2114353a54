use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Node center in diagram coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

pub type Positions = BTreeMap<String, Position>;

#[derive(Debug, Clone)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeShape {
    RoundRect,
    Ellipse,
    Diamond,
}

/// Rendered footprint of a node, label included.
#[derive(Debug, Clone)]
pub struct NodeGeometry {
    pub width: f32,
    pub height: f32,
    pub shape: NodeShape,
    pub label: TextBlock,
}

pub type NodeGeometries = BTreeMap<String, NodeGeometry>;

/// Axis-aligned box given by its corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Bounds {
    pub fn around(center: Position, width: f32, height: f32) -> Self {
        Self {
            x1: center.x - width / 2.0,
            y1: center.y - height / 2.0,
            x2: center.x + width / 2.0,
            y2: center.y + height / 2.0,
        }
    }

    pub fn center(&self) -> Position {
        Position::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// True unless the boxes are separated by at least `padding` on some axis.
    pub fn overlaps(&self, other: &Bounds, padding: f32) -> bool {
        !(self.x2 + padding <= other.x1
            || self.x1 - padding >= other.x2
            || self.y2 + padding <= other.y1
            || self.y1 - padding >= other.y2)
    }
}
