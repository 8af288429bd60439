//! Sketch nodes and entities
//!
//! Nodes are the only holders of coordinates. Entities reference nodes by id
//! and keep their non-positional parameters (width, radius, ...) themselves.

use glam::DVec2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A shared 2D point owned by the sketch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SketchNode {
    /// Unique identifier
    pub id: Uuid,
    /// X coordinate in plane-local axes
    pub x: f64,
    /// Y coordinate in plane-local axes
    pub y: f64,
    /// Fixed nodes are never moved by the solver, extend or drags
    #[serde(default)]
    pub fixed: bool,
}

impl SketchNode {
    /// Create a free node at the given position
    pub fn new(position: DVec2) -> Self {
        Self {
            id: Uuid::new_v4(),
            x: position.x,
            y: position.y,
            fixed: false,
        }
    }

    /// Position as a vector
    pub fn position(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    /// Overwrite the position
    pub fn set_position(&mut self, position: DVec2) {
        self.x = position.x;
        self.y = position.y;
    }
}

/// Geometry of a sketch entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SketchGeometry {
    /// A line segment between two nodes
    Line {
        /// Start node
        start: Uuid,
        /// End node
        end: Uuid,
    },

    /// A chain of segments through a list of nodes
    Polyline {
        /// Nodes in order
        nodes: Vec<Uuid>,
        /// Whether the last node connects back to the first
        closed: bool,
    },

    /// An axis-aligned rectangle anchored at one corner
    Rectangle {
        /// Anchor corner node
        corner: Uuid,
        /// Extent along X (may be negative)
        width: f64,
        /// Extent along Y (may be negative)
        height: f64,
    },

    /// A circle
    Circle {
        /// Center node
        center: Uuid,
        /// Radius
        radius: f64,
    },

    /// A circular arc, counter-clockwise from start to end
    Arc {
        /// Center node
        center: Uuid,
        /// Start node
        start: Uuid,
        /// End node
        end: Uuid,
    },

    /// A spline through control points
    Spline {
        /// Control point nodes
        control_points: Vec<Uuid>,
    },

    /// A standalone point
    Point {
        /// The node
        node: Uuid,
    },
}

impl SketchGeometry {
    /// Get the type name of this geometry
    pub fn type_name(&self) -> &'static str {
        match self {
            SketchGeometry::Line { .. } => "Line",
            SketchGeometry::Polyline { .. } => "Polyline",
            SketchGeometry::Rectangle { .. } => "Rectangle",
            SketchGeometry::Circle { .. } => "Circle",
            SketchGeometry::Arc { .. } => "Arc",
            SketchGeometry::Spline { .. } => "Spline",
            SketchGeometry::Point { .. } => "Point",
        }
    }

    /// All node ids referenced by this geometry
    pub fn node_ids(&self) -> Vec<Uuid> {
        match self {
            SketchGeometry::Line { start, end } => vec![*start, *end],
            SketchGeometry::Polyline { nodes, .. } => nodes.clone(),
            SketchGeometry::Rectangle { corner, .. } => vec![*corner],
            SketchGeometry::Circle { center, .. } => vec![*center],
            SketchGeometry::Arc { center, start, end } => vec![*center, *start, *end],
            SketchGeometry::Spline { control_points } => control_points.clone(),
            SketchGeometry::Point { node } => vec![*node],
        }
    }

    /// Check if this geometry references a specific node
    pub fn references_node(&self, node_id: Uuid) -> bool {
        self.node_ids().contains(&node_id)
    }

    /// Whether this geometry always bounds a region on its own
    pub fn is_closed(&self) -> bool {
        match self {
            SketchGeometry::Rectangle { .. } | SketchGeometry::Circle { .. } => true,
            SketchGeometry::Polyline { closed, .. } => *closed,
            _ => false,
        }
    }
}

/// An entity in a sketch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SketchEntity {
    /// Unique identifier
    pub id: Uuid,
    /// Construction geometry is ignored by connectivity and contours
    #[serde(default)]
    pub construction: bool,
    /// Entities sharing a node with this one (hint only)
    #[serde(default)]
    pub connections: Vec<Uuid>,
    /// Shape of the entity
    pub geometry: SketchGeometry,
}

impl SketchEntity {
    /// Create a new non-construction entity
    pub fn new(geometry: SketchGeometry) -> Self {
        Self {
            id: Uuid::new_v4(),
            construction: false,
            connections: Vec::new(),
            geometry,
        }
    }

    /// Get the type name of this entity
    pub fn type_name(&self) -> &'static str {
        self.geometry.type_name()
    }

    /// All node ids referenced by this entity
    pub fn node_ids(&self) -> Vec<Uuid> {
        self.geometry.node_ids()
    }

    /// Start and end nodes if this is a line
    pub fn line_nodes(&self) -> Option<(Uuid, Uuid)> {
        match self.geometry {
            SketchGeometry::Line { start, end } => Some((start, end)),
            _ => None,
        }
    }

    /// Whether this entity is a line
    pub fn is_line(&self) -> bool {
        matches!(self.geometry, SketchGeometry::Line { .. })
    }
}

/// Partial update applied by [`Sketch::update_entity`](super::Sketch::update_entity)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityUpdate {
    /// New construction flag
    pub construction: Option<bool>,
    /// New rectangle width
    pub width: Option<f64>,
    /// New rectangle height
    pub height: Option<f64>,
    /// New circle radius
    pub radius: Option<f64>,
    /// New polyline closed flag
    pub closed: Option<bool>,
}

impl EntityUpdate {
    /// Toggle construction geometry
    pub fn construction(value: bool) -> Self {
        Self {
            construction: Some(value),
            ..Default::default()
        }
    }

    /// Change a circle radius
    pub fn radius(value: f64) -> Self {
        Self {
            radius: Some(value),
            ..Default::default()
        }
    }

    /// Change a rectangle size
    pub fn size(width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Default::default()
        }
    }

    /// Open or close a polyline
    pub fn closed(value: bool) -> Self {
        Self {
            closed: Some(value),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_ids() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let arc = SketchGeometry::Arc {
            center: a,
            start: b,
            end: c,
        };
        assert_eq!(arc.node_ids(), vec![a, b, c]);
        assert!(arc.references_node(b));
        assert!(!arc.references_node(Uuid::new_v4()));
    }

    #[test]
    fn test_closed_geometry() {
        let id = Uuid::new_v4();
        assert!(
            SketchGeometry::Circle {
                center: id,
                radius: 1.0
            }
            .is_closed()
        );
        assert!(
            !SketchGeometry::Polyline {
                nodes: vec![id],
                closed: false
            }
            .is_closed()
        );
        assert!(!SketchGeometry::Point { node: id }.is_closed());
    }

    #[test]
    fn test_line_nodes() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let line = SketchEntity::new(SketchGeometry::Line { start: a, end: b });
        assert_eq!(line.line_nodes(), Some((a, b)));
        assert_eq!(line.type_name(), "Line");

        let point = SketchEntity::new(SketchGeometry::Point { node: a });
        assert_eq!(point.line_nodes(), None);
    }
}
