//! Sketch Constraints
//!
//! Defines geometric and dimensional constraints that can be applied
//! to sketch entities. Constraints reference entities, never nodes; the
//! solver resolves entities to their nodes when it runs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of relation a constraint enforces
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ConstraintKind {
    // ============== Solved ==============
    /// A line is horizontal (parallel to X axis)
    Horizontal,
    /// A line is vertical (parallel to Y axis)
    Vertical,

    // ============== Declared, not solved ==============
    /// Two entities meet at a point
    Coincident,
    /// Two lines are parallel
    Parallel,
    /// Two lines are perpendicular
    Perpendicular,
    /// A curve is tangent to another curve
    Tangent,
    /// Two entities have equal length or radius
    Equal,
    /// An entity does not move
    Fixed,
    /// Distance between two entities
    Distance {
        /// Required distance
        value: f64,
    },
    /// Angle between two lines
    Angle {
        /// Angle in radians
        value: f64,
    },
    /// Radius of a circle or arc
    Radius {
        /// Required radius
        value: f64,
    },
}

impl ConstraintKind {
    /// Get the type name of this kind
    pub fn type_name(&self) -> &'static str {
        match self {
            ConstraintKind::Horizontal => "Horizontal",
            ConstraintKind::Vertical => "Vertical",
            ConstraintKind::Coincident => "Coincident",
            ConstraintKind::Parallel => "Parallel",
            ConstraintKind::Perpendicular => "Perpendicular",
            ConstraintKind::Tangent => "Tangent",
            ConstraintKind::Equal => "Equal",
            ConstraintKind::Fixed => "Fixed",
            ConstraintKind::Distance { .. } => "Distance",
            ConstraintKind::Angle { .. } => "Angle",
            ConstraintKind::Radius { .. } => "Radius",
        }
    }

    /// Number of entities this kind must reference
    pub fn entity_count(&self) -> usize {
        match self {
            ConstraintKind::Horizontal
            | ConstraintKind::Vertical
            | ConstraintKind::Fixed
            | ConstraintKind::Radius { .. } => 1,
            ConstraintKind::Coincident
            | ConstraintKind::Parallel
            | ConstraintKind::Perpendicular
            | ConstraintKind::Tangent
            | ConstraintKind::Equal
            | ConstraintKind::Distance { .. }
            | ConstraintKind::Angle { .. } => 2,
        }
    }
}

/// A constraint between sketch entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SketchConstraint {
    /// Unique identifier
    pub id: Uuid,
    /// What the constraint enforces
    pub kind: ConstraintKind,
    /// Constrained entities
    pub entity_ids: Vec<Uuid>,
    /// Disabled constraints are kept but ignored by the solver
    pub enabled: bool,
}

impl SketchConstraint {
    /// Create an enabled constraint
    pub fn new(kind: ConstraintKind, entity_ids: Vec<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            entity_ids,
            enabled: true,
        }
    }

    /// Get the unique ID of this constraint
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Get the type name of this constraint
    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    /// Get all entity IDs referenced by this constraint
    pub fn referenced_entities(&self) -> &[Uuid] {
        &self.entity_ids
    }

    /// Check if this constraint references a specific entity
    pub fn references_entity(&self, entity_id: Uuid) -> bool {
        self.entity_ids.contains(&entity_id)
    }

    /// Whether the relaxation solver acts on this constraint
    pub fn is_solvable(&self) -> bool {
        matches!(
            self.kind,
            ConstraintKind::Horizontal | ConstraintKind::Vertical
        )
    }

    /// Whether this is a dimensional constraint (has a value)
    pub fn is_dimensional(&self) -> bool {
        self.value().is_some()
    }

    /// Get the dimensional value if this is a dimensional constraint
    pub fn value(&self) -> Option<f64> {
        match self.kind {
            ConstraintKind::Distance { value }
            | ConstraintKind::Angle { value }
            | ConstraintKind::Radius { value } => Some(value),
            _ => None,
        }
    }

    /// Set the dimensional value if this is a dimensional constraint
    pub fn set_value(&mut self, new_value: f64) -> bool {
        match &mut self.kind {
            ConstraintKind::Distance { value }
            | ConstraintKind::Angle { value }
            | ConstraintKind::Radius { value } => {
                *value = new_value;
                true
            }
            _ => false,
        }
    }

    // ============== Factory Methods ==============

    /// Create a horizontal constraint
    pub fn horizontal(line: Uuid) -> Self {
        Self::new(ConstraintKind::Horizontal, vec![line])
    }

    /// Create a vertical constraint
    pub fn vertical(line: Uuid) -> Self {
        Self::new(ConstraintKind::Vertical, vec![line])
    }

    /// Create a coincident constraint
    pub fn coincident(entity1: Uuid, entity2: Uuid) -> Self {
        Self::new(ConstraintKind::Coincident, vec![entity1, entity2])
    }

    /// Create a parallel constraint
    pub fn parallel(line1: Uuid, line2: Uuid) -> Self {
        Self::new(ConstraintKind::Parallel, vec![line1, line2])
    }

    /// Create a perpendicular constraint
    pub fn perpendicular(line1: Uuid, line2: Uuid) -> Self {
        Self::new(ConstraintKind::Perpendicular, vec![line1, line2])
    }

    /// Create a tangent constraint
    pub fn tangent(curve1: Uuid, curve2: Uuid) -> Self {
        Self::new(ConstraintKind::Tangent, vec![curve1, curve2])
    }

    /// Create an equal length/radius constraint
    pub fn equal(entity1: Uuid, entity2: Uuid) -> Self {
        Self::new(ConstraintKind::Equal, vec![entity1, entity2])
    }

    /// Create a fixed constraint
    pub fn fixed(entity: Uuid) -> Self {
        Self::new(ConstraintKind::Fixed, vec![entity])
    }

    /// Create a distance constraint
    pub fn distance(entity1: Uuid, entity2: Uuid, value: f64) -> Self {
        Self::new(ConstraintKind::Distance { value }, vec![entity1, entity2])
    }

    /// Create an angle constraint
    pub fn angle(line1: Uuid, line2: Uuid, value: f64) -> Self {
        Self::new(ConstraintKind::Angle { value }, vec![line1, line2])
    }

    /// Create a radius constraint
    pub fn radius(circle: Uuid, value: f64) -> Self {
        Self::new(ConstraintKind::Radius { value }, vec![circle])
    }
}
