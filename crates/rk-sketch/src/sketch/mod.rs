//! Sketch Topology Store
//!
//! A [`Sketch`] owns the canonical set of shared nodes and the entities
//! that reference them by id. Connectivity comes from shared node ids:
//! acquiring a coordinate close to an existing node reuses that node.

mod constraint;
mod contour;
mod edit;
mod entity;
mod record;
mod solver;

use std::collections::{HashMap, HashSet};

use glam::DVec2;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::config::SketchConfig;

pub use constraint::{ConstraintKind, SketchConstraint};
pub use contour::ContourDetector;
pub use edit::{EditOutcome, EditReport, offset_chain};
pub use entity::{EntityUpdate, SketchEntity, SketchGeometry, SketchNode};
pub use record::SketchRecord;
pub use solver::{ConstraintSolver, SolveResult};

/// Sketch-related errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SketchError {
    #[error("Entity not found: {0}")]
    EntityNotFound(Uuid),

    #[error("Node not found: {0}")]
    NodeNotFound(Uuid),

    #[error("Constraint not found: {0}")]
    ConstraintNotFound(Uuid),

    #[error("Entity {id} is a {found}, expected {expected}")]
    WrongEntityType {
        id: Uuid,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Degenerate geometry: {0}")]
    Degenerate(String),

    #[error("Node {0} is fixed")]
    NodeFixed(Uuid),

    #[error("Invalid constraint: {0}")]
    InvalidConstraint(String),

    #[error("Entity {entity} references missing node {node}")]
    DanglingNode { entity: Uuid, node: Uuid },

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Deserialization error: {0}")]
    Deserialize(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for sketch operations
pub type SketchResult<T> = Result<T, SketchError>;

/// Corners of a rectangle starting at `corner`; counter-clockwise when width
/// and height are positive
pub fn rectangle_corners(corner: DVec2, width: f64, height: f64) -> [DVec2; 4] {
    [
        corner,
        corner + DVec2::new(width, 0.0),
        corner + DVec2::new(width, height),
        corner + DVec2::new(0.0, height),
    ]
}

/// A 2D sketch: nodes, entities and constraints
#[derive(Debug, Clone, Default)]
pub struct Sketch {
    config: SketchConfig,
    /// All nodes by id
    nodes: HashMap<Uuid, SketchNode>,
    /// Node ids in creation order (acquisition scans in this order)
    node_order: Vec<Uuid>,
    /// Entities in creation order
    entities: Vec<SketchEntity>,
    constraints: Vec<SketchConstraint>,
}

impl Sketch {
    /// Create an empty sketch with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty sketch with a custom configuration
    pub fn with_config(config: SketchConfig) -> SketchResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Default::default()
        })
    }

    /// Active configuration
    pub fn config(&self) -> &SketchConfig {
        &self.config
    }

    /// Remove every node, entity and constraint
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.node_order.clear();
        self.entities.clear();
        self.constraints.clear();
    }

    // ============== Nodes ==============

    /// All nodes by id
    pub fn nodes(&self) -> &HashMap<Uuid, SketchNode> {
        &self.nodes
    }

    /// Nodes in creation order
    pub fn nodes_iter(&self) -> impl Iterator<Item = &SketchNode> {
        self.node_order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Get a node by ID
    pub fn node(&self, id: Uuid) -> Option<&SketchNode> {
        self.nodes.get(&id)
    }

    /// Get a node position by ID
    pub fn node_position(&self, id: Uuid) -> Option<DVec2> {
        self.nodes.get(&id).map(SketchNode::position)
    }

    /// First node (in creation order) inside the per-axis snap box around `position`
    pub fn find_node_near(&self, position: DVec2) -> Option<Uuid> {
        let snap = self.config.snap_distance;
        self.nodes_iter()
            .find(|node| (node.x - position.x).abs() < snap && (node.y - position.y).abs() < snap)
            .map(|node| node.id)
    }

    /// Return the id of a node at `position`, reusing a nearby node if one exists
    pub fn acquire_node(&mut self, position: DVec2) -> Uuid {
        if let Some(id) = self.find_node_near(position) {
            return id;
        }
        let node = SketchNode::new(position);
        let id = node.id;
        self.nodes.insert(id, node);
        self.node_order.push(id);
        id
    }

    /// Move a node; every entity referencing it follows
    pub fn move_node(&mut self, id: Uuid, position: DVec2) -> SketchResult<()> {
        let node = self.nodes.get_mut(&id).ok_or(SketchError::NodeNotFound(id))?;
        if node.fixed {
            return Err(SketchError::NodeFixed(id));
        }
        node.set_position(position);
        Ok(())
    }

    /// Pin or release a node
    pub fn set_node_fixed(&mut self, id: Uuid, fixed: bool) -> SketchResult<()> {
        let node = self.nodes.get_mut(&id).ok_or(SketchError::NodeNotFound(id))?;
        node.fixed = fixed;
        Ok(())
    }

    pub(crate) fn node_mut(&mut self, id: Uuid) -> Option<&mut SketchNode> {
        self.nodes.get_mut(&id)
    }

    /// Delete every node that no entity references
    fn remove_orphan_nodes(&mut self) -> usize {
        let referenced: HashSet<Uuid> = self
            .entities
            .iter()
            .flat_map(SketchEntity::node_ids)
            .collect();
        let before = self.nodes.len();
        self.nodes.retain(|id, _| referenced.contains(id));
        self.node_order.retain(|id| referenced.contains(id));
        let removed = before - self.nodes.len();
        if removed > 0 {
            debug!("Removed {} orphan nodes", removed);
        }
        removed
    }

    // ============== Entities ==============

    /// Entities in creation order
    pub fn entities(&self) -> &[SketchEntity] {
        &self.entities
    }

    /// Get an entity by ID
    pub fn entity(&self, id: Uuid) -> Option<&SketchEntity> {
        self.entities.iter().find(|e| e.id == id)
    }

    fn entity_index(&self, id: Uuid) -> Option<usize> {
        self.entities.iter().position(|e| e.id == id)
    }

    /// Resolved definition points of an entity (rectangle corners are derived)
    pub fn entity_points(&self, id: Uuid) -> Option<Vec<DVec2>> {
        let entity = self.entity(id)?;
        self.geometry_points(&entity.geometry)
    }

    fn geometry_points(&self, geometry: &SketchGeometry) -> Option<Vec<DVec2>> {
        match geometry {
            SketchGeometry::Rectangle {
                corner,
                width,
                height,
            } => {
                let corner = self.node_position(*corner)?;
                Some(rectangle_corners(corner, *width, *height).to_vec())
            }
            other => other
                .node_ids()
                .into_iter()
                .map(|id| self.node_position(id))
                .collect(),
        }
    }

    /// Straight segments making up an entity (lines, polylines, rectangles)
    pub fn entity_segments(&self, entity: &SketchEntity) -> Vec<(DVec2, DVec2)> {
        let closed = match &entity.geometry {
            SketchGeometry::Line { .. } => false,
            SketchGeometry::Polyline { closed, .. } => *closed,
            SketchGeometry::Rectangle { .. } => true,
            _ => return Vec::new(),
        };
        let Some(points) = self.geometry_points(&entity.geometry) else {
            return Vec::new();
        };

        let mut segments: Vec<(DVec2, DVec2)> =
            points.windows(2).map(|pair| (pair[0], pair[1])).collect();
        if closed && points.len() > 2 {
            segments.push((points[points.len() - 1], points[0]));
        }
        segments
    }

    /// Add a line between two positions
    pub fn add_line(&mut self, start: DVec2, end: DVec2) -> SketchResult<Uuid> {
        self.check_distinct(start, end, "line")?;
        let start_id = self.acquire_node(start);
        let end_id = self.acquire_node(end);
        if start_id == end_id {
            return Err(SketchError::Degenerate(
                "line endpoints snap to the same node".into(),
            ));
        }
        Ok(self.insert_entity(SketchGeometry::Line {
            start: start_id,
            end: end_id,
        }))
    }

    /// Add a polyline through the given positions
    pub fn add_polyline(&mut self, points: &[DVec2], closed: bool) -> SketchResult<Uuid> {
        let min_points = if closed { 3 } else { 2 };
        if points.len() < min_points {
            return Err(SketchError::Degenerate(format!(
                "polyline needs at least {} points, got {}",
                min_points,
                points.len()
            )));
        }
        for pair in points.windows(2) {
            self.check_distinct(pair[0], pair[1], "polyline segment")?;
        }
        if closed {
            self.check_distinct(points[points.len() - 1], points[0], "polyline segment")?;
        }

        let nodes: Vec<Uuid> = points.iter().map(|p| self.acquire_node(*p)).collect();
        let collapsed = nodes.windows(2).any(|pair| pair[0] == pair[1])
            || (closed && nodes.first() == nodes.last());
        if collapsed {
            self.remove_orphan_nodes();
            return Err(SketchError::Degenerate(
                "polyline vertices snap to the same node".into(),
            ));
        }
        Ok(self.insert_entity(SketchGeometry::Polyline { nodes, closed }))
    }

    /// Add a rectangle anchored at `corner`
    pub fn add_rectangle(&mut self, corner: DVec2, width: f64, height: f64) -> SketchResult<Uuid> {
        self.check_size(width, "rectangle width")?;
        self.check_size(height, "rectangle height")?;
        let corner = self.acquire_node(corner);
        Ok(self.insert_entity(SketchGeometry::Rectangle {
            corner,
            width,
            height,
        }))
    }

    /// Add a rectangle spanning two opposite corners
    pub fn add_rectangle_from_corners(&mut self, a: DVec2, b: DVec2) -> SketchResult<Uuid> {
        let size = b - a;
        self.add_rectangle(a, size.x, size.y)
    }

    /// Add a circle
    pub fn add_circle(&mut self, center: DVec2, radius: f64) -> SketchResult<Uuid> {
        if radius <= 0.0 {
            return Err(SketchError::Degenerate(format!(
                "circle radius must be positive, got {radius}"
            )));
        }
        self.check_size(radius, "circle radius")?;
        let center = self.acquire_node(center);
        Ok(self.insert_entity(SketchGeometry::Circle { center, radius }))
    }

    /// Add a standalone point
    pub fn add_point(&mut self, position: DVec2) -> SketchResult<Uuid> {
        if !position.is_finite() {
            return Err(SketchError::Degenerate("point is not finite".into()));
        }
        let node = self.acquire_node(position);
        Ok(self.insert_entity(SketchGeometry::Point { node }))
    }

    /// Add an arc running counter-clockwise from `start` to `end` about `center`
    pub fn add_arc(&mut self, center: DVec2, start: DVec2, end: DVec2) -> SketchResult<Uuid> {
        self.check_distinct(center, start, "arc radius")?;
        self.check_distinct(center, end, "arc radius")?;
        self.check_distinct(start, end, "arc chord")?;

        let ids = [
            self.acquire_node(center),
            self.acquire_node(start),
            self.acquire_node(end),
        ];
        if ids[0] == ids[1] || ids[0] == ids[2] || ids[1] == ids[2] {
            self.remove_orphan_nodes();
            return Err(SketchError::Degenerate(
                "arc points snap to the same node".into(),
            ));
        }
        Ok(self.insert_entity(SketchGeometry::Arc {
            center: ids[0],
            start: ids[1],
            end: ids[2],
        }))
    }

    /// Add a spline through control points
    pub fn add_spline(&mut self, points: &[DVec2]) -> SketchResult<Uuid> {
        if points.len() < 2 {
            return Err(SketchError::Degenerate(format!(
                "spline needs at least 2 control points, got {}",
                points.len()
            )));
        }
        for pair in points.windows(2) {
            self.check_distinct(pair[0], pair[1], "spline span")?;
        }
        let control_points: Vec<Uuid> = points.iter().map(|p| self.acquire_node(*p)).collect();
        if control_points.windows(2).any(|pair| pair[0] == pair[1]) {
            self.remove_orphan_nodes();
            return Err(SketchError::Degenerate(
                "spline control points snap to the same node".into(),
            ));
        }
        Ok(self.insert_entity(SketchGeometry::Spline { control_points }))
    }

    /// Mark an entity as construction geometry (or clear the flag)
    pub fn set_construction(&mut self, id: Uuid, construction: bool) -> SketchResult<()> {
        self.update_entity(id, EntityUpdate::construction(construction))
    }

    /// Apply a partial update to an entity
    ///
    /// Fields that do not apply to the entity type are rejected and nothing
    /// is changed.
    pub fn update_entity(&mut self, id: Uuid, update: EntityUpdate) -> SketchResult<()> {
        let index = self.entity_index(id).ok_or(SketchError::EntityNotFound(id))?;
        let geometry = &self.entities[index].geometry;

        let wrong_type = |expected: &'static str| SketchError::WrongEntityType {
            id,
            expected,
            found: geometry.type_name(),
        };

        match geometry {
            SketchGeometry::Rectangle { .. } => {
                if let Some(width) = update.width {
                    self.check_size(width, "rectangle width")?;
                }
                if let Some(height) = update.height {
                    self.check_size(height, "rectangle height")?;
                }
            }
            _ if update.width.is_some() || update.height.is_some() => {
                return Err(wrong_type("Rectangle"));
            }
            _ => {}
        }
        match geometry {
            SketchGeometry::Circle { .. } => {
                if let Some(radius) = update.radius {
                    if radius <= 0.0 {
                        return Err(SketchError::Degenerate(format!(
                            "circle radius must be positive, got {radius}"
                        )));
                    }
                    self.check_size(radius, "circle radius")?;
                }
            }
            _ if update.radius.is_some() => return Err(wrong_type("Circle")),
            _ => {}
        }
        match geometry {
            SketchGeometry::Polyline { nodes, .. } => {
                if update.closed == Some(true) && nodes.len() < 3 {
                    return Err(SketchError::Degenerate(
                        "a closed polyline needs at least 3 nodes".into(),
                    ));
                }
            }
            _ if update.closed.is_some() => return Err(wrong_type("Polyline")),
            _ => {}
        }

        let entity = &mut self.entities[index];
        match &mut entity.geometry {
            SketchGeometry::Rectangle { width, height, .. } => {
                if let Some(value) = update.width {
                    *width = value;
                }
                if let Some(value) = update.height {
                    *height = value;
                }
            }
            SketchGeometry::Circle { radius, .. } => {
                if let Some(value) = update.radius {
                    *radius = value;
                }
            }
            SketchGeometry::Polyline { closed, .. } => {
                if let Some(value) = update.closed {
                    *closed = value;
                }
            }
            _ => {}
        }
        if let Some(construction) = update.construction {
            entity.construction = construction;
            self.refresh_connections();
        }
        Ok(())
    }

    /// Remove an entity, the constraints on it and any nodes it leaves orphaned
    pub fn remove_entity(&mut self, id: Uuid) -> Option<SketchEntity> {
        let index = self.entity_index(id)?;
        let entity = self.entities.remove(index);

        let before = self.constraints.len();
        self.constraints.retain(|c| !c.references_entity(id));
        let dropped = before - self.constraints.len();
        if dropped > 0 {
            debug!("Dropped {} constraints on removed entity {}", dropped, id);
        }

        self.refresh_connections();
        self.remove_orphan_nodes();
        debug!("Removed {} {}", entity.type_name(), id);
        Some(entity)
    }

    fn insert_entity(&mut self, geometry: SketchGeometry) -> Uuid {
        let entity = SketchEntity::new(geometry);
        let id = entity.id;
        debug!("Added {} {}", entity.type_name(), id);
        self.entities.push(entity);
        self.refresh_connections();
        id
    }

    /// Recompute every entity's `connections` from shared node ids
    fn refresh_connections(&mut self) {
        let mut users: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for entity in self.entities.iter().filter(|e| !e.construction) {
            for node in entity.node_ids() {
                let list = users.entry(node).or_default();
                if !list.contains(&entity.id) {
                    list.push(entity.id);
                }
            }
        }

        for entity in &mut self.entities {
            let mut connections = Vec::new();
            if !entity.construction {
                for node in entity.geometry.node_ids() {
                    for other in users.get(&node).into_iter().flatten() {
                        if *other != entity.id && !connections.contains(other) {
                            connections.push(*other);
                        }
                    }
                }
            }
            entity.connections = connections;
        }
    }

    fn check_size(&self, value: f64, what: &str) -> SketchResult<()> {
        if !value.is_finite() || value.abs() < self.config.min_entity_size {
            return Err(SketchError::Degenerate(format!(
                "{what} {value} is below the minimum size {}",
                self.config.min_entity_size
            )));
        }
        Ok(())
    }

    fn check_distinct(&self, a: DVec2, b: DVec2, what: &str) -> SketchResult<()> {
        if !a.is_finite() || !b.is_finite() {
            return Err(SketchError::Degenerate(format!("{what} is not finite")));
        }
        let snap = self.config.snap_distance;
        let delta = (b - a).abs();
        if a.distance(b) < self.config.min_entity_size || (delta.x < snap && delta.y < snap) {
            return Err(SketchError::Degenerate(format!(
                "{what} from {a} to {b} is too short"
            )));
        }
        Ok(())
    }

    // ============== Constraints ==============

    /// All constraints
    pub fn constraints(&self) -> &[SketchConstraint] {
        &self.constraints
    }

    /// Iterate over enabled constraints
    pub fn constraints_iter(&self) -> impl Iterator<Item = &SketchConstraint> {
        self.constraints.iter().filter(|c| c.enabled)
    }

    /// Get a constraint by ID
    pub fn constraint(&self, id: Uuid) -> Option<&SketchConstraint> {
        self.constraints.iter().find(|c| c.id == id)
    }

    /// Add a constraint after validating its references, then re-solve
    pub fn add_constraint(&mut self, constraint: SketchConstraint) -> SketchResult<Uuid> {
        let expected = constraint.kind.entity_count();
        if constraint.entity_ids.len() != expected {
            return Err(SketchError::InvalidConstraint(format!(
                "{} constraint takes {} entities, got {}",
                constraint.type_name(),
                expected,
                constraint.entity_ids.len()
            )));
        }
        for entity_id in &constraint.entity_ids {
            let entity = self
                .entity(*entity_id)
                .ok_or(SketchError::EntityNotFound(*entity_id))?;
            if constraint.is_solvable() && !entity.is_line() {
                return Err(SketchError::WrongEntityType {
                    id: *entity_id,
                    expected: "Line",
                    found: entity.type_name(),
                });
            }
        }
        if self.constraints.iter().any(|c| c.id == constraint.id) {
            return Err(SketchError::InvalidConstraint(format!(
                "duplicate constraint id {}",
                constraint.id
            )));
        }

        let id = constraint.id;
        debug!("Added {} constraint {}", constraint.type_name(), id);
        self.constraints.push(constraint);
        self.solve_all_constraints();
        Ok(id)
    }

    /// Constrain a line to be vertical
    pub fn add_vertical_constraint(&mut self, entity_id: Uuid) -> SketchResult<Uuid> {
        self.add_constraint(SketchConstraint::vertical(entity_id))
    }

    /// Constrain a line to be horizontal
    pub fn add_horizontal_constraint(&mut self, entity_id: Uuid) -> SketchResult<Uuid> {
        self.add_constraint(SketchConstraint::horizontal(entity_id))
    }

    /// Remove a constraint
    pub fn remove_constraint(&mut self, id: Uuid) -> Option<SketchConstraint> {
        let index = self.constraints.iter().position(|c| c.id == id)?;
        Some(self.constraints.remove(index))
    }

    /// Enable or disable a constraint; enabling re-solves the sketch
    pub fn set_constraint_enabled(&mut self, id: Uuid, enabled: bool) -> SketchResult<()> {
        let constraint = self
            .constraints
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(SketchError::ConstraintNotFound(id))?;
        constraint.enabled = enabled;
        if enabled {
            self.solve_all_constraints();
        }
        Ok(())
    }

    /// Run the relaxation solver over every enabled constraint
    pub fn solve_all_constraints(&mut self) -> SolveResult {
        ConstraintSolver::from_config(&self.config).solve(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f64, y: f64) -> DVec2 {
        DVec2::new(x, y)
    }

    #[test]
    fn test_acquire_reuses_node_within_box() {
        let mut sketch = Sketch::new();
        let snap = sketch.config().snap_distance;

        let a = sketch.acquire_node(v(1.0, 1.0));
        let b = sketch.acquire_node(v(1.0 + snap * 0.5, 1.0 - snap * 0.5));
        assert_eq!(a, b);
        assert_eq!(sketch.nodes().len(), 1);

        let c = sketch.acquire_node(v(1.0 + snap * 2.0, 1.0));
        assert_ne!(a, c);
    }

    #[test]
    fn test_acquire_box_merges_along_diagonal() {
        let mut sketch = Sketch::new();
        let snap = sketch.config().snap_distance;

        let a = sketch.acquire_node(v(0.0, 0.0));
        // Euclidean distance is ~1.27 * snap, still inside the per-axis box
        let b = sketch.acquire_node(v(snap * 0.9, snap * 0.9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_acquire_returns_first_created_node() {
        let mut sketch = Sketch::new();
        let snap = sketch.config().snap_distance;

        let first = sketch.acquire_node(v(0.0, 0.0));
        let second = sketch.acquire_node(v(snap * 1.5, 0.0));
        assert_ne!(first, second);

        // Inside both boxes; the older node wins
        let probe = sketch.acquire_node(v(snap * 0.75, 0.0));
        assert_eq!(probe, first);
    }

    #[test]
    fn test_shared_endpoints_merge() {
        let mut sketch = Sketch::new();
        let l1 = sketch.add_line(v(0.0, 0.0), v(10.0, 0.0)).unwrap();
        let l2 = sketch.add_line(v(10.0, 0.0), v(10.0, 10.0)).unwrap();

        assert_eq!(sketch.nodes().len(), 3);
        let (_, end1) = sketch.entity(l1).unwrap().line_nodes().unwrap();
        let (start2, _) = sketch.entity(l2).unwrap().line_nodes().unwrap();
        assert_eq!(end1, start2);

        assert_eq!(sketch.entity(l1).unwrap().connections, vec![l2]);
        assert_eq!(sketch.entity(l2).unwrap().connections, vec![l1]);
    }

    #[test]
    fn test_degenerate_input_allocates_nothing() {
        let mut sketch = Sketch::new();

        let line = sketch.add_line(v(1.0, 1.0), v(1.0, 1.0));
        assert!(matches!(line, Err(SketchError::Degenerate(_))));
        let circle = sketch.add_circle(v(0.0, 0.0), 0.0);
        assert!(matches!(circle, Err(SketchError::Degenerate(_))));
        let circle = sketch.add_circle(v(0.0, 0.0), -3.0);
        assert!(matches!(circle, Err(SketchError::Degenerate(_))));
        let rect = sketch.add_rectangle(v(0.0, 0.0), 5.0, 0.0);
        assert!(matches!(rect, Err(SketchError::Degenerate(_))));
        let poly = sketch.add_polyline(&[v(0.0, 0.0)], false);
        assert!(matches!(poly, Err(SketchError::Degenerate(_))));

        assert!(sketch.nodes().is_empty());
        assert!(sketch.entities().is_empty());
    }

    #[test]
    fn test_snapped_collapse_rolls_back_nodes() {
        let mut sketch = Sketch::new();
        let snap = sketch.config().snap_distance;
        sketch.add_point(v(0.0, 0.0)).unwrap();

        // Both vertices are more than a snap apart but both land on the point's node
        let result = sketch.add_polyline(
            &[v(-snap * 0.9, 0.0), v(snap * 0.9, 0.0), v(5.0, 5.0)],
            false,
        );
        assert!(matches!(result, Err(SketchError::Degenerate(_))));
        assert_eq!(sketch.nodes().len(), 1);
        assert_eq!(sketch.entities().len(), 1);
    }

    #[test]
    fn test_remove_entity_cleans_orphans() {
        let mut sketch = Sketch::new();
        let l1 = sketch.add_line(v(0.0, 0.0), v(10.0, 0.0)).unwrap();
        let l2 = sketch.add_line(v(10.0, 0.0), v(10.0, 10.0)).unwrap();

        sketch.remove_entity(l1).unwrap();
        assert_eq!(sketch.nodes().len(), 2);
        assert!(sketch.entity(l2).unwrap().connections.is_empty());

        sketch.remove_entity(l2).unwrap();
        assert!(sketch.nodes().is_empty());
        assert!(sketch.remove_entity(l2).is_none());
    }

    #[test]
    fn test_remove_entity_drops_its_constraints() {
        let mut sketch = Sketch::new();
        let line = sketch.add_line(v(0.0, 0.0), v(0.5, 10.0)).unwrap();
        sketch.add_vertical_constraint(line).unwrap();
        assert_eq!(sketch.constraints().len(), 1);

        sketch.remove_entity(line);
        assert!(sketch.constraints().is_empty());
    }

    #[test]
    fn test_rectangle_points_are_derived() {
        let mut sketch = Sketch::new();
        let rect = sketch.add_rectangle(v(1.0, 2.0), 4.0, -3.0).unwrap();

        assert_eq!(sketch.nodes().len(), 1);
        let points = sketch.entity_points(rect).unwrap();
        assert_eq!(
            points,
            vec![v(1.0, 2.0), v(5.0, 2.0), v(5.0, -1.0), v(1.0, -1.0)]
        );
        let segments = sketch.entity_segments(sketch.entity(rect).unwrap());
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[3], (v(1.0, -1.0), v(1.0, 2.0)));
    }

    #[test]
    fn test_update_entity() {
        let mut sketch = Sketch::new();
        let circle = sketch.add_circle(v(0.0, 0.0), 2.0).unwrap();
        let line = sketch.add_line(v(0.0, 0.0), v(4.0, 0.0)).unwrap();

        sketch.update_entity(circle, EntityUpdate::radius(3.5)).unwrap();
        assert!(matches!(
            sketch.entity(circle).unwrap().geometry,
            SketchGeometry::Circle { radius, .. } if radius == 3.5
        ));

        let err = sketch.update_entity(line, EntityUpdate::radius(1.0));
        assert!(matches!(err, Err(SketchError::WrongEntityType { .. })));

        let err = sketch.update_entity(circle, EntityUpdate::radius(0.0));
        assert!(matches!(err, Err(SketchError::Degenerate(_))));

        let err = sketch.update_entity(Uuid::new_v4(), EntityUpdate::construction(true));
        assert!(matches!(err, Err(SketchError::EntityNotFound(_))));
    }

    #[test]
    fn test_construction_drops_connections() {
        let mut sketch = Sketch::new();
        let l1 = sketch.add_line(v(0.0, 0.0), v(10.0, 0.0)).unwrap();
        let l2 = sketch.add_line(v(10.0, 0.0), v(10.0, 10.0)).unwrap();

        sketch.set_construction(l2, true).unwrap();
        assert!(sketch.entity(l1).unwrap().connections.is_empty());
        assert!(sketch.entity(l2).unwrap().connections.is_empty());
        // Shared node is still shared
        assert_eq!(sketch.nodes().len(), 3);
    }

    #[test]
    fn test_move_node_respects_fixed() {
        let mut sketch = Sketch::new();
        let line = sketch.add_line(v(0.0, 0.0), v(10.0, 0.0)).unwrap();
        let (start, _) = sketch.entity(line).unwrap().line_nodes().unwrap();

        sketch.move_node(start, v(1.0, 1.0)).unwrap();
        assert_eq!(sketch.node_position(start), Some(v(1.0, 1.0)));

        sketch.set_node_fixed(start, true).unwrap();
        assert_eq!(
            sketch.move_node(start, v(2.0, 2.0)),
            Err(SketchError::NodeFixed(start))
        );
        assert_eq!(sketch.node_position(start), Some(v(1.0, 1.0)));
    }

    #[test]
    fn test_constraint_validation() {
        let mut sketch = Sketch::new();
        let circle = sketch.add_circle(v(0.0, 0.0), 2.0).unwrap();

        let err = sketch.add_vertical_constraint(circle);
        assert!(matches!(err, Err(SketchError::WrongEntityType { .. })));

        let err = sketch.add_horizontal_constraint(Uuid::new_v4());
        assert!(matches!(err, Err(SketchError::EntityNotFound(_))));

        let err = sketch.add_constraint(SketchConstraint::new(ConstraintKind::Parallel, vec![circle]));
        assert!(matches!(err, Err(SketchError::InvalidConstraint(_))));

        // Declared kinds are stored even though they are not solved
        sketch.add_constraint(SketchConstraint::radius(circle, 3.0)).unwrap();
        assert_eq!(sketch.constraints().len(), 1);
    }

    #[test]
    fn test_disable_constraint() {
        let mut sketch = Sketch::new();
        let line = sketch.add_line(v(0.0, 0.0), v(10.0, 5.0)).unwrap();
        let id = sketch.add_horizontal_constraint(line).unwrap();

        sketch.set_constraint_enabled(id, false).unwrap();
        assert_eq!(sketch.constraints_iter().count(), 0);
        assert!(sketch.remove_constraint(id).is_some());
        assert_eq!(
            sketch.set_constraint_enabled(id, true),
            Err(SketchError::ConstraintNotFound(id))
        );
    }
}
