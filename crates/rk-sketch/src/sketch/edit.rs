//! Sketch editing operations
//!
//! Trim, extend and offset work on the shared node graph. Trim deletes its
//! target and re-inserts the surviving pieces as new lines; extend moves a
//! node in place; offset always creates a new entity next to the original.

use glam::DVec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{Sketch, SketchGeometry};
use crate::constants::GEOMETRY_EPSILON;
use crate::geometry::{
    distance_to_polyline, in_open_unit_range, in_unit_range, intersect_line_circle,
    intersect_line_line, left_normal, point_at, project_point_on_line,
};

/// Ids touched by an applied edit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditReport {
    /// Entities inserted by the edit
    pub created: Vec<Uuid>,
    /// Entities deleted by the edit
    pub removed: Vec<Uuid>,
    /// Nodes whose coordinates changed
    pub moved_nodes: Vec<Uuid>,
}

/// Result of an editing operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EditOutcome {
    /// The sketch was changed
    Applied(EditReport),
    /// The target entity does not exist
    NotFound,
    /// The target exists but the operation does not apply to its type
    WrongType,
    /// Nothing to trim against or extend to
    NoIntersection,
    /// The result would be smaller than the minimum entity size
    Degenerate,
    /// The operation would move a fixed node
    NodeFixed,
}

impl EditOutcome {
    /// Whether the sketch was changed
    pub fn is_applied(&self) -> bool {
        matches!(self, EditOutcome::Applied(_))
    }

    /// Report of an applied edit
    pub fn report(&self) -> Option<&EditReport> {
        match self {
            EditOutcome::Applied(report) => Some(report),
            _ => None,
        }
    }
}

/// Geometry a trim or extend target is intersected against
#[derive(Debug, Clone, Copy)]
enum Cutter {
    Segment(DVec2, DVec2),
    Circle { center: DVec2, radius: f64 },
}

impl Sketch {
    /// Segments and circles of every entity except `exclude`
    fn cutters(&self, exclude: Uuid) -> Vec<Cutter> {
        let mut cutters = Vec::new();
        for entity in self.entities.iter().filter(|e| e.id != exclude) {
            match &entity.geometry {
                SketchGeometry::Circle { center, radius } => {
                    if let Some(center) = self.node_position(*center) {
                        cutters.push(Cutter::Circle {
                            center,
                            radius: *radius,
                        });
                    }
                }
                _ => cutters.extend(
                    self.entity_segments(entity)
                        .into_iter()
                        .map(|(a, b)| Cutter::Segment(a, b)),
                ),
            }
        }
        cutters
    }

    // ============== Trim ==============

    /// Cut the clicked piece out of a line, polyline or rectangle
    ///
    /// The segment nearest `click` is split at every crossing with other
    /// geometry and the fragment nearest `click` is dropped. The target is
    /// always deleted; surviving fragments and, for polylines and
    /// rectangles, every other segment come back as independent lines.
    pub fn trim_entity(&mut self, target: Uuid, click: DVec2) -> EditOutcome {
        let Some(entity) = self.entity(target) else {
            return EditOutcome::NotFound;
        };
        if !matches!(
            entity.geometry,
            SketchGeometry::Line { .. }
                | SketchGeometry::Polyline { .. }
                | SketchGeometry::Rectangle { .. }
        ) {
            warn!("Trim is not supported on {}", entity.type_name());
            return EditOutcome::WrongType;
        }

        let construction = entity.construction;
        let segments = self.entity_segments(entity);
        let Some(clicked) = nearest_segment(&segments, click) else {
            return EditOutcome::Degenerate;
        };

        // Gathered before anything is removed
        let mut cutters = self.cutters(target);
        cutters.extend(
            segments
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != clicked)
                .map(|(_, (a, b))| Cutter::Segment(*a, *b)),
        );

        let (a, b) = segments[clicked];
        let params = split_parameters(a, b, &cutters);
        let fragments: Vec<(DVec2, DVec2)> = params
            .windows(2)
            .map(|pair| (point_at(a, b, pair[0]), point_at(a, b, pair[1])))
            .collect();
        let dropped = nearest_segment(&fragments, click).unwrap_or(0);
        debug!(
            "Trimming {} at {} split points, dropping fragment {}",
            target,
            params.len() - 2,
            dropped
        );

        let survivors: Vec<(DVec2, DVec2)> = fragments
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != dropped)
            .map(|(_, fragment)| *fragment)
            .chain(
                segments
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != clicked)
                    .map(|(_, segment)| *segment),
            )
            .filter(|(p, q)| p.distance(*q) > self.config.min_fragment_length)
            .collect();

        // Target goes first so its unshared endpoints cannot capture a split point
        self.remove_entity(target);
        let mut created = Vec::new();
        for (p, q) in survivors {
            match self.add_line(p, q) {
                Ok(id) => {
                    if construction {
                        let _ = self.set_construction(id, true);
                    }
                    created.push(id);
                }
                Err(err) => debug!("Skipping trim fragment: {}", err),
            }
        }

        info!("Trimmed {}: {} lines created", target, created.len());
        EditOutcome::Applied(EditReport {
            created,
            removed: vec![target],
            moved_nodes: Vec::new(),
        })
    }

    // ============== Extend ==============

    /// Extend a line from the endpoint nearest `click` to the next geometry
    ///
    /// The endpoint's node is moved, so every entity sharing it follows.
    pub fn extend_entity(&mut self, target: Uuid, click: DVec2) -> EditOutcome {
        let Some(entity) = self.entity(target) else {
            return EditOutcome::NotFound;
        };
        let Some((start, end)) = entity.line_nodes() else {
            warn!("Extend is not supported on {}", entity.type_name());
            return EditOutcome::WrongType;
        };
        let (Some(start_pos), Some(end_pos)) = (self.node_position(start), self.node_position(end))
        else {
            return EditOutcome::NotFound;
        };

        let (moving, moving_pos, anchor_pos) =
            if click.distance(start_pos) <= click.distance(end_pos) {
                (start, start_pos, end_pos)
            } else {
                (end, end_pos, start_pos)
            };
        let length = anchor_pos.distance(moving_pos);
        if length < GEOMETRY_EPSILON {
            return EditOutcome::Degenerate;
        }
        if self.node(moving).is_some_and(|node| node.fixed) {
            warn!("Cannot extend {}: node {} is fixed", target, moving);
            return EditOutcome::NodeFixed;
        }

        let direction = (moving_pos - anchor_pos) / length;
        let ray_end = moving_pos + direction * length * self.config.extend_ray_factor;

        let nearest = self
            .cutters(target)
            .into_iter()
            .flat_map(|cutter| ray_hits(moving_pos, ray_end, cutter))
            .min_by(f64::total_cmp);
        let Some(t) = nearest else {
            debug!("Nothing ahead of {} to extend to", target);
            return EditOutcome::NoIntersection;
        };

        let point = point_at(moving_pos, ray_end, t);
        if let Some(node) = self.node_mut(moving) {
            node.set_position(point);
        }
        info!("Extended {} to ({}, {})", target, point.x, point.y);
        EditOutcome::Applied(EditReport {
            moved_nodes: vec![moving],
            ..Default::default()
        })
    }

    // ============== Offset ==============

    /// Create a copy of an entity `distance` away, on the side of `side_point`
    ///
    /// Lines produce a parallel line, polylines and rectangles a mitred
    /// polyline, circles a concentric circle. The original is never changed.
    pub fn offset_entity(&mut self, target: Uuid, distance: f64, side_point: DVec2) -> EditOutcome {
        let Some(entity) = self.entity(target) else {
            return EditOutcome::NotFound;
        };
        let geometry = entity.geometry.clone();
        if matches!(
            geometry,
            SketchGeometry::Arc { .. } | SketchGeometry::Spline { .. } | SketchGeometry::Point { .. }
        ) {
            warn!("Offset is not supported on {}", geometry.type_name());
            return EditOutcome::WrongType;
        }
        let distance = distance.abs();
        if distance < self.config.min_entity_size {
            return EditOutcome::Degenerate;
        }

        match geometry {
            SketchGeometry::Line { start, end } => {
                let (Some(a), Some(b)) = (self.node_position(start), self.node_position(end)) else {
                    return EditOutcome::NotFound;
                };
                let Some(normal) = left_normal(b - a) else {
                    return EditOutcome::Degenerate;
                };
                let midpoint = (a + b) * 0.5;
                let shift = normal * distance;
                let shift = if (midpoint + shift).distance(side_point)
                    <= (midpoint - shift).distance(side_point)
                {
                    shift
                } else {
                    -shift
                };
                let created = self.add_line(a + shift, b + shift).ok();
                offset_outcome(target, created)
            }
            SketchGeometry::Polyline { .. } | SketchGeometry::Rectangle { .. } => {
                self.offset_chain_entity(target, distance, side_point)
            }
            SketchGeometry::Circle { center, radius } => {
                let Some(center_pos) = self.node_position(center) else {
                    return EditOutcome::NotFound;
                };
                let radius = if center_pos.distance(side_point) > radius {
                    radius + distance
                } else {
                    radius - distance
                };
                if radius <= self.config.min_entity_size {
                    debug!("Offset of {} would collapse the circle", target);
                    return EditOutcome::Degenerate;
                }
                let created = self.add_circle(center_pos, radius).ok();
                offset_outcome(target, created)
            }
            _ => EditOutcome::WrongType,
        }
    }

    /// Offset a polyline or rectangle as one mitred chain
    pub fn offset_chain_entity(
        &mut self,
        target: Uuid,
        distance: f64,
        side_point: DVec2,
    ) -> EditOutcome {
        let Some(entity) = self.entity(target) else {
            return EditOutcome::NotFound;
        };
        let closed = match &entity.geometry {
            SketchGeometry::Polyline { closed, .. } => *closed,
            SketchGeometry::Rectangle { .. } => true,
            other => {
                warn!("Chain offset is not supported on {}", other.type_name());
                return EditOutcome::WrongType;
            }
        };
        let distance = distance.abs();
        if distance < self.config.min_entity_size {
            return EditOutcome::Degenerate;
        }
        let Some(points) = self.entity_points(target) else {
            return EditOutcome::NotFound;
        };

        let left = offset_chain(&points, closed, distance);
        let right = offset_chain(&points, closed, -distance);
        if left.is_empty() || right.is_empty() {
            return EditOutcome::Degenerate;
        }
        let chain = if distance_to_polyline(side_point, &left, closed)
            <= distance_to_polyline(side_point, &right, closed)
        {
            left
        } else {
            right
        };
        let created = self.add_polyline(&chain, closed).ok();
        offset_outcome(target, created)
    }

}

fn offset_outcome(target: Uuid, created: Option<Uuid>) -> EditOutcome {
    match created {
        Some(id) => {
            info!("Offset {} into {}", target, id);
            EditOutcome::Applied(EditReport {
                created: vec![id],
                ..Default::default()
            })
        }
        None => EditOutcome::Degenerate,
    }
}

/// Offset a chain of points by `distance` to the left of its direction
///
/// Each segment is shifted along its own normal and consecutive segments are
/// re-joined where their infinite extensions meet. Parallel neighbours join
/// at the raw shifted endpoint. Negative distances offset to the right.
/// Returns an empty list for chains too short to offset or with repeated
/// points.
pub fn offset_chain(points: &[DVec2], closed: bool, distance: f64) -> Vec<DVec2> {
    let n = points.len();
    if n < 2 || (closed && n < 3) {
        return Vec::new();
    }
    let segment_count = if closed { n } else { n - 1 };

    let mut shifted = Vec::with_capacity(segment_count);
    for i in 0..segment_count {
        let a = points[i];
        let b = points[(i + 1) % n];
        let Some(normal) = left_normal(b - a) else {
            return Vec::new();
        };
        shifted.push((a + normal * distance, b + normal * distance));
    }

    let join = |prev: (DVec2, DVec2), next: (DVec2, DVec2)| {
        intersect_line_line(prev.0, prev.1, next.0, next.1)
            .map(|hit| hit.point)
            .unwrap_or(prev.1)
    };

    if closed {
        (0..segment_count)
            .map(|i| join(shifted[(i + segment_count - 1) % segment_count], shifted[i]))
            .collect()
    } else {
        let mut result = Vec::with_capacity(n);
        result.push(shifted[0].0);
        for i in 1..segment_count {
            result.push(join(shifted[i - 1], shifted[i]));
        }
        result.push(shifted[segment_count - 1].1);
        result
    }
}

/// Index of the segment closest to `point`
fn nearest_segment(segments: &[(DVec2, DVec2)], point: DVec2) -> Option<usize> {
    segments
        .iter()
        .map(|(a, b)| project_point_on_line(point, *a, *b).distance)
        .enumerate()
        .min_by(|(_, x), (_, y)| x.total_cmp(y))
        .map(|(i, _)| i)
}

/// Sorted split parameters of `a -> b`, including both ends
fn split_parameters(a: DVec2, b: DVec2, cutters: &[Cutter]) -> Vec<f64> {
    let mut hits = Vec::new();
    for cutter in cutters {
        match *cutter {
            Cutter::Segment(p, q) => {
                if let Some(hit) = intersect_line_line(a, b, p, q)
                    && in_unit_range(hit.u)
                    && in_open_unit_range(hit.t)
                {
                    hits.push(hit.t);
                }
            }
            Cutter::Circle { center, radius } => hits.extend(
                intersect_line_circle(a, b, center, radius)
                    .into_iter()
                    .filter(|t| in_open_unit_range(*t)),
            ),
        }
    }
    hits.sort_by(f64::total_cmp);
    hits.dedup_by(|later, earlier| (*later - *earlier).abs() < GEOMETRY_EPSILON);

    let mut params = Vec::with_capacity(hits.len() + 2);
    params.push(0.0);
    params.extend(hits);
    params.push(1.0);
    params
}

/// Parameters along the ray `origin -> ray_end` where it meets `cutter`,
/// strictly ahead of the origin
fn ray_hits(origin: DVec2, ray_end: DVec2, cutter: Cutter) -> Vec<f64> {
    let ahead = |t: f64| t > GEOMETRY_EPSILON && t <= 1.0 + GEOMETRY_EPSILON;
    match cutter {
        Cutter::Segment(p, q) => intersect_line_line(origin, ray_end, p, q)
            .filter(|hit| in_unit_range(hit.u) && ahead(hit.t))
            .map(|hit| hit.t)
            .into_iter()
            .collect(),
        Cutter::Circle { center, radius } => intersect_line_circle(origin, ray_end, center, radius)
            .into_iter()
            .filter(|t| ahead(*t))
            .collect(),
    }
}
