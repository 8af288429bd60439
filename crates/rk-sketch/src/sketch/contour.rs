//! Closed contour detection
//!
//! Finds the closed profiles of a sketch. Rectangles, circles and closed
//! polylines are closed by themselves; loops built from separate lines and
//! open polylines are found by a bounded depth-first cycle search over the
//! node graph. Construction geometry never takes part.

use std::collections::{HashMap, HashSet};

use glam::DVec2;
use tracing::debug;
use uuid::Uuid;

use super::{Sketch, SketchGeometry, rectangle_corners};
use crate::config::SketchConfig;
use crate::constants::{CIRCLE_SEGMENTS, CONTOUR_STEP_BUDGET};
use crate::geometry::circle_polygon;

/// Undirected node graph with neighbours in insertion order
#[derive(Debug, Default)]
struct NodeGraph {
    neighbours: HashMap<Uuid, Vec<Uuid>>,
    /// Nodes in order of first appearance
    order: Vec<Uuid>,
}

impl NodeGraph {
    fn touch(&mut self, node: Uuid) {
        if !self.neighbours.contains_key(&node) {
            self.neighbours.insert(node, Vec::new());
            self.order.push(node);
        }
    }

    fn add_edge(&mut self, a: Uuid, b: Uuid) {
        if a == b {
            return;
        }
        self.touch(a);
        self.touch(b);
        for (from, to) in [(a, b), (b, a)] {
            if let Some(list) = self.neighbours.get_mut(&from)
                && !list.contains(&to)
            {
                list.push(to);
            }
        }
    }

    fn neighbours(&self, node: Uuid) -> &[Uuid] {
        self.neighbours.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    fn degree(&self, node: Uuid) -> usize {
        self.neighbours(node).len()
    }
}

/// Canonical key of a cycle: its sorted node ids
fn cycle_key(nodes: &[Uuid]) -> String {
    let mut ids: Vec<String> = nodes.iter().map(Uuid::to_string).collect();
    ids.sort();
    ids.join(",")
}

/// Depth-first cycle search from a single start node
struct CycleSearch<'a> {
    graph: &'a NodeGraph,
    start: Uuid,
    budget: usize,
    steps: usize,
    path: Vec<Uuid>,
    on_path: HashSet<Uuid>,
    found: Vec<Vec<Uuid>>,
}

impl<'a> CycleSearch<'a> {
    fn run(graph: &'a NodeGraph, start: Uuid, budget: usize) -> Vec<Vec<Uuid>> {
        let mut search = Self {
            graph,
            start,
            budget,
            steps: 0,
            path: vec![start],
            on_path: HashSet::from([start]),
            found: Vec::new(),
        };
        search.walk(start, None);
        if search.steps >= budget {
            debug!("Cycle search from {} stopped at the step budget", start);
        }
        search.found
    }

    fn walk(&mut self, current: Uuid, previous: Option<Uuid>) {
        let graph = self.graph;
        for &next in graph.neighbours(current) {
            if self.steps >= self.budget {
                return;
            }
            self.steps += 1;

            if Some(next) == previous {
                continue;
            }
            if next == self.start {
                if self.path.len() >= 3 {
                    self.found.push(self.path.clone());
                }
                continue;
            }
            if self.on_path.contains(&next) {
                continue;
            }

            self.path.push(next);
            self.on_path.insert(next);
            self.walk(next, Some(current));
            self.on_path.remove(&next);
            self.path.pop();
        }
    }
}

/// Detects closed profiles in a sketch
#[derive(Debug, Clone)]
pub struct ContourDetector {
    /// Maximum neighbour expansions per start node
    step_budget: usize,
    /// Points used to approximate a circle
    circle_segments: u32,
}

impl Default for ContourDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ContourDetector {
    /// Create a detector with default parameters
    pub fn new() -> Self {
        Self {
            step_budget: CONTOUR_STEP_BUDGET,
            circle_segments: CIRCLE_SEGMENTS,
        }
    }

    /// Create a detector using a sketch configuration
    pub fn from_config(config: &SketchConfig) -> Self {
        Self {
            step_budget: config.contour_step_budget,
            circle_segments: config.circle_segments,
        }
    }

    /// Set the per-start-node expansion budget
    ///
    /// The search is exhaustive only while the budget is not reached; dense
    /// graphs can lose cycles.
    pub fn with_step_budget(mut self, step_budget: usize) -> Self {
        self.step_budget = step_budget;
        self
    }

    /// Set the number of points used for circles
    pub fn with_circle_segments(mut self, circle_segments: u32) -> Self {
        self.circle_segments = circle_segments.max(3);
        self
    }

    /// Find every closed contour as a polygon of current node positions
    pub fn detect(&self, sketch: &Sketch) -> Vec<Vec<DVec2>> {
        let mut graph = NodeGraph::default();
        let mut contours = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for entity in sketch.entities().iter().filter(|e| !e.construction) {
            match &entity.geometry {
                SketchGeometry::Line { start, end } => graph.add_edge(*start, *end),
                SketchGeometry::Polyline { nodes, closed } => {
                    for pair in nodes.windows(2) {
                        graph.add_edge(pair[0], pair[1]);
                    }
                    if *closed && nodes.len() > 2 {
                        if let (Some(first), Some(last)) = (nodes.first(), nodes.last()) {
                            graph.add_edge(*last, *first);
                        }
                        if seen.insert(cycle_key(nodes))
                            && let Some(points) = resolve(sketch, nodes)
                        {
                            contours.push(points);
                        }
                    }
                }
                SketchGeometry::Rectangle {
                    corner,
                    width,
                    height,
                } => {
                    if let Some(corner) = sketch.node_position(*corner) {
                        contours.push(rectangle_corners(corner, *width, *height).to_vec());
                    }
                }
                SketchGeometry::Circle { center, radius } => {
                    if let Some(center) = sketch.node_position(*center) {
                        contours.push(circle_polygon(center, *radius, self.circle_segments));
                    }
                }
                SketchGeometry::Arc { .. }
                | SketchGeometry::Spline { .. }
                | SketchGeometry::Point { .. } => {}
            }
        }

        for &start in &graph.order {
            if graph.degree(start) < 2 {
                continue;
            }
            for cycle in CycleSearch::run(&graph, start, self.step_budget) {
                if seen.insert(cycle_key(&cycle))
                    && let Some(points) = resolve(sketch, &cycle)
                {
                    contours.push(points);
                }
            }
        }

        debug!("Detected {} closed contours", contours.len());
        contours
    }
}

fn resolve(sketch: &Sketch, nodes: &[Uuid]) -> Option<Vec<DVec2>> {
    nodes.iter().map(|id| sketch.node_position(*id)).collect()
}

impl Sketch {
    /// Closed profiles of the sketch, using the configured search budget
    pub fn closed_contours(&self) -> Vec<Vec<DVec2>> {
        ContourDetector::from_config(&self.config).detect(self)
    }
}
