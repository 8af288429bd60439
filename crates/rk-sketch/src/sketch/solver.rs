//! Constraint Solver
//!
//! Gauss-Seidel style relaxation for axis-alignment constraints. Each pass
//! applies every enabled constraint once, snapping the two endpoints of a
//! constrained line to their average coordinate. There is no global system
//! solve, so conflicting constraints that share a node may oscillate until
//! the pass limit.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{ConstraintKind, Sketch, SketchNode};
use crate::config::SketchConfig;
use crate::constants::{SOLVER_MAX_ITERATIONS, SOLVER_TOLERANCE};

/// Result of solving sketch constraints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SolveResult {
    /// A pass measured total error below tolerance
    Converged {
        /// Passes run, including the final measuring pass
        passes: usize,
    },

    /// The pass limit was reached first
    NotConverged {
        /// Passes run
        passes: usize,
        /// Total error remaining after the last pass
        residual: f64,
    },
}

impl SolveResult {
    /// Whether the solver reached a fixed point
    pub fn is_converged(&self) -> bool {
        matches!(self, SolveResult::Converged { .. })
    }
}

#[derive(Debug, Clone, Copy)]
enum Axis {
    X,
    Y,
}

impl Axis {
    fn get(self, node: &SketchNode) -> f64 {
        match self {
            Axis::X => node.x,
            Axis::Y => node.y,
        }
    }

    fn set(self, node: &mut SketchNode, value: f64) {
        match self {
            Axis::X => node.x = value,
            Axis::Y => node.y = value,
        }
    }
}

/// A solvable constraint resolved to its line's nodes
#[derive(Debug, Clone, Copy)]
struct AxisTarget {
    axis: Axis,
    start: Uuid,
    end: Uuid,
}

/// Constraint solver using iterative relaxation
#[derive(Debug, Clone)]
pub struct ConstraintSolver {
    /// Total error below which solving stops
    tolerance: f64,
    /// Maximum number of passes
    max_iterations: usize,
}

impl Default for ConstraintSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstraintSolver {
    /// Create a new solver with default parameters
    pub fn new() -> Self {
        Self {
            tolerance: SOLVER_TOLERANCE,
            max_iterations: SOLVER_MAX_ITERATIONS,
        }
    }

    /// Create a solver using a sketch configuration
    pub fn from_config(config: &SketchConfig) -> Self {
        Self {
            tolerance: config.solver_tolerance,
            max_iterations: config.solver_max_iterations,
        }
    }

    /// Set the convergence tolerance
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the maximum passes
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Solve the constraints in the given sketch, moving its nodes in place
    pub fn solve(&self, sketch: &mut Sketch) -> SolveResult {
        let targets = Self::resolve_targets(sketch);
        if targets.is_empty() {
            return SolveResult::Converged { passes: 0 };
        }

        for pass in 1..=self.max_iterations {
            let total: f64 = targets
                .iter()
                .map(|target| self.relax(sketch, *target))
                .sum();

            if total < self.tolerance {
                debug!("Constraints converged after {} passes", pass);
                return SolveResult::Converged { passes: pass };
            }
        }

        let residual = Self::measure(sketch, &targets);
        if residual < self.tolerance {
            // The last pass fixed everything but did not get to measure it
            return SolveResult::Converged {
                passes: self.max_iterations,
            };
        }
        warn!(
            "Constraint solve stopped after {} passes with residual {}",
            self.max_iterations, residual
        );
        SolveResult::NotConverged {
            passes: self.max_iterations,
            residual,
        }
    }

    /// Resolve enabled axis constraints to node pairs; others are skipped
    fn resolve_targets(sketch: &Sketch) -> Vec<AxisTarget> {
        sketch
            .constraints_iter()
            .filter_map(|constraint| {
                let axis = match constraint.kind {
                    ConstraintKind::Vertical => Axis::X,
                    ConstraintKind::Horizontal => Axis::Y,
                    _ => return None,
                };
                let entity_id = constraint.entity_ids.first()?;
                let (start, end) = sketch.entity(*entity_id)?.line_nodes()?;
                Some(AxisTarget { axis, start, end })
            })
            .collect()
    }

    /// Apply one constraint and return the error it had before the update
    fn relax(&self, sketch: &mut Sketch, target: AxisTarget) -> f64 {
        let (Some(a), Some(b)) = (
            sketch.node(target.start).copied(),
            sketch.node(target.end).copied(),
        ) else {
            return 0.0;
        };

        let axis = target.axis;
        let diff = axis.get(&a) - axis.get(&b);
        if diff.abs() <= self.tolerance {
            return diff.abs();
        }

        let value = match (a.fixed, b.fixed) {
            (false, false) => (axis.get(&a) + axis.get(&b)) * 0.5,
            (true, false) => axis.get(&a),
            (false, true) => axis.get(&b),
            (true, true) => return diff.abs(),
        };
        for id in [target.start, target.end] {
            if let Some(node) = sketch.node_mut(id)
                && !node.fixed
            {
                axis.set(node, value);
            }
        }
        diff.abs()
    }

    fn measure(sketch: &Sketch, targets: &[AxisTarget]) -> f64 {
        targets
            .iter()
            .filter_map(|target| {
                let a = sketch.node(target.start)?;
                let b = sketch.node(target.end)?;
                Some((target.axis.get(a) - target.axis.get(b)).abs())
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sketch::SketchConstraint;
    use approx::assert_abs_diff_eq;
    use glam::DVec2;

    fn line_nodes(sketch: &Sketch, line: Uuid) -> (DVec2, DVec2) {
        let (s, e) = sketch.entity(line).unwrap().line_nodes().unwrap();
        (
            sketch.node_position(s).unwrap(),
            sketch.node_position(e).unwrap(),
        )
    }

    #[test]
    fn test_vertical_constraint_converges() {
        let mut sketch = Sketch::new();
        let line = sketch
            .add_line(DVec2::new(0.0, 0.0), DVec2::new(10.0, 5.0))
            .unwrap();

        sketch.add_vertical_constraint(line).unwrap();
        let (start, end) = line_nodes(&sketch, line);
        assert_abs_diff_eq!(start.x, end.x, epsilon = 1e-9);
        assert_abs_diff_eq!(start.x, 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(start.y, 0.0);
        assert_abs_diff_eq!(end.y, 5.0);

        // Already at the fixed point
        let result = sketch.solve_all_constraints();
        assert_eq!(result, SolveResult::Converged { passes: 1 });
        assert_eq!(line_nodes(&sketch, line), (start, end));
    }

    #[test]
    fn test_simple_horizontal_constraint() {
        let mut sketch = Sketch::new();
        let line = sketch
            .add_line(DVec2::new(0.0, 0.0), DVec2::new(10.0, 5.0))
            .unwrap();
        sketch
            .add_constraint(SketchConstraint::horizontal(line))
            .unwrap();

        let (start, end) = line_nodes(&sketch, line);
        assert_abs_diff_eq!(start.y, 2.5, epsilon = 1e-9);
        assert_abs_diff_eq!(end.y, 2.5, epsilon = 1e-9);
    }

    #[test]
    fn test_independent_constraints_converge_in_one_pass() {
        let mut sketch = Sketch::new();
        let a = sketch
            .add_line(DVec2::new(0.0, 0.0), DVec2::new(1.0, 10.0))
            .unwrap();
        let b = sketch
            .add_line(DVec2::new(20.0, 0.0), DVec2::new(30.0, 2.0))
            .unwrap();
        sketch.constraints.push(SketchConstraint::vertical(a));
        sketch.constraints.push(SketchConstraint::horizontal(b));

        // One correcting pass plus one measuring pass
        let result = ConstraintSolver::new().solve(&mut sketch);
        assert_eq!(result, SolveResult::Converged { passes: 2 });
    }

    #[test]
    fn test_fixed_node_is_not_moved() {
        let mut sketch = Sketch::new();
        let line = sketch
            .add_line(DVec2::new(0.0, 0.0), DVec2::new(10.0, 5.0))
            .unwrap();
        let (start_id, _) = sketch.entity(line).unwrap().line_nodes().unwrap();
        sketch.set_node_fixed(start_id, true).unwrap();

        sketch.add_horizontal_constraint(line).unwrap();
        let (start, end) = line_nodes(&sketch, line);
        assert_eq!(start, DVec2::new(0.0, 0.0));
        assert_abs_diff_eq!(end.y, 0.0);
    }

    #[test]
    fn test_both_fixed_does_not_converge() {
        let mut sketch = Sketch::new();
        let line = sketch
            .add_line(DVec2::new(0.0, 0.0), DVec2::new(10.0, 5.0))
            .unwrap();
        let (s, e) = sketch.entity(line).unwrap().line_nodes().unwrap();
        sketch.set_node_fixed(s, true).unwrap();
        sketch.set_node_fixed(e, true).unwrap();
        sketch.constraints.push(SketchConstraint::vertical(line));

        let result = ConstraintSolver::new()
            .with_max_iterations(4)
            .solve(&mut sketch);
        match result {
            SolveResult::NotConverged { passes, residual } => {
                assert_eq!(passes, 4);
                assert_abs_diff_eq!(residual, 10.0);
            }
            other => panic!("expected NotConverged, got {:?}", other),
        }
    }

    #[test]
    fn test_chained_constraints_are_bounded_by_pass_limit() {
        let mut sketch = Sketch::new();
        let a = sketch
            .add_line(DVec2::new(0.0, 0.0), DVec2::new(10.0, 10.0))
            .unwrap();
        let b = sketch
            .add_line(DVec2::new(10.0, 10.0), DVec2::new(20.0, 20.0))
            .unwrap();
        sketch.constraints.push(SketchConstraint::vertical(a));
        sketch.constraints.push(SketchConstraint::vertical(b));

        // The shared node is pulled back and forth and only settles geometrically
        let result = ConstraintSolver::new().solve(&mut sketch);
        match result {
            SolveResult::NotConverged { passes, residual } => {
                assert_eq!(passes, SOLVER_MAX_ITERATIONS);
                assert!(residual > 0.0 && residual < 20.0);
            }
            other => panic!("expected NotConverged, got {:?}", other),
        }

        // More passes shrink the residual further
        let result = ConstraintSolver::new()
            .with_max_iterations(200)
            .solve(&mut sketch);
        assert!(result.is_converged());
    }

    #[test]
    fn test_disabled_and_unsolved_constraints_are_skipped() {
        let mut sketch = Sketch::new();
        let line = sketch
            .add_line(DVec2::new(0.0, 0.0), DVec2::new(10.0, 5.0))
            .unwrap();
        let mut vertical = SketchConstraint::vertical(line);
        vertical.enabled = false;
        sketch.constraints.push(vertical);
        sketch.constraints.push(SketchConstraint::fixed(line));

        let result = ConstraintSolver::new().solve(&mut sketch);
        assert_eq!(result, SolveResult::Converged { passes: 0 });
        assert_eq!(
            line_nodes(&sketch, line),
            (DVec2::new(0.0, 0.0), DVec2::new(10.0, 5.0))
        );
    }
}
