//! 2D Sketch Engine
//!
//! This crate provides:
//! - A node/entity topology store with snapped node sharing
//! - Trim, extend and offset editing on lines, polylines, rectangles and circles
//! - Vertical/horizontal constraint relaxation
//! - Closed contour (profile) detection
//! - RON/JSON snapshots of a sketch

pub mod config;
pub mod constants;
pub mod geometry;
pub mod sketch;

// Re-exports for convenience
pub use config::SketchConfig;
pub use sketch::{
    ConstraintKind, ConstraintSolver, ContourDetector, EditOutcome, EditReport, EntityUpdate,
    Sketch, SketchConstraint, SketchEntity, SketchError, SketchGeometry, SketchNode, SketchRecord,
    SketchResult, SolveResult, offset_chain,
};
