//! Global constants for rk-sketch

/// Tolerance used by every geometric comparison in the kernel
pub const GEOMETRY_EPSILON: f64 = 1e-9;

/// Per-axis distance under which an acquired coordinate reuses an existing node
pub const SNAP_DISTANCE: f64 = 0.01;

/// Smallest line length, radius or rectangle side accepted at creation time
pub const MIN_ENTITY_SIZE: f64 = 1e-6;

/// Trim fragments shorter than this are not re-created
pub const MIN_FRAGMENT_LENGTH: f64 = 1e-4;

/// Extend casts its ray this many line lengths past the moving endpoint
pub const EXTEND_RAY_FACTOR: f64 = 1000.0;

/// Maximum number of relaxation passes per solve
pub const SOLVER_MAX_ITERATIONS: usize = 10;

/// Total constraint error under which the solver stops
pub const SOLVER_TOLERANCE: f64 = 1e-9;

/// Maximum depth-first expansions per start node during cycle search
pub const CONTOUR_STEP_BUDGET: usize = 5000;

/// Number of polygon vertices used to approximate a circle profile
pub const CIRCLE_SEGMENTS: u32 = 64;
