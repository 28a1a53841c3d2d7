//! rust_tdbastar - kinodynamic motion planning with motion primitives
//!
//! This crate provides tdbastar, an A* search that chains precomputed
//! motion primitives and checks them lazily against a 2D environment,
//! together with the robot models and tooling it needs.

// Core modules
pub mod common;
pub mod robots;
pub mod utils;

// Algorithm modules
pub mod path_planning;

// Re-export common types for convenience
pub use common::{Action, NearestNeighbors, Point2D, RobotModel, State};
pub use common::{PlanningError, PlanningResult, Trajectory};
pub use path_planning::{tdbastar, Problem, TdbAStarOptions};
