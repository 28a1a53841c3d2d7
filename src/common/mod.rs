//! Common types, traits, and error definitions for rust_tdbastar
//!
//! This module provides the foundational building blocks shared by the
//! search, the robot models and the output trajectory.

pub mod types;
pub mod traits;
pub mod error;
pub mod trajectory;

pub use types::*;
pub use traits::*;
pub use error::{PlanningError, PlanningResult};
pub use trajectory::{FeasibilityThresholds, Trajectory};
