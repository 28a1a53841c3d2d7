//! Utility modules for rust_tdbastar

pub mod visualization;

pub use visualization::{colors, PathStyle, Visualizer};
