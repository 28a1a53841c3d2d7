// Path Planning algorithms module

pub mod tdbastar;

pub use tdbastar::{tdbastar, tdbastar_with_robot, Problem, TdbAStarOptions, TdbAStarOutput};
