//! tdbastar: kinodynamic A* over a motion primitive library
//!
//! Primitives are short dynamically feasible trajectories for the
//! un-offset robot. The search aligns every primitive whose start is
//! within `alpha * delta` of a node, checks the aligned rollout lazily,
//! and merges states closer than `(1 - alpha) * delta` into one node.
//! Reaching the goal partway through a primitive is detected by sampling
//! the rollout, so the goal test is not limited to primitive ends.
//!
//! ```no_run
//! use std::path::Path;
//! use rust_tdbastar::path_planning::tdbastar::{load_primitives, tdbastar, Problem, TdbAStarOptions};
//! use rust_tdbastar::robots::robot_factory;
//!
//! # fn main() -> rust_tdbastar::common::PlanningResult<()> {
//! let problem = Problem::load(Path::new("problem.json"))?;
//! let robot = robot_factory(&problem.robot_type, &problem.env)?;
//! let motions = load_primitives(Path::new("motions.json"), robot.as_ref())?;
//! let out = tdbastar(&problem, &TdbAStarOptions::default(), &motions)?;
//! println!("solved: {} cost: {}", out.report.solved, out.report.cost);
//! # Ok(())
//! # }
//! ```

pub mod calibration;
pub mod expander;
pub mod heuristic;
pub mod lazy_traj;
pub mod motion;
pub mod nearest;
pub mod node;
pub mod options;
pub mod reconstruct;
pub mod search;
pub mod time_bench;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::{PlanningError, PlanningResult, State};
use crate::robots::Environment;

pub use calibration::{automatic_delta, filter_duplicates};
pub use expander::Expander;
pub use heuristic::{
    build_heuristic_map, check_goal, load_heu_map, write_heu_map, EuclideanHeuristic, HeuristicNode, RoadmapConfig,
    RoadmapHeuristic,
};
pub use lazy_traj::{check_lazy_trajectory, Direction, LazyTrajectory, Rollout};
pub use motion::{
    build_motion_index, check_motion_dimensions, check_motions, compute_collision_shapes, generate_primitives,
    load_primitives, save_primitives, MotionPrimitive,
};
pub use nearest::LinearNearest;
pub use node::{Node, NodeId, NodeStore, OpenSet, QueueHandle};
pub use options::{HeuristicKind, TdbAStarOptions};
pub use reconstruct::from_solution_to_trajectory;
pub use search::{tdbastar, tdbastar_with_robot, SearchReport, TdbAStarOutput, TerminateStatus};
pub use time_bench::TimeBenchmark;

/// One planning query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub name: String,
    /// Robot type string understood by [`crate::robots::robot_factory`]
    pub robot_type: String,
    pub start: State,
    pub goal: State,
    pub env: Environment,
}

impl Problem {
    pub fn load(path: &Path) -> PlanningResult<Self> {
        let file = std::fs::File::open(path).map_err(|e| PlanningError::io(path, e))?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }

    pub fn save(&self, path: &Path) -> PlanningResult<()> {
        let file = std::fs::File::create(path).map_err(|e| PlanningError::io(path, e))?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), self)?;
        Ok(())
    }
}
