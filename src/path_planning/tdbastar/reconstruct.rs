//! Back-trace a search node into one continuous trajectory

use tracing::debug;

use crate::common::error::ensure_consistent;
use crate::common::{PlanningError, PlanningResult, RobotModel, State, Trajectory};

use super::lazy_traj::LazyTrajectory;
use super::motion::MotionPrimitive;
use super::node::{NodeId, NodeStore};

/// Numeric tolerance between the stitched end and the terminal node
pub const RECONSTRUCTION_TOLERANCE: f64 = 1e-6;

/// Walk parent links from `solution` to the root and stitch the aligned
/// primitives of every edge.
///
/// Each segment is re-rolled from its parent node's state, cut at the
/// child's intermediate stop if any, and ends exactly at the child's
/// state, so consecutive segments share their boundary state.
pub fn from_solution_to_trajectory(
    robot: &dyn RobotModel,
    motions: &[MotionPrimitive],
    nodes: &NodeStore,
    solution: NodeId,
    start: &State,
    goal: &State,
) -> PlanningResult<Trajectory> {
    let path = nodes.path_to(solution)?;
    debug!(num_nodes = path.len(), "reconstructing solution");

    let mut traj = Trajectory::new();
    traj.start = start.clone();
    traj.goal = goal.clone();
    traj.states.push(nodes[path[0]].state.clone());

    for pair in path.windows(2) {
        let parent = &nodes[pair[0]];
        let child = &nodes[pair[1]];
        let motion = child
            .used_motion
            .and_then(|idx| motions.get(idx))
            .ok_or_else(|| {
                PlanningError::Consistency(format!("node {} has no valid primitive", pair[1].0))
            })?;

        let lazy = LazyTrajectory::new(robot, motion, robot.offset(&parent.state));
        let take = child.intermediate_state.map_or(motion.len(), |k| k + 1);
        ensure_consistent!(
            take >= 2 && take <= motion.len(),
            "cannot take {} states of primitive {} with {} states",
            take,
            motion.idx,
            motion.len()
        );

        traj.states
            .extend(lazy.states().take(take - 1).skip(1));
        traj.states.push(child.state.clone());
        traj.actions
            .extend(motion.actions.iter().take(take - 1).cloned());
    }

    ensure_consistent!(
        traj.states[0] == *start,
        "trajectory does not begin at the start state"
    );
    let terminal = &nodes[solution].state;
    let end_distance = traj
        .states
        .last()
        .map_or(f64::INFINITY, |last| robot.distance(last, terminal));
    ensure_consistent!(
        end_distance <= RECONSTRUCTION_TOLERANCE,
        "trajectory ends {} away from the terminal node",
        end_distance
    );
    ensure_consistent!(
        traj.actions.len() + 1 == traj.states.len(),
        "{} states for {} actions",
        traj.states.len(),
        traj.actions.len()
    );

    traj.cost = traj.actions.len() as f64 * robot.ref_dt();
    Ok(traj)
}
