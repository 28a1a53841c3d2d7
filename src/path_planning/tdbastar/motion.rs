//! Motion primitive library
//!
//! Primitives are short dynamically feasible trajectories for the
//! un-offset robot. They are created once (generated or loaded) and stay
//! read-only during the search; only duplicate filtering flips `disabled`.

use std::path::Path;

use nalgebra::DVector;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::common::{Action, NearestNeighbors, PlanningError, PlanningResult, RobotModel, State};
use crate::robots::CollisionShape;

use super::nearest::LinearNearest;

/// Precomputed short trajectory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionPrimitive {
    /// Position in the library
    pub idx: usize,
    pub states: Vec<State>,
    pub actions: Vec<Action>,
    pub cost: f64,
    #[serde(default)]
    pub disabled: bool,
    #[serde(skip)]
    pub collision_shape: Option<CollisionShape>,
}

impl MotionPrimitive {
    pub fn new(idx: usize, states: Vec<State>, actions: Vec<Action>, ref_dt: f64) -> Self {
        let cost = actions.len() as f64 * ref_dt;
        Self {
            idx,
            states,
            actions,
            cost,
            disabled: false,
            collision_shape: None,
        }
    }

    /// Roll out `actions` from `start` with the robot dynamics
    pub fn from_rollout(idx: usize, robot: &dyn RobotModel, start: State, actions: Vec<Action>) -> Self {
        let dt = robot.ref_dt();
        let mut states = Vec::with_capacity(actions.len() + 1);
        states.push(start);
        for u in &actions {
            let next = robot.step(&states[states.len() - 1], u, dt);
            states.push(next);
        }
        Self::new(idx, states, actions, dt)
    }

    pub fn first_state(&self) -> &State {
        &self.states[0]
    }

    pub fn last_state(&self) -> &State {
        &self.states[self.states.len() - 1]
    }

    /// Number of states
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Validate library invariants: non-empty, `idx` matches the position,
/// at least one action per primitive and one more state than actions.
pub fn check_motions(motions: &[MotionPrimitive]) -> PlanningResult<()> {
    if motions.is_empty() {
        return Err(PlanningError::Configuration(
            "motions should be loaded before calling tdbastar".to_string(),
        ));
    }
    for (position, motion) in motions.iter().enumerate() {
        if motion.idx != position {
            return Err(PlanningError::Configuration(format!(
                "motion at position {} has idx {}",
                position, motion.idx
            )));
        }
        if motion.actions.is_empty() || motion.states.len() != motion.actions.len() + 1 {
            return Err(PlanningError::Configuration(format!(
                "motion {} has {} states and {} actions",
                motion.idx,
                motion.states.len(),
                motion.actions.len()
            )));
        }
    }
    Ok(())
}

/// Reject primitives whose states or actions do not match the robot's
/// state and action dimensions.
pub fn check_motion_dimensions(motions: &[MotionPrimitive], robot: &dyn RobotModel) -> PlanningResult<()> {
    for motion in motions {
        let bad_state = motion.states.iter().find(|x| x.len() != robot.nx());
        let bad_action = motion.actions.iter().find(|u| u.len() != robot.nu());
        if let Some(x) = bad_state {
            return Err(PlanningError::Configuration(format!(
                "motion {} has a state of dimension {}, robot {} expects {}",
                motion.idx,
                x.len(),
                robot.name(),
                robot.nx()
            )));
        }
        if let Some(u) = bad_action {
            return Err(PlanningError::Configuration(format!(
                "motion {} has an action of dimension {}, robot {} expects {}",
                motion.idx,
                u.len(),
                robot.name(),
                robot.nu()
            )));
        }
    }
    Ok(())
}

/// Attach a translation-shiftable collision shape to every primitive when
/// the robot supports it.
pub fn compute_collision_shapes(motions: &mut [MotionPrimitive], robot: &dyn RobotModel) {
    if !robot.reuses_collision_shape() {
        return;
    }
    for motion in motions.iter_mut() {
        motion.collision_shape = robot.collision_shape(&motion.states);
    }
}

/// Random library: canonical random starts, constant random actions.
pub fn generate_primitives(
    robot: &dyn RobotModel,
    num_primitives: usize,
    num_steps: usize,
    rng: &mut dyn RngCore,
) -> Vec<MotionPrimitive> {
    let (u_lb, u_ub) = robot.action_bounds();
    let mut motions = Vec::with_capacity(num_primitives);
    for idx in 0..num_primitives {
        let start = robot.canonical_state(&robot.sample_state(rng));
        let u: Action = DVector::from_iterator(
            robot.nu(),
            u_lb.iter().zip(u_ub.iter()).map(|(lo, hi)| rng.gen_range(*lo..=*hi)),
        );
        let actions = vec![u; num_steps];
        motions.push(MotionPrimitive::from_rollout(idx, robot, start, actions));
    }
    compute_collision_shapes(&mut motions, robot);
    debug!(num_primitives, num_steps, "generated motion primitives");
    motions
}

/// Nearest-neighbor index over primitive start states, built from the
/// first `max_motions` enabled primitives.
pub fn build_motion_index<'a>(
    motions: &[MotionPrimitive],
    robot: &'a dyn RobotModel,
    max_motions: usize,
) -> LinearNearest<'a, usize> {
    let mut index = LinearNearest::with_robot(robot);
    for motion in motions.iter().take(max_motions).filter(|m| !m.disabled) {
        index.add(motion.first_state().clone(), motion.idx);
    }
    index
}

pub fn save_primitives(path: &Path, motions: &[MotionPrimitive]) -> PlanningResult<()> {
    let file = std::fs::File::create(path).map_err(|e| PlanningError::io(path, e))?;
    serde_json::to_writer(std::io::BufWriter::new(file), motions)?;
    Ok(())
}

/// Load a JSON library and recompute collision shapes for `robot`.
pub fn load_primitives(path: &Path, robot: &dyn RobotModel) -> PlanningResult<Vec<MotionPrimitive>> {
    let file = std::fs::File::open(path).map_err(|e| PlanningError::io(path, e))?;
    let mut motions: Vec<MotionPrimitive> = serde_json::from_reader(std::io::BufReader::new(file))?;
    check_motions(&motions)?;
    check_motion_dimensions(&motions, robot)?;
    compute_collision_shapes(&mut motions, robot);
    info!(path = %path.display(), num_primitives = motions.len(), "loaded motion primitives");
    Ok(motions)
}
