//! Lazily aligned primitives and their validity check

use nalgebra::DVector;

use crate::common::{Action, RobotModel, State};

use super::motion::MotionPrimitive;
use super::time_bench::{Stopwatch, TimeBenchmark};

/// Which primitive state is aligned with the offset's source state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// The first state
    Forward,
    /// The last state
    Backward,
}

/// A primitive paired with an alignment offset, rolled out on demand.
///
/// Borrows the primitive and the robot; nothing is materialized until
/// [`LazyTrajectory::states`] or [`LazyTrajectory::compute`] is called.
#[derive(Clone)]
pub struct LazyTrajectory<'a> {
    pub robot: &'a dyn RobotModel,
    pub motion: &'a MotionPrimitive,
    pub offset: DVector<f64>,
    pub direction: Direction,
}

impl<'a> LazyTrajectory<'a> {
    pub fn new(robot: &'a dyn RobotModel, motion: &'a MotionPrimitive, offset: DVector<f64>) -> Self {
        Self {
            robot,
            motion,
            offset,
            direction: Direction::Forward,
        }
    }

    /// Descriptor whose last state is aligned with the offset's source,
    /// for callers that grow trajectories towards a state instead of away
    /// from it. The forward search never builds one.
    pub fn backward(robot: &'a dyn RobotModel, motion: &'a MotionPrimitive, offset: DVector<f64>) -> Self {
        Self {
            direction: Direction::Backward,
            ..Self::new(robot, motion, offset)
        }
    }

    /// Offset applied to every primitive state
    pub fn effective_offset(&self) -> DVector<f64> {
        match self.direction {
            Direction::Forward => self.offset.clone(),
            Direction::Backward => self.robot.backward_offset(&self.offset, self.motion.last_state()),
        }
    }

    /// Aligned states, one at a time
    pub fn states(&self) -> impl Iterator<Item = State> + '_ {
        let offset = self.effective_offset();
        self.motion
            .states
            .iter()
            .map(move |x| self.robot.transform_state(&offset, x))
    }

    /// Aligned last state, if the robot can compute it without a rollout
    pub fn last_state(&self) -> Option<State> {
        self.robot
            .transform_last_state(&self.effective_offset(), &self.motion.states)
    }

    /// Write the aligned rollout into `rollout`, stopping before the first
    /// state rejected by `check_state`. Returns the number of states kept.
    pub fn compute(&self, rollout: &mut Rollout, check_state: Option<&dyn Fn(&State) -> bool>) -> usize {
        rollout.clear();
        for x in self.states() {
            if let Some(check) = check_state {
                if !check(&x) {
                    break;
                }
            }
            rollout.states.push(x);
        }
        let num_actions = rollout.states.len().saturating_sub(1);
        rollout
            .actions
            .extend(self.motion.actions.iter().take(num_actions).cloned());
        rollout.states.len()
    }
}

/// Reusable rollout buffer
#[derive(Debug, Clone, Default)]
pub struct Rollout {
    pub states: Vec<State>,
    pub actions: Vec<Action>,
}

impl Rollout {
    pub fn with_capacity(num_states: usize) -> Self {
        Self {
            states: Vec::with_capacity(num_states),
            actions: Vec::with_capacity(num_states.saturating_sub(1)),
        }
    }

    pub fn clear(&mut self) {
        self.states.clear();
        self.actions.clear();
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Validate an aligned primitive against bounds and obstacles.
///
/// 1. reject on the last state alone when the robot can predict it
/// 2. roll out, checking bounds per state (`check_state`) or afterwards
///    from the end towards the start
/// 3. collision check, through the shifted cached shape when allowed
///
/// Each stage is billed to its [`TimeBenchmark`] bucket. On success
/// `rollout` holds the full aligned primitive.
pub fn check_lazy_trajectory(
    lazy: &LazyTrajectory,
    time_bench: &mut TimeBenchmark,
    rollout: &mut Rollout,
    check_state: Option<&dyn Fn(&State) -> bool>,
    use_collision_shape: bool,
) -> bool {
    let robot = lazy.robot;

    let watch = Stopwatch::new();
    let last_state_valid = lazy
        .last_state()
        .map_or(true, |last| robot.is_state_valid(&last));
    time_bench.check_bounds += watch.elapsed_ms();
    if !last_state_valid {
        return false;
    }

    let watch = Stopwatch::new();
    let num_valid_states = lazy.compute(rollout, check_state);
    time_bench.time_transform_primitive += watch.elapsed_ms();

    let watch = Stopwatch::new();
    let bounds_valid = match check_state {
        Some(_) => num_valid_states >= lazy.motion.len(),
        None => rollout.states.iter().rev().all(|x| robot.is_state_valid(x)),
    };
    time_bench.check_bounds += watch.elapsed_ms();
    if !bounds_valid {
        return false;
    }

    let watch = Stopwatch::new();
    let shape = lazy
        .motion
        .collision_shape
        .as_ref()
        .filter(|_| use_collision_shape && robot.reuses_collision_shape());
    let collision_free = match shape {
        Some(shape) => {
            let shift = robot.translation(&lazy.effective_offset());
            !shape.collides(&shift, robot.environment())
        }
        None => rollout.states.iter().all(|x| robot.collision_free(x)),
    };
    time_bench.time_collisions += watch.elapsed_ms();
    time_bench.num_col_motions += 1;

    collision_free
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_planning::tdbastar::motion::compute_collision_shapes;
    use crate::robots::{Environment, Obstacle, Unicycle1};
    use nalgebra::{dvector, Vector2};

    fn robot(obstacles: Vec<Obstacle>) -> Unicycle1 {
        Unicycle1::new(Environment::new(
            Vector2::new(0.0, 0.0),
            Vector2::new(3.0, 3.0),
            obstacles,
        ))
    }

    fn straight(robot: &Unicycle1) -> MotionPrimitive {
        let mut motions = vec![MotionPrimitive::from_rollout(
            0,
            robot,
            dvector![0.0, 0.0, 0.0],
            vec![dvector![0.5, 0.0]; 10],
        )];
        compute_collision_shapes(&mut motions, robot);
        motions.remove(0)
    }

    #[test]
    fn test_forward_alignment_starts_at_source() {
        let robot = robot(Vec::new());
        let motion = straight(&robot);
        let x = dvector![1.0, 1.0, 0.0];
        let lazy = LazyTrajectory::new(&robot, &motion, robot.offset(&x));
        let states: Vec<State> = lazy.states().collect();
        assert_eq!(states.len(), 11);
        assert!(robot.distance(&states[0], &x) < 1e-12);
        assert!((states[10][0] - 1.5).abs() < 1e-12);
        let last = lazy.last_state().unwrap();
        assert!(robot.distance(&last, &states[10]) < 1e-12);
    }

    #[test]
    fn test_backward_alignment_ends_at_source() {
        let robot = robot(Vec::new());
        let motion = straight(&robot);
        let x = dvector![2.0, 1.0, 0.0];
        let lazy = LazyTrajectory::backward(&robot, &motion, robot.offset(&x));
        let states: Vec<State> = lazy.states().collect();
        assert!(robot.distance(&states[10], &x) < 1e-12);
        assert!((states[0][0] - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_compute_stops_at_first_invalid_state() {
        let robot = robot(Vec::new());
        let motion = straight(&robot);
        let lazy = LazyTrajectory::new(&robot, &motion, robot.offset(&dvector![2.78, 1.0, 0.0]));
        let mut rollout = Rollout::with_capacity(motion.len());
        let check = |x: &State| robot.is_state_valid(x);
        let num_valid = lazy.compute(&mut rollout, Some(&check));
        assert_eq!(num_valid, 5);
        assert_eq!(rollout.actions.len(), 4);

        let num_all = lazy.compute(&mut rollout, None);
        assert_eq!(num_all, 11);
        assert_eq!(rollout.actions.len(), 10);
    }

    #[test]
    fn test_out_of_bounds_is_rejected() {
        let robot = robot(Vec::new());
        let motion = straight(&robot);
        let lazy = LazyTrajectory::new(&robot, &motion, robot.offset(&dvector![2.78, 1.0, 0.0]));
        let mut bench = TimeBenchmark::default();
        let mut rollout = Rollout::default();
        assert!(!check_lazy_trajectory(&lazy, &mut bench, &mut rollout, None, true));
        // rejected before the collision stage
        assert_eq!(bench.num_col_motions, 0);
    }

    #[test]
    fn test_collision_paths_agree() {
        let robot = robot(vec![Obstacle::circle(1.8, 1.0, 0.2)]);
        let motion = straight(&robot);
        let check = |x: &State| robot.is_state_valid(x);
        let mut bench = TimeBenchmark::default();
        let mut rollout = Rollout::default();

        let blocked = LazyTrajectory::new(&robot, &motion, robot.offset(&dvector![1.0, 1.0, 0.0]));
        let clear = LazyTrajectory::new(&robot, &motion, robot.offset(&dvector![1.0, 2.5, 0.0]));
        for use_shape in [true, false] {
            assert!(!check_lazy_trajectory(&blocked, &mut bench, &mut rollout, Some(&check), use_shape));
            assert!(check_lazy_trajectory(&clear, &mut bench, &mut rollout, Some(&check), use_shape));
            assert_eq!(rollout.len(), motion.len());
        }
        assert_eq!(bench.num_col_motions, 4);
    }
}
