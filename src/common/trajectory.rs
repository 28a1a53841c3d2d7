//! Output trajectory and its feasibility check

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::common::traits::RobotModel;
use crate::common::types::{Action, State};

/// Tolerances used to decide whether a trajectory is feasible
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeasibilityThresholds {
    /// Maximum allowed penetration into obstacles
    pub col_tol: f64,
    /// Maximum distance between the last state and the goal
    pub goal_tol: f64,
    /// Maximum dynamics violation between consecutive states
    pub traj_tol: f64,
}

impl Default for FeasibilityThresholds {
    fn default() -> Self {
        Self {
            col_tol: 1e-2,
            goal_tol: 1e-2,
            traj_tol: 1e-2,
        }
    }
}

/// Sequence of states and actions produced by the planner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trajectory {
    pub states: Vec<State>,
    pub actions: Vec<Action>,
    pub start: State,
    pub goal: State,
    /// Number of actions times the reference time step
    pub cost: f64,
    pub feasible: bool,
    pub start_distance: f64,
    pub goal_distance: f64,
    pub max_collision: f64,
    pub max_jump: f64,
    pub bounds_valid: bool,
}

impl Trajectory {
    pub fn new() -> Self {
        Self {
            states: Vec::new(),
            actions: Vec::new(),
            start: State::zeros(0),
            goal: State::zeros(0),
            cost: 0.0,
            feasible: false,
            start_distance: f64::INFINITY,
            goal_distance: f64::INFINITY,
            max_collision: f64::INFINITY,
            max_jump: f64::INFINITY,
            bounds_valid: false,
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Recompute start/goal distances, collision depth, dynamics violation
    /// and bounds, then decide feasibility against `thresholds`.
    pub fn update_feasibility(&mut self, robot: &dyn RobotModel, thresholds: &FeasibilityThresholds) {
        let (first, last) = match (self.states.first(), self.states.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => {
                self.feasible = false;
                return;
            }
        };

        self.start_distance = robot.distance(first, &self.start);
        self.goal_distance = robot.distance(last, &self.goal);

        self.max_collision = self
            .states
            .iter()
            .map(|x| (-robot.collision_distance(x)).max(0.0))
            .fold(0.0, f64::max);

        let dt = robot.ref_dt();
        self.max_jump = self
            .states
            .iter()
            .tuple_windows()
            .zip(self.actions.iter())
            .map(|((x, next), u)| robot.distance(&robot.step(x, u, dt), next))
            .fold(0.0, f64::max);

        self.bounds_valid = self.states.iter().all(|x| robot.is_state_valid(x));

        let sizes_match = self.actions.len() + 1 == self.states.len();

        self.feasible = sizes_match
            && self.bounds_valid
            && self.start_distance <= thresholds.traj_tol
            && self.goal_distance <= thresholds.goal_tol
            && self.max_collision <= thresholds.col_tol
            && self.max_jump <= thresholds.traj_tol;
    }
}

impl Default for Trajectory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::robots::{Environment, Integrator2D};
    use nalgebra::{dvector, Vector2};

    fn robot() -> Integrator2D {
        Integrator2D::new(Environment::empty(Vector2::new(-5.0, -5.0), Vector2::new(5.0, 5.0)))
    }

    fn straight_line(robot: &Integrator2D) -> Trajectory {
        let mut traj = Trajectory::new();
        let u = dvector![0.5, 0.0];
        let mut x = dvector![0.0, 0.0];
        traj.states.push(x.clone());
        for _ in 0..10 {
            x = robot.step(&x, &u, robot.ref_dt());
            traj.states.push(x.clone());
            traj.actions.push(u.clone());
        }
        traj.start = dvector![0.0, 0.0];
        traj.goal = x;
        traj
    }

    #[test]
    fn test_feasible_rollout() {
        let robot = robot();
        let mut traj = straight_line(&robot);
        traj.update_feasibility(&robot, &FeasibilityThresholds::default());
        assert!(traj.feasible);
        assert!(traj.max_jump < 1e-12);
        assert_eq!(traj.max_collision, 0.0);
    }

    #[test]
    fn test_jump_makes_infeasible() {
        let robot = robot();
        let mut traj = straight_line(&robot);
        traj.states[5][1] += 0.5;
        traj.update_feasibility(&robot, &FeasibilityThresholds::default());
        assert!(!traj.feasible);
        assert!(traj.max_jump > 0.4);
    }

    #[test]
    fn test_goal_tolerance() {
        let robot = robot();
        let mut traj = straight_line(&robot);
        traj.goal = dvector![3.0, 0.0];
        traj.update_feasibility(&robot, &FeasibilityThresholds::default());
        assert!(!traj.feasible);
        let loose = FeasibilityThresholds {
            goal_tol: 3.0,
            ..FeasibilityThresholds::default()
        };
        traj.update_feasibility(&robot, &loose);
        assert!(traj.feasible);
    }

    #[test]
    fn test_empty_trajectory_is_infeasible() {
        let robot = robot();
        let mut traj = Trajectory::new();
        traj.update_feasibility(&robot, &FeasibilityThresholds::default());
        assert!(!traj.feasible);
        assert!(traj.is_empty());
    }
}
