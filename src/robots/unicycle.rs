//! First-order unicycle
//!
//! State `[x, y, yaw]`, action `[v, w]`. Primitives are aligned by
//! translation only, so the offset is the position of the target state.

use nalgebra::{dvector, DVector, Vector2};
use rand::{Rng, RngCore};

use crate::common::{normalize_angle, Point2D, RobotModel, State};

use super::environment::{CollisionShape, Disk, Environment};

/// Unicycle model parameters
#[derive(Debug, Clone)]
pub struct UnicycleConfig {
    /// Maximum absolute linear velocity [m/s]
    pub max_vel: f64,
    /// Maximum absolute angular velocity [rad/s]
    pub max_angular_vel: f64,
    /// Footprint radius [m]
    pub radius: f64,
    /// Integration step [s]
    pub ref_dt: f64,
    /// Weight of position / orientation in the metric
    pub distance_weights: [f64; 2],
}

impl Default for UnicycleConfig {
    fn default() -> Self {
        Self {
            max_vel: 0.5,
            max_angular_vel: 0.5,
            radius: 0.25,
            ref_dt: 0.1,
            distance_weights: [1.0, 0.5],
        }
    }
}

/// `unicycle1_v0`
pub struct Unicycle1 {
    config: UnicycleConfig,
    env: Environment,
}

impl Unicycle1 {
    pub const NAME: &'static str = "unicycle1_v0";

    pub fn new(env: Environment) -> Self {
        Self::with_config(env, UnicycleConfig::default())
    }

    pub fn with_config(env: Environment, config: UnicycleConfig) -> Self {
        Self { config, env }
    }

    pub fn config(&self) -> &UnicycleConfig {
        &self.config
    }

    fn position(x: &State) -> Point2D {
        Point2D::new(x[0], x[1])
    }
}

impl RobotModel for Unicycle1 {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn nx(&self) -> usize {
        3
    }

    fn nu(&self) -> usize {
        2
    }

    fn action_bounds(&self) -> (DVector<f64>, DVector<f64>) {
        let (v, w) = (self.config.max_vel, self.config.max_angular_vel);
        (dvector![-v, -w], dvector![v, w])
    }

    fn offset_dim(&self) -> usize {
        2
    }

    fn ref_dt(&self) -> f64 {
        self.config.ref_dt
    }

    fn distance(&self, a: &State, b: &State) -> f64 {
        let [w_pos, w_yaw] = self.config.distance_weights;
        let d_pos = Self::position(a).distance(&Self::position(b));
        let d_yaw = normalize_angle(a[2] - b[2]).abs();
        w_pos * d_pos + w_yaw * d_yaw
    }

    fn is_state_valid(&self, x: &State) -> bool {
        x.iter().all(|v| v.is_finite()) && self.env.contains(&Self::position(x))
    }

    fn offset(&self, x: &State) -> DVector<f64> {
        dvector![x[0], x[1]]
    }

    fn canonical_state(&self, x: &State) -> State {
        dvector![0.0, 0.0, x[2]]
    }

    fn transform_state(&self, offset: &DVector<f64>, x: &State) -> State {
        dvector![x[0] + offset[0], x[1] + offset[1], x[2]]
    }

    fn backward_offset(&self, offset: &DVector<f64>, last_state: &State) -> DVector<f64> {
        dvector![offset[0] - last_state[0], offset[1] - last_state[1]]
    }

    fn transform_last_state(&self, offset: &DVector<f64>, states: &[State]) -> Option<State> {
        states.last().map(|x| self.transform_state(offset, x))
    }

    fn lower_bound_time(&self, a: &State, b: &State) -> f64 {
        let d_pos = Self::position(a).distance(&Self::position(b));
        let d_yaw = normalize_angle(a[2] - b[2]).abs();
        (d_pos / self.config.max_vel).max(d_yaw / self.config.max_angular_vel)
    }

    fn step(&self, x: &State, u: &DVector<f64>, dt: f64) -> State {
        let yaw = x[2];
        dvector![
            x[0] + u[0] * yaw.cos() * dt,
            x[1] + u[0] * yaw.sin() * dt,
            normalize_angle(yaw + u[1] * dt)
        ]
    }

    fn environment(&self) -> &Environment {
        &self.env
    }

    fn collision_distance(&self, x: &State) -> f64 {
        self.env.clearance(&Self::position(x), self.config.radius)
    }

    fn sample_state(&self, rng: &mut dyn RngCore) -> State {
        let pi = std::f64::consts::PI;
        dvector![
            rng.gen_range(self.env.min.x..=self.env.max.x),
            rng.gen_range(self.env.min.y..=self.env.max.y),
            rng.gen_range(-pi..=pi)
        ]
    }

    fn reuses_collision_shape(&self) -> bool {
        true
    }

    fn collision_shape(&self, states: &[State]) -> Option<CollisionShape> {
        let disks = states
            .iter()
            .map(|x| Disk {
                center: Self::position(x),
                radius: self.config.radius,
            })
            .collect();
        Some(CollisionShape::new(disks))
    }

    fn translation(&self, offset: &DVector<f64>) -> Vector2<f64> {
        Vector2::new(offset[0], offset[1])
    }
}
