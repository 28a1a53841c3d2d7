//! Single integrator in the plane: state `[x, y]`, action `[vx, vy]`.

use nalgebra::{dvector, DVector, Vector2};
use rand::{Rng, RngCore};

use crate::common::{Point2D, RobotModel, State};

use super::environment::{CollisionShape, Disk, Environment};

/// `integrator1_2d_v0`
pub struct Integrator2D {
    max_vel: f64,
    radius: f64,
    ref_dt: f64,
    env: Environment,
}

impl Integrator2D {
    pub const NAME: &'static str = "integrator1_2d_v0";

    pub fn new(env: Environment) -> Self {
        Self {
            max_vel: 0.5,
            radius: 0.1,
            ref_dt: 0.1,
            env,
        }
    }

    pub fn max_vel(&self) -> f64 {
        self.max_vel
    }

    fn position(x: &State) -> Point2D {
        Point2D::new(x[0], x[1])
    }
}

impl RobotModel for Integrator2D {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn nx(&self) -> usize {
        2
    }

    fn nu(&self) -> usize {
        2
    }

    fn action_bounds(&self) -> (DVector<f64>, DVector<f64>) {
        let v = self.max_vel;
        (dvector![-v, -v], dvector![v, v])
    }

    fn offset_dim(&self) -> usize {
        2
    }

    fn ref_dt(&self) -> f64 {
        self.ref_dt
    }

    fn distance(&self, a: &State, b: &State) -> f64 {
        (a - b).norm()
    }

    fn is_state_valid(&self, x: &State) -> bool {
        x.iter().all(|v| v.is_finite()) && self.env.contains(&Self::position(x))
    }

    fn offset(&self, x: &State) -> DVector<f64> {
        x.clone()
    }

    fn canonical_state(&self, _x: &State) -> State {
        State::zeros(2)
    }

    fn transform_state(&self, offset: &DVector<f64>, x: &State) -> State {
        x + offset
    }

    fn backward_offset(&self, offset: &DVector<f64>, last_state: &State) -> DVector<f64> {
        offset - last_state
    }

    fn transform_last_state(&self, offset: &DVector<f64>, states: &[State]) -> Option<State> {
        states.last().map(|x| x + offset)
    }

    fn lower_bound_time(&self, a: &State, b: &State) -> f64 {
        (a - b).amax() / self.max_vel
    }

    fn step(&self, x: &State, u: &DVector<f64>, dt: f64) -> State {
        x + u * dt
    }

    fn environment(&self) -> &Environment {
        &self.env
    }

    fn collision_distance(&self, x: &State) -> f64 {
        self.env.clearance(&Self::position(x), self.radius)
    }

    fn sample_state(&self, rng: &mut dyn RngCore) -> State {
        dvector![
            rng.gen_range(self.env.min.x..=self.env.max.x),
            rng.gen_range(self.env.min.y..=self.env.max.y)
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
                radius: self.radius,
            })
            .collect();
        Some(CollisionShape::new(disks))
    }

    fn translation(&self, offset: &DVector<f64>) -> Vector2<f64> {
        Vector2::new(offset[0], offset[1])
    }
}
