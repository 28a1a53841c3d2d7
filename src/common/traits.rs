//! Common traits defining interfaces between the search and its collaborators

use nalgebra::{DVector, Vector2};
use rand::RngCore;

use crate::common::types::State;
use crate::robots::{CollisionShape, Environment};

/// Capability interface of a dynamical robot model.
///
/// One flat trait with one implementation per robot type; concrete models
/// are created by [`crate::robots::robot_factory`]. Offsets describe the
/// rigid transform that aligns a primitive (defined for the un-offset
/// robot) with an arbitrary state.
pub trait RobotModel {
    /// Type string used by the factory
    fn name(&self) -> &str;

    /// State dimension
    fn nx(&self) -> usize;

    /// Action dimension
    fn nu(&self) -> usize;

    /// Lower and upper action bounds
    fn action_bounds(&self) -> (DVector<f64>, DVector<f64>);

    /// Dimension of the alignment offset
    fn offset_dim(&self) -> usize;

    /// Reference integration time step [s]
    fn ref_dt(&self) -> f64;

    /// Metric on the state space
    fn distance(&self, a: &State, b: &State) -> f64;

    /// State bounds check (workspace and robot limits)
    fn is_state_valid(&self, x: &State) -> bool;

    /// Offset aligning the canonical primitive start with `x`
    fn offset(&self, x: &State) -> DVector<f64>;

    /// `x` with the offset removed, i.e. the state primitives are keyed by
    fn canonical_state(&self, x: &State) -> State;

    /// Apply an offset to a single primitive state
    fn transform_state(&self, offset: &DVector<f64>, x: &State) -> State;

    /// Offset that aligns the primitive *end* (instead of its start) with
    /// the state `offset` was computed from
    fn backward_offset(&self, offset: &DVector<f64>, last_state: &State) -> DVector<f64>;

    /// Aligned last state only, when the model can compute it without a
    /// full rollout
    fn transform_last_state(&self, _offset: &DVector<f64>, _states: &[State]) -> Option<State> {
        None
    }

    /// Admissible lower bound of the time needed to move from `a` to `b`
    fn lower_bound_time(&self, a: &State, b: &State) -> f64;

    /// Integrate the dynamics for one step
    fn step(&self, x: &State, u: &DVector<f64>, dt: f64) -> State;

    /// Static environment the model is checked against
    fn environment(&self) -> &Environment;

    /// Signed clearance between the robot at `x` and the closest obstacle
    fn collision_distance(&self, x: &State) -> f64;

    /// Collision check against the static environment
    fn collision_free(&self, x: &State) -> bool {
        self.collision_distance(x) >= 0.0
    }

    /// Uniform sample from the state bounds (may still be in collision)
    fn sample_state(&self, rng: &mut dyn RngCore) -> State;

    /// Whether primitive collision shapes can be reused by a pure translation
    fn reuses_collision_shape(&self) -> bool {
        false
    }

    /// Collision shape swept by the canonical primitive `states`
    fn collision_shape(&self, _states: &[State]) -> Option<CollisionShape> {
        None
    }

    /// Translational part of an offset
    fn translation(&self, offset: &DVector<f64>) -> Vector2<f64>;
}

/// Strategy interface for nearest-neighbor structures.
///
/// Items are stored together with the state they are keyed by; distances
/// follow the metric the backend was created with.
pub trait NearestNeighbors<T: Copy> {
    /// Insert an item
    fn add(&mut self, key: State, item: T);

    /// Up to `k` items ordered by increasing distance
    fn nearest_k(&self, query: &State, k: usize) -> Vec<T>;

    /// All items within `radius` (inclusive), ordered by increasing distance
    fn nearest_r(&self, query: &State, radius: f64) -> Vec<T>;

    /// Closest item, if any
    fn nearest(&self, query: &State) -> Option<T> {
        self.nearest_k(query, 1).into_iter().next()
    }

    /// All items in insertion order
    fn list(&self) -> Vec<T>;

    /// Number of stored items
    fn size(&self) -> usize;
}

/// Cost-to-go estimate
pub trait Heuristic {
    fn h(&self, x: &State) -> f64;
}
