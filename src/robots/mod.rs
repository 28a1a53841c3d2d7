//! Robot models and the static environment they are checked against
//!
//! Every model implements [`RobotModel`]; [`robot_factory`] selects one by
//! the type string stored in a [`crate::path_planning::tdbastar::Problem`].

pub mod environment;
pub mod integrator;
pub mod unicycle;

pub use environment::{CollisionShape, Disk, Environment, Obstacle};
pub use integrator::Integrator2D;
pub use unicycle::{Unicycle1, UnicycleConfig};

use crate::common::{PlanningError, PlanningResult, RobotModel};

/// Create the robot model named `robot_type` inside `env`.
pub fn robot_factory(robot_type: &str, env: &Environment) -> PlanningResult<Box<dyn RobotModel>> {
    match robot_type {
        Unicycle1::NAME => Ok(Box::new(Unicycle1::new(env.clone()))),
        Integrator2D::NAME => Ok(Box::new(Integrator2D::new(env.clone()))),
        other => Err(PlanningError::Configuration(format!(
            "unknown robot type '{}'",
            other
        ))),
    }
}
