//! Offline tuning of the novelty radius and the primitive library

use rand::RngCore;
use tracing::info;

use crate::common::{NearestNeighbors, PlanningError, PlanningResult, RobotModel};

use super::motion::MotionPrimitive;

/// Upper bound on the number of sampled states
const MAX_CALIBRATION_SAMPLES: usize = 1000;
/// Rejection-sampling budget per state
const MAX_ATTEMPTS_PER_SAMPLE: usize = 10_000;

/// Recommend a `delta` so that, on average, `num_desired_neighbors`
/// primitives fall inside the selection radius `alpha * delta`.
///
/// Samples valid collision-free states, measures the distance from each
/// canonical sample to its `num_desired_neighbors + 1`-th nearest
/// primitive start, and returns the mean divided by `alpha`.
pub fn automatic_delta(
    num_desired_neighbors: usize,
    alpha: f64,
    robot: &dyn RobotModel,
    index: &dyn NearestNeighbors<usize>,
    motions: &[MotionPrimitive],
    rng: &mut dyn RngCore,
) -> PlanningResult<f64> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(PlanningError::InvalidParameter(format!(
            "alpha needs to be between 0 and 1, got {}",
            alpha
        )));
    }
    let num_samples = MAX_CALIBRATION_SAMPLES.min(index.size());
    if num_samples == 0 {
        return Err(PlanningError::Configuration(
            "cannot calibrate delta with an empty primitive index".to_string(),
        ));
    }

    let mut sum_delta = 0.0;
    for _ in 0..num_samples {
        let x = (0..MAX_ATTEMPTS_PER_SAMPLE)
            .map(|_| robot.sample_state(rng))
            .find(|x| robot.is_state_valid(x) && robot.collision_free(x))
            .ok_or_else(|| {
                PlanningError::Configuration("could not sample a valid state for calibration".to_string())
            })?;
        let canonical = robot.canonical_state(&x);
        let kth = index
            .nearest_k(&canonical, num_desired_neighbors + 1)
            .last()
            .and_then(|&idx| motions.get(idx))
            .ok_or_else(|| PlanningError::Configuration("primitive index is out of date".to_string()))?;
        sum_delta += robot.distance(&canonical, kth.first_state());
    }

    let delta = sum_delta / num_samples as f64 / alpha;
    info!(delta, num_samples, num_desired_neighbors, "automatically adjusted delta");
    Ok(delta)
}

/// Disable primitives that start within `factor * delta * alpha` and end
/// within `factor * delta * (1 - alpha)` of an earlier enabled primitive.
///
/// The first primitive seen survives. Running it again on its own output
/// disables nothing. Returns the number of newly disabled primitives.
pub fn filter_duplicates(
    motions: &mut [MotionPrimitive],
    delta: f64,
    alpha: f64,
    robot: &dyn RobotModel,
    index: &dyn NearestNeighbors<usize>,
    factor: f64,
) -> usize {
    let start_radius = factor * delta * alpha;
    let end_radius = factor * delta * (1.0 - alpha);
    let mut num_duplicates = 0;

    for i in 0..motions.len() {
        if motions[i].disabled {
            continue;
        }
        let last = motions[i].last_state().clone();
        for j in index.nearest_r(motions[i].first_state(), start_radius) {
            if j == i || j >= motions.len() || motions[j].disabled {
                continue;
            }
            if robot.distance(&last, motions[j].last_state()) < end_radius {
                motions[j].disabled = true;
                num_duplicates += 1;
            }
        }
    }

    info!(num_duplicates, "duplicate motions");
    num_duplicates
}
