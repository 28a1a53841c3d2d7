//! Candidate generation: primitives whose start is close to a state

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::common::{NearestNeighbors, RobotModel, State};

use super::lazy_traj::LazyTrajectory;
use super::motion::MotionPrimitive;
use super::time_bench::Stopwatch;

pub struct Expander<'a> {
    robot: &'a dyn RobotModel,
    motions: &'a [MotionPrimitive],
    index: &'a dyn NearestNeighbors<usize>,
    /// Primitive selection radius
    radius: f64,
    rng: StdRng,
    shuffle: bool,
    /// Accumulated nearest-neighbor query time [ms]
    pub time_in_nn: f64,
}

impl<'a> Expander<'a> {
    pub fn new(
        robot: &'a dyn RobotModel,
        motions: &'a [MotionPrimitive],
        index: &'a dyn NearestNeighbors<usize>,
        radius: f64,
    ) -> Self {
        Self {
            robot,
            motions,
            index,
            radius,
            rng: StdRng::from_entropy(),
            shuffle: true,
            time_in_nn: 0.0,
        }
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Fresh lazy candidates for every enabled primitive within the
    /// selection radius of `x`, aligned to start at `x`.
    pub fn expand_lazy(&mut self, x: &State) -> Vec<LazyTrajectory<'a>> {
        let canonical = self.robot.canonical_state(x);

        let watch = Stopwatch::new();
        let mut candidates = self.index.nearest_r(&canonical, self.radius);
        self.time_in_nn += watch.elapsed_ms();

        if self.shuffle {
            candidates.shuffle(&mut self.rng);
        }

        let robot = self.robot;
        let motions = self.motions;
        let offset = robot.offset(x);
        candidates
            .into_iter()
            .filter_map(|idx| motions.get(idx))
            .filter(|motion| !motion.disabled)
            .map(|motion| LazyTrajectory::new(robot, motion, offset.clone()))
            .collect()
    }
}
