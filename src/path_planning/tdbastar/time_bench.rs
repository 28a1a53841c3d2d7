//! Wall-clock accounting of the search pipeline

use std::collections::BTreeMap;
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::common::error::ensure_consistent;
use crate::common::PlanningResult;

/// Untimed work allowed inside a search, in percent of `time_search`
const MAX_EXTRA_TIME_PERCENT: f64 = 20.0;
/// Shorter searches are dominated by timer resolution and skip the ratio check
const MIN_TIME_FOR_RATIO_CHECK_MS: f64 = 1000.0;
/// Rounding slack when subtracting buckets [ms]
const EXTRA_TIME_SLACK_MS: f64 = 1e-3;

pub struct Stopwatch {
    start: Instant,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1e3
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `f` and add its wall-clock time to `bucket`
pub fn timed<T>(bucket: &mut f64, f: impl FnOnce() -> T) -> T {
    let watch = Stopwatch::new();
    let out = f();
    *bucket += watch.elapsed_ms();
    out
}

/// Time spent in each stage of one search, in milliseconds
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimeBenchmark {
    pub expands: usize,
    pub num_col_motions: usize,
    pub time_search: f64,
    pub time_nearest_motion: f64,
    pub time_nearest_node: f64,
    pub time_nearest_node_add: f64,
    pub time_nearest_node_search: f64,
    pub time_collisions: f64,
    pub time_lazy_expand: f64,
    pub time_alloc_primitive: f64,
    pub time_transform_primitive: f64,
    pub time_queue: f64,
    pub check_bounds: f64,
    pub time_hfun: f64,
    pub time_check_goal: f64,
    pub extra_time: f64,
}

impl TimeBenchmark {
    /// Sum of the buckets measured inside the search loop
    fn accounted_time(&self) -> f64 {
        self.time_collisions
            + self.time_nearest_node_add
            + self.time_nearest_node_search
            + self.time_lazy_expand
            + self.time_alloc_primitive
            + self.time_transform_primitive
            + self.time_queue
            + self.check_bounds
            + self.time_hfun
            + self.time_check_goal
    }

    /// Close the books after a search: fold in the expander's query time,
    /// derive the totals and verify that the buckets explain the search time.
    pub fn finalize(&mut self, time_in_nn: f64) -> PlanningResult<()> {
        self.time_nearest_motion += time_in_nn;
        self.time_nearest_node = self.time_nearest_node_add + self.time_nearest_node_search;
        self.extra_time = self.time_search - self.accounted_time();

        ensure_consistent!(
            self.extra_time >= -EXTRA_TIME_SLACK_MS,
            "timed stages ({:.3} ms) exceed the search time ({:.3} ms)",
            self.accounted_time(),
            self.time_search
        );
        if self.time_search >= MIN_TIME_FOR_RATIO_CHECK_MS {
            let percent = self.extra_time / self.time_search * 100.0;
            ensure_consistent!(
                percent < MAX_EXTRA_TIME_PERCENT,
                "untimed work is {:.1}% of the search time",
                percent
            );
        }
        info!(
            extra_time = self.extra_time,
            percent = self.extra_percent(),
            "extra time"
        );
        Ok(())
    }

    pub fn extra_percent(&self) -> f64 {
        if self.time_search > 0.0 {
            self.extra_time / self.time_search * 100.0
        } else {
            0.0
        }
    }

    /// Every bucket as a string, keyed by its name
    pub fn to_data(&self) -> PlanningResult<BTreeMap<String, String>> {
        let data = match serde_json::to_value(self)? {
            Value::Object(map) => map
                .into_iter()
                .map(|(key, value)| (key, value.to_string()))
                .collect(),
            _ => BTreeMap::new(),
        };
        Ok(data)
    }

    pub fn log(&self) {
        info!(
            expands = self.expands,
            num_col_motions = self.num_col_motions,
            time_search = self.time_search,
            time_nearest_motion = self.time_nearest_motion,
            time_nearest_node = self.time_nearest_node,
            time_nearest_node_add = self.time_nearest_node_add,
            time_nearest_node_search = self.time_nearest_node_search,
            time_collisions = self.time_collisions,
            time_lazy_expand = self.time_lazy_expand,
            time_alloc_primitive = self.time_alloc_primitive,
            time_transform_primitive = self.time_transform_primitive,
            time_queue = self.time_queue,
            check_bounds = self.check_bounds,
            time_hfun = self.time_hfun,
            time_check_goal = self.time_check_goal,
            extra_time = self.extra_time,
            "time benchmark"
        );
    }
}
