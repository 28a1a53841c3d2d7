//! Brute-force nearest-neighbor backend
//!
//! Linear scan over all stored keys; exact for any metric the robot
//! provides. Other spatial indices can be plugged in through
//! [`NearestNeighbors`].

use crate::common::{NearestNeighbors, RobotModel, State};

type Metric<'a> = Box<dyn Fn(&State, &State) -> f64 + 'a>;

pub struct LinearNearest<'a, T> {
    entries: Vec<(State, T)>,
    metric: Metric<'a>,
}

impl<'a, T: Copy> LinearNearest<'a, T> {
    pub fn new(metric: impl Fn(&State, &State) -> f64 + 'a) -> Self {
        Self {
            entries: Vec::new(),
            metric: Box::new(metric),
        }
    }

    /// Index using the robot's state metric
    pub fn with_robot(robot: &'a dyn RobotModel) -> Self {
        Self::new(move |a, b| robot.distance(a, b))
    }

    fn sorted_distances(&self, query: &State) -> Vec<(f64, T)> {
        let mut distances: Vec<(f64, T)> = self
            .entries
            .iter()
            .map(|(key, item)| ((self.metric)(query, key), *item))
            .collect();
        distances.sort_by(|a, b| a.0.total_cmp(&b.0));
        distances
    }
}

impl<'a, T: Copy> NearestNeighbors<T> for LinearNearest<'a, T> {
    fn add(&mut self, key: State, item: T) {
        self.entries.push((key, item));
    }

    fn nearest_k(&self, query: &State, k: usize) -> Vec<T> {
        let mut distances = self.sorted_distances(query);
        distances.truncate(k);
        distances.into_iter().map(|(_, item)| item).collect()
    }

    fn nearest_r(&self, query: &State, radius: f64) -> Vec<T> {
        let mut within: Vec<(f64, T)> = self
            .entries
            .iter()
            .filter_map(|(key, item)| {
                let d = (self.metric)(query, key);
                if d <= radius {
                    Some((d, *item))
                } else {
                    None
                }
            })
            .collect();
        within.sort_by(|a, b| a.0.total_cmp(&b.0));
        within.into_iter().map(|(_, item)| item).collect()
    }

    fn nearest(&self, query: &State) -> Option<T> {
        self.entries
            .iter()
            .map(|(key, item)| ((self.metric)(query, key), *item))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, item)| item)
    }

    fn list(&self) -> Vec<T> {
        self.entries.iter().map(|(_, item)| *item).collect()
    }

    fn size(&self) -> usize {
        self.entries.len()
    }
}
