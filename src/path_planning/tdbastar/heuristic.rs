//! Cost-to-go estimates and goal tests
//!
//! [`EuclideanHeuristic`] is the robot's lower-bound time to the goal.
//! [`RoadmapHeuristic`] reuses cost-to-go values stored in a heuristic map:
//! a collision-free roadmap searched backwards from the goal, saved as JSON
//! under the `heu_map` key so several searches can share it.

use std::cmp::Reverse;
use std::path::Path;

use ordered_float::NotNan;
use priority_queue::PriorityQueue;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::common::error::ensure_consistent;
use crate::common::{Heuristic, NearestNeighbors, PlanningError, PlanningResult, RobotModel, State};

use super::nearest::LinearNearest;

/// Sanity ceiling for heuristic values
pub const MAX_HEURISTIC: f64 = 1e5;

/// Key holding the node list in a heuristic map file
const HEU_MAP_KEY: &str = "heu_map";

pub struct EuclideanHeuristic<'a> {
    robot: &'a dyn RobotModel,
    goal: State,
}

impl<'a> EuclideanHeuristic<'a> {
    pub fn new(robot: &'a dyn RobotModel, goal: State) -> Self {
        Self { robot, goal }
    }
}

impl Heuristic for EuclideanHeuristic<'_> {
    fn h(&self, x: &State) -> f64 {
        self.robot.lower_bound_time(x, &self.goal)
    }
}

/// One roadmap vertex: state, cost-to-go and parent towards the goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeuristicNode {
    pub x: State,
    pub d: f64,
    pub p: Option<usize>,
}

#[derive(Serialize)]
struct HeuristicMapFile<'a> {
    heu_map: &'a [HeuristicNode],
}

pub fn write_heu_map(path: &Path, heu_map: &[HeuristicNode]) -> PlanningResult<()> {
    let file = std::fs::File::create(path).map_err(|e| PlanningError::io(path, e))?;
    serde_json::to_writer_pretty(std::io::BufWriter::new(file), &HeuristicMapFile { heu_map })?;
    Ok(())
}

pub fn load_heu_map(path: &Path) -> PlanningResult<Vec<HeuristicNode>> {
    info!(path = %path.display(), "loading heuristic map");
    let raw = std::fs::read_to_string(path).map_err(|e| PlanningError::io(path, e))?;
    let mut document: Value = serde_json::from_str(&raw)?;
    let nodes = document
        .get_mut(HEU_MAP_KEY)
        .map(Value::take)
        .ok_or_else(|| {
            PlanningError::Configuration(format!("missing `{}` key in {}", HEU_MAP_KEY, path.display()))
        })?;
    Ok(serde_json::from_value(nodes)?)
}

/// Roadmap construction parameters
#[derive(Debug, Clone)]
pub struct RoadmapConfig {
    /// Number of collision-free vertices besides the goal
    pub num_samples: usize,
    /// Vertices closer than this are connected
    pub connection_radius: f64,
    /// Distance between collision checks along an edge
    pub edge_resolution: f64,
    /// Rejection-sampling budget per vertex
    pub max_attempts_per_sample: usize,
}

impl Default for RoadmapConfig {
    fn default() -> Self {
        Self {
            num_samples: 500,
            connection_radius: 1.0,
            edge_resolution: 0.05,
            max_attempts_per_sample: 100,
        }
    }
}

fn edge_collision_free(robot: &dyn RobotModel, a: &State, b: &State, resolution: f64) -> bool {
    let n_steps = (robot.distance(a, b) / resolution).ceil().max(1.0) as usize;
    (0..=n_steps).all(|i| {
        let t = i as f64 / n_steps as f64;
        robot.collision_free(&a.lerp(b, t))
    })
}

fn priority(cost: f64) -> PlanningResult<Reverse<NotNan<f64>>> {
    NotNan::new(cost)
        .map(Reverse)
        .map_err(|_| PlanningError::Consistency("roadmap cost is NaN".to_string()))
}

/// Sample a roadmap and run Dijkstra from the goal.
///
/// Edge weights are lower-bound times. Vertices that cannot reach the goal
/// are dropped; the goal is always node 0 and parents precede children.
pub fn build_heuristic_map(
    robot: &dyn RobotModel,
    goal: &State,
    config: &RoadmapConfig,
    rng: &mut dyn RngCore,
) -> PlanningResult<Vec<HeuristicNode>> {
    let mut vertices = vec![goal.clone()];
    for _ in 0..config.num_samples {
        let sample = (0..config.max_attempts_per_sample)
            .map(|_| robot.sample_state(rng))
            .find(|x| robot.is_state_valid(x) && robot.collision_free(x));
        if let Some(x) = sample {
            vertices.push(x);
        }
    }

    let mut index = LinearNearest::with_robot(robot);
    for (i, x) in vertices.iter().enumerate() {
        index.add(x.clone(), i);
    }

    let mut cost = vec![f64::INFINITY; vertices.len()];
    let mut parent: Vec<Option<usize>> = vec![None; vertices.len()];
    let mut settled_order = Vec::with_capacity(vertices.len());
    let mut settled = vec![false; vertices.len()];
    let mut queue = PriorityQueue::new();
    cost[0] = 0.0;
    queue.push(0, priority(0.0)?);

    while let Some((current, _)) = queue.pop() {
        settled[current] = true;
        settled_order.push(current);
        for neighbor in index.nearest_r(&vertices[current], config.connection_radius) {
            if settled[neighbor] {
                continue;
            }
            let new_cost = cost[current] + robot.lower_bound_time(&vertices[neighbor], &vertices[current]);
            if new_cost < cost[neighbor]
                && edge_collision_free(robot, &vertices[current], &vertices[neighbor], config.edge_resolution)
            {
                cost[neighbor] = new_cost;
                parent[neighbor] = Some(current);
                queue.push_increase(neighbor, priority(new_cost)?);
            }
        }
    }

    let mut new_index = vec![None; vertices.len()];
    for (position, &vertex) in settled_order.iter().enumerate() {
        new_index[vertex] = Some(position);
    }
    let mut heu_map = Vec::with_capacity(settled_order.len());
    for &vertex in &settled_order {
        let p = match parent[vertex] {
            Some(parent_vertex) => {
                let p = new_index[parent_vertex];
                ensure_consistent!(p.is_some(), "roadmap parent {} was never settled", parent_vertex);
                p
            }
            None => None,
        };
        heu_map.push(HeuristicNode {
            x: vertices[vertex].clone(),
            d: cost[vertex],
            p,
        });
    }
    debug!(
        num_vertices = vertices.len(),
        num_connected = heu_map.len(),
        "built heuristic map"
    );
    Ok(heu_map)
}

/// Cost-to-go through the closest heuristic map entries
pub struct RoadmapHeuristic<'a> {
    robot: &'a dyn RobotModel,
    goal: State,
    heu_map: Vec<HeuristicNode>,
    index: LinearNearest<'a, usize>,
    connection_radius: f64,
}

impl<'a> RoadmapHeuristic<'a> {
    pub fn new(robot: &'a dyn RobotModel, goal: State, heu_map: Vec<HeuristicNode>, connection_radius: f64) -> Self {
        let mut index = LinearNearest::with_robot(robot);
        for (i, node) in heu_map.iter().enumerate() {
            index.add(node.x.clone(), i);
        }
        Self {
            robot,
            goal,
            heu_map,
            index,
            connection_radius,
        }
    }

    pub fn len(&self) -> usize {
        self.heu_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heu_map.is_empty()
    }
}

impl Heuristic for RoadmapHeuristic<'_> {
    fn h(&self, x: &State) -> f64 {
        self.index
            .nearest_r(x, self.connection_radius)
            .into_iter()
            .map(|i| {
                let node = &self.heu_map[i];
                node.d + self.robot.lower_bound_time(x, &node.x)
            })
            .reduce(f64::min)
            .unwrap_or_else(|| self.robot.lower_bound_time(x, &self.goal))
    }
}

/// Heuristic values must be non-negative and below [`MAX_HEURISTIC`]
pub fn check_heuristic_bounds(h: f64) -> PlanningResult<()> {
    ensure_consistent!(h >= 0.0, "heuristic value {} should be non-negative", h);
    ensure_consistent!(h <= MAX_HEURISTIC, "heuristic value {} should be bounded", h);
    Ok(())
}

/// First sampled rollout state within `radius` of the goal.
///
/// Tests `num_check_goal` evenly spaced states (for 4: at 1/5, 2/5, 3/5
/// and 4/5 of the rollout) and then the final state. Index 0 is the state
/// the primitive was aligned to and is never returned.
pub fn check_goal(
    robot: &dyn RobotModel,
    goal: &State,
    states: &[State],
    radius: f64,
    num_check_goal: usize,
) -> Option<usize> {
    let len = states.len();
    if len < 2 {
        return None;
    }
    (0..num_check_goal)
        .map(|n| ((n + 1) as f64 / (num_check_goal + 1) as f64 * len as f64) as usize)
        .chain(std::iter::once(len - 1))
        .filter(|&i| i > 0 && i < len)
        .find(|&i| robot.distance(&states[i], goal) <= radius)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::robots::{Environment, Integrator2D, Obstacle};
    use nalgebra::{dvector, Vector2};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn robot() -> Integrator2D {
        Integrator2D::new(Environment::empty(Vector2::new(-5.0, -5.0), Vector2::new(5.0, 5.0)))
    }

    fn line(n: usize) -> Vec<State> {
        (0..n).map(|i| dvector![i as f64, 0.0]).collect()
    }

    #[test]
    fn test_euclidean_is_lower_bound_time() {
        let robot = robot();
        let h = EuclideanHeuristic::new(&robot, dvector![1.0, 0.0]);
        assert!((h.h(&dvector![0.0, 0.0]) - 2.0).abs() < 1e-12);
        assert_eq!(h.h(&dvector![1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_check_goal_sample_positions() {
        let robot = robot();
        let states = line(10);
        // samples 2, 4, 6, 8 then 9
        assert_eq!(check_goal(&robot, &dvector![4.0, 0.0], &states, 0.5, 4), Some(4));
        assert_eq!(check_goal(&robot, &dvector![3.0, 0.0], &states, 0.5, 4), None);
        assert_eq!(check_goal(&robot, &dvector![9.0, 0.0], &states, 0.5, 4), Some(9));
        // the earliest sample wins
        assert_eq!(check_goal(&robot, &dvector![5.0, 0.0], &states, 1.0, 4), Some(4));
    }

    #[test]
    fn test_check_goal_without_interior_samples() {
        let robot = robot();
        let states = line(10);
        assert_eq!(check_goal(&robot, &dvector![4.0, 0.0], &states, 0.5, 0), None);
        assert_eq!(check_goal(&robot, &dvector![9.0, 0.0], &states, 0.5, 0), Some(9));
        assert_eq!(check_goal(&robot, &dvector![0.0, 0.0], &states, 0.5, 4), None);
    }

    #[test]
    fn test_heuristic_bounds() {
        assert!(check_heuristic_bounds(0.0).is_ok());
        assert!(check_heuristic_bounds(-1e-3).is_err());
        assert!(check_heuristic_bounds(2e5).is_err());
        assert!(check_heuristic_bounds(f64::NAN).is_err());
    }

    #[test]
    fn test_heu_map_file_round_trip() {
        let nodes = vec![
            HeuristicNode {
                x: dvector![0.0, 0.0],
                d: 0.0,
                p: None,
            },
            HeuristicNode {
                x: dvector![1.0, 0.0],
                d: 2.0,
                p: Some(0),
            },
        ];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("heu_map.json");
        write_heu_map(&path, &nodes).unwrap();
        assert_eq!(load_heu_map(&path).unwrap(), nodes);
    }

    #[test]
    fn test_heu_map_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.json");
        std::fs::write(&path, "{\"nodes\": []}").unwrap();
        assert!(matches!(load_heu_map(&path), Err(PlanningError::Configuration(_))));
    }

    #[test]
    fn test_roadmap_goes_around_obstacles() {
        let robot = Integrator2D::new(Environment::new(
            Vector2::new(0.0, 0.0),
            Vector2::new(4.0, 4.0),
            vec![Obstacle::rectangle(2.0, 1.5, 0.4, 3.0)],
        ));
        let goal = dvector![3.5, 0.5];
        let config = RoadmapConfig {
            num_samples: 300,
            connection_radius: 1.0,
            ..RoadmapConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(0);
        let heu_map = build_heuristic_map(&robot, &goal, &config, &mut rng).unwrap();
        assert_eq!(heu_map[0].d, 0.0);
        for (i, node) in heu_map.iter().enumerate() {
            if let Some(p) = node.p {
                assert!(p < i);
                assert!(node.d >= heu_map[p].d);
            }
        }

        let roadmap = RoadmapHeuristic::new(&robot, goal.clone(), heu_map, 1.0);
        let euclidean = EuclideanHeuristic::new(&robot, goal);
        let behind_wall = dvector![0.5, 0.5];
        assert!(roadmap.h(&behind_wall) > euclidean.h(&behind_wall) + 1.0);
        // far from every vertex the Euclidean bound is used
        let lonely = RoadmapHeuristic::new(&robot, dvector![3.5, 0.5], Vec::new(), 1.0);
        assert!(lonely.is_empty());
        assert_eq!(lonely.h(&behind_wall), euclidean.h(&behind_wall));
    }
}
