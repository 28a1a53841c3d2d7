//! The tdbastar search loop

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

use crate::common::{
    FeasibilityThresholds, Heuristic, NearestNeighbors, PlanningError, PlanningResult, RobotModel, State,
    Trajectory,
};
use crate::common::error::ensure_consistent;
use crate::robots::robot_factory;

use super::expander::Expander;
use super::heuristic::{check_goal, check_heuristic_bounds, load_heu_map, EuclideanHeuristic, RoadmapHeuristic};
use super::lazy_traj::{check_lazy_trajectory, Rollout};
use super::motion::{build_motion_index, check_motion_dimensions, check_motions, MotionPrimitive};
use super::nearest::LinearNearest;
use super::node::{Node, NodeId, NodeStore, OpenSet};
use super::options::{HeuristicKind, TdbAStarOptions};
use super::reconstruct::from_solution_to_trajectory;
use super::time_bench::{timed, Stopwatch, TimeBenchmark};
use super::Problem;

const PRINT_EVERY: usize = 1000;

/// Collision tolerance of the post-search check; primitives are only
/// checked at their stored states
const SOLVED_COL_TOL: f64 = 5e-2;

/// Why the search loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TerminateStatus {
    Solved,
    MaxExpands,
    MaxTime,
    EmptyQueue,
    Unknown,
}

impl TerminateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminateStatus::Solved => "SOLVED",
            TerminateStatus::MaxExpands => "MAX_EXPANDS",
            TerminateStatus::MaxTime => "MAX_TIME",
            TerminateStatus::EmptyQueue => "EMPTY_QUEUE",
            TerminateStatus::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for TerminateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of one run
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub solved: bool,
    pub cost: f64,
    /// Wall-clock time of the search loop [ms]
    pub time_search: f64,
    pub status: TerminateStatus,
    pub num_nodes: usize,
    pub num_primitives: usize,
    pub delta: f64,
    pub time_bench: TimeBenchmark,
    /// Flat string view of the report and the time benchmark
    pub data: BTreeMap<String, String>,
}

/// Trajectory, report and the explored search tree
pub struct TdbAStarOutput {
    pub trajectory: Trajectory,
    pub report: SearchReport,
    pub nodes: NodeStore,
}

fn stop_reason(
    time_bench: &TimeBenchmark,
    elapsed_ms: f64,
    open: &OpenSet,
    options: &TdbAStarOptions,
) -> Option<TerminateStatus> {
    if time_bench.expands >= options.max_expands {
        Some(TerminateStatus::MaxExpands)
    } else if elapsed_ms > options.search_timelimit {
        Some(TerminateStatus::MaxTime)
    } else if open.is_empty() {
        Some(TerminateStatus::EmptyQueue)
    } else {
        None
    }
}

fn make_heuristic<'a>(
    robot: &'a dyn RobotModel,
    goal: &State,
    options: &TdbAStarOptions,
) -> PlanningResult<Box<dyn Heuristic + 'a>> {
    match options.heuristic {
        HeuristicKind::Euclidean => Ok(Box::new(EuclideanHeuristic::new(robot, goal.clone()))),
        HeuristicKind::Roadmap => {
            let path = options.heu_map_file.as_ref().ok_or_else(|| {
                PlanningError::Configuration("roadmap heuristic requires heu_map_file".to_string())
            })?;
            let heu_map = load_heu_map(path)?;
            Ok(Box::new(RoadmapHeuristic::new(
                robot,
                goal.clone(),
                heu_map,
                options.heu_connection_radius,
            )))
        }
    }
}

/// Run tdbastar for the robot named in `problem`.
pub fn tdbastar(
    problem: &Problem,
    options: &TdbAStarOptions,
    motions: &[MotionPrimitive],
) -> PlanningResult<TdbAStarOutput> {
    let robot = robot_factory(&problem.robot_type, &problem.env)?;
    tdbastar_with_robot(problem, options, motions, robot.as_ref())
}

/// Run tdbastar with an already constructed robot model.
///
/// Configuration mistakes are returned before searching. Running out of
/// expansions, time or open nodes is not an error: the trajectory then
/// ends at the visited node closest to the goal and `solved` is false.
pub fn tdbastar_with_robot(
    problem: &Problem,
    options: &TdbAStarOptions,
    motions: &[MotionPrimitive],
    robot: &dyn RobotModel,
) -> PlanningResult<TdbAStarOutput> {
    options.log();
    options.validate()?;
    check_motions(motions)?;
    check_motion_dimensions(motions, robot)?;
    for (name, x) in [("start", &problem.start), ("goal", &problem.goal)] {
        if x.len() != robot.nx() {
            return Err(PlanningError::InvalidParameter(format!(
                "{} has dimension {}, robot {} expects {}",
                name,
                x.len(),
                robot.name(),
                robot.nx()
            )));
        }
    }
    let start = &problem.start;
    let goal = &problem.goal;

    let mut time_bench = TimeBenchmark::default();

    let motion_index = timed(&mut time_bench.time_nearest_motion, || {
        build_motion_index(motions, robot, options.max_motions)
    });
    if motion_index.size() == 0 {
        return Err(PlanningError::Configuration(
            "no enabled motion primitive to search with".to_string(),
        ));
    }
    let max_motion_len = motion_index
        .list()
        .into_iter()
        .map(|idx| motions[idx].len())
        .max()
        .unwrap_or(0);

    let mut expander = Expander::new(robot, motions, &motion_index, options.selection_radius())
        .with_shuffle(options.shuffle_expansions);
    if options.fix_seed {
        expander.seed(0);
    }

    let heuristic = make_heuristic(robot, goal, options)?;
    let goal_radius = options.goal_radius();
    let novelty_radius = options.novelty_radius();

    // the start node is indexed inside the timed window
    let watch = Stopwatch::new();
    let mut nodes = NodeStore::new();
    let mut open = OpenSet::new();
    let mut node_index: LinearNearest<NodeId> = LinearNearest::with_robot(robot);

    let start_h = heuristic.h(start);
    check_heuristic_bounds(start_h)?;
    let start_id = nodes.push(Node::start(start.clone(), start_h));
    let handle = open.push(start_id, &nodes[start_id])?;
    nodes[start_id].handle = Some(handle);
    timed(&mut time_bench.time_nearest_node_add, || {
        node_index.add(start.clone(), start_id)
    });

    let check_state = |x: &State| robot.is_state_valid(x);
    let per_state_bounds: Option<&dyn Fn(&State) -> bool> = if options.check_bounds_per_state {
        Some(&check_state)
    } else {
        None
    };
    let mut rollout = Rollout::with_capacity(max_motion_len);
    let mut best_distance_to_goal = robot.distance(start, goal);
    let mut solution = None;

    let status = loop {
        if let Some(reason) = stop_reason(&time_bench, watch.elapsed_ms(), &open, options) {
            info!(status = %reason, "break search");
            break reason;
        }

        let popped = timed(&mut time_bench.time_queue, || open.pop());
        let current = match popped {
            Some(id) => id,
            None => break TerminateStatus::EmptyQueue,
        };
        nodes[current].handle = None;

        if time_bench.expands % PRINT_EVERY == 0 {
            info!(
                expands = time_bench.expands,
                open = open.len(),
                best_distance = best_distance_to_goal,
                f_score = nodes[current].f_score,
                "search status"
            );
        }
        time_bench.expands += 1;

        let current_state = nodes[current].state.clone();
        let current_g = nodes[current].g_score;

        let distance_to_goal = robot.distance(&current_state, goal);
        best_distance_to_goal = best_distance_to_goal.min(distance_to_goal);
        if distance_to_goal < goal_radius {
            info!(
                cost = nodes[current].f_score,
                distance = distance_to_goal,
                "found solution"
            );
            solution = Some(current);
            break TerminateStatus::Solved;
        }

        let lazy_trajs = timed(&mut time_bench.time_lazy_expand, || {
            expander.expand_lazy(&current_state)
        });

        let mut num_new_children = 0;
        for lazy in &lazy_trajs {
            if !check_lazy_trajectory(
                lazy,
                &mut time_bench,
                &mut rollout,
                per_state_bounds,
                options.use_collision_shapes,
            ) {
                continue;
            }

            let chosen_index = if options.check_intermediate_goal {
                timed(&mut time_bench.time_check_goal, || {
                    check_goal(robot, goal, &rollout.states, goal_radius, options.num_check_goal)
                })
            } else {
                None
            };
            // a valid rollout holds every primitive state, so at least two
            let stop = chosen_index.unwrap_or(rollout.len() - 1);
            let candidate = &rollout.states[stop];

            let h_score = timed(&mut time_bench.time_hfun, || heuristic.h(candidate));
            check_heuristic_bounds(h_score)?;

            let cost_motion = stop as f64 * robot.ref_dt();
            let g_score = current_g
                + cost_motion
                + options.cost_delta_factor * robot.lower_bound_time(&current_state, &rollout.states[0]);

            let neighbors = timed(&mut time_bench.time_nearest_node_search, || {
                node_index.nearest_r(candidate, novelty_radius)
            });

            if neighbors.is_empty() || chosen_index.is_some() {
                let id = timed(&mut time_bench.time_alloc_primitive, || {
                    nodes.push(Node::child(
                        candidate.clone(),
                        g_score,
                        h_score,
                        current,
                        lazy.motion.idx,
                        chosen_index,
                    ))
                });
                let handle = timed(&mut time_bench.time_queue, || open.push(id, &nodes[id]))?;
                nodes[id].handle = Some(handle);
                timed(&mut time_bench.time_nearest_node_add, || {
                    node_index.add(candidate.clone(), id)
                });
                num_new_children += 1;
            } else {
                for neighbor in neighbors {
                    let tentative_g = g_score + robot.lower_bound_time(candidate, &nodes[neighbor].state);
                    if tentative_g >= nodes[neighbor].g_score {
                        continue;
                    }
                    let node = &mut nodes[neighbor];
                    node.set_g_score(tentative_g);
                    node.came_from = Some(current);
                    node.used_motion = Some(lazy.motion.idx);
                    // a relaxing edge is always taken in full
                    node.intermediate_state = None;
                    let handle = node.handle;
                    match handle {
                        Some(handle) => {
                            timed(&mut time_bench.time_queue, || open.update(handle, &nodes[neighbor]))?;
                        }
                        None => {
                            let handle =
                                timed(&mut time_bench.time_queue, || open.push(neighbor, &nodes[neighbor]))?;
                            nodes[neighbor].handle = Some(handle);
                        }
                    }
                }
            }

            if num_new_children >= options.limit_branching_factor {
                break;
            }
        }
    };

    time_bench.time_search = watch.elapsed_ms();
    time_bench.finalize(expander.time_in_nn)?;

    info!(status = %status, "terminate status");
    time_bench.log();

    let solved = status == TerminateStatus::Solved;
    let terminal = match solution {
        Some(id) if solved => id,
        _ => {
            let nearest = node_index
                .nearest(goal)
                .ok_or_else(|| PlanningError::Consistency("node index is empty".to_string()))?;
            info!(
                distance = robot.distance(&nodes[nearest].state, goal),
                "closest node to goal"
            );
            nearest
        }
    };

    let mut trajectory = from_solution_to_trajectory(robot, motions, &nodes, terminal, start, goal)?;

    if solved {
        let thresholds = FeasibilityThresholds {
            col_tol: SOLVED_COL_TOL,
            goal_tol: options.delta.max(goal_radius),
            traj_tol: options.delta,
        };
        trajectory.update_feasibility(robot, &thresholds);
        ensure_consistent!(
            trajectory.feasible,
            "solution is infeasible: goal distance {}, max jump {}, max collision {}, bounds valid {}",
            trajectory.goal_distance,
            trajectory.max_jump,
            trajectory.max_collision,
            trajectory.bounds_valid
        );
    }
    trajectory.update_feasibility(robot, &options.feasibility);
    debug!(
        feasible = trajectory.feasible,
        num_states = trajectory.len(),
        "output trajectory"
    );

    let mut data = time_bench.to_data()?;
    data.insert("terminate_status".to_string(), status.as_str().to_string());
    data.insert("solved".to_string(), solved.to_string());
    data.insert("delta".to_string(), options.delta.to_string());
    data.insert("num_primitives".to_string(), motions.len().to_string());

    let report = SearchReport {
        solved,
        cost: trajectory.cost,
        time_search: time_bench.time_search,
        status,
        num_nodes: nodes.len(),
        num_primitives: motions.len(),
        delta: options.delta,
        time_bench,
        data,
    };

    Ok(TdbAStarOutput {
        trajectory,
        report,
        nodes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_planning::tdbastar::motion::{compute_collision_shapes, generate_primitives};
    use crate::robots::{Environment, Integrator2D, Obstacle, Unicycle1};
    use nalgebra::{dvector, Vector2};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn open_env() -> Environment {
        Environment::empty(Vector2::new(-3.0, -3.0), Vector2::new(3.0, 3.0))
    }

    fn problem(robot_type: &str, start: State, goal: State, env: Environment) -> Problem {
        Problem {
            name: "test".to_string(),
            robot_type: robot_type.to_string(),
            start,
            goal,
            env,
        }
    }

    fn deterministic() -> TdbAStarOptions {
        TdbAStarOptions {
            fix_seed: true,
            ..TdbAStarOptions::default()
        }
    }

    /// Eight constant-velocity primitives for the integrator
    fn integrator_motions(robot: &Integrator2D, steps: usize) -> Vec<MotionPrimitive> {
        let v = robot.max_vel();
        let directions = [
            (v, 0.0),
            (-v, 0.0),
            (0.0, v),
            (0.0, -v),
            (v, v),
            (v, -v),
            (-v, v),
            (-v, -v),
        ];
        let mut motions: Vec<MotionPrimitive> = directions
            .iter()
            .enumerate()
            .map(|(idx, (vx, vy))| {
                MotionPrimitive::from_rollout(idx, robot, State::zeros(2), vec![dvector![*vx, *vy]; steps])
            })
            .collect();
        compute_collision_shapes(&mut motions, robot);
        motions
    }

    fn assert_scores_consistent(nodes: &NodeStore) {
        for (_, node) in nodes.iter() {
            assert_eq!(node.f_score, node.g_score + node.h_score);
            assert!(node.h_score >= 0.0);
        }
    }

    #[test]
    fn test_single_primitive_single_step() {
        let robot = Integrator2D::new(open_env());
        let motions = vec![MotionPrimitive::from_rollout(
            0,
            &robot,
            dvector![0.0, 0.0],
            vec![dvector![0.5, 0.0]],
        )];
        let problem = problem("integrator1_2d_v0", dvector![0.0, 0.0], dvector![0.05, 0.0], open_env());
        let options = TdbAStarOptions {
            delta: 0.04,
            ..deterministic()
        };

        let out = tdbastar(&problem, &options, &motions).unwrap();
        assert!(out.report.solved);
        assert_eq!(out.report.status, TerminateStatus::Solved);
        assert_eq!(out.report.time_bench.expands, 2);
        assert_eq!(out.trajectory.states.len(), 2);
        assert_eq!(out.trajectory.actions.len(), 1);
        assert_eq!(out.trajectory.states[0], problem.start);
        assert!((out.trajectory.cost - 0.1).abs() < 1e-12);
        assert!(out.trajectory.feasible);
        assert_eq!(out.report.data.get("terminate_status").map(String::as_str), Some("SOLVED"));
    }

    #[test]
    fn test_start_inside_goal_radius() {
        let robot = Integrator2D::new(open_env());
        let motions = integrator_motions(&robot, 5);
        let problem = problem("integrator1_2d_v0", dvector![0.0, 0.0], dvector![0.01, 0.0], open_env());
        let out = tdbastar_with_robot(&problem, &deterministic(), &motions, &robot).unwrap();
        assert!(out.report.solved);
        assert_eq!(out.trajectory.states.len(), 1);
        assert!(out.trajectory.actions.is_empty());
    }

    #[test]
    fn test_solves_around_obstacle() {
        let env = Environment::new(
            Vector2::new(-3.0, -3.0),
            Vector2::new(3.0, 3.0),
            vec![Obstacle::rectangle(0.0, 0.0, 0.4, 2.0)],
        );
        let robot = Integrator2D::new(env.clone());
        let motions = integrator_motions(&robot, 5);
        let problem = problem("integrator1_2d_v0", dvector![-1.0, 0.0], dvector![1.0, 0.0], env);
        let options = TdbAStarOptions {
            delta: 0.2,
            max_expands: 5000,
            feasibility: FeasibilityThresholds {
                goal_tol: 0.2,
                ..FeasibilityThresholds::default()
            },
            ..deterministic()
        };
        let out = tdbastar_with_robot(&problem, &options, &motions, &robot).unwrap();
        assert!(out.report.solved);
        assert!(out.trajectory.feasible);
        assert_eq!(out.trajectory.states[0], problem.start);
        assert!(robot.distance(out.trajectory.states.last().unwrap(), &problem.goal) < options.goal_radius());
        assert!(out.trajectory.max_collision <= options.feasibility.col_tol);
        assert_scores_consistent(&out.nodes);
        // parent links keep increasing cost-to-come
        for (_, node) in out.nodes.iter() {
            if let Some(parent) = node.came_from {
                assert!(out.nodes[parent].g_score < node.g_score);
            }
        }
    }

    #[test]
    fn test_bounds_scan_after_rollout_matches_per_state() {
        // the walls of a narrow corridor come from the workspace bounds
        let env = Environment::empty(Vector2::new(-2.0, -0.3), Vector2::new(2.0, 0.3));
        let robot = Integrator2D::new(env.clone());
        let motions = integrator_motions(&robot, 4);
        let problem = problem("integrator1_2d_v0", dvector![-1.5, 0.0], dvector![1.5, 0.0], env);
        let run = |per_state: bool| {
            let options = TdbAStarOptions {
                delta: 0.2,
                max_expands: 2000,
                check_bounds_per_state: per_state,
                ..deterministic()
            };
            tdbastar_with_robot(&problem, &options, &motions, &robot).unwrap()
        };
        let per_state = run(true);
        let after_rollout = run(false);
        assert!(per_state.report.solved);
        assert!(after_rollout.report.solved);
        assert_eq!(per_state.report.num_nodes, after_rollout.report.num_nodes);
        assert_eq!(per_state.trajectory.states, after_rollout.trajectory.states);
        assert!(after_rollout.trajectory.bounds_valid);
    }

    #[test]
    fn test_unicycle_with_generated_primitives() {
        let env = Environment::empty(Vector2::new(0.0, 0.0), Vector2::new(3.0, 3.0));
        let robot = Unicycle1::new(env.clone());
        let mut rng = StdRng::seed_from_u64(42);
        let motions = generate_primitives(&robot, 100, 10, &mut rng);
        let problem = problem("unicycle1_v0", dvector![0.5, 0.5, 0.0], dvector![2.0, 1.5, 0.0], env);
        let options = TdbAStarOptions {
            delta: 0.4,
            max_expands: 300,
            ..deterministic()
        };
        let out = tdbastar(&problem, &options, &motions).unwrap();
        assert_scores_consistent(&out.nodes);
        assert_eq!(out.trajectory.states[0], problem.start);
        assert_eq!(out.trajectory.actions.len() + 1, out.trajectory.states.len());
        if out.report.solved {
            assert!(robot.distance(out.trajectory.states.last().unwrap(), &problem.goal) < options.goal_radius());
        }
    }

    #[test]
    fn test_novelty_without_intermediate_goals() {
        let robot = Integrator2D::new(open_env());
        let motions = integrator_motions(&robot, 4);
        let problem = problem("integrator1_2d_v0", dvector![0.0, 0.0], dvector![2.5, 2.5], open_env());
        let options = TdbAStarOptions {
            delta: 0.2,
            max_expands: 200,
            check_intermediate_goal: false,
            ..deterministic()
        };
        let out = tdbastar_with_robot(&problem, &options, &motions, &robot).unwrap();
        let states: Vec<&State> = out.nodes.iter().map(|(_, n)| &n.state).collect();
        for (i, a) in states.iter().enumerate() {
            for b in states.iter().skip(i + 1) {
                assert!(robot.distance(a, b) > options.novelty_radius());
            }
        }
        assert!(out.nodes.iter().all(|(_, n)| n.intermediate_state.is_none()));
    }

    #[test]
    fn test_unreachable_goal() {
        let env = Environment::new(
            Vector2::new(-3.0, -3.0),
            Vector2::new(3.0, 3.0),
            vec![Obstacle::circle(2.0, 2.0, 0.7)],
        );
        let robot = Integrator2D::new(env.clone());
        let motions = integrator_motions(&robot, 4);
        let problem = problem("integrator1_2d_v0", dvector![-2.0, -2.0], dvector![2.0, 2.0], env);
        let options = TdbAStarOptions {
            delta: 0.3,
            max_expands: 50,
            ..deterministic()
        };
        let out = tdbastar_with_robot(&problem, &options, &motions, &robot).unwrap();
        assert!(!out.report.solved);
        assert!(matches!(
            out.report.status,
            TerminateStatus::MaxExpands | TerminateStatus::EmptyQueue
        ));
        assert!(!out.trajectory.is_empty());
        assert_eq!(out.trajectory.states[0], problem.start);

        // the trajectory ends at the visited node closest to the goal
        let last = out.trajectory.states.last().unwrap();
        let closest = out
            .nodes
            .iter()
            .map(|(_, n)| robot.distance(&n.state, &problem.goal))
            .fold(f64::INFINITY, f64::min);
        assert!((robot.distance(last, &problem.goal) - closest).abs() < 1e-9);
    }

    #[test]
    fn test_max_time() {
        let env = Environment::empty(Vector2::new(-30.0, -30.0), Vector2::new(30.0, 30.0));
        let robot = Integrator2D::new(env.clone());
        let motions = integrator_motions(&robot, 4);
        let problem = problem("integrator1_2d_v0", dvector![-29.0, -29.0], dvector![29.0, 29.0], env);
        let options = TdbAStarOptions {
            delta: 0.05,
            max_expands: usize::MAX,
            search_timelimit: 50.0,
            ..deterministic()
        };
        let out = tdbastar_with_robot(&problem, &options, &motions, &robot).unwrap();
        assert_eq!(out.report.status, TerminateStatus::MaxTime);
        assert!(!out.report.solved);
        assert!(!out.trajectory.is_empty());
        assert_eq!(out.trajectory.states[0], problem.start);
        assert!(out.report.time_search >= options.search_timelimit);
    }

    #[test]
    fn test_empty_queue_when_boxed_in() {
        let env = Environment::new(
            Vector2::new(-3.0, -3.0),
            Vector2::new(3.0, 3.0),
            vec![
                Obstacle::rectangle(0.0, 0.6, 1.4, 0.2),
                Obstacle::rectangle(0.0, -0.6, 1.4, 0.2),
                Obstacle::rectangle(0.6, 0.0, 0.2, 1.4),
                Obstacle::rectangle(-0.6, 0.0, 0.2, 1.4),
            ],
        );
        let robot = Integrator2D::new(env.clone());
        let motions = integrator_motions(&robot, 4);
        let problem = problem("integrator1_2d_v0", dvector![0.0, 0.0], dvector![2.0, 2.0], env);
        let options = TdbAStarOptions {
            delta: 0.3,
            ..deterministic()
        };
        let out = tdbastar_with_robot(&problem, &options, &motions, &robot).unwrap();
        assert_eq!(out.report.status, TerminateStatus::EmptyQueue);
        assert!(!out.report.solved);
        assert!(out.report.num_nodes < 100);
    }

    #[test]
    fn test_relaxation_keeps_cheaper_node() {
        let robot = Integrator2D::new(open_env());
        let v = robot.max_vel();
        // both end at (0.2, 0): the first one takes a detour of six steps,
        // the second one goes straight in four
        let detour = vec![
            dvector![0.0, v],
            dvector![v, 0.0],
            dvector![v, 0.0],
            dvector![v, 0.0],
            dvector![v, 0.0],
            dvector![0.0, -v],
        ];
        let motions = vec![
            MotionPrimitive::from_rollout(0, &robot, State::zeros(2), detour),
            MotionPrimitive::from_rollout(1, &robot, State::zeros(2), vec![dvector![v, 0.0]; 4]),
        ];
        let problem = problem("integrator1_2d_v0", dvector![0.0, 0.0], dvector![-2.0, -2.0], open_env());
        for shuffle in [false, true] {
            let options = TdbAStarOptions {
                delta: 0.2,
                max_expands: 2,
                shuffle_expansions: shuffle,
                check_intermediate_goal: false,
                ..deterministic()
            };
            let out = tdbastar_with_robot(&problem, &options, &motions, &robot).unwrap();
            let target = dvector![0.2, 0.0];
            let at_target: Vec<&Node> = out
                .nodes
                .iter()
                .map(|(_, n)| n)
                .filter(|n| robot.distance(&n.state, &target) <= options.novelty_radius())
                .collect();
            assert_eq!(at_target.len(), 1);
            assert!((at_target[0].g_score - 0.4).abs() < 1e-9);
            assert_eq!(at_target[0].used_motion, Some(1));
            assert_scores_consistent(&out.nodes);
        }
    }

    #[test]
    fn test_time_benchmark_is_filled() {
        let robot = Integrator2D::new(open_env());
        let motions = integrator_motions(&robot, 4);
        let problem = problem("integrator1_2d_v0", dvector![0.0, 0.0], dvector![1.5, -1.0], open_env());
        let out = tdbastar_with_robot(&problem, &deterministic(), &motions, &robot).unwrap();
        let bench = &out.report.time_bench;
        assert!(bench.expands > 0);
        assert!(bench.num_col_motions > 0);
        assert!(bench.time_search > 0.0);
        assert_eq!(bench.time_nearest_node, bench.time_nearest_node_add + bench.time_nearest_node_search);
        assert_eq!(out.report.num_primitives, 8);
        assert_eq!(out.report.num_nodes, out.nodes.len());
        assert!(out.report.data.contains_key("time_collisions"));
    }

    #[test]
    fn test_invalid_configuration() {
        let robot = Integrator2D::new(open_env());
        let motions = integrator_motions(&robot, 4);
        let problem = problem("integrator1_2d_v0", dvector![0.0, 0.0], dvector![1.0, 0.0], open_env());

        let negative_delta = TdbAStarOptions {
            delta: -1.0,
            ..deterministic()
        };
        assert!(matches!(
            tdbastar(&problem, &negative_delta, &motions),
            Err(PlanningError::InvalidParameter(_))
        ));

        let bad_alpha = TdbAStarOptions {
            alpha: 1.0,
            ..deterministic()
        };
        assert!(matches!(
            tdbastar(&problem, &bad_alpha, &motions),
            Err(PlanningError::InvalidParameter(_))
        ));

        assert!(matches!(
            tdbastar(&problem, &deterministic(), &[]),
            Err(PlanningError::Configuration(_))
        ));

        let unknown = Problem {
            robot_type: "quadrotor_v0".to_string(),
            ..problem.clone()
        };
        assert!(matches!(
            tdbastar(&unknown, &deterministic(), &motions),
            Err(PlanningError::Configuration(_))
        ));

        // integrator primitives handed to a unicycle problem
        let unicycle = Problem {
            robot_type: "unicycle1_v0".to_string(),
            start: dvector![0.0, 0.0, 0.0],
            goal: dvector![1.0, 0.0, 0.0],
            ..problem.clone()
        };
        assert!(matches!(
            tdbastar(&unicycle, &deterministic(), &motions),
            Err(PlanningError::Configuration(_))
        ));

        let wrong_dim = Problem {
            start: dvector![0.0, 0.0, 0.0],
            ..problem
        };
        assert!(matches!(
            tdbastar(&wrong_dim, &deterministic(), &motions),
            Err(PlanningError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_roadmap_heuristic_search() {
        let env = Environment::new(
            Vector2::new(-3.0, -3.0),
            Vector2::new(3.0, 3.0),
            vec![Obstacle::rectangle(0.0, 0.0, 0.4, 2.0)],
        );
        let robot = Integrator2D::new(env.clone());
        let goal = dvector![1.0, 0.0];
        let mut rng = StdRng::seed_from_u64(1);
        let heu_map = crate::path_planning::tdbastar::heuristic::build_heuristic_map(
            &robot,
            &goal,
            &Default::default(),
            &mut rng,
        )
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("heu_map.json");
        crate::path_planning::tdbastar::heuristic::write_heu_map(&path, &heu_map).unwrap();

        let motions = integrator_motions(&robot, 5);
        let problem = problem("integrator1_2d_v0", dvector![-1.0, 0.0], goal, env);
        let options = TdbAStarOptions {
            delta: 0.2,
            max_expands: 5000,
            heuristic: HeuristicKind::Roadmap,
            heu_map_file: Some(path),
            ..deterministic()
        };
        let out = tdbastar_with_robot(&problem, &options, &motions, &robot).unwrap();
        assert!(out.report.solved);
        assert_scores_consistent(&out.nodes);
    }
}
