// tdbastar demo for the first-order unicycle
//
// usage: tdbastar_unicycle [problem.json [motions.json [options.toml]]]
// Without arguments a built-in problem and a random primitive library are used.

use std::path::{Path, PathBuf};

use nalgebra::{dvector, Vector2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rust_tdbastar::path_planning::tdbastar::{
    build_motion_index, filter_duplicates, generate_primitives, load_primitives, tdbastar, MotionPrimitive,
    Problem, TdbAStarOptions,
};
use rust_tdbastar::robots::{robot_factory, Environment, Obstacle, Unicycle1};
use rust_tdbastar::utils::{PathStyle, Visualizer};
use rust_tdbastar::PlanningResult;

const NUM_PRIMITIVES: usize = 2000;
const PRIMITIVE_STEPS: usize = 5;

fn default_problem() -> Problem {
    Problem {
        name: "unicycle_wall".to_string(),
        robot_type: Unicycle1::NAME.to_string(),
        start: dvector![0.5, 0.5, 0.0],
        goal: dvector![4.5, 2.5, 0.0],
        env: Environment::new(
            Vector2::new(0.0, 0.0),
            Vector2::new(5.0, 3.0),
            vec![Obstacle::rectangle(2.5, 1.0, 0.4, 2.0), Obstacle::circle(3.8, 2.0, 0.3)],
        ),
    }
}

fn primitives(problem: &Problem, path: Option<&Path>, options: &TdbAStarOptions) -> PlanningResult<Vec<MotionPrimitive>> {
    let robot = robot_factory(&problem.robot_type, &problem.env)?;
    if let Some(path) = path {
        return load_primitives(path, robot.as_ref());
    }
    let mut rng = StdRng::seed_from_u64(0);
    let mut motions = generate_primitives(robot.as_ref(), NUM_PRIMITIVES, PRIMITIVE_STEPS, &mut rng);
    let index = build_motion_index(&motions, robot.as_ref(), motions.len());
    filter_duplicates(&mut motions, options.delta, options.alpha, robot.as_ref(), &index, 1.0);
    Ok(motions)
}

fn main() -> PlanningResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
    let problem = match args.first() {
        Some(path) => Problem::load(path)?,
        None => default_problem(),
    };
    let options = match args.get(2) {
        Some(path) => TdbAStarOptions::load(path)?,
        None => TdbAStarOptions {
            delta: 0.3,
            max_expands: 20_000,
            fix_seed: true,
            ..Default::default()
        },
    };
    let motions = primitives(&problem, args.get(1).map(PathBuf::as_path), &options)?;

    info!(problem = %problem.name, num_primitives = motions.len(), "start tdbastar");
    let out = tdbastar(&problem, &options, &motions)?;
    info!(
        solved = out.report.solved,
        cost = out.report.cost,
        status = %out.report.status,
        feasible = out.trajectory.feasible,
        "tdbastar finished"
    );

    let mut vis = Visualizer::new();
    vis.set_title(&format!("tdbastar: {}", problem.name))
        .plot_environment(&problem.env)
        .plot_search_tree(&out.nodes)
        .plot_trajectory(&out.trajectory, &PathStyle::default())
        .plot_start(&problem.start)
        .plot_goal(&problem.goal);
    let dir = Path::new("./img/path_planning");
    std::fs::create_dir_all(dir).map_err(|e| rust_tdbastar::PlanningError::io(dir, e))?;
    vis.save_png(&dir.join("tdbastar.png"), 800, 500)
}
