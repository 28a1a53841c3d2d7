//! Plotting of environments, search trees and trajectories with gnuplot
//!
//! Layers are collected first and drawn into a single axes on save, so
//! every call only records data.

use std::f64::consts::PI;
use std::path::Path;

use gnuplot::{AutoOption, AxesCommon, Caption, Color, Figure, LineWidth, PointSize, PointSymbol};

use crate::common::{PlanningError, PlanningResult, State, Trajectory};
use crate::path_planning::tdbastar::NodeStore;
use crate::robots::{Environment, Obstacle};

/// Color palette for consistent styling
pub mod colors {
    pub const OBSTACLE: &str = "#000000";
    pub const BOUNDS: &str = "#808080";
    pub const START: &str = "#00AA00";
    pub const GOAL: &str = "#0000FF";
    pub const PATH: &str = "#FF0000";
    pub const TREE: &str = "#C0C0C0";
}

/// Segments used to draw a circle outline
const CIRCLE_SEGMENTS: usize = 32;

/// Style for path rendering
#[derive(Debug, Clone)]
pub struct PathStyle {
    pub color: String,
    pub line_width: f64,
    pub caption: String,
}

impl PathStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            line_width: 2.0,
            caption: caption.to_string(),
        }
    }

    pub fn with_line_width(mut self, width: f64) -> Self {
        self.line_width = width;
        self
    }
}

impl Default for PathStyle {
    fn default() -> Self {
        Self::new(colors::PATH, "Trajectory")
    }
}

#[derive(Debug, Clone)]
enum Layer {
    Lines { x: Vec<f64>, y: Vec<f64>, style: PathStyle },
    Point { x: f64, y: f64, color: String, caption: String },
}

/// Main visualizer struct
pub struct Visualizer {
    title: String,
    x_range: Option<(f64, f64)>,
    y_range: Option<(f64, f64)>,
    layers: Vec<Layer>,
}

impl Visualizer {
    pub fn new() -> Self {
        Self {
            title: String::new(),
            x_range: None,
            y_range: None,
            layers: Vec::new(),
        }
    }

    pub fn set_title(&mut self, title: &str) -> &mut Self {
        self.title = title.to_string();
        self
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// Workspace bounds and obstacle outlines; also fixes the axis ranges.
    pub fn plot_environment(&mut self, env: &Environment) -> &mut Self {
        self.x_range = Some((env.min.x, env.max.x));
        self.y_range = Some((env.min.y, env.max.y));
        let bounds = PathStyle::new(colors::BOUNDS, "").with_line_width(1.0);
        self.push_lines(
            vec![env.min.x, env.max.x, env.max.x, env.min.x, env.min.x],
            vec![env.min.y, env.min.y, env.max.y, env.max.y, env.min.y],
            bounds,
        );

        for obstacle in &env.obstacles {
            let (x, y) = obstacle_outline(obstacle);
            self.push_lines(x, y, PathStyle::new(colors::OBSTACLE, "").with_line_width(1.5));
        }
        self
    }

    /// One segment per parent link, from parent state to child state.
    pub fn plot_search_tree(&mut self, nodes: &NodeStore) -> &mut Self {
        for (_, node) in nodes.iter() {
            let Some(parent) = node.came_from.and_then(|id| nodes.get(id)) else {
                continue;
            };
            self.push_lines(
                vec![parent.state[0], node.state[0]],
                vec![parent.state[1], node.state[1]],
                PathStyle::new(colors::TREE, "").with_line_width(0.5),
            );
        }
        self
    }

    pub fn plot_trajectory(&mut self, traj: &Trajectory, style: &PathStyle) -> &mut Self {
        let x = traj.states.iter().map(|s| s[0]).collect();
        let y = traj.states.iter().map(|s| s[1]).collect();
        self.push_lines(x, y, style.clone());
        self
    }

    pub fn plot_start(&mut self, state: &State) -> &mut Self {
        self.push_point(state, colors::START, "Start")
    }

    pub fn plot_goal(&mut self, state: &State) -> &mut Self {
        self.push_point(state, colors::GOAL, "Goal")
    }

    pub fn save_png(&self, path: &Path, width: u32, height: u32) -> PlanningResult<()> {
        let mut figure = self.render();
        figure
            .save_to_png(path, width, height)
            .map_err(|e| PlanningError::Visualization(format!("{}: {}", path.display(), e)))
    }

    pub fn save_svg(&self, path: &Path, width: u32, height: u32) -> PlanningResult<()> {
        let mut figure = self.render();
        figure
            .save_to_svg(path, width, height)
            .map_err(|e| PlanningError::Visualization(format!("{}: {}", path.display(), e)))
    }

    fn push_lines(&mut self, x: Vec<f64>, y: Vec<f64>, style: PathStyle) {
        self.layers.push(Layer::Lines { x, y, style });
    }

    fn push_point(&mut self, state: &State, color: &str, caption: &str) -> &mut Self {
        self.layers.push(Layer::Point {
            x: state[0],
            y: state[1],
            color: color.to_string(),
            caption: caption.to_string(),
        });
        self
    }

    fn render(&self) -> Figure {
        let mut figure = Figure::new();
        let axes = figure.axes2d();
        if !self.title.is_empty() {
            axes.set_title(&self.title, &[]);
        }
        axes.set_x_label("X [m]", &[]);
        axes.set_y_label("Y [m]", &[]);
        axes.set_aspect_ratio(AutoOption::Fix(1.0));
        if let Some((min, max)) = self.x_range {
            axes.set_x_range(AutoOption::Fix(min), AutoOption::Fix(max));
        }
        if let Some((min, max)) = self.y_range {
            axes.set_y_range(AutoOption::Fix(min), AutoOption::Fix(max));
        }

        for layer in &self.layers {
            match layer {
                Layer::Lines { x, y, style } => {
                    axes.lines(
                        x,
                        y,
                        &[Caption(&style.caption), Color(&style.color), LineWidth(style.line_width)],
                    );
                }
                Layer::Point { x, y, color, caption } => {
                    axes.points(
                        &[*x],
                        &[*y],
                        &[Caption(caption), Color(color), PointSymbol('O'), PointSize(1.5)],
                    );
                }
            }
        }
        figure
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}

fn obstacle_outline(obstacle: &Obstacle) -> (Vec<f64>, Vec<f64>) {
    match obstacle {
        Obstacle::Circle { center, radius } => (0..=CIRCLE_SEGMENTS)
            .map(|i| {
                let a = 2.0 * PI * i as f64 / CIRCLE_SEGMENTS as f64;
                (center.x + radius * a.cos(), center.y + radius * a.sin())
            })
            .unzip(),
        Obstacle::Box { center, size } => {
            let (hx, hy) = (size.x / 2.0, size.y / 2.0);
            (
                vec![center.x - hx, center.x + hx, center.x + hx, center.x - hx, center.x - hx],
                vec![center.y - hy, center.y - hy, center.y + hy, center.y + hy, center.y - hy],
            )
        }
    }
}
