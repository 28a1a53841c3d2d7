//! Search options and their TOML loader

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::common::{FeasibilityThresholds, PlanningError, PlanningResult};

/// Heuristic used to order the open set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeuristicKind {
    /// Robot lower-bound time to the goal
    Euclidean,
    /// Cost-to-go values reused from a heuristic map file
    Roadmap,
}

/// Configuration for the tdbastar search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TdbAStarOptions {
    /// Share of `delta` used to select primitives; the rest deduplicates
    pub alpha: f64,
    /// Novelty radius
    pub delta: f64,
    /// Goal acceptance radius is `delta_factor_goal * delta`
    pub delta_factor_goal: f64,
    /// Weight of the lower-bound time between a node and the first state
    /// of an aligned primitive
    pub cost_delta_factor: f64,
    /// Number of library primitives considered
    pub max_motions: usize,
    /// Maximum number of expansions
    pub max_expands: usize,
    /// Wall-clock budget [ms]
    pub search_timelimit: f64,
    /// Maximum number of new children per expansion
    pub limit_branching_factor: usize,
    /// Deterministic random number generators
    pub fix_seed: bool,
    /// Interior rollout states tested against the goal
    pub num_check_goal: usize,
    pub check_intermediate_goal: bool,
    /// Check bounds while rolling out and stop at the first invalid state;
    /// otherwise scan the finished rollout from its end
    pub check_bounds_per_state: bool,
    /// Use translated primitive collision shapes when the robot allows it
    pub use_collision_shapes: bool,
    /// Randomize the order in which primitives are tried
    pub shuffle_expansions: bool,
    pub heuristic: HeuristicKind,
    pub heu_map_file: Option<PathBuf>,
    /// Radius used to connect a state to heuristic map entries
    pub heu_connection_radius: f64,
    /// Tolerances for the final feasibility check
    pub feasibility: FeasibilityThresholds,
}

impl Default for TdbAStarOptions {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            delta: 0.3,
            delta_factor_goal: 1.0,
            cost_delta_factor: 0.0,
            max_motions: 1000,
            max_expands: 1000,
            search_timelimit: 10_000.0,
            limit_branching_factor: 1000,
            fix_seed: false,
            num_check_goal: 4,
            check_intermediate_goal: true,
            check_bounds_per_state: true,
            use_collision_shapes: true,
            shuffle_expansions: true,
            heuristic: HeuristicKind::Euclidean,
            heu_map_file: None,
            heu_connection_radius: 1.0,
            feasibility: FeasibilityThresholds::default(),
        }
    }
}

impl TdbAStarOptions {
    /// Read options from a TOML file; missing keys keep their defaults.
    pub fn load(path: &Path) -> PlanningResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| PlanningError::io(path, e))?;
        let options = Self::from_toml_str(&raw)?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_toml_str(raw: &str) -> PlanningResult<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Primitive selection radius
    pub fn selection_radius(&self) -> f64 {
        self.alpha * self.delta
    }

    /// Deduplication radius
    pub fn novelty_radius(&self) -> f64 {
        (1.0 - self.alpha) * self.delta
    }

    pub fn goal_radius(&self) -> f64 {
        self.delta_factor_goal * self.delta
    }

    pub fn validate(&self) -> PlanningResult<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(PlanningError::InvalidParameter(format!(
                "alpha needs to be between 0 and 1, got {}",
                self.alpha
            )));
        }
        if !(self.delta > 0.0) {
            return Err(PlanningError::InvalidParameter(format!(
                "delta must be positive, got {} (use calibration::automatic_delta to compute one)",
                self.delta
            )));
        }
        if !(self.delta_factor_goal > 0.0) {
            return Err(PlanningError::InvalidParameter(
                "delta_factor_goal must be positive".to_string(),
            ));
        }
        if self.cost_delta_factor < 0.0 {
            return Err(PlanningError::InvalidParameter(
                "cost_delta_factor must be zero or greater".to_string(),
            ));
        }
        if self.max_motions == 0 {
            return Err(PlanningError::InvalidParameter(
                "max_motions must be greater than zero".to_string(),
            ));
        }
        if self.limit_branching_factor == 0 {
            return Err(PlanningError::InvalidParameter(
                "limit_branching_factor must be greater than zero".to_string(),
            ));
        }
        if self.heuristic == HeuristicKind::Roadmap && self.heu_map_file.is_none() {
            return Err(PlanningError::Configuration(
                "roadmap heuristic requires heu_map_file".to_string(),
            ));
        }
        Ok(())
    }

    /// Log every option at info level
    pub fn log(&self) {
        info!(
            alpha = self.alpha,
            delta = self.delta,
            delta_factor_goal = self.delta_factor_goal,
            cost_delta_factor = self.cost_delta_factor,
            max_motions = self.max_motions,
            max_expands = self.max_expands,
            search_timelimit = self.search_timelimit,
            limit_branching_factor = self.limit_branching_factor,
            fix_seed = self.fix_seed,
            num_check_goal = self.num_check_goal,
            check_bounds_per_state = self.check_bounds_per_state,
            heuristic = ?self.heuristic,
            "tdbastar options"
        );
    }
}
