//! Error types for rust_tdbastar

use std::path::PathBuf;

/// Main error type for the planner and its collaborators
#[derive(Debug, thiserror::Error)]
pub enum PlanningError {
    /// Invalid parameter (alpha, delta, limits, ...)
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// Missing or malformed inputs (primitive library, robot type, ...)
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// Internal bookkeeping went wrong; results cannot be trusted
    #[error("Consistency error: {0}")]
    Consistency(String),
    /// File could not be read or written
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// TOML config could not be parsed
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
    /// Plot could not be rendered
    #[error("Visualization error: {0}")]
    Visualization(String),
}

impl PlanningError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PlanningError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for planning operations
pub type PlanningResult<T> = Result<T, PlanningError>;

/// Return a [`PlanningError::Consistency`] when `cond` does not hold.
macro_rules! ensure_consistent {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::common::PlanningError::Consistency(format!($($arg)+)));
        }
    };
}

pub(crate) use ensure_consistent;
