use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = LabelError> = std::result::Result<T, E>;

/// Errors raised by label I/O and the point-cloud model.
#[derive(Debug, Error)]
pub enum LabelError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: {reason}")]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("label {index} cannot be exported: {reason}")]
    InvalidLabel { index: usize, reason: String },

    #[error("point cloud {path} has no '{field}' field")]
    MissingField { path: PathBuf, field: String },

    #[error("expected {points} colors to match the points, got {colors}")]
    ColorCount { points: usize, colors: usize },

    #[error("point cloud {0} must be uploaded before it is rendered")]
    NotUploaded(PathBuf),

    #[error("failed to read point cloud {path}: {reason}")]
    Pcd { path: PathBuf, reason: String },

    #[error("invalid config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("render backend error: {0}")]
    Backend(String),
}

impl LabelError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
