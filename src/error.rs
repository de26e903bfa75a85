//! Internal error taxonomy (spec §7), layered under `anyhow` at the CLI edge.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PangrepsError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("index corruption in {path}: {reason}")]
    IndexCorruption { path: PathBuf, reason: String },

    #[error("capacity exceeded: {0}")]
    CapacityExceeded(String),

    #[error("not implemented: {0}")]
    NotImplemented(String),
}

pub type Result<T> = std::result::Result<T, PangrepsError>;

impl PangrepsError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PangrepsError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn corruption(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        PangrepsError::IndexCorruption {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
