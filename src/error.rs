use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SunburstError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid chart config: {0}")]
    InvalidConfig(String),

    #[error("invalid color {0:?} (expected #RRGGBB)")]
    InvalidColor(String),
}

pub type Result<T> = std::result::Result<T, SunburstError>;
