use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// An output directory could not be created or reached.
    #[error("cannot reach output location {path:?}: {source}")]
    Unreachable { path: PathBuf, source: io::Error },

    #[error("failed to persist {path:?}: {source}")]
    Persist { path: PathBuf, source: io::Error },

    #[error("failed to read {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },

    /// The upstream marker exists but its contents do not parse.
    #[error("upstream manifest {name} is malformed: {source}")]
    MalformedManifest {
        name: String,
        source: serde_json::Error,
    },

    #[error("gave up on {marker} after {waited:?}")]
    HandoffTimeout { marker: String, waited: Duration },

    #[error("output name {stem}.json is already claimed by {claimed_by}")]
    NameCollision { stem: String, claimed_by: String },

    #[error("invalid configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
