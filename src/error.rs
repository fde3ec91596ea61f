//! Error types shared across the crate.

use std::path::PathBuf;

use thiserror::Error;

/// A malformed track-descriptor batch. Fatal for the whole batch.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read track descriptors from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed track descriptor batch: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed track descriptor batch: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("track {id}: {field} range is invalid (min {min}, max {max})")]
    InvalidRange {
        id: i64,
        field: &'static str,
        min: f32,
        max: f32,
    },

    #[error("track id {0} appears more than once")]
    DuplicateId(i64),
}

/// Failure to hand an asset to the playback backend.
///
/// Recovered inside the track by moving on to the next asset.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {path:?}: {reason}")]
    Decode { path: PathBuf, reason: String },
}

/// Errors that prevent a session from starting.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Tracks(#[from] ConfigError),

    #[error("asset directory {0:?} does not exist")]
    MissingAssetDir(PathBuf),

    #[error("no audio output device: {0}")]
    Output(#[from] rodio::StreamError),

    #[error("failed to spawn track thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("failed to read commands: {0}")]
    Io(#[from] std::io::Error),
}
