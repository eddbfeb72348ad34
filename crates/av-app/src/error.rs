use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single generation call. One variant per cause the caller
/// may want to treat differently; no retrying happens at this level.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerateError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("quota or rate limit exceeded: {0}")]
    Quota(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected response from generation service: {0}")]
    ResponseFormat(String),
}

/// Failure writing a generated image (or the run directory) to disk.
#[derive(Debug, Error)]
#[error("failed to write output `{}`: {source}", .path.display())]
pub struct OutputError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}
