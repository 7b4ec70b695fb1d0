use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Error surface for the daemon runtime and its HTTP client helpers.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(#[from] healer_core::ConfigError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{url} returned HTTP {status}: {body}")]
    Http { url: String, status: u16, body: String },

    #[error("daemon protocol error: {0}")]
    Protocol(String),

    #[error("daemon is not running (no answer at {url})")]
    DaemonNotRunning { url: String },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        path: path.into(),
        source,
    }
}

/// Failure of a single device-control command.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The command did not finish within the adapter's timeout.
    #[error("command timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The command ran but exited unsuccessfully. For liveness probes this is
    /// the expected "process not found" answer rather than a fault.
    #[error("command exited with status {code:?}: {stderr}")]
    NonZeroExit { code: Option<i32>, stderr: String },

    /// The command could not be spawned or its output could not be read.
    #[error("transport failure: {0}")]
    Transport(String),
}

impl ProbeError {
    pub fn is_negative_result(&self) -> bool {
        matches!(self, ProbeError::NonZeroExit { .. })
    }
}
