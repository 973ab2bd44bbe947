//! Error types for the request/response harness.
//!
//! # Design
//! Every failure surfaces to the caller unchanged; nothing here is retried.
//! The one condition that is deliberately not an error is a server that never
//! prints its readiness marker (see `process::start_server`).

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HarnessError>;

/// Errors returned by the harness entry points.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A required input file is missing or one of the flat files is malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The request body file is not valid JSON.
    #[error("invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The method in `request_url.txt` is not GET, POST, PUT, PATCH or DELETE.
    #[error("unsupported http method: {0}")]
    UnsupportedMethod(String),

    /// The HTTP round-trip itself failed (connection refused, DNS, ...).
    #[error("http request failed: {0}")]
    Network(#[from] Box<ureq::Error>),

    /// The server command could not be spawned.
    #[error("failed to start `{command}`: {source}")]
    ProcessLaunch {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl HarnessError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        HarnessError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<ureq::Error> for HarnessError {
    fn from(err: ureq::Error) -> Self {
        HarnessError::Network(Box::new(err))
    }
}
