//! Typed error hierarchy for namefix.
//!
//! One enum per seam:
//! - `RemoteError`: any failed exchange with the analysis service
//! - `OrchestratorError`: job lifecycle failures (remote errors, poll ceiling)
//! - `DirectiveError`: the remote's suggestion text is not a well-formed directive list
//! - `ConfigError`: missing credentials and invalid configuration values
//!
//! Per-directive problems (missing file, rejected path, unreadable file) are not
//! errors; they are reported as `RenameOutcome`s.

use std::time::Duration;
use thiserror::Error;

/// A request to the remote analysis service did not succeed.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("{operation} request failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation} request returned HTTP {status}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("Failed to decode {operation} response: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },

    #[error("Invalid job handle '{0}': expected <remote>:<branch>:<owner/repo>")]
    InvalidHandle(String),
}

/// Errors from the job orchestrator.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("Indexing of {handle} did not complete after {attempts} status checks ({elapsed:?})")]
    PollTimeout {
        handle: String,
        attempts: u32,
        elapsed: Duration,
    },

    #[error("Indexing of {handle} reported failure")]
    JobFailed { handle: String },
}

/// The suggestion text could not be turned into rename directives.
#[derive(Debug, Error)]
pub enum DirectiveError {
    #[error("Malformed directive list at byte {position}: {message}")]
    Malformed { position: usize, message: String },

    #[error("Response envelope is not valid JSON: {0}")]
    InvalidEnvelope(#[source] serde_json::Error),

    #[error("Response envelope has no 'message' text")]
    MissingMessage,

    #[error("Directive {index} has an invalid {field}: {message}")]
    InvalidField {
        index: usize,
        field: &'static str,
        message: String,
    },
}

/// Configuration problems.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing credential: set {0} in the environment or in .env")]
    MissingCredential(&'static str),

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}
