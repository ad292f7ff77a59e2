//! Error kinds surfaced by a pipeline run.
//!
//! Every variant except [`PipelineError::Decode`] is fatal for the run. Decode
//! failures are first offered to the caller's [`crate::dispatch::ResultHandler`],
//! and only end up here when the handler asks for the error to be rethrown.

use thiserror::Error;

use crate::contract::StoreError;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Listing the container failed (auth, network, missing bucket).
    #[error("listing s3://{container}/{prefix} failed: {source}")]
    Enumeration {
        container: String,
        prefix: String,
        #[source]
        source: StoreError,
    },

    /// Retrieving one object failed.
    #[error("fetching s3://{container}/{key} failed: {source}")]
    Fetch {
        container: String,
        key: String,
        #[source]
        source: StoreError,
    },

    /// The object was fetched but its gzip body could not be decoded.
    #[error("decompressing {key} failed: {source}")]
    Decompress {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Local I/O on the combined log or the profile file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The analyzer could not be started or exited abnormally.
    #[error("analyzer invocation failed: {0}")]
    AnalyzerInvocation(String),

    /// The analyzer output was not valid JSON and the handler did not recover.
    #[error("decoding analyzer output failed: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
        raw: Vec<u8>,
    },

    /// A result handler failed while consuming the result.
    #[error("result handler failed: {0}")]
    Handler(StoreError),

    /// The run was cancelled before the analyzer was invoked.
    #[error("run cancelled")]
    Cancelled,
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
