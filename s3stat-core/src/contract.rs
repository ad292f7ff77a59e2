//! # contract: collaborator interfaces for the log pipeline
//!
//! The pipeline talks to two things it does not own: the remote object store
//! that holds the log files, and the external analyzer process. Both sit behind
//! a trait here so the CLI can plug in the AWS client and `goaccess`, while
//! tests plug in `mockall` mocks.
//!
//! ## Mocking & Testing
//! - Both traits are annotated for `mockall`; the generated `MockObjectStore` and
//!   `MockAnalyzer` are exported under the `test-export-mocks` feature so
//!   integration tests in this and dependent crates can use them.
//!
//! ## Errors
//! - Store implementations return a boxed [`StoreError`]; the pipeline wraps it
//!   into the matching [`PipelineError`] variant together with the container and key.

use std::path::PathBuf;

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Error type returned by collaborators (simple boxed error, like the store SDKs give us).
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Which kind of access log the run processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSource {
    /// Plain S3 server access logs: space delimited, uncompressed.
    #[default]
    Storage,
    /// CloudFront edge logs: tab delimited, gzip compressed.
    EdgeCache,
}

impl LogSource {
    pub fn from_cloudfront_flag(cloudfront: bool) -> Self {
        if cloudfront {
            LogSource::EdgeCache
        } else {
            LogSource::Storage
        }
    }

    /// Whether fetched bodies must be gunzipped before concatenation.
    pub fn is_compressed(&self) -> bool {
        matches!(self, LogSource::EdgeCache)
    }
}

/// A remote log object selected for the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogObjectRef {
    pub container: String,
    pub key: String,
    pub compressed: bool,
}

/// One page of a listing call.
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    /// Object keys in the order the store returned them.
    pub keys: Vec<String>,
    /// Token to request the following page; `None` on the last page.
    pub next: Option<String>,
}

/// Read-only access to a bucket-like object store.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List one page of keys under `prefix`, continuing from `continuation` when given.
    async fn list_page(
        &self,
        container: &str,
        prefix: &str,
        continuation: Option<String>,
    ) -> Result<ListPage, StoreError>;

    /// Fetch the full body of one object.
    async fn get_object(&self, container: &str, key: &str) -> Result<Vec<u8>, StoreError>;
}

/// Representation requested from the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Html,
    Csv,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Html => "html",
            OutputFormat::Csv => "csv",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "html" => Ok(OutputFormat::Html),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(format!("unsupported output format '{other}', expected html, json or csv")),
        }
    }
}

/// Everything the analyzer needs for one invocation.
#[derive(Debug, Clone)]
pub struct AnalyzerRequest {
    pub log_path: PathBuf,
    pub profile_path: PathBuf,
    /// `None` runs the analyzer interactively on the caller's terminal.
    pub format: Option<OutputFormat>,
}

/// Captured analyzer output. Empty in interactive mode.
#[derive(Debug, Clone, Default)]
pub struct AnalyzerOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub status: Option<i32>,
}

/// Runs the external log analyzer against a combined log and a profile.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn invoke(&self, request: &AnalyzerRequest) -> Result<AnalyzerOutput, PipelineError>;
}
