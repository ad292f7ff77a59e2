//! Routing analyzer output to the caller.
//!
//! A run ends in exactly one of three ways once the analyzer has finished:
//! nothing is delivered (interactive mode), the result handler receives the
//! result, or the error handler receives a decode failure together with the raw
//! bytes and decides whether the run recovers or fails.

use std::path::{Path, PathBuf};

use mockall::automock;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::contract::{AnalyzerOutput, OutputFormat, StoreError};
use crate::error::PipelineError;

/// Default location the built-in handler writes the report to.
pub const DEFAULT_ARTIFACT: &str = "s3output.html";

/// The analyzer's output, as delivered to a [`ResultHandler`].
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisResult {
    /// Decoded `-o json` output.
    Structured(Value),
    /// `-o html` / `-o csv` output, untouched.
    Raw(Vec<u8>),
}

impl AnalysisResult {
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            AnalysisResult::Structured(value) => serde_json::to_vec_pretty(value),
            AnalysisResult::Raw(bytes) => Ok(bytes.clone()),
        }
    }
}

/// The error handler's verdict on a decode failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Recovery {
    /// Swallow the error; the run succeeds with this value.
    Suppress(Value),
    /// Fail the run with [`PipelineError::Decode`].
    Rethrow,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// No output format was requested; goaccess ran on the terminal.
    Interactive,
    /// The result handler received the analysis.
    Delivered,
    /// Decoding failed and the error handler supplied a replacement value.
    Recovered(Value),
}

/// Caller-supplied consumer of analysis results.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait ResultHandler: Send + Sync {
    fn on_result(&self, result: AnalysisResult) -> Result<(), StoreError>;

    fn on_error(&self, error: &serde_json::Error, raw: &[u8]) -> Recovery;
}

/// Adapts two closures into a [`ResultHandler`].
pub struct FnHandler<R, E> {
    on_result: R,
    on_error: E,
}

impl<R, E> FnHandler<R, E>
where
    R: Fn(AnalysisResult) -> Result<(), StoreError> + Send + Sync,
    E: Fn(&serde_json::Error, &[u8]) -> Recovery + Send + Sync,
{
    pub fn new(on_result: R, on_error: E) -> Self {
        Self { on_result, on_error }
    }
}

impl<R, E> ResultHandler for FnHandler<R, E>
where
    R: Fn(AnalysisResult) -> Result<(), StoreError> + Send + Sync,
    E: Fn(&serde_json::Error, &[u8]) -> Recovery + Send + Sync,
{
    fn on_result(&self, result: AnalysisResult) -> Result<(), StoreError> {
        (self.on_result)(result)
    }

    fn on_error(&self, error: &serde_json::Error, raw: &[u8]) -> Recovery {
        (self.on_error)(error, raw)
    }
}

/// Writes results to a local file; prints undecodable output and rethrows.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    path: PathBuf,
}

impl Default for ArtifactWriter {
    fn default() -> Self {
        Self::new(DEFAULT_ARTIFACT)
    }
}

impl ArtifactWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultHandler for ArtifactWriter {
    fn on_result(&self, result: AnalysisResult) -> Result<(), StoreError> {
        let bytes = result.to_bytes()?;
        std::fs::write(&self.path, &bytes)?;
        info!(path = %self.path.display(), size = bytes.len(), "Report written");
        Ok(())
    }

    fn on_error(&self, error: &serde_json::Error, raw: &[u8]) -> Recovery {
        warn!(error = %error, size = raw.len(), "Analyzer output is not valid JSON");
        println!("{}", String::from_utf8_lossy(raw));
        Recovery::Rethrow
    }
}

/// Route captured analyzer output to `handler` according to the requested format.
pub fn dispatch<H>(
    format: Option<OutputFormat>,
    output: AnalyzerOutput,
    handler: &H,
) -> Result<RunOutcome, PipelineError>
where
    H: ResultHandler + ?Sized,
{
    let result = match format {
        None => return Ok(RunOutcome::Interactive),
        Some(OutputFormat::Json) => match serde_json::from_slice::<Value>(&output.stdout) {
            Ok(value) => AnalysisResult::Structured(value),
            Err(source) => {
                return match handler.on_error(&source, &output.stdout) {
                    Recovery::Suppress(value) => {
                        warn!(error = %source, "Decode failure suppressed by handler");
                        Ok(RunOutcome::Recovered(value))
                    }
                    Recovery::Rethrow => {
                        error!(error = %source, "Decode failure rethrown by handler");
                        Err(PipelineError::Decode {
                            source,
                            raw: output.stdout,
                        })
                    }
                };
            }
        },
        Some(OutputFormat::Html) | Some(OutputFormat::Csv) => AnalysisResult::Raw(output.stdout),
    };

    handler.on_result(result).map_err(PipelineError::Handler)?;
    Ok(RunOutcome::Delivered)
}
