//! Running goaccess as a subprocess.

use std::ffi::OsString;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::contract::{Analyzer, AnalyzerOutput, AnalyzerRequest};
use crate::error::PipelineError;

pub const DEFAULT_PROGRAM: &str = "goaccess";

/// [`Analyzer`] backed by the goaccess binary.
#[derive(Debug, Clone)]
pub struct GoAccess {
    program: OsString,
    leading_args: Vec<OsString>,
}

impl Default for GoAccess {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl GoAccess {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// Arguments placed before `-f`, for wrappers such as `docker run ... goaccess`.
    pub fn with_leading_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Full argument list for one request.
    pub fn args(&self, request: &AnalyzerRequest) -> Vec<OsString> {
        let mut args = self.leading_args.clone();
        args.push("-f".into());
        args.push(request.log_path.clone().into_os_string());
        args.push("-p".into());
        args.push(request.profile_path.clone().into_os_string());
        if let Some(format) = request.format {
            args.push("-o".into());
            args.push(format.as_str().into());
        }
        args
    }
}

#[async_trait]
impl Analyzer for GoAccess {
    async fn invoke(&self, request: &AnalyzerRequest) -> Result<AnalyzerOutput, PipelineError> {
        let args = self.args(request);
        info!(
            program = ?self.program,
            log = %request.log_path.display(),
            format = ?request.format,
            "Creating report"
        );

        let mut command = Command::new(&self.program);
        command.args(&args).kill_on_drop(true);

        let Some(format) = request.format else {
            // Interactive: goaccess owns the terminal until the user quits.
            let status = command
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
                .await
                .map_err(|e| {
                    error!(error = ?e, program = ?self.program, "Failed to launch analyzer");
                    PipelineError::AnalyzerInvocation(format!("failed to launch {:?}: {e}", self.program))
                })?;
            if !status.success() {
                error!(program = ?self.program, status = %status, "Analyzer exited with non-zero code");
                return Err(PipelineError::AnalyzerInvocation(format!(
                    "{:?} exited with {status}",
                    self.program
                )));
            }
            return Ok(AnalyzerOutput {
                status: status.code(),
                ..Default::default()
            });
        };

        let output = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                error!(error = ?e, program = ?self.program, "Failed to launch analyzer");
                PipelineError::AnalyzerInvocation(format!("failed to launch {:?}: {e}", self.program))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(
                program = ?self.program,
                status = %output.status,
                stderr = %stderr.trim(),
                "Analyzer exited with non-zero code"
            );
            return Err(PipelineError::AnalyzerInvocation(format!(
                "{:?} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        debug!(
            format = %format,
            stdout = output.stdout.len(),
            stderr = output.stderr.len(),
            "Analyzer finished"
        );
        Ok(AnalyzerOutput {
            status: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
