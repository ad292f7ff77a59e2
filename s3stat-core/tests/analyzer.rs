#![cfg(unix)]

use std::path::PathBuf;

use s3stat_core::analyze::GoAccess;
use s3stat_core::contract::{Analyzer, AnalyzerRequest, OutputFormat};
use s3stat_core::PipelineError;

fn request(format: Option<OutputFormat>) -> AnalyzerRequest {
    AnalyzerRequest {
        log_path: PathBuf::from("/tmp/s3stat-combined.log"),
        profile_path: PathBuf::from("/tmp/s3stat.goaccessrc"),
        format,
    }
}

/// A stand-in for goaccess: `sh -c <script> goaccess -f ... -p ... [-o ...]`.
fn fake(script: &str) -> GoAccess {
    GoAccess::new("sh").with_leading_args(["-c", script, "goaccess"])
}

#[tokio::test]
async fn captures_stdout_of_successful_run() {
    let output = fake(r#"printf '{"hits": 42}'"#)
        .invoke(&request(Some(OutputFormat::Json)))
        .await
        .expect("fake analyzer should succeed");

    assert_eq!(output.stdout, br#"{"hits": 42}"#);
    assert_eq!(output.status, Some(0));
}

#[tokio::test]
async fn passes_input_profile_and_format_flags() {
    let output = fake(r#"printf '%s ' "$@""#)
        .invoke(&request(Some(OutputFormat::Csv)))
        .await
        .unwrap();

    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "-f /tmp/s3stat-combined.log -p /tmp/s3stat.goaccessrc -o csv "
    );
}

#[tokio::test]
async fn non_zero_exit_is_an_invocation_error() {
    let err = fake("echo 'parse error' >&2; exit 3")
        .invoke(&request(Some(OutputFormat::Json)))
        .await
        .unwrap_err();

    match err {
        PipelineError::AnalyzerInvocation(message) => assert!(message.contains("parse error")),
        other => panic!("expected invocation error, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_program_is_an_invocation_error() {
    let err = GoAccess::new("/nonexistent/s3stat/goaccess")
        .invoke(&request(Some(OutputFormat::Html)))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::AnalyzerInvocation(_)));
}

#[tokio::test]
async fn interactive_run_captures_nothing() {
    let output = fake("exit 0")
        .invoke(&request(None))
        .await
        .expect("interactive run should succeed");

    assert!(output.stdout.is_empty());
    assert!(output.stderr.is_empty());
    assert_eq!(output.status, Some(0));
}

#[tokio::test]
async fn interactive_non_zero_exit_is_an_invocation_error() {
    let err = fake("exit 4").invoke(&request(None)).await.unwrap_err();

    assert!(matches!(err, PipelineError::AnalyzerInvocation(_)), "got {err:?}");
}
