///
/// This module implements the CLI for s3stat: argument parsing, settings
/// resolution and the async entrypoint used by `main()` and integration tests.
///
/// All pipeline logic lives in [`s3stat-core`]; this module only wires the AWS
/// store, the goaccess analyzer and the default artifact handler into it.
///
/// ## How To Use
/// - For command-line users: `s3stat <key> <secret> <bucket> <prefix> [-c] [-o json] [-d YYYY-MM-DD]`.
///   Pass empty strings for key and secret to use credentials from the environment.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// [`s3stat-core`]: ../../s3stat_core/
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use s3stat_core::analyze::GoAccess;
use s3stat_core::contract::OutputFormat;
use s3stat_core::dispatch::ArtifactWriter;
use s3stat_core::pipeline::{run_with_cancel, RunReport};
use tokio_util::sync::CancellationToken;

use crate::config::Settings;
use crate::load_config::{load_config, FileConfig};
use crate::store::S3Store;

/// Downloads a day of S3 or CloudFront logs and parses them with goaccess.
#[derive(Parser, Debug)]
#[clap(
    name = "s3stat",
    version,
    about = "Downloads logs from S3, and parses them with goaccess."
)]
pub struct Cli {
    /// Amazon identification key (empty: use the environment)
    pub key: String,

    /// Amazon identification key secret (empty: use the environment)
    pub secret: String,

    /// Input bucket where logs are stored
    pub bucket: String,

    /// Path inside the input bucket where logs are stored
    pub prefix: String,

    /// Cloudfront log processing
    #[clap(short = 'c', long)]
    pub cloudfront: bool,

    /// Process S3 access logs even when the settings file enables cloudfront
    #[clap(long, conflicts_with = "cloudfront")]
    pub no_cloudfront: bool,

    /// Output format. One of html, json or csv; omit to browse interactively
    #[clap(short = 'o', long)]
    pub output: Option<OutputFormat>,

    /// The date to run the report on in YYYY-MM-DD format. Defaults to today
    #[clap(short = 'd', long)]
    pub date: Option<NaiveDate>,

    /// Verbose output
    #[clap(short = 'v', long)]
    pub verbose: bool,

    /// Optional YAML settings file
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// AWS region of the bucket
    #[clap(long)]
    pub region: Option<String>,

    /// Custom S3 endpoint URL
    #[clap(long)]
    pub endpoint: Option<String>,

    /// Number of log files fetched in parallel
    #[clap(long)]
    pub concurrency: Option<usize>,

    /// Skip log files that fail to download instead of aborting
    #[clap(long)]
    pub skip_failed: bool,

    /// List only keys starting with <prefix><date>
    #[clap(long)]
    pub prefix_extension: bool,

    /// Text that must directly precede the date in a key, e.g. access_log-
    #[clap(long)]
    pub marker: Option<String>,

    /// goaccess binary to run
    #[clap(long)]
    pub analyzer: Option<PathBuf>,

    /// Where json/html/csv reports are written
    #[clap(long)]
    pub artifact: Option<PathBuf>,
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<RunReport> {
    tracing::info!("trace_initialised");

    let file = match &cli.config {
        Some(path) => load_config(path)?,
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(&cli, file, chrono::Local::now().date_naive());
    settings.trace_loaded();

    let store = S3Store::connect(&settings.s3).await;
    let analyzer = GoAccess::new(&settings.analyzer).with_leading_args(&settings.analyzer_args);
    let handler = ArtifactWriter::new(&settings.artifact);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling run");
            on_interrupt.cancel();
        }
    });

    let result = run_with_cancel(&settings.run, &store, &analyzer, &handler, cancel)
        .await
        .with_context(|| {
            format!(
                "analysing s3://{}/{} for {}",
                settings.run.container, settings.run.prefix, settings.run.date
            )
        });
    interrupt.abort();

    match &result {
        Ok(report) => tracing::info!(command = "run", ?report, "Run complete"),
        Err(e) => tracing::error!(command = "run", error = %e, "Run failed"),
    }
    result
}
