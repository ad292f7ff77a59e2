// s3stat/src/config.rs

use std::path::PathBuf;

use chrono::NaiveDate;
use s3stat_core::analyze::DEFAULT_PROGRAM;
use s3stat_core::contract::LogSource;
use s3stat_core::dispatch::DEFAULT_ARTIFACT;
use s3stat_core::fetch::FetchPolicy;
use s3stat_core::pipeline::RunConfig;
use s3stat_core::select::SelectionStrategy;
use tracing::{debug, info};

use crate::cli::Cli;
use crate::load_config::FileConfig;
use crate::store::S3Settings;

/// Environment variable naming the goaccess binary, below `--analyzer` and above the file.
pub const ANALYZER_ENV: &str = "S3STAT_GOACCESS";

/// Fully resolved settings for one invocation.
#[derive(Debug)]
pub struct Settings {
    pub run: RunConfig,
    pub s3: S3Settings,
    pub analyzer: PathBuf,
    pub analyzer_args: Vec<String>,
    pub artifact: PathBuf,
}

impl Settings {
    /// Merge command line, environment and file; command line wins.
    pub fn resolve(cli: &Cli, file: FileConfig, today: NaiveDate) -> Self {
        let mut run = RunConfig::new(&cli.bucket, &cli.prefix, cli.date.unwrap_or(today));
        let cloudfront = if cli.cloudfront {
            true
        } else if cli.no_cloudfront {
            false
        } else {
            file.cloudfront.unwrap_or(false)
        };
        run.source = LogSource::from_cloudfront_flag(cloudfront);
        run.output = cli.output.or(file.output);
        run.concurrency = cli.concurrency.or(file.concurrency).unwrap_or(1).max(1);
        run.fetch_policy = if cli.skip_failed {
            FetchPolicy::Skip
        } else {
            file.fetch_policy.unwrap_or_default()
        };
        run.strategy = if cli.prefix_extension {
            SelectionStrategy::PrefixExtension
        } else {
            file.strategy.unwrap_or_default()
        };
        run.marker = cli.marker.clone().or(file.marker).unwrap_or_default();

        let s3 = S3Settings {
            region: cli.region.clone().or(file.region),
            endpoint: cli.endpoint.clone().or(file.endpoint),
            credentials: None,
        }
        .with_keys(&cli.key, &cli.secret);

        let analyzer = cli
            .analyzer
            .clone()
            .or_else(|| std::env::var_os(ANALYZER_ENV).map(PathBuf::from))
            .or(file.analyzer)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROGRAM));

        Settings {
            run,
            s3,
            analyzer,
            analyzer_args: file.analyzer_args,
            artifact: cli
                .artifact
                .clone()
                .or(file.artifact)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACT)),
        }
    }

    pub fn trace_loaded(&self) {
        info!(
            bucket = %self.run.container,
            prefix = %self.run.prefix,
            date = %self.run.date,
            source = ?self.run.source,
            explicit_credentials = self.s3.credentials.is_some(),
            "Loaded settings"
        );
        debug!(
            run = ?self.run,
            region = ?self.s3.region,
            endpoint = ?self.s3.endpoint,
            analyzer = %self.analyzer.display(),
            artifact = %self.artifact.display(),
            "Settings loaded (full debug)"
        );
    }
}
