use std::fs::write;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;
use serial_test::serial;
use tempfile::NamedTempFile;

use s3stat::cli::Cli;
use s3stat::config::{Settings, ANALYZER_ENV};
use s3stat::load_config::{load_config, FileConfig};
use s3stat_core::contract::{LogSource, OutputFormat};
use s3stat_core::fetch::FetchPolicy;
use s3stat_core::select::SelectionStrategy;

fn yaml(content: &str) -> NamedTempFile {
    let file = NamedTempFile::new().expect("Creating temp config file failed");
    write(file.path(), content).expect("Writing temp config failed");
    file
}

fn cli(extra: &[&str]) -> Cli {
    let mut args = vec!["s3stat", "", "", "my-logs", "s3/"];
    args.extend_from_slice(extra);
    Cli::try_parse_from(args).expect("arguments should parse")
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
}

#[test]
fn parses_full_yaml() {
    let file = yaml(
        "region: eu-west-1\n\
         endpoint: http://localhost:4566\n\
         cloudfront: true\n\
         concurrency: 8\n\
         fetch_policy: skip\n\
         strategy: prefix_extension\n\
         marker: access_log-\n\
         output: csv\n\
         analyzer: /opt/goaccess\n\
         analyzer_args: [\"--no-global-config\"]\n\
         artifact: out/report.csv\n",
    );

    let config = load_config(file.path()).expect("config should load");

    assert_eq!(
        config,
        FileConfig {
            region: Some("eu-west-1".into()),
            endpoint: Some("http://localhost:4566".into()),
            cloudfront: Some(true),
            concurrency: Some(8),
            fetch_policy: Some(FetchPolicy::Skip),
            strategy: Some(SelectionStrategy::PrefixExtension),
            marker: Some("access_log-".into()),
            output: Some(OutputFormat::Csv),
            analyzer: Some(PathBuf::from("/opt/goaccess")),
            analyzer_args: vec!["--no-global-config".into()],
            artifact: Some(PathBuf::from("out/report.csv")),
        }
    );
}

#[test]
fn unknown_keys_are_rejected() {
    let file = yaml("bucket_id: 12\n");
    assert!(load_config(file.path()).is_err());
}

#[test]
#[serial]
fn defaults_without_file_or_flags() {
    std::env::remove_var(ANALYZER_ENV);
    let settings = Settings::resolve(&cli(&[]), FileConfig::default(), today());

    assert_eq!(settings.run.container, "my-logs");
    assert_eq!(settings.run.prefix, "s3/");
    assert_eq!(settings.run.date, today());
    assert_eq!(settings.run.source, LogSource::Storage);
    assert_eq!(settings.run.output, None);
    assert_eq!(settings.run.concurrency, 1);
    assert_eq!(settings.run.fetch_policy, FetchPolicy::Abort);
    assert_eq!(settings.run.strategy, SelectionStrategy::FilterAfterList);
    assert_eq!(settings.s3.credentials, None);
    assert_eq!(settings.analyzer, PathBuf::from("goaccess"));
    assert_eq!(settings.artifact, PathBuf::from("s3output.html"));
}

#[test]
#[serial]
fn command_line_overrides_file() {
    std::env::remove_var(ANALYZER_ENV);
    let file = FileConfig {
        region: Some("eu-west-1".into()),
        output: Some(OutputFormat::Csv),
        concurrency: Some(8),
        analyzer: Some(PathBuf::from("/opt/goaccess")),
        ..Default::default()
    };
    let cli = cli(&[
        "-o",
        "json",
        "-d",
        "2023-12-31",
        "--region",
        "us-west-2",
        "--concurrency",
        "2",
        "--skip-failed",
        "-c",
    ]);

    let settings = Settings::resolve(&cli, file, today());

    assert_eq!(settings.run.output, Some(OutputFormat::Json));
    assert_eq!(settings.run.date, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    assert_eq!(settings.run.concurrency, 2);
    assert_eq!(settings.run.fetch_policy, FetchPolicy::Skip);
    assert_eq!(settings.run.source, LogSource::EdgeCache);
    assert_eq!(settings.s3.region.as_deref(), Some("us-west-2"));
    assert_eq!(settings.analyzer, PathBuf::from("/opt/goaccess"));
}

#[test]
#[serial]
fn analyzer_env_sits_between_flag_and_file() {
    std::env::set_var(ANALYZER_ENV, "/env/goaccess");
    let file = FileConfig {
        analyzer: Some(PathBuf::from("/file/goaccess")),
        ..Default::default()
    };

    let from_env = Settings::resolve(&cli(&[]), file, today());
    let from_flag = Settings::resolve(
        &cli(&["--analyzer", "/flag/goaccess"]),
        FileConfig::default(),
        today(),
    );
    std::env::remove_var(ANALYZER_ENV);

    assert_eq!(from_env.analyzer, PathBuf::from("/env/goaccess"));
    assert_eq!(from_flag.analyzer, PathBuf::from("/flag/goaccess"));
}

#[test]
fn explicit_keys_are_used_when_both_given() {
    let cli = Cli::try_parse_from(["s3stat", "AKIA", "s3cr3t", "my-logs", "s3/"]).unwrap();
    let settings = Settings::resolve(&cli, FileConfig::default(), today());
    assert_eq!(
        settings.s3.credentials,
        Some(("AKIA".to_string(), "s3cr3t".to_string()))
    );
}

#[test]
fn no_cloudfront_flag_overrides_file() {
    let cloudfront_file = || FileConfig {
        cloudfront: Some(true),
        ..Default::default()
    };

    let from_file = Settings::resolve(&cli(&[]), cloudfront_file(), today());
    let overridden = Settings::resolve(&cli(&["--no-cloudfront"]), cloudfront_file(), today());

    assert_eq!(from_file.run.source, LogSource::EdgeCache);
    assert_eq!(overridden.run.source, LogSource::Storage);
}

#[test]
fn cloudfront_flags_conflict() {
    assert!(Cli::try_parse_from(["s3stat", "", "", "b", "p/", "-c", "--no-cloudfront"]).is_err());
}
