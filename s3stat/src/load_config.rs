/// `load_config` module: reads the optional YAML settings file.
///
/// Every key is optional; anything given on the command line wins over the
/// file. Secrets do not belong here: credentials come from the positional
/// arguments or from the AWS environment.
///
/// ```yaml
/// region: eu-west-1
/// endpoint: http://localhost:4566
/// concurrency: 8
/// fetch_policy: skip          # or: abort
/// strategy: prefix_extension  # or: filter_after_list
/// marker: access_log-
/// output: json
/// analyzer: /usr/local/bin/goaccess
/// analyzer_args: []
/// artifact: reports/today.json
/// ```
use anyhow::Result;
use s3stat_core::contract::OutputFormat;
use s3stat_core::fetch::FetchPolicy;
use s3stat_core::select::SelectionStrategy;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub cloudfront: Option<bool>,
    pub concurrency: Option<usize>,
    pub fetch_policy: Option<FetchPolicy>,
    pub strategy: Option<SelectionStrategy>,
    pub marker: Option<String>,
    pub output: Option<OutputFormat>,
    pub analyzer: Option<PathBuf>,
    #[serde(default)]
    pub analyzer_args: Vec<String>,
    pub artifact: Option<PathBuf>,
}

/// Loads a YAML settings file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FileConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!("Failed to read config file {:?}: {}", path_ref, e));
        }
    };

    let config: FileConfig = match serde_yaml::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML {:?}: {e}", path_ref));
        }
    };

    info!(config_path = ?path_ref, "Parsed config YAML successfully");
    Ok(config)
}
