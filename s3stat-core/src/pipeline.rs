//! High-level pipeline: select → fetch → concatenate → analyze → dispatch.
//!
//! This module wires the components together for one run over one day of logs:
//!   - Writes the goaccess profile for the configured [`LogSource`] to a temp file
//!   - Lazily enumerates matching objects and fetches them (optionally several at once)
//!   - Appends every body, in enumeration order, to one temporary combined log
//!   - Invokes the analyzer once the combined log is complete and flushed
//!   - Hands the output to a [`ResultHandler`] via [`dispatch`]
//!
//! # Error Handling
//! Listing and decompression failures always abort. Fetch failures abort under
//! [`FetchPolicy::Abort`] (the default) and are logged and reported under
//! [`FetchPolicy::Skip`]. In every abort case the analyzer is never started. Both temp files are removed on every
//! exit path because they are owned by this function's stack frame.
//!
//! # Ordering
//! With `concurrency > 1` up to that many fetches are in flight, but results are
//! consumed in enumeration order, so the combined log is identical to a sequential run.

use chrono::NaiveDate;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::concat::CombinedLog;
use crate::contract::{Analyzer, AnalyzerRequest, LogSource, ObjectStore, OutputFormat};
use crate::dispatch::{dispatch, ResultHandler, RunOutcome};
use crate::error::PipelineError;
use crate::fetch::{FetchPolicy, Fetcher};
use crate::profile::FormatProfile;
use crate::select::{select, DateFilter, SelectionQuery, SelectionStrategy};

/// Everything that parameterises one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub container: String,
    pub prefix: String,
    pub date: NaiveDate,
    pub source: LogSource,
    pub strategy: SelectionStrategy,
    pub marker: String,
    pub output: Option<OutputFormat>,
    pub fetch_policy: FetchPolicy,
    /// Maximum fetches in flight. `1` fetches strictly one after another.
    pub concurrency: usize,
}

impl RunConfig {
    pub fn new(container: impl Into<String>, prefix: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            container: container.into(),
            prefix: prefix.into(),
            date,
            source: LogSource::default(),
            strategy: SelectionStrategy::default(),
            marker: String::new(),
            output: None,
            fetch_policy: FetchPolicy::default(),
            concurrency: 1,
        }
    }

    pub fn selection_query(&self) -> SelectionQuery {
        SelectionQuery {
            container: self.container.clone(),
            prefix: self.prefix.clone(),
            date: DateFilter::new(self.date),
            strategy: self.strategy,
            marker: self.marker.clone(),
            compressed: self.source.is_compressed(),
        }
    }
}

/// What a finished run did.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Objects appended to the combined log.
    pub objects: usize,
    /// Total decompressed bytes handed to the analyzer.
    pub bytes: u64,
    /// Keys that failed to fetch under [`FetchPolicy::Skip`].
    pub skipped: Vec<String>,
    pub outcome: RunOutcome,
}

/// Run the pipeline once with no external cancellation.
pub async fn run<S, A, H>(
    config: &RunConfig,
    store: &S,
    analyzer: &A,
    handler: &H,
) -> Result<RunReport, PipelineError>
where
    S: ObjectStore + ?Sized,
    A: Analyzer + ?Sized,
    H: ResultHandler + ?Sized,
{
    run_with_cancel(config, store, analyzer, handler, CancellationToken::new()).await
}

/// Run the pipeline once; cancelling `cancel` aborts the run until the analyzer has finished.
///
/// Dropping the analyzer future on cancellation kills a running goaccess child.
pub async fn run_with_cancel<S, A, H>(
    config: &RunConfig,
    store: &S,
    analyzer: &A,
    handler: &H,
    cancel: CancellationToken,
) -> Result<RunReport, PipelineError>
where
    S: ObjectStore + ?Sized,
    A: Analyzer + ?Sized,
    H: ResultHandler + ?Sized,
{
    info!(
        container = %config.container,
        prefix = %config.prefix,
        date = %config.date,
        source = ?config.source,
        output = ?config.output,
        "[RUN] Starting log analysis run"
    );

    let profile_file = FormatProfile::for_source(config.source).write_temp()?;
    let mut combined = CombinedLog::new()?;
    let mut skipped = Vec::new();

    let query = config.selection_query();
    let fetcher = Fetcher::new(store);
    let fetcher = &fetcher;

    let fetched = select(store, &query)
        .map(move |selected| async move {
            let object = selected?;
            let body = fetcher.fetch(&object).await;
            Ok::<_, PipelineError>((object, body))
        })
        .buffered(config.concurrency.max(1));
    futures::pin_mut!(fetched);

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(objects = combined.objects(), "[RUN] Cancelled while downloading logs");
                return Err(PipelineError::Cancelled);
            }
            next = fetched.next() => next,
        };
        let Some(item) = next else { break };

        let (object, body) = item.map_err(|e| {
            error!(error = %e, "[RUN][ERROR] Listing log objects failed");
            e
        })?;

        match body {
            Ok(data) => {
                combined.append(&data)?;
                debug!(key = %object.key, size = data.len(), "[RUN] Appended object");
            }
            Err(e @ PipelineError::Fetch { .. }) if config.fetch_policy == FetchPolicy::Skip => {
                warn!(key = %object.key, error = %e, "[RUN] Fetch failed, skipping object");
                skipped.push(object.key);
            }
            // Decompression failures and aborting fetch failures end the run.
            Err(e) => {
                error!(key = %object.key, error = %e, "[RUN][ERROR] Fetch failed, aborting run");
                return Err(e);
            }
        }
    }

    combined.finish()?;
    info!(
        objects = combined.objects(),
        bytes = combined.len(),
        skipped = skipped.len(),
        "[RUN] Downloading of logs completed"
    );

    if cancel.is_cancelled() {
        return Err(PipelineError::Cancelled);
    }

    let request = AnalyzerRequest {
        log_path: combined.path().to_path_buf(),
        profile_path: profile_file.path().to_path_buf(),
        format: config.output,
    };
    let output = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            warn!("[RUN] Cancelled while the analyzer was running");
            return Err(PipelineError::Cancelled);
        }
        output = analyzer.invoke(&request) => output?,
    };
    let outcome = dispatch(config.output, output, handler)?;

    info!(outcome = ?outcome, "[RUN] Run complete");
    Ok(RunReport {
        objects: combined.objects(),
        bytes: combined.len(),
        skipped,
        outcome,
    })
}
