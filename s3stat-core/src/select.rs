//! Object selection: which keys under a prefix belong to the requested day.
//!
//! Selection is lazy. [`select`] returns a stream; listing pages are only
//! requested from the store as the stream is polled, and a failed listing call
//! surfaces as [`PipelineError::Enumeration`] on the stream.

use chrono::NaiveDate;
use futures::stream::{self, Stream, TryStreamExt};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::contract::{LogObjectRef, ObjectStore};
use crate::error::PipelineError;

/// The day a run reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateFilter {
    date: NaiveDate,
}

impl DateFilter {
    pub fn new(date: NaiveDate) -> Self {
        Self { date }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// The date as it appears in log object keys: `YYYY-MM-DD`.
    pub fn token(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// How keys are matched against the date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// List everything under the prefix, keep keys containing `marker + date`.
    #[default]
    FilterAfterList,
    /// List only under `prefix + date`. Cheaper when keys start with the date.
    PrefixExtension,
}

/// What to select: container, prefix, day and matching rules.
#[derive(Debug, Clone)]
pub struct SelectionQuery {
    pub container: String,
    pub prefix: String,
    pub date: DateFilter,
    pub strategy: SelectionStrategy,
    /// Prepended to the date token when substring matching, e.g. `access_log-`.
    pub marker: String,
    /// Whether selected objects must be gunzipped.
    pub compressed: bool,
}

impl SelectionQuery {
    /// Prefix handed to the listing call.
    pub fn listing_prefix(&self) -> String {
        match self.strategy {
            SelectionStrategy::FilterAfterList => self.prefix.clone(),
            SelectionStrategy::PrefixExtension => format!("{}{}", self.prefix, self.date.token()),
        }
    }

    /// Whether a listed key belongs in the run.
    pub fn matches(&self, key: &str) -> bool {
        if key.is_empty() || key.ends_with('/') {
            return false;
        }
        match self.strategy {
            SelectionStrategy::FilterAfterList => {
                key.starts_with(&self.prefix)
                    && key.contains(&format!("{}{}", self.marker, self.date.token()))
            }
            SelectionStrategy::PrefixExtension => key.starts_with(&self.listing_prefix()),
        }
    }
}

enum Cursor {
    Start,
    Next(String),
    Done,
}

/// Enumerate the objects selected by `query`, page by page, in listing order.
pub fn select<'a, S>(
    store: &'a S,
    query: &'a SelectionQuery,
) -> impl Stream<Item = Result<LogObjectRef, PipelineError>> + 'a
where
    S: ObjectStore + ?Sized,
{
    let listing_prefix = query.listing_prefix();

    let pages = stream::try_unfold(Cursor::Start, move |cursor| {
        let listing_prefix = listing_prefix.clone();
        async move {
            let continuation = match cursor {
                Cursor::Start => None,
                Cursor::Next(token) => Some(token),
                Cursor::Done => return Ok(None),
            };
            let page = store
                .list_page(&query.container, &listing_prefix, continuation)
                .await
                .map_err(|source| PipelineError::Enumeration {
                    container: query.container.clone(),
                    prefix: listing_prefix.clone(),
                    source,
                })?;
            debug!(
                container = %query.container,
                prefix = %listing_prefix,
                keys = page.keys.len(),
                more = page.next.is_some(),
                "Listed page"
            );
            let cursor = match page.next {
                Some(token) => Cursor::Next(token),
                None => Cursor::Done,
            };
            Ok::<_, PipelineError>(Some((page.keys, cursor)))
        }
    });

    pages
        .map_ok(move |keys| {
            stream::iter(
                keys.into_iter()
                    .filter(|key| query.matches(key))
                    .map(|key| {
                        Ok(LogObjectRef {
                            container: query.container.clone(),
                            key,
                            compressed: query.compressed,
                        })
                    })
                    .collect::<Vec<_>>(),
            )
        })
        .try_flatten()
}
