//! Fetching selected objects and undoing their compression.

use std::io::Read;

use flate2::read::MultiGzDecoder;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::contract::{LogObjectRef, ObjectStore};
use crate::error::PipelineError;

/// What to do when a single object cannot be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchPolicy {
    /// Abort the run on the first failure. Nothing is handed to the analyzer.
    #[default]
    Abort,
    /// Log the failure, record the key in the run report and carry on.
    Skip,
}

/// Retrieves object bodies from a store, gunzipping them when flagged.
pub struct Fetcher<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: ObjectStore + ?Sized> Fetcher<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Fetch one object and return its decompressed content.
    pub async fn fetch(&self, object: &LogObjectRef) -> Result<Vec<u8>, PipelineError> {
        debug!(container = %object.container, key = %object.key, "Fetching log object");

        let body = self
            .store
            .get_object(&object.container, &object.key)
            .await
            .map_err(|source| PipelineError::Fetch {
                container: object.container.clone(),
                key: object.key.clone(),
                source,
            })?;

        if !object.compressed {
            trace!(key = %object.key, size = body.len(), "Fetched plain object");
            return Ok(body);
        }

        let plain = gunzip(&body).map_err(|source| PipelineError::Decompress {
            key: object.key.clone(),
            source,
        })?;
        trace!(
            key = %object.key,
            compressed = body.len(),
            size = plain.len(),
            "Fetched and decompressed object"
        );
        Ok(plain)
    }
}

/// Decode a gzip body. Concatenated gzip members are decoded back to back.
pub fn gunzip(body: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(body.len() * 4);
    MultiGzDecoder::new(body).read_to_end(&mut out)?;
    Ok(out)
}
