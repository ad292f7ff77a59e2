#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use s3stat_core::contract::{ListPage, ObjectStore, StoreError};

/// In-memory bucket that pages its listing and can fail or delay chosen keys.
pub struct MemoryStore {
    objects: Vec<(String, Vec<u8>)>,
    page_size: usize,
    failing: Vec<String>,
    delays: HashMap<String, Duration>,
    gets: AtomicUsize,
}

impl MemoryStore {
    pub fn new(objects: Vec<(&str, Vec<u8>)>) -> Self {
        Self {
            objects: objects
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            page_size: 2,
            failing: Vec::new(),
            delays: HashMap::new(),
            gets: AtomicUsize::new(0),
        }
    }

    pub fn failing(mut self, key: &str) -> Self {
        self.failing.push(key.to_string());
        self
    }

    pub fn delayed(mut self, key: &str, millis: u64) -> Self {
        self.delays
            .insert(key.to_string(), Duration::from_millis(millis));
        self
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_page(
        &self,
        _container: &str,
        prefix: &str,
        continuation: Option<String>,
    ) -> Result<ListPage, StoreError> {
        let start = continuation
            .map(|token| token.parse::<usize>())
            .transpose()?
            .unwrap_or(0);
        let matching: Vec<&String> = self
            .objects
            .iter()
            .map(|(key, _)| key)
            .filter(|key| key.starts_with(prefix))
            .collect();
        let end = (start + self.page_size).min(matching.len());
        Ok(ListPage {
            keys: matching[start..end].iter().map(|k| k.to_string()).collect(),
            next: (end < matching.len()).then(|| end.to_string()),
        })
    }

    async fn get_object(&self, _container: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(key) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.iter().any(|k| k == key) {
            return Err(format!("connection reset while fetching {key}").into());
        }
        self.objects
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, body)| body.clone())
            .ok_or_else(|| format!("no such key: {key}").into())
    }
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn s3_line(n: usize) -> Vec<u8> {
    format!(
        "owner bucket [09/Mar/2024:10:00:{n:02} +0000] 10.0.0.{n} - REQ{n} REST.GET.OBJECT k \"GET /k HTTP/1.1\" 200 - 10 10 1 1 \"-\" \"curl\" -\n"
    )
    .into_bytes()
}
