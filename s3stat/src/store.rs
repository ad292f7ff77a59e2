//! AWS S3 implementation of the core [`ObjectStore`] contract.

use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client;
use s3stat_core::contract::{ListPage, ObjectStore, StoreError};
use tracing::{debug, info, trace};

/// Region used when neither the command line nor the environment names one.
pub const FALLBACK_REGION: &str = "us-east-1";

/// Connection settings for the bucket holding the logs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct S3Settings {
    pub region: Option<String>,
    /// Custom endpoint URL (LocalStack, MinIO).
    pub endpoint: Option<String>,
    /// Explicit `(access key, secret key)`; `None` uses the default provider chain.
    pub credentials: Option<(String, String)>,
}

impl S3Settings {
    /// Explicit keys win only when both are non-empty.
    pub fn with_keys(mut self, key: &str, secret: &str) -> Self {
        self.credentials = if key.is_empty() || secret.is_empty() {
            None
        } else {
            Some((key.to_string(), secret.to_string()))
        };
        self
    }
}

/// Bucket access through the AWS SDK.
#[derive(Clone)]
pub struct S3Store {
    client: Client,
}

impl S3Store {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn connect(settings: &S3Settings) -> Self {
        let region = RegionProviderChain::first_try(settings.region.clone().map(Region::new))
            .or_default_provider()
            .or_else(Region::new(FALLBACK_REGION));

        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region);

        if let Some(endpoint) = &settings.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        if let Some((key, secret)) = &settings.credentials {
            loader = loader.credentials_provider(Credentials::new(key, secret, None, None, "s3stat"));
            info!("Using explicit AWS credentials");
        } else {
            info!("Using AWS credentials from the environment");
        }

        let shared = loader.load().await;
        let builder = aws_sdk_s3::config::Builder::from(&shared);
        // Custom endpoints rarely support virtual-hosted buckets.
        let config = if settings.endpoint.is_some() {
            builder.force_path_style(true).build()
        } else {
            builder.build()
        };

        Self::new(Client::from_conf(config))
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list_page(
        &self,
        container: &str,
        prefix: &str,
        continuation: Option<String>,
    ) -> Result<ListPage, StoreError> {
        let resp = self
            .client
            .list_objects_v2()
            .bucket(container)
            .prefix(prefix)
            .set_continuation_token(continuation)
            .send()
            .await
            .map_err(|e| format!("{}", DisplayErrorContext(&e)))?;

        let keys: Vec<String> = resp
            .contents()
            .iter()
            .filter_map(|obj| obj.key().map(str::to_string))
            .collect();
        let next = if resp.is_truncated().unwrap_or(false) {
            resp.next_continuation_token().map(str::to_string)
        } else {
            None
        };

        debug!(bucket = container, prefix, keys = keys.len(), "Listed S3 page");
        Ok(ListPage { keys, next })
    }

    async fn get_object(&self, container: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        let resp = self
            .client
            .get_object()
            .bucket(container)
            .key(key)
            .send()
            .await
            .map_err(|e| format!("{}", DisplayErrorContext(&e)))?;

        let body = resp
            .body
            .collect()
            .await
            .map_err(|e| format!("failed to read body: {e}"))?
            .into_bytes();

        trace!(bucket = container, key, size = body.len(), "Downloaded object");
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_keys_fall_back_to_environment() {
        assert_eq!(S3Settings::default().with_keys("", "secret").credentials, None);
        assert_eq!(S3Settings::default().with_keys("key", "").credentials, None);
    }

    #[test]
    fn explicit_keys_are_kept() {
        let settings = S3Settings::default().with_keys("AKIA", "s3cr3t");
        assert_eq!(
            settings.credentials,
            Some(("AKIA".to_string(), "s3cr3t".to_string()))
        );
    }
}
