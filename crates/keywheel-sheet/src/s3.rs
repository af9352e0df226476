//! S3 transfer backend.

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use tracing::info;

use crate::error::{SheetError, SheetResult};
use crate::store::{Locator, ObjectStore};

/// [`ObjectStore`] backed by an S3 bucket.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    /// Build a store from the ambient AWS environment (credentials chain,
    /// region, etc.).
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self {
            client: aws_sdk_s3::Client::new(&config),
        }
    }

    /// Build a store from an existing SDK client.
    #[must_use]
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn fetch(&self, locator: &Locator) -> SheetResult<Vec<u8>> {
        let response = self
            .client
            .get_object()
            .bucket(locator.bucket())
            .key(locator.key())
            .send()
            .await
            .map_err(|e| SheetError::Fetch {
                locator: locator.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| SheetError::Fetch {
                locator: locator.to_string(),
                message: e.to_string(),
            })?;

        Ok(data.into_bytes().to_vec())
    }

    async fn store(&self, locator: &Locator, bytes: Vec<u8>) -> SheetResult<()> {
        self.client
            .put_object()
            .bucket(locator.bucket())
            .key(locator.key())
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| SheetError::Store {
                locator: locator.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        info!(locator = %locator, "uploaded registry document");
        Ok(())
    }
}
