//! Object transfer trait and the checkpointing document handle.

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::error::{SheetError, SheetResult};
use crate::workbook::Workbook;

/// Location of the registry document in an object store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    bucket: String,
    key: String,
}

impl Locator {
    /// Parse an `s3://bucket/key` URL.
    pub fn parse(url: &str) -> SheetResult<Self> {
        let parsed = Url::parse(url).map_err(|e| SheetError::InvalidLocator {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if parsed.scheme() != "s3" {
            return Err(SheetError::InvalidLocator {
                url: url.to_string(),
                reason: format!("expected s3:// scheme, got {}://", parsed.scheme()),
            });
        }
        let bucket = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| SheetError::InvalidLocator {
                url: url.to_string(),
                reason: "missing bucket".to_string(),
            })?
            .to_string();
        let key = parsed.path().trim_start_matches('/').to_string();
        if key.is_empty() {
            return Err(SheetError::InvalidLocator {
                url: url.to_string(),
                reason: "missing object key".to_string(),
            });
        }
        Ok(Self { bucket, key })
    }

    /// Bucket component.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Object key component.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// Byte-level transfer of the registry document.
///
/// The rotation engine calls `fetch` once per run and `store` once per
/// checkpoint; implementations hold no document state of their own.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the object's bytes.
    async fn fetch(&self, locator: &Locator) -> SheetResult<Vec<u8>>;

    /// Store the object's bytes, replacing any previous version.
    async fn store(&self, locator: &Locator, bytes: Vec<u8>) -> SheetResult<()>;
}

#[async_trait]
impl<S: ObjectStore + ?Sized> ObjectStore for std::sync::Arc<S> {
    async fn fetch(&self, locator: &Locator) -> SheetResult<Vec<u8>> {
        (**self).fetch(locator).await
    }

    async fn store(&self, locator: &Locator, bytes: Vec<u8>) -> SheetResult<()> {
        (**self).store(locator, bytes).await
    }
}

/// A workbook bound to its object-store location.
///
/// `load` parses the current remote document; `checkpoint` durably writes a
/// full serialized copy. A returned `Ok` from `checkpoint` is the durability
/// guarantee the rotation engine sequences on.
pub struct DocumentHandle<S> {
    store: S,
    locator: Locator,
}

impl<S: ObjectStore> DocumentHandle<S> {
    /// Bind a transfer backend to a document locator.
    pub fn new(store: S, locator: Locator) -> Self {
        Self { store, locator }
    }

    /// The bound document location.
    #[must_use]
    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    /// Fetch and parse the document.
    pub async fn load(&self) -> SheetResult<Workbook> {
        let bytes = self.store.fetch(&self.locator).await?;
        debug!(locator = %self.locator, bytes = bytes.len(), "loaded registry document");
        Workbook::from_bytes(&bytes)
    }

    /// Serialize and durably store the document.
    pub async fn checkpoint(&self, workbook: &Workbook) -> SheetResult<()> {
        let bytes = workbook.to_bytes()?;
        let len = bytes.len();
        self.store.store(&self.locator, bytes).await?;
        debug!(locator = %self.locator, bytes = len, "checkpointed registry document");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_locator() {
        let locator = Locator::parse("s3://accounts-bucket/rotation/registry.json").unwrap();
        assert_eq!(locator.bucket(), "accounts-bucket");
        assert_eq!(locator.key(), "rotation/registry.json");
        assert_eq!(
            locator.to_string(),
            "s3://accounts-bucket/rotation/registry.json"
        );
    }

    #[test]
    fn parse_rejects_non_s3_scheme() {
        let err = Locator::parse("https://bucket/key").unwrap_err();
        assert!(err.to_string().contains("s3://"));
    }

    #[test]
    fn parse_rejects_missing_key() {
        assert!(Locator::parse("s3://bucket").is_err());
        assert!(Locator::parse("s3://bucket/").is_err());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Locator::parse("not a url").is_err());
    }
}
