//! In-memory transfer backend.
//!
//! Used by tests that need to observe checkpoint ordering: the store keeps
//! every version written to each locator, so a test can assert what was
//! durable at any point in a run.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{SheetError, SheetResult};
use crate::store::{Locator, ObjectStore};

/// [`ObjectStore`] holding objects in process memory.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    history: Mutex<HashMap<String, Vec<Vec<u8>>>>,
}

impl MemoryObjectStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object without recording it as a stored version.
    pub fn seed(&self, locator: &Locator, bytes: Vec<u8>) {
        self.objects
            .lock()
            .expect("memory store poisoned")
            .insert(locator.to_string(), bytes);
    }

    /// Current bytes of an object, if present.
    pub fn snapshot(&self, locator: &Locator) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .expect("memory store poisoned")
            .get(&locator.to_string())
            .cloned()
    }

    /// Every version stored to a locator, oldest first.
    pub fn stored_versions(&self, locator: &Locator) -> Vec<Vec<u8>> {
        self.history
            .lock()
            .expect("memory store poisoned")
            .get(&locator.to_string())
            .cloned()
            .unwrap_or_default()
    }

    /// Number of `store` calls made against a locator.
    pub fn store_count(&self, locator: &Locator) -> usize {
        self.stored_versions(locator).len()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn fetch(&self, locator: &Locator) -> SheetResult<Vec<u8>> {
        self.objects
            .lock()
            .expect("memory store poisoned")
            .get(&locator.to_string())
            .cloned()
            .ok_or_else(|| SheetError::Fetch {
                locator: locator.to_string(),
                message: "object not found".to_string(),
            })
    }

    async fn store(&self, locator: &Locator, bytes: Vec<u8>) -> SheetResult<()> {
        let name = locator.to_string();
        self.objects
            .lock()
            .expect("memory store poisoned")
            .insert(name.clone(), bytes.clone());
        self.history
            .lock()
            .expect("memory store poisoned")
            .entry(name)
            .or_default()
            .push(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::Workbook;
    use crate::DocumentHandle;

    fn locator() -> Locator {
        Locator::parse("s3://bucket/doc.json").unwrap()
    }

    #[tokio::test]
    async fn fetch_missing_object_is_an_error() {
        let store = MemoryObjectStore::new();
        let err = store.fetch(&locator()).await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn store_records_history() {
        let store = MemoryObjectStore::new();
        let loc = locator();
        store.store(&loc, b"v1".to_vec()).await.unwrap();
        store.store(&loc, b"v2".to_vec()).await.unwrap();

        assert_eq!(store.fetch(&loc).await.unwrap(), b"v2");
        assert_eq!(store.store_count(&loc), 2);
        assert_eq!(store.stored_versions(&loc)[0], b"v1");
    }

    #[tokio::test]
    async fn document_handle_round_trip() {
        let store = MemoryObjectStore::new();
        let loc = locator();

        let mut wb = Workbook::new();
        wb.insert_sheet("s", vec![vec!["User".into()], vec!["amy".into()]]);
        store.seed(&loc, wb.to_bytes().unwrap());

        let handle = DocumentHandle::new(store, loc);
        let loaded = handle.load().await.unwrap();
        assert_eq!(loaded, wb);

        handle.checkpoint(&loaded).await.unwrap();
    }
}
