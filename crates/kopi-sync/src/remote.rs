//! # Remote Store Abstraction
//!
//! A document store with named collections, addressed by the same UUID
//! the local row carries. The worker and hydrator only ever see this
//! trait; swapping the hosted backend means writing one impl.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{SyncError, SyncResult};

/// Collection names in the remote store.
pub const COLLECTION_PRODUCTS: &str = "products";
pub const COLLECTION_RECIPES: &str = "recipes";
pub const COLLECTION_RECIPE_INGREDIENTS: &str = "recipe_ingredients";
pub const COLLECTION_WASTE_LOGS: &str = "waste_logs";
pub const COLLECTION_AUDIT_TRAIL: &str = "audit_trail";

/// One remote document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

/// The remote document store.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetches every document in a collection.
    async fn fetch_all(&self, collection: &str) -> SyncResult<Vec<Document>>;

    /// Creates or replaces the document with the given id. Returns the
    /// remote document id (equal to `id` for id-addressed backends).
    async fn upsert_document(&self, collection: &str, id: &str, data: Value)
        -> SyncResult<String>;

    /// Deletes a document. Deleting a missing document is not an error.
    async fn delete_document(&self, collection: &str, id: &str) -> SyncResult<()>;
}

/// In-memory remote store with failure injection.
///
/// Stands in for the hosted backend in tests: collections are maps in a
/// mutex, and `fail_requests` makes every call error until cleared, which
/// is how offline periods are simulated.
#[derive(Default)]
pub struct InMemoryRemoteStore {
    collections: Mutex<HashMap<String, HashMap<String, Value>>>,
    fail_requests: AtomicBool,
}

impl InMemoryRemoteStore {
    /// Creates an empty store.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes every subsequent call fail (true) or succeed (false).
    pub fn set_failing(&self, failing: bool) {
        self.fail_requests.store(failing, Ordering::SeqCst);
    }

    /// Number of documents in a collection.
    pub fn count(&self, collection: &str) -> usize {
        let collections = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        collections.get(collection).map_or(0, |c| c.len())
    }

    /// Direct document lookup for assertions.
    pub fn get(&self, collection: &str, id: &str) -> Option<Value> {
        let collections = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        collections.get(collection)?.get(id).cloned()
    }

    /// Seeds a document, bypassing the trait (test setup).
    pub fn seed(&self, collection: &str, id: &str, data: Value) {
        let mut collections = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data);
    }

    fn check_failure(&self) -> SyncResult<()> {
        if self.fail_requests.load(Ordering::SeqCst) {
            return Err(SyncError::Remote("injected failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemoteStore {
    async fn fetch_all(&self, collection: &str) -> SyncResult<Vec<Document>> {
        self.check_failure()?;

        let collections = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        let docs = collections
            .get(collection)
            .map(|c| {
                c.iter()
                    .map(|(id, data)| Document {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(docs)
    }

    async fn upsert_document(
        &self,
        collection: &str,
        id: &str,
        data: Value,
    ) -> SyncResult<String> {
        self.check_failure()?;

        let mut collections = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data);

        Ok(id.to_string())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> SyncResult<()> {
        self.check_failure()?;

        let mut collections = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(id);
        }

        Ok(())
    }
}
