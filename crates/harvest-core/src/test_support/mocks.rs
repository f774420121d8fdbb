//! Mock Implementations for Testing
//!
//! [`MockDatabase`] is an in-memory [`DatabaseAdapter`] that counts every
//! call, can be told to fail, and lets a test push arbitrary subscription
//! emissions.
//!
//! ```rust
//! use harvest_core::test_support::mocks::MockDatabase;
//! use harvest_core::traits::DatabaseAdapter;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = MockDatabase::new();
//! db.create("pages", "home", serde_json::Map::new()).await?;
//!
//! // Second create fails and is counted separately
//! assert!(db.create("pages", "home", serde_json::Map::new()).await.is_err());
//! let stats = db.stats();
//! assert_eq!(stats.create_count, 1);
//! assert_eq!(stats.failed_create_count, 1);
//!
//! // Error injection
//! db.set_simulate_errors(true, "offline");
//! assert!(db.get("pages", "home").await.is_err());
//! # Ok(())
//! # }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{AdminError, AdminResult};
use crate::traits::{DatabaseAdapter, Document, DocumentCallback, Subscription};

/// Call counters for [`MockDatabase`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockDatabaseStats {
    /// Number of get calls
    pub get_count: usize,
    /// Successful creates
    pub create_count: usize,
    /// Creates rejected because the document existed
    pub failed_create_count: usize,
    /// Successful updates
    pub update_count: usize,
    /// Updates rejected because the document was missing
    pub failed_update_count: usize,
    /// Number of delete calls
    pub delete_count: usize,
    /// Number of get_all calls
    pub get_all_count: usize,
    /// Number of subscribe calls
    pub subscribe_count: usize,
}

impl MockDatabaseStats {
    /// Writes that reached the store
    pub fn write_count(&self) -> usize {
        self.create_count + self.update_count + self.delete_count
    }
}

type Key = (String, String);

#[derive(Default)]
struct MockDatabaseState {
    documents: BTreeMap<Key, Document>,
    listeners: HashMap<u64, (Key, DocumentCallback)>,
    next_listener: u64,
    stats: MockDatabaseStats,
    simulate_errors: bool,
    error_message: String,
}

impl MockDatabaseState {
    fn check(&self) -> AdminResult<()> {
        if self.simulate_errors {
            Err(AdminError::transport(self.error_message.clone()))
        } else {
            Ok(())
        }
    }

    fn callbacks(&self, key: &Key) -> Vec<DocumentCallback> {
        self.listeners
            .values()
            .filter(|(k, _)| k == key)
            .map(|(_, cb)| cb.clone())
            .collect()
    }
}

/// Mock database adapter for testing
///
/// Writes notify subscribers of the written document, like a push backend.
/// `subscribe` emits the current snapshot once on registration.
#[derive(Clone, Default)]
pub struct MockDatabase {
    state: Arc<Mutex<MockDatabaseState>>,
}

fn key(collection: &str, id: &str) -> Key {
    (collection.to_string(), id.to_string())
}

impl MockDatabase {
    /// Create a new mock database
    pub fn new() -> Self {
        Self::default()
    }

    /// Get operation statistics
    pub fn stats(&self) -> MockDatabaseStats {
        self.state.lock().stats.clone()
    }

    /// Configure error simulation
    ///
    /// While enabled every operation fails with a transport error carrying
    /// `message`.
    pub fn set_simulate_errors(&self, enabled: bool, message: &str) {
        let mut state = self.state.lock();
        state.simulate_errors = enabled;
        state.error_message = message.to_string();
    }

    /// Reset stored documents, listeners and statistics
    pub fn reset(&self) {
        let mut state = self.state.lock();
        *state = MockDatabaseState::default();
    }

    /// Insert a document without counting a write or notifying
    pub fn seed(&self, collection: &str, id: &str, data: Document) {
        self.state.lock().documents.insert(key(collection, id), data);
    }

    /// Current content of a document
    pub fn document(&self, collection: &str, id: &str) -> Option<Document> {
        self.state.lock().documents.get(&key(collection, id)).cloned()
    }

    /// Number of live subscriptions
    pub fn listener_count(&self) -> usize {
        self.state.lock().listeners.len()
    }

    /// Push an emission to every subscriber of `collection/id`
    pub fn emit(&self, collection: &str, id: &str, snapshot: Option<Document>) {
        let callbacks = self.state.lock().callbacks(&key(collection, id));
        for callback in callbacks {
            callback(snapshot.clone());
        }
    }

    fn notify(&self, collection: &str, id: &str) {
        let snapshot = self.document(collection, id);
        self.emit(collection, id, snapshot);
    }
}

#[async_trait]
impl DatabaseAdapter for MockDatabase {
    async fn get(&self, collection: &str, id: &str) -> AdminResult<Option<Document>> {
        let mut state = self.state.lock();
        state.check()?;
        state.stats.get_count += 1;
        Ok(state.documents.get(&key(collection, id)).cloned())
    }

    async fn create(&self, collection: &str, id: &str, data: Document) -> AdminResult<()> {
        {
            let mut state = self.state.lock();
            state.check()?;
            let k = key(collection, id);
            if state.documents.contains_key(&k) {
                state.stats.failed_create_count += 1;
                return Err(AdminError::document_exists(collection, id));
            }
            state.stats.create_count += 1;
            state.documents.insert(k, data);
        }
        self.notify(collection, id);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, data: Document) -> AdminResult<()> {
        {
            let mut state = self.state.lock();
            state.check()?;
            let k = key(collection, id);
            if !state.documents.contains_key(&k) {
                state.stats.failed_update_count += 1;
                return Err(AdminError::document_not_found(collection, id));
            }
            state.stats.update_count += 1;
            state.documents.insert(k, data);
        }
        self.notify(collection, id);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> AdminResult<()> {
        {
            let mut state = self.state.lock();
            state.check()?;
            state.stats.delete_count += 1;
            state.documents.remove(&key(collection, id));
        }
        self.notify(collection, id);
        Ok(())
    }

    async fn get_all(&self, collection: &str) -> AdminResult<Vec<Document>> {
        let mut state = self.state.lock();
        state.check()?;
        state.stats.get_all_count += 1;
        Ok(state
            .documents
            .iter()
            .filter(|((c, _), _)| c == collection)
            .map(|(_, doc)| doc.clone())
            .collect())
    }

    fn subscribe(
        &self,
        collection: &str,
        id: &str,
        callback: DocumentCallback,
    ) -> AdminResult<Subscription> {
        let (listener_id, snapshot) = {
            let mut state = self.state.lock();
            state.check()?;
            state.stats.subscribe_count += 1;
            let listener_id = state.next_listener;
            state.next_listener += 1;
            let k = key(collection, id);
            let snapshot = state.documents.get(&k).cloned();
            state.listeners.insert(listener_id, (k, callback.clone()));
            (listener_id, snapshot)
        };

        callback(snapshot);

        let state = Arc::downgrade(&self.state);
        Ok(Subscription::new(move || {
            if let Some(state) = state.upgrade() {
                state.lock().listeners.remove(&listener_id);
            }
        }))
    }

    fn backend_name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_counts_and_injection() {
        let db = MockDatabase::new();
        let data = json!({"a": 1}).as_object().cloned().unwrap();

        assert!(db.update("pages", "home", data.clone()).await.is_err());
        db.create("pages", "home", data.clone()).await.unwrap();
        db.update("pages", "home", data).await.unwrap();
        db.get("pages", "home").await.unwrap();

        let stats = db.stats();
        assert_eq!(stats.failed_update_count, 1);
        assert_eq!(stats.create_count, 1);
        assert_eq!(stats.update_count, 1);
        assert_eq!(stats.get_count, 1);

        db.set_simulate_errors(true, "down");
        let err = db.get("pages", "home").await.unwrap_err();
        assert_eq!(err, AdminError::Transport("down".into()));

        db.reset();
        assert_eq!(db.stats(), MockDatabaseStats::default());
        assert!(db.document("pages", "home").is_none());
    }

    #[test]
    fn test_emit_reaches_subscribers_until_dropped() {
        let db = MockDatabase::new();
        let seen = Arc::new(Mutex::new(0usize));
        let counter = seen.clone();
        let sub = db
            .subscribe("pages", "home", Arc::new(move |_: Option<Document>| *counter.lock() += 1))
            .unwrap();

        db.emit("pages", "home", None);
        drop(sub);
        db.emit("pages", "home", None);

        assert_eq!(*seen.lock(), 2);
        assert_eq!(db.listener_count(), 0);
    }
}
