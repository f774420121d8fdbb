//! Database adapter abstraction
//!
//! Any content backend (a push-based document store, a REST service polled on
//! an interval, an in-memory map in tests) implements [`DatabaseAdapter`].
//! Documents are addressed by `(collection, id)` and carry a nested JSON
//! object mirroring the page schema.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::Subscription;
use crate::error::AdminResult;

/// Persisted content for one `(collection, id)` pair
pub type Document = Map<String, Value>;

/// Callback invoked on every subscription emission
///
/// `None` means the document does not exist (or was deleted).
pub type DocumentCallback = Arc<dyn Fn(Option<Document>) + Send + Sync + 'static>;

/// Capability set every content backend must provide
///
/// ## Error contract
///
/// - `get` on a missing document returns `Ok(None)`, never an error
/// - `create` on an existing id fails with `AdminError::AlreadyExists`
/// - `update` on a missing id fails with `AdminError::NotFound`
/// - network or backend failures surface as `AdminError::Transport`
#[async_trait]
pub trait DatabaseAdapter: Send + Sync {
    /// Fetch one document
    async fn get(&self, collection: &str, id: &str) -> AdminResult<Option<Document>>;

    /// Create a document under a caller-chosen id
    async fn create(&self, collection: &str, id: &str, data: Document) -> AdminResult<()>;

    /// Replace the content of an existing document
    async fn update(&self, collection: &str, id: &str, data: Document) -> AdminResult<()>;

    /// Delete a document
    async fn delete(&self, collection: &str, id: &str) -> AdminResult<()>;

    /// Fetch every document in a collection
    async fn get_all(&self, collection: &str) -> AdminResult<Vec<Document>>;

    /// Open a live subscription on one document
    ///
    /// The callback may fire zero, one or many times. Push backends emit on
    /// every remote change; poll backends emit on a fixed interval whether or
    /// not the value changed. Once the returned [`Subscription`] is released
    /// the callback must not fire again.
    fn subscribe(
        &self,
        collection: &str,
        id: &str,
        callback: DocumentCallback,
    ) -> AdminResult<Subscription>;

    /// Short backend name for logs
    fn backend_name(&self) -> &'static str {
        "unknown"
    }

    /// Whether written documents outlive the process
    fn is_durable(&self) -> bool {
        true
    }
}
