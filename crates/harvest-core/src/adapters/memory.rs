//! In-process adapters
//!
//! [`MemoryDatabase`] is a push-based backend: subscribers receive the current
//! snapshot as soon as they subscribe and again after every write or deletion
//! of their document. [`MemoryStorage`] keeps uploaded bytes in a map and hands
//! out `memory://` URLs.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use crate::error::{AdminError, AdminResult};
use crate::traits::{
    DatabaseAdapter, Document, DocumentCallback, FileUpload, StorageAdapter, Subscription,
    UploadOptions,
};

struct Listener {
    id: u64,
    collection: String,
    doc_id: String,
    callback: DocumentCallback,
}

#[derive(Default)]
struct DatabaseState {
    collections: HashMap<String, BTreeMap<String, Document>>,
    listeners: Vec<Listener>,
    next_listener: u64,
}

impl DatabaseState {
    fn snapshot(&self, collection: &str, id: &str) -> Option<Document> {
        self.collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned()
    }

    fn listeners_for(&self, collection: &str, id: &str) -> Vec<DocumentCallback> {
        self.listeners
            .iter()
            .filter(|l| l.collection == collection && l.doc_id == id)
            .map(|l| l.callback.clone())
            .collect()
    }
}

/// In-memory document store with live subscriptions
#[derive(Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<Mutex<DatabaseState>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscriptions
    pub fn listener_count(&self) -> usize {
        self.state.lock().listeners.len()
    }

    /// Number of documents in a collection
    pub fn document_count(&self, collection: &str) -> usize {
        self.state
            .lock()
            .collections
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    // Callbacks run after the lock is released so they may call back into
    // the database.
    fn notify(&self, collection: &str, id: &str) {
        let (callbacks, snapshot) = {
            let state = self.state.lock();
            (
                state.listeners_for(collection, id),
                state.snapshot(collection, id),
            )
        };
        for callback in callbacks {
            callback(snapshot.clone());
        }
    }
}

impl std::fmt::Debug for MemoryDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MemoryDatabase")
            .field("collections", &state.collections.len())
            .field("listeners", &state.listeners.len())
            .finish()
    }
}

#[async_trait]
impl DatabaseAdapter for MemoryDatabase {
    async fn get(&self, collection: &str, id: &str) -> AdminResult<Option<Document>> {
        Ok(self.state.lock().snapshot(collection, id))
    }

    async fn create(&self, collection: &str, id: &str, data: Document) -> AdminResult<()> {
        {
            let mut state = self.state.lock();
            let docs = state.collections.entry(collection.to_string()).or_default();
            if docs.contains_key(id) {
                return Err(AdminError::document_exists(collection, id));
            }
            docs.insert(id.to_string(), data);
        }
        debug!(collection, id, "Document created");
        self.notify(collection, id);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, data: Document) -> AdminResult<()> {
        {
            let mut state = self.state.lock();
            let doc = state
                .collections
                .get_mut(collection)
                .and_then(|docs| docs.get_mut(id))
                .ok_or_else(|| AdminError::document_not_found(collection, id))?;
            *doc = data;
        }
        debug!(collection, id, "Document updated");
        self.notify(collection, id);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> AdminResult<()> {
        let removed = self
            .state
            .lock()
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .is_some();
        if removed {
            debug!(collection, id, "Document deleted");
            self.notify(collection, id);
        }
        Ok(())
    }

    async fn get_all(&self, collection: &str) -> AdminResult<Vec<Document>> {
        let state = self.state.lock();
        let Some(docs) = state.collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(docs
            .iter()
            .map(|(id, doc)| {
                let mut with_id = Document::new();
                with_id.insert("id".to_string(), Value::String(id.clone()));
                with_id.extend(doc.clone());
                with_id
            })
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
            let listener_id = state.next_listener;
            state.next_listener += 1;
            state.listeners.push(Listener {
                id: listener_id,
                collection: collection.to_string(),
                doc_id: id.to_string(),
                callback: callback.clone(),
            });
            (listener_id, state.snapshot(collection, id))
        };

        callback(snapshot);

        let state = Arc::downgrade(&self.state);
        Ok(Subscription::new(move || {
            if let Some(state) = state.upgrade() {
                state.lock().listeners.retain(|l| l.id != listener_id);
            }
        }))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn is_durable(&self) -> bool {
        false
    }
}

/// In-memory asset storage
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes stored under a URL previously returned by `upload`
    pub fn bytes(&self, url: &str) -> Option<Vec<u8>> {
        self.files.lock().get(url).cloned()
    }

    pub fn file_count(&self) -> usize {
        self.files.lock().len()
    }
}

#[async_trait]
impl StorageAdapter for MemoryStorage {
    async fn upload(&self, file: FileUpload, options: UploadOptions) -> AdminResult<String> {
        let url = match options.folder.as_deref().filter(|f| !f.is_empty()) {
            Some(folder) => format!("memory://{}/{}", folder.trim_matches('/'), file.file_name),
            None => format!("memory://{}", file.file_name),
        };
        self.files.lock().insert(url.clone(), file.bytes);
        Ok(url)
    }

    async fn delete(&self, url: &str) -> AdminResult<()> {
        self.files.lock().remove(url);
        Ok(())
    }
}
