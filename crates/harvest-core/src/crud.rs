//! CRUD façade over the injected adapters
//!
//! [`CrudManager`] forwards content operations to a [`DatabaseAdapter`] and
//! file operations to an optional [`StorageAdapter`]. It also owns the
//! legacy-to-sectioned document migration and the write helpers used by the
//! import and editor paths.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config_manager::{METADATA_COLLECTION, PAGES_LIST_ID};
use crate::error::{AdminError, AdminResult};
use crate::traits::{
    DatabaseAdapter, Document, DocumentCallback, FileUpload, StorageAdapter, Subscription,
    UploadOptions,
};

const LEGACY_TITLE: &str = "Добро пожаловать!";
const LEGACY_SUBTITLE: &str = "Это ваш сайт";
const LEGACY_DESCRIPTION: &str = "Редактируйте через админ-панель";

/// Result of [`CrudManager::migrate_to_sections`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// No document to migrate; nothing written
    NoData,
    /// The document already has a `hero` or `gallery` section; nothing written
    AlreadyMigrated,
    /// The reshaped document was written
    Migrated,
}

impl MigrationOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::NoData)
    }

    pub fn already_migrated(&self) -> bool {
        matches!(self, Self::AlreadyMigrated)
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::NoData => "no data to migrate",
            Self::AlreadyMigrated => "already migrated",
            Self::Migrated => "migration complete",
        }
    }
}

/// Which write [`CrudManager::create_or_update`] ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Updated,
}

/// Builder for [`CrudManager`]
#[derive(Default)]
pub struct CrudManagerBuilder {
    database: Option<Arc<dyn DatabaseAdapter>>,
    storage: Option<Arc<dyn StorageAdapter>>,
}

impl CrudManagerBuilder {
    pub fn database(mut self, database: Arc<dyn DatabaseAdapter>) -> Self {
        self.database = Some(database);
        self
    }

    pub fn storage(mut self, storage: Arc<dyn StorageAdapter>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Optional storage, for callers holding a maybe-configured adapter
    pub fn maybe_storage(mut self, storage: Option<Arc<dyn StorageAdapter>>) -> Self {
        self.storage = storage;
        self
    }

    /// Build the manager; a database adapter is required
    pub fn build(self) -> AdminResult<CrudManager> {
        let database = self
            .database
            .ok_or_else(|| AdminError::not_configured("database adapter is required"))?;
        Ok(CrudManager {
            database,
            storage: self.storage,
        })
    }
}

/// Uniform content and file operations
#[derive(Clone)]
pub struct CrudManager {
    database: Arc<dyn DatabaseAdapter>,
    storage: Option<Arc<dyn StorageAdapter>>,
}

impl CrudManager {
    pub fn builder() -> CrudManagerBuilder {
        CrudManagerBuilder::default()
    }

    /// Manager with a database and no storage
    pub fn new(database: Arc<dyn DatabaseAdapter>) -> Self {
        Self {
            database,
            storage: None,
        }
    }

    pub fn database(&self) -> &Arc<dyn DatabaseAdapter> {
        &self.database
    }

    pub fn has_storage(&self) -> bool {
        self.storage.is_some()
    }

    pub async fn get(&self, collection: &str, id: &str) -> AdminResult<Option<Document>> {
        self.database.get(collection, id).await
    }

    pub async fn create(&self, collection: &str, id: &str, data: Document) -> AdminResult<()> {
        self.database.create(collection, id, data).await
    }

    pub async fn update(&self, collection: &str, id: &str, data: Document) -> AdminResult<()> {
        self.database.update(collection, id, data).await
    }

    pub async fn delete(&self, collection: &str, id: &str) -> AdminResult<()> {
        self.database.delete(collection, id).await
    }

    pub async fn get_all(&self, collection: &str) -> AdminResult<Vec<Document>> {
        self.database.get_all(collection).await
    }

    pub fn subscribe(
        &self,
        collection: &str,
        id: &str,
        callback: DocumentCallback,
    ) -> AdminResult<Subscription> {
        self.database.subscribe(collection, id, callback)
    }

    fn storage(&self) -> AdminResult<&Arc<dyn StorageAdapter>> {
        self.storage
            .as_ref()
            .ok_or_else(|| AdminError::not_configured("storage adapter is not configured"))
    }

    pub async fn upload_file(&self, file: FileUpload, options: UploadOptions) -> AdminResult<String> {
        self.storage()?.upload(file, options).await
    }

    pub async fn delete_file(&self, url: &str) -> AdminResult<()> {
        self.storage()?.delete(url).await
    }

    /// Editor save: update an existing document, create a missing one
    pub async fn save_document(
        &self,
        collection: &str,
        id: &str,
        data: Document,
    ) -> AdminResult<WriteOutcome> {
        if self.get(collection, id).await?.is_some() {
            self.update(collection, id, data).await?;
            Ok(WriteOutcome::Updated)
        } else {
            self.create(collection, id, data).await?;
            Ok(WriteOutcome::Created)
        }
    }

    /// Create, falling back to update when the document already exists
    pub async fn create_or_update(
        &self,
        collection: &str,
        id: &str,
        data: Document,
    ) -> AdminResult<WriteOutcome> {
        match self.create(collection, id, data.clone()).await {
            Ok(()) => Ok(WriteOutcome::Created),
            Err(e) if e.is_already_exists() => {
                debug!(collection, id, "Document exists, updating instead");
                self.update(collection, id, data).await?;
                Ok(WriteOutcome::Updated)
            }
            Err(e) => Err(e),
        }
    }

    /// Update, falling back to create when the document is missing
    pub async fn update_or_create(
        &self,
        collection: &str,
        id: &str,
        data: Document,
    ) -> AdminResult<WriteOutcome> {
        match self.update(collection, id, data.clone()).await {
            Ok(()) => Ok(WriteOutcome::Updated),
            Err(e) if e.is_not_found() => {
                self.create(collection, id, data).await?;
                Ok(WriteOutcome::Created)
            }
            Err(e) => Err(e),
        }
    }

    /// Write the page-name list to its metadata record
    pub async fn write_pages_list(&self, pages: &[String]) -> AdminResult<WriteOutcome> {
        let mut record = Document::new();
        record.insert("pages".to_string(), json!(pages));
        record.insert("updatedAt".to_string(), json!(Utc::now().to_rfc3339()));
        self.update_or_create(METADATA_COLLECTION, PAGES_LIST_ID, record)
            .await
    }

    /// Reshape a legacy flat document into `hero` / `gallery` sections
    ///
    /// `{title, subtitle, description, carousel}` becomes
    /// `{hero: {title, subtitle, description}, gallery: {images}}`. A document
    /// that already has either section is left alone.
    pub async fn migrate_to_sections(
        &self,
        collection: &str,
        id: &str,
    ) -> AdminResult<MigrationOutcome> {
        let Some(legacy) = self.get(collection, id).await? else {
            warn!(collection, id, "No data to migrate");
            return Ok(MigrationOutcome::NoData);
        };

        if legacy.contains_key("hero") || legacy.contains_key("gallery") {
            info!(collection, id, "Document already migrated");
            return Ok(MigrationOutcome::AlreadyMigrated);
        }

        let mut migrated = Document::new();
        migrated.insert(
            "hero".to_string(),
            json!({
                "title": legacy_or(&legacy, "title", json!(LEGACY_TITLE)),
                "subtitle": legacy_or(&legacy, "subtitle", json!(LEGACY_SUBTITLE)),
                "description": legacy_or(&legacy, "description", json!(LEGACY_DESCRIPTION)),
            }),
        );
        migrated.insert(
            "gallery".to_string(),
            json!({ "images": legacy_or(&legacy, "carousel", json!([])) }),
        );

        self.update(collection, id, migrated).await?;
        info!(collection, id, "Document migrated to sections");
        Ok(MigrationOutcome::Migrated)
    }
}

impl std::fmt::Debug for CrudManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrudManager")
            .field("database", &self.database.backend_name())
            .field("storage", &self.storage.is_some())
            .finish()
    }
}

// Empty strings, `false`, zero and null count as missing.
fn legacy_or(doc: &Document, key: &str, fallback: Value) -> Value {
    match doc.get(key) {
        None | Some(Value::Null) | Some(Value::Bool(false)) => fallback,
        Some(Value::String(s)) if s.is_empty() => fallback,
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => fallback,
        Some(value) => value.clone(),
    }
}
