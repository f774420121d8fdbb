//! The admin service object
//!
//! [`Admin`] is built once by the hosting application with [`Admin::init`]
//! and passed to whatever needs content or schema access. It wires the CRUD
//! manager, the config manager, the content service and the importer
//! together, and carries the page lifecycle operations of the dashboard.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::config_manager::ConfigManager;
use crate::content::ContentService;
use crate::crud::{CrudManager, WriteOutcome};
use crate::error::{AdminError, AdminResult};
use crate::flatten::{flatten, unflatten};
use crate::import::AutoImporter;
use crate::schema::{SchemaConfig, PAGES_COLLECTION};
use crate::store::{MemoryStore, StoreKeys};
use crate::traits::{DatabaseAdapter, Document, LocalStore, StorageAdapter};

const NEW_PAGE_TITLE: &str = "Новая страница";
const NEW_PAGE_DESCRIPTION: &str = "Добавьте описание страницы";

/// Runtime mode; development logs content lookups that find nothing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Development,
    Production,
}

impl Mode {
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(AdminError::not_configured(format!("unknown mode {other:?}"))),
        }
    }
}

/// Everything [`Admin::init`] needs
pub struct AdminOptions {
    config: SchemaConfig,
    database: Option<Arc<dyn DatabaseAdapter>>,
    storage: Option<Arc<dyn StorageAdapter>>,
    store: Option<Arc<dyn LocalStore>>,
    keys: StoreKeys,
    mode: Mode,
    remote_schema: bool,
}

impl AdminOptions {
    /// Options around an initial schema, usually inferred from the seed
    pub fn new(config: SchemaConfig) -> Self {
        Self {
            config,
            database: None,
            storage: None,
            store: None,
            keys: StoreKeys::default(),
            mode: Mode::default(),
            remote_schema: true,
        }
    }

    pub fn database(mut self, database: Arc<dyn DatabaseAdapter>) -> Self {
        self.database = Some(database);
        self
    }

    pub fn storage(mut self, storage: Arc<dyn StorageAdapter>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn maybe_storage(mut self, storage: Option<Arc<dyn StorageAdapter>>) -> Self {
        self.storage = storage;
        self
    }

    /// Local durable store; an in-memory store is used when unset
    pub fn store(mut self, store: Arc<dyn LocalStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn keys(mut self, keys: StoreKeys) -> Self {
        self.keys = keys;
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Mirror page schemas to the backend's metadata record (on by default)
    pub fn remote_schema(mut self, enabled: bool) -> Self {
        self.remote_schema = enabled;
        self
    }
}

/// Explicitly constructed admin service
pub struct Admin {
    crud: Arc<CrudManager>,
    config: Arc<ConfigManager>,
    content: ContentService,
    importer: AutoImporter,
    mode: Mode,
}

impl Admin {
    /// Build the service
    ///
    /// Fails when no database adapter is given. With remote schema enabled
    /// the remote page schemas are pulled once; a failure there is logged
    /// and the local schema is used.
    pub async fn init(options: AdminOptions) -> AdminResult<Self> {
        let AdminOptions {
            config,
            database,
            storage,
            store,
            keys,
            mode,
            remote_schema,
        } = options;

        let database =
            database.ok_or_else(|| AdminError::not_configured("database adapter is required"))?;
        let crud = Arc::new(
            CrudManager::builder()
                .database(database)
                .maybe_storage(storage)
                .build()?,
        );
        let store = store.unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let config = Arc::new(ConfigManager::load(config, store.clone(), keys.clone()).await?);

        if remote_schema {
            config.set_remote(crud.clone());
            if let Err(e) = config.load_from_remote().await {
                warn!(error = %e, "Could not load remote schema, using local copy");
            }
        }

        let content = ContentService::new(crud.clone(), config.clone(), mode);
        let importer = AutoImporter::new(store, keys, crud.clone(), config.clone());

        info!(
            mode = %mode,
            backend = crud.database().backend_name(),
            storage = crud.has_storage(),
            pages = config.get_pages().len(),
            "Admin initialized"
        );

        Ok(Self {
            crud,
            config,
            content,
            importer,
            mode,
        })
    }

    pub fn crud(&self) -> &Arc<CrudManager> {
        &self.crud
    }

    pub fn config_manager(&self) -> &Arc<ConfigManager> {
        &self.config
    }

    pub fn content(&self) -> &ContentService {
        &self.content
    }

    pub fn importer(&self) -> &AutoImporter {
        &self.importer
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Add a page: starter schema, starter document, refreshed page list
    pub async fn create_page(&self, name: &str) -> AdminResult<()> {
        self.config.add_page(name).await?;

        let now = Utc::now().to_rfc3339();
        let mut doc = Document::new();
        doc.insert("title1".to_string(), json!(NEW_PAGE_TITLE));
        doc.insert("description1".to_string(), json!(NEW_PAGE_DESCRIPTION));
        doc.insert("createdAt".to_string(), json!(now));
        doc.insert("updatedAt".to_string(), json!(now));
        self.crud.create(PAGES_COLLECTION, name, doc).await?;
        self.content.evict_document(PAGES_COLLECTION, name);

        self.crud.write_pages_list(&self.config.get_pages()).await?;
        info!(page = %name, "Page created");
        Ok(())
    }

    /// Delete a page's document and schema; returns whether the schema existed
    ///
    /// A failure to refresh the page list afterwards is only logged.
    pub async fn delete_page(&self, name: &str) -> AdminResult<bool> {
        self.crud.delete(PAGES_COLLECTION, name).await?;
        self.content.evict_document(PAGES_COLLECTION, name);
        let existed = self.config.remove_page(name).await?;

        if let Err(e) = self.crud.write_pages_list(&self.config.get_pages()).await {
            warn!(page = %name, error = %e, "Could not refresh page list");
        }
        info!(page = %name, existed, "Page deleted");
        Ok(existed)
    }

    /// A document as the editor shows it: dot-path keys to values
    pub async fn load_for_edit(
        &self,
        collection: &str,
        id: &str,
    ) -> AdminResult<BTreeMap<String, Value>> {
        Ok(self
            .crud
            .get(collection, id)
            .await?
            .map(|doc| flatten(&doc))
            .unwrap_or_default())
    }

    /// Save editor values given as dot-path keys
    pub async fn save_page_edits(
        &self,
        collection: &str,
        id: &str,
        values: &BTreeMap<String, Value>,
    ) -> AdminResult<WriteOutcome> {
        let doc = unflatten(values);
        let outcome = self.crud.save_document(collection, id, doc).await?;
        self.content.evict_document(collection, id);
        info!(collection, id, ?outcome, "Document saved");
        Ok(outcome)
    }

    /// Drop cached content and the remote schema link
    pub fn reset(&self) {
        self.content.clear_cache(None);
        self.config.detach_remote();
        info!("Admin reset");
    }
}

impl fmt::Debug for Admin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Admin")
            .field("crud", &self.crud)
            .field("config", &self.config)
            .field("mode", &self.mode)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("production".parse::<Mode>().unwrap(), Mode::Production);
        assert_eq!("DEV".parse::<Mode>().unwrap(), Mode::Development);
        assert!("staging".parse::<Mode>().is_err());
        assert_eq!(Mode::default().to_string(), "development");
    }

    #[tokio::test]
    async fn test_init_requires_database() {
        let err = Admin::init(AdminOptions::new(SchemaConfig::with_pages()))
            .await
            .unwrap_err();
        assert!(err.is_configuration());
    }
}
