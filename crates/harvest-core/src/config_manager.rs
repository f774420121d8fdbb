//! Schema ownership and persistence
//!
//! [`ConfigManager`] holds the authoritative [`SchemaConfig`] in memory,
//! writes it to the local store after every mutation, and optionally mirrors
//! the page schemas to a metadata record on the content backend.
//!
//! ## Merge policy
//!
//! On load, a previously persisted config is merged over the freshly inferred
//! one page by page: a saved page replaces the inferred page entirely. The
//! page-name list, persisted under its own key, is then consulted and any
//! listed page missing from the merge result is recovered with the starter
//! fields. A consequence is that fields added to the seed after the first run
//! stay hidden on pages that already have a saved schema until their fields
//! are updated explicitly.
//!
//! Mutations are serialized per manager, so concurrent callers cannot lose
//! each other's writes to the persisted page-name list.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::crud::CrudManager;
use crate::error::AdminResult;
use crate::schema::{PageSchema, SchemaConfig, PAGES_COLLECTION};
use crate::store::{load_json, save_json, StoreKeys};
use crate::traits::{Document, LocalStore};

/// Collection holding backend metadata records
pub const METADATA_COLLECTION: &str = "_metadata";

/// Metadata record holding the remote copy of the page schemas
pub const FIELDS_CONFIG_ID: &str = "fields_config";

/// Metadata record holding the list of page names
pub const PAGES_LIST_ID: &str = "pages_list";

/// Merge a persisted config over a freshly inferred one
///
/// Starts from a copy of `initial`; every page in `saved` replaces the page of
/// the same name. Names in `pages_list` that are still missing afterwards get
/// [`PageSchema::starter`].
pub fn merge_configs(
    initial: &SchemaConfig,
    saved: &SchemaConfig,
    pages_list: &[String],
) -> SchemaConfig {
    let mut merged = initial.clone();
    let pages = merged.pages_mut();

    if let Some(saved_pages) = saved.pages() {
        for (name, page) in saved_pages {
            pages.insert(name.clone(), page.clone());
        }
    }

    for name in pages_list {
        if !pages.contains_key(name) {
            info!(page = %name, "Recovering page missing from saved schema");
            pages.insert(name.clone(), PageSchema::starter());
        }
    }

    merged
}

struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Owner of the in-memory schema
pub struct ConfigManager {
    config: RwLock<SchemaConfig>,
    writes: Mutex<()>,
    store: Arc<dyn LocalStore>,
    keys: StoreKeys,
    remote: RwLock<Option<Arc<CrudManager>>>,
    loading_remote: AtomicBool,
}

impl ConfigManager {
    /// Load the manager, merging `initial` with any persisted config
    ///
    /// Without a persisted config `initial` is adopted as is and written to
    /// the store right away.
    pub async fn load(
        initial: SchemaConfig,
        store: Arc<dyn LocalStore>,
        keys: StoreKeys,
    ) -> AdminResult<Self> {
        let saved: Option<SchemaConfig> = load_json(store.as_ref(), &keys.config).await?;

        let config = match saved {
            Some(saved) => {
                let pages_list: Vec<String> = load_json(store.as_ref(), &keys.pages_list)
                    .await?
                    .unwrap_or_default();
                let merged = merge_configs(&initial, &saved, &pages_list);
                info!(pages = merged.page_names().len(), "Loaded persisted schema");
                merged
            }
            None => {
                save_json(store.as_ref(), &keys.config, &initial).await?;
                info!(pages = initial.page_names().len(), "Initialized new schema");
                initial
            }
        };

        Ok(Self {
            config: RwLock::new(config),
            writes: Mutex::new(()),
            store,
            keys,
            remote: RwLock::new(None),
            loading_remote: AtomicBool::new(false),
        })
    }

    /// Attach the CRUD manager used for the remote schema record
    pub fn set_remote(&self, crud: Arc<CrudManager>) {
        *self.remote.write() = Some(crud);
    }

    /// Drop the remote link
    pub fn detach_remote(&self) {
        *self.remote.write() = None;
    }

    pub fn has_remote(&self) -> bool {
        self.remote.read().is_some()
    }

    pub fn keys(&self) -> &StoreKeys {
        &self.keys
    }

    /// Snapshot of the current config
    pub fn get_config(&self) -> SchemaConfig {
        self.config.read().clone()
    }

    /// Run `f` against the current config without cloning it
    pub fn read<R>(&self, f: impl FnOnce(&SchemaConfig) -> R) -> R {
        f(&self.config.read())
    }

    /// Page names in key order
    pub fn get_pages(&self) -> Vec<String> {
        self.config.read().page_names()
    }

    /// Schema of one page, empty when the page is unknown
    pub fn get_page_fields(&self, name: &str) -> PageSchema {
        self.config.read().page(name).cloned().unwrap_or_default()
    }

    /// Page names with their leaf field counts
    pub fn describe_pages(&self) -> BTreeMap<String, usize> {
        self.config
            .read()
            .pages()
            .map(|pages| {
                pages
                    .iter()
                    .map(|(name, page)| (name.clone(), page.field_count()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Add a page with the starter fields, replacing any page of that name
    pub async fn add_page(&self, name: &str) -> AdminResult<()> {
        let _write = self.writes.lock().await;
        {
            let mut config = self.config.write();
            config
                .pages_mut()
                .insert(name.to_string(), PageSchema::starter());
        }
        info!(page = %name, "Page added");
        self.persist(true).await
    }

    /// Remove a page's schema; returns whether it existed
    pub async fn remove_page(&self, name: &str) -> AdminResult<bool> {
        let _write = self.writes.lock().await;
        let removed = {
            let mut config = self.config.write();
            config
                .collections
                .get_mut(PAGES_COLLECTION)
                .and_then(|pages| pages.remove(name))
                .is_some()
        };
        if !removed {
            return Ok(false);
        }
        info!(page = %name, "Page removed");
        self.persist(true).await?;
        Ok(true)
    }

    pub async fn delete_page(&self, name: &str) -> AdminResult<bool> {
        self.remove_page(name).await
    }

    /// Replace a page's entire schema
    ///
    /// Returns `false` without touching anything when there is no pages
    /// collection yet.
    pub async fn update_page_fields(&self, name: &str, fields: PageSchema) -> AdminResult<bool> {
        let _write = self.writes.lock().await;
        {
            let mut config = self.config.write();
            let Some(pages) = config
                .collections
                .get_mut(PAGES_COLLECTION)
            else {
                debug!(page = %name, "No pages collection, field update skipped");
                return Ok(false);
            };
            pages.insert(name.to_string(), fields);
        }
        debug!(page = %name, "Page fields updated");
        self.persist(true).await?;
        Ok(true)
    }

    /// Pull page schemas from the remote metadata record
    ///
    /// Each remote page replaces the local page of the same name. A missing
    /// record is the normal first-run state and yields `Ok(false)`, as do a
    /// missing remote link and a load already in flight.
    pub async fn load_from_remote(&self) -> AdminResult<bool> {
        let Some(crud) = self.remote.read().clone() else {
            return Ok(false);
        };
        if self.loading_remote.swap(true, Ordering::SeqCst) {
            return Ok(false);
        }
        let _guard = LoadingGuard(&self.loading_remote);

        let record = match crud.get(METADATA_COLLECTION, FIELDS_CONFIG_ID).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                info!("No remote schema yet, it will be created on first save");
                return Ok(false);
            }
            Err(e) if e.is_not_found() => return Ok(false),
            Err(e) => return Err(e),
        };

        let Some(remote_pages) = record
            .get("collections")
            .and_then(|c| c.get(PAGES_COLLECTION))
            .and_then(Value::as_object)
        else {
            return Ok(false);
        };

        let _write = self.writes.lock().await;
        {
            let mut config = self.config.write();
            let pages = config.pages_mut();
            for (name, raw) in remote_pages {
                match serde_json::from_value::<PageSchema>(raw.clone()) {
                    Ok(page) => {
                        pages.insert(name.clone(), page);
                        debug!(page = %name, "Loaded remote page schema");
                    }
                    Err(e) => warn!(page = %name, error = %e, "Skipping unreadable remote page schema"),
                }
            }
        }
        self.persist_local(false).await?;
        info!(pages = remote_pages.len(), "Remote schema loaded");
        Ok(true)
    }

    /// Push page schemas to the remote metadata record
    ///
    /// The record is created when it does not exist yet. Returns `Ok(false)`
    /// when no remote link is attached.
    pub async fn save_to_remote(&self) -> AdminResult<bool> {
        let Some(crud) = self.remote.read().clone() else {
            debug!("No remote attached, remote schema save skipped");
            return Ok(false);
        };
        let record = self.remote_record()?;
        crud.update_or_create(METADATA_COLLECTION, FIELDS_CONFIG_ID, record)
            .await?;
        debug!("Remote schema saved");
        Ok(true)
    }

    /// Pretty-printed JSON of the whole config
    pub fn export_config(&self) -> AdminResult<String> {
        Ok(serde_json::to_string_pretty(&*self.config.read())?)
    }

    /// Drop the persisted config from the local store
    pub async fn clear_storage(&self) -> AdminResult<()> {
        self.store.remove(&self.keys.config).await?;
        info!("Cached schema cleared");
        Ok(())
    }

    fn remote_record(&self) -> AdminResult<Document> {
        let pages = self.config.read().pages().cloned().unwrap_or_default();
        let mut collections = Map::new();
        collections.insert(PAGES_COLLECTION.to_string(), serde_json::to_value(pages)?);
        let mut record = Document::new();
        record.insert("collections".to_string(), Value::Object(collections));
        Ok(record)
    }

    async fn persist_local(&self, with_pages_list: bool) -> AdminResult<()> {
        let (config, pages) = {
            let config = self.config.read();
            (config.clone(), config.page_names())
        };
        save_json(self.store.as_ref(), &self.keys.config, &config).await?;
        if with_pages_list {
            save_json(self.store.as_ref(), &self.keys.pages_list, &pages).await?;
        }
        Ok(())
    }

    // Local failures propagate; remote failures are logged so they never
    // mask a successful local write.
    async fn persist(&self, with_pages_list: bool) -> AdminResult<()> {
        self.persist_local(with_pages_list).await?;
        if let Err(e) = self.save_to_remote().await {
            warn!(error = %e, "Failed to save schema to remote");
        }
        Ok(())
    }
}

impl std::fmt::Debug for ConfigManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigManager")
            .field("pages", &self.get_pages())
            .field("remote", &self.has_remote())
            .finish()
    }
}
