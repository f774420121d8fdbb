//! Composition root: settings in, adapters and the admin service out

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use harvest_adapters::{CloudinaryAdapter, RestApiAdapter};
use harvest_config::{AdminSettings, BackendSettings, StorageSettings};
use harvest_core::{
    infer_config, parse_seed_text, Admin, AdminOptions, DatabaseAdapter, FileStore, LocalStore,
    MemoryDatabase, Mode, SchemaConfig, StorageAdapter, StoreKeys,
};
use serde_json::Value;
use tracing::{debug, warn};

/// Database adapter for the configured backend
pub fn create_database(settings: &AdminSettings) -> Result<Arc<dyn DatabaseAdapter>> {
    match &settings.backend {
        BackendSettings::Memory => {
            warn!("Using the in-memory backend; nothing is kept after exit");
            Ok(Arc::new(MemoryDatabase::new()))
        }
        BackendSettings::Rest(rest) => {
            debug!(base_url = %rest.base_url, "Using REST backend");
            Ok(Arc::new(
                RestApiAdapter::new(rest).context("Failed to create REST adapter")?,
            ))
        }
    }
}

/// Storage adapter, if one is configured
pub fn create_storage(settings: &AdminSettings) -> Result<Option<Arc<dyn StorageAdapter>>> {
    match &settings.storage {
        None => Ok(None),
        Some(StorageSettings::Cloudinary(cloudinary)) => {
            let adapter = CloudinaryAdapter::new(cloudinary.clone())
                .context("Failed to create Cloudinary adapter")?;
            Ok(Some(Arc::new(adapter)))
        }
    }
}

pub fn create_store(settings: &AdminSettings) -> Arc<dyn LocalStore> {
    Arc::new(FileStore::new(settings.store.path.clone()))
}

pub fn store_keys(settings: &AdminSettings) -> StoreKeys {
    StoreKeys {
        config: settings.store.config_key.clone(),
        pages_list: settings.store.pages_list_key.clone(),
        import_completed: settings.store.import_completed_key.clone(),
        import_date: settings.store.import_date_key.clone(),
    }
}

/// Read a seed file: JSON, optionally wrapped as a JS module export
pub async fn read_seed(path: &Path) -> Result<Value> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read seed file {}", path.display()))?;
    parse_seed_text(&text).with_context(|| format!("Invalid seed file {}", path.display()))
}

/// Build the admin service from settings
///
/// With a seed the inferred schema is the starting point; otherwise an empty
/// pages collection is, and the saved schema fills it in.
pub async fn build_admin(settings: &AdminSettings, seed: Option<&Value>) -> Result<Admin> {
    let initial = seed.map(infer_config).unwrap_or_else(SchemaConfig::with_pages);
    let mode: Mode = settings.mode.as_str().parse()?;

    let options = AdminOptions::new(initial)
        .database(create_database(settings)?)
        .maybe_storage(create_storage(settings)?)
        .store(create_store(settings))
        .keys(store_keys(settings))
        .mode(mode);

    Admin::init(options)
        .await
        .context("Failed to initialize admin service")
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_config::{CloudinarySettings, RestSettings};
    use tempfile::TempDir;

    #[test]
    fn test_backend_selection() {
        let mut settings = AdminSettings::default();
        assert_eq!(create_database(&settings).unwrap().backend_name(), "memory");

        settings.backend = BackendSettings::Rest(RestSettings::new("http://localhost:8080"));
        assert_eq!(create_database(&settings).unwrap().backend_name(), "rest");
    }

    #[test]
    fn test_storage_is_optional() {
        let mut settings = AdminSettings::default();
        assert!(create_storage(&settings).unwrap().is_none());

        settings.storage = Some(StorageSettings::Cloudinary(CloudinarySettings::new(
            "demo", "unsigned",
        )));
        assert!(create_storage(&settings).unwrap().is_some());
    }

    #[test]
    fn test_store_keys_follow_settings() {
        let mut settings = AdminSettings::default();
        settings.store.config_key = "site_schema".to_string();
        let keys = store_keys(&settings);
        assert_eq!(keys.config, "site_schema");
        assert_eq!(keys.import_completed, StoreKeys::default().import_completed);
    }

    #[tokio::test]
    async fn test_read_seed_accepts_module_export() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("database.js");
        std::fs::write(&path, "export const siteData = {\"main\": {\"hero\": {\"title\": \"Hi\"}}};\n")
            .unwrap();

        let seed = read_seed(&path).await.unwrap();
        assert_eq!(seed["main"]["hero"]["title"], "Hi");
        assert!(read_seed(&dir.path().join("missing.json")).await.is_err());
    }

    #[tokio::test]
    async fn test_build_admin_with_file_store() {
        let dir = TempDir::new().unwrap();
        let mut settings = AdminSettings::default();
        settings.store.path = dir.path().to_path_buf();

        let seed = serde_json::json!({"main": {"hero": {"title": "Hi"}}});
        let admin = build_admin(&settings, Some(&seed)).await.unwrap();
        assert_eq!(admin.config_manager().get_pages(), vec!["main"]);
        assert!(dir.path().join("admin_panel_config.json").exists());
    }
}
