//! Seed import
//!
//! [`AutoImporter`] seeds an empty backend from the bundled content seed
//! exactly once. A marker in the local store moves from pending to completed
//! after a fully successful import; only [`AutoImporter::reset`] moves it
//! back. A failed import leaves the marker pending so the next start retries
//! the whole sequence.
//!
//! The same import routine serves manual imports of pasted seed text, which
//! never touch the marker.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config_manager::ConfigManager;
use crate::crud::{CrudManager, WriteOutcome};
use crate::error::{AdminError, AdminResult};
use crate::schema::{infer_config, seed_to_documents, validate_seed, PAGES_COLLECTION};
use crate::store::StoreKeys;
use crate::traits::LocalStore;

static EXPORT_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*export\s+(?:const\s+[A-Za-z_$][\w$]*\s*=|default)\s*").expect("valid regex")
});

static TRAILING_SEMICOLON: Lazy<Regex> = Lazy::new(|| Regex::new(r";?\s*$").expect("valid regex"));

/// Parse pasted seed text
///
/// Only strict JSON is accepted. A leading `export const name =` or
/// `export default` and a trailing `;` are tolerated so a seed module can be
/// pasted as is. Nothing is ever evaluated.
pub fn parse_seed_text(text: &str) -> AdminResult<Value> {
    let body = EXPORT_PREFIX.replace(text, "");
    let body = TRAILING_SEMICOLON.replace(&body, "");
    serde_json::from_str(&body).map_err(|e| AdminError::InvalidSeed(e.to_string()))
}

/// Marker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStatus {
    Pending,
    Completed,
}

/// What an import wrote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Pages whose schema was imported
    pub pages: Vec<String>,
    /// Documents newly created
    pub created: usize,
    /// Documents that already existed and were updated
    pub updated: usize,
    /// Non-fatal seed warnings
    pub warnings: Vec<String>,
}

/// Result of [`AutoImporter::run_if_pending`]
#[derive(Debug)]
pub enum AutoImportOutcome {
    /// The marker was already completed; nothing ran
    Skipped,
    /// The import ran and the marker is now completed
    Imported(ImportReport),
    /// The import failed; the marker stays pending
    Failed(AdminError),
}

impl AutoImportOutcome {
    pub fn is_imported(&self) -> bool {
        matches!(self, Self::Imported(_))
    }
}

/// One-time seed importer
pub struct AutoImporter {
    store: Arc<dyn LocalStore>,
    keys: StoreKeys,
    crud: Arc<CrudManager>,
    config: Arc<ConfigManager>,
}

impl AutoImporter {
    pub fn new(
        store: Arc<dyn LocalStore>,
        keys: StoreKeys,
        crud: Arc<CrudManager>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            store,
            keys,
            crud,
            config,
        }
    }

    pub async fn status(&self) -> AdminResult<ImportStatus> {
        match self.store.get(&self.keys.import_completed).await? {
            Some(_) => Ok(ImportStatus::Completed),
            None => Ok(ImportStatus::Pending),
        }
    }

    pub async fn needs_auto_import(&self) -> AdminResult<bool> {
        Ok(self.status().await? == ImportStatus::Pending)
    }

    /// When the import completed, if it has
    pub async fn completed_at(&self) -> AdminResult<Option<DateTime<Utc>>> {
        let Some(raw) = self.store.get(&self.keys.import_date).await? else {
            return Ok(None);
        };
        match DateTime::parse_from_rfc3339(raw.trim()) {
            Ok(date) => Ok(Some(date.with_timezone(&Utc))),
            Err(e) => {
                warn!(error = %e, "Unreadable import date");
                Ok(None)
            }
        }
    }

    pub async fn mark_completed(&self) -> AdminResult<()> {
        self.store.set(&self.keys.import_completed, "true").await?;
        self.store
            .set(&self.keys.import_date, &Utc::now().to_rfc3339())
            .await
    }

    /// Move the marker back to pending so the next run imports again
    pub async fn reset(&self) -> AdminResult<()> {
        self.store.remove(&self.keys.import_completed).await?;
        self.store.remove(&self.keys.import_date).await?;
        info!("Auto-import marker reset");
        Ok(())
    }

    /// Import `seed` if the marker is pending
    ///
    /// `on_complete` runs after the marker is set, so dependent state can be
    /// rebuilt from the new schema. Failures are logged and returned as
    /// [`AutoImportOutcome::Failed`] without completing the marker.
    pub async fn run_if_pending<F>(&self, seed: &Value, on_complete: F) -> AutoImportOutcome
    where
        F: FnOnce(&ImportReport),
    {
        match self.needs_auto_import().await {
            Ok(true) => {}
            Ok(false) => {
                debug!("Auto-import already completed");
                return AutoImportOutcome::Skipped;
            }
            Err(e) => {
                error!(error = %e, "Could not read auto-import marker");
                return AutoImportOutcome::Failed(e);
            }
        }

        info!("Running auto-import from seed");
        let result = match self.import_seed(seed).await {
            Ok(report) => self.mark_completed().await.map(|()| report),
            Err(e) => Err(e),
        };

        match result {
            Ok(report) => {
                info!(
                    pages = report.pages.len(),
                    created = report.created,
                    updated = report.updated,
                    "Auto-import complete"
                );
                on_complete(&report);
                AutoImportOutcome::Imported(report)
            }
            Err(e) => {
                error!(error = %e, "Auto-import failed, will retry on next start");
                AutoImportOutcome::Failed(e)
            }
        }
    }

    /// Import a seed: schema into the config manager, content into the backend
    ///
    /// Seed errors abort before anything is written; warnings are carried in
    /// the report. Pages are written one after another, then the page-name
    /// list is published.
    pub async fn import_seed(&self, seed: &Value) -> AdminResult<ImportReport> {
        let validation = validate_seed(seed);
        if !validation.is_valid() {
            return Err(AdminError::InvalidSeed(validation.errors.join("; ")));
        }
        for warning in &validation.warnings {
            warn!(warning = %warning, "Seed warning");
        }

        let config = infer_config(seed);
        let documents = seed_to_documents(seed);
        let mut report = ImportReport {
            warnings: validation.warnings,
            ..ImportReport::default()
        };

        if let Some(pages) = config.pages() {
            for (name, page) in pages {
                self.config.add_page(name).await?;
                self.config
                    .update_page_fields(name, page.flatten_sections())
                    .await?;
                report.pages.push(name.clone());
            }
        }
        debug!(pages = report.pages.len(), "Seed schema applied");

        for (name, doc) in documents {
            match self.crud.create_or_update(PAGES_COLLECTION, &name, doc).await? {
                WriteOutcome::Created => {
                    report.created += 1;
                    debug!(page = %name, "Page document created");
                }
                WriteOutcome::Updated => {
                    report.updated += 1;
                    debug!(page = %name, "Page document updated");
                }
            }
        }

        self.crud.write_pages_list(&self.config.get_pages()).await?;
        Ok(report)
    }
}

impl std::fmt::Debug for AutoImporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoImporter")
            .field("marker", &self.keys.import_completed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_plain_json() {
        let seed = parse_seed_text(r#"{"home": {"hero": {"title": "Hi"}}}"#).unwrap();
        assert_eq!(seed["home"]["hero"]["title"], json!("Hi"));
    }

    #[test]
    fn test_parse_strips_module_wrapper() {
        let text = "export const siteData = {\n  \"home\": {\"hero\": {\"title\": \"Hi\"}}\n};\n";
        let seed = parse_seed_text(text).unwrap();
        assert!(seed["home"].is_object());

        let seed = parse_seed_text("export default {\"a\": {}};").unwrap();
        assert!(seed["a"].is_object());
    }

    #[test]
    fn test_parse_rejects_js_literals() {
        let err = parse_seed_text("export const x = { home: { title: 'Hi' } };").unwrap_err();
        assert!(matches!(err, AdminError::InvalidSeed(_)));
        assert!(parse_seed_text("(() => ({}))()").is_err());
    }
}
