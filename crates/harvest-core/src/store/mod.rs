//! Local durable stores
//!
//! [`LocalStore`](crate::traits::LocalStore) implementations plus the key
//! names the admin panel persists under and JSON helpers over raw values.

pub mod file;
pub mod memory;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::AdminResult;
use crate::traits::LocalStore;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Names of the keys persisted in the local store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreKeys {
    /// Serialized schema config
    pub config: String,
    /// Flat list of page names, kept apart from the config as a tripwire
    pub pages_list: String,
    /// Auto-import completion marker
    pub import_completed: String,
    /// Timestamp of auto-import completion
    pub import_date: String,
}

impl Default for StoreKeys {
    fn default() -> Self {
        Self {
            config: "admin_panel_config".to_string(),
            pages_list: "admin_panel_pages_list".to_string(),
            import_completed: "auto_import_completed".to_string(),
            import_date: "auto_import_date".to_string(),
        }
    }
}

/// Read and deserialize a JSON value
///
/// Unparseable content is logged and treated as absent.
pub async fn load_json<T: DeserializeOwned>(
    store: &dyn LocalStore,
    key: &str,
) -> AdminResult<Option<T>> {
    let Some(raw) = store.get(key).await? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(key, error = %e, "Discarding unreadable local store entry");
            Ok(None)
        }
    }
}

/// Serialize and write a JSON value
pub async fn save_json<T: Serialize + ?Sized>(
    store: &dyn LocalStore,
    key: &str,
    value: &T,
) -> AdminResult<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_json_helpers() {
        let store = MemoryStore::new();
        save_json(&store, "list", &vec!["home", "about"]).await.unwrap();
        let list: Option<Vec<String>> = load_json(&store, "list").await.unwrap();
        assert_eq!(list, Some(vec!["home".to_string(), "about".to_string()]));
    }

    #[tokio::test]
    async fn test_unreadable_entry_is_absent() {
        let store = MemoryStore::new();
        store.set("broken", "{not json").await.unwrap();
        let value: Option<Vec<String>> = load_json(&store, "broken").await.unwrap();
        assert!(value.is_none());
    }
}
