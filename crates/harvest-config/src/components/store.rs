//! Local durable store settings
//!
//! Where the schema cache and the import marker live on disk, and the keys
//! they are stored under.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Local store section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Directory holding one file per key
    pub path: PathBuf,
    pub config_key: String,
    pub pages_list_key: String,
    pub import_completed_key: String,
    pub import_date_key: String,
}

impl StoreSettings {
    /// `~/.local/share/harvest-admin` or the platform equivalent
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .map(|dir| dir.join("harvest-admin"))
            .unwrap_or_else(|| PathBuf::from(".harvest-admin"))
    }

    pub fn keys(&self) -> [&str; 4] {
        [
            &self.config_key,
            &self.pages_list_key,
            &self.import_completed_key,
            &self.import_date_key,
        ]
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
            config_key: "admin_panel_config".to_string(),
            pages_list_key: "admin_panel_pages_list".to_string(),
            import_completed_key: "auto_import_completed".to_string(),
            import_date_key: "auto_import_date".to_string(),
        }
    }
}
