//! File storage settings

use serde::{Deserialize, Serialize};

/// Which storage adapter to build; absent means uploads are disabled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageSettings {
    Cloudinary(CloudinarySettings),
}

/// Cloudinary unsigned uploads
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudinarySettings {
    pub cloud_name: String,
    pub upload_preset: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_secret: Option<String>,
}

impl CloudinarySettings {
    pub fn new(cloud_name: impl Into<String>, upload_preset: impl Into<String>) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            upload_preset: upload_preset.into(),
            api_key: None,
            api_secret: None,
        }
    }
}
