//! Binary asset storage abstraction (image uploads).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AdminResult;

/// A file selected for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    /// Builder-style: set the MIME type
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Options accepted by [`StorageAdapter::upload`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadOptions {
    /// Target folder on the storage service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
}

impl UploadOptions {
    pub fn in_folder(folder: impl Into<String>) -> Self {
        Self {
            folder: Some(folder.into()),
        }
    }
}

/// Capability set for asset storage backends
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Upload a file and return its public URL
    async fn upload(&self, file: FileUpload, options: UploadOptions) -> AdminResult<String>;

    /// Delete a previously uploaded file
    ///
    /// Best effort: some services need server-side credentials and treat
    /// this as a no-op.
    async fn delete(&self, url: &str) -> AdminResult<()>;
}
