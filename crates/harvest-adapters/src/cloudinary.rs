//! Cloudinary storage adapter
//!
//! Uploads go through an unsigned upload preset, so no secret is needed on
//! the client. Deletion needs a signed request and is left to the server
//! side; [`CloudinaryAdapter::delete`] only logs.

use std::time::Duration;

use async_trait::async_trait;
use harvest_config::CloudinarySettings;
use harvest_core::{AdminError, AdminResult, FileUpload, StorageAdapter, UploadOptions};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Upload API root
pub const CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com/v1_1";

static UPLOAD_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/upload/(?:[^/]*,[^/]*/)*(?:v\d+/)?(.+)$").expect("valid regex"));

/// Public id of an uploaded asset, from its delivery url
///
/// The public id is the path after `/upload/` without transformation or
/// version segments and without the file extension, folders included:
/// `.../image/upload/v1712/site/hero.jpg` gives `site/hero`. Urls without an
/// `/upload/` segment fall back to the last path segment.
pub fn extract_public_id(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let tail = UPLOAD_PATH
        .captures(path)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or_else(|| path.rsplit('/').next().unwrap_or(path));

    match tail.rsplit_once('/') {
        Some((folder, file)) => format!("{folder}/{}", strip_extension(file)),
        None => strip_extension(tail).to_string(),
    }
}

fn strip_extension(file: &str) -> &str {
    file.split('.').next().unwrap_or(file)
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Storage adapter for Cloudinary image uploads
#[derive(Clone)]
pub struct CloudinaryAdapter {
    client: Client,
    settings: CloudinarySettings,
    api_base: String,
}

impl CloudinaryAdapter {
    pub fn new(settings: CloudinarySettings) -> AdminResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| AdminError::not_configured(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client, settings))
    }

    pub fn with_client(client: Client, settings: CloudinarySettings) -> Self {
        Self {
            client,
            settings,
            api_base: CLOUDINARY_API_BASE.to_string(),
        }
    }

    /// Builder-style: point at another API root
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn upload_url(&self) -> String {
        format!("{}/{}/image/upload", self.api_base, self.settings.cloud_name)
    }

    fn has_credentials(&self) -> bool {
        self.settings.api_key.is_some() && self.settings.api_secret.is_some()
    }
}

#[async_trait]
impl StorageAdapter for CloudinaryAdapter {
    async fn upload(&self, file: FileUpload, options: UploadOptions) -> AdminResult<String> {
        let FileUpload {
            file_name,
            content_type,
            bytes,
        } = file;
        let size = bytes.len();

        let mut part = Part::bytes(bytes).file_name(file_name.clone());
        if let Some(content_type) = content_type {
            part = part
                .mime_str(&content_type)
                .map_err(|e| AdminError::transport(format!("invalid content type: {e}")))?;
        }

        let mut form = Form::new()
            .part("file", part)
            .text("upload_preset", self.settings.upload_preset.clone());
        if let Some(folder) = &options.folder {
            form = form.text("folder", folder.clone());
        }

        debug!(file = %file_name, size, folder = ?options.folder, "Uploading to Cloudinary");
        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| AdminError::transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorResponse>()
                .await
                .ok()
                .and_then(|body| body.error)
                .and_then(|error| error.message)
                .unwrap_or_else(|| "Unknown error".to_string());
            warn!(file = %file_name, %status, %message, "Cloudinary upload failed");
            return Err(AdminError::transport(format!("Cloudinary error: {message}")));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| AdminError::transport(format!("unreadable Cloudinary response: {e}")))?;
        let url = body
            .secure_url
            .ok_or_else(|| AdminError::transport("Cloudinary response has no secure_url"))?;
        info!(file = %file_name, url = %url, "File uploaded");
        Ok(url)
    }

    async fn delete(&self, url: &str) -> AdminResult<()> {
        let public_id = extract_public_id(url);
        if !self.has_credentials() {
            warn!(public_id = %public_id, "API key and secret required for deletion");
            return Ok(());
        }
        warn!(public_id = %public_id, "Deletion must be signed server-side, skipped");
        Ok(())
    }
}

impl std::fmt::Debug for CloudinaryAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryAdapter")
            .field("cloud_name", &self.settings.cloud_name)
            .field("upload_preset", &self.settings.upload_preset)
            .field("api_base", &self.api_base)
            .finish()
    }
}
