use std::path::Path;

use anyhow::{Context, Result};
use harvest_core::{Admin, FileUpload, UploadOptions};

/// MIME type from a file extension, for the common image formats
pub fn guess_content_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    Some(match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "avif" => "image/avif",
        _ => return None,
    })
}

pub async fn upload(admin: &Admin, file: &Path, folder: Option<String>) -> Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    let mut upload = FileUpload::new(file_name, bytes);
    if let Some(content_type) = guess_content_type(file) {
        upload = upload.with_content_type(content_type);
    }
    let options = UploadOptions { folder };

    let url = admin.crud().upload_file(upload, options).await?;
    println!("{url}");
    Ok(())
}

pub async fn delete(admin: &Admin, url: &str) -> Result<()> {
    admin.crud().delete_file(url).await?;
    println!("Delete requested for {url}");
    Ok(())
}
