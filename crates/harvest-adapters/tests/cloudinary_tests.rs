//! Cloudinary adapter against a mock upload endpoint

use harvest_adapters::CloudinaryAdapter;
use harvest_config::CloudinarySettings;
use harvest_core::{AdminError, FileUpload, StorageAdapter, UploadOptions};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn adapter(server: &MockServer) -> CloudinaryAdapter {
    CloudinaryAdapter::new(CloudinarySettings::new("demo", "unsigned_preset"))
        .unwrap()
        .with_api_base(server.uri())
}

fn image() -> FileUpload {
    FileUpload::new("hero.png", b"fake png bytes".to_vec()).with_content_type("image/png")
}

#[tokio::test]
async fn test_upload_returns_secure_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/demo/image/upload"))
        .and(body_string_contains("unsigned_preset"))
        .and(body_string_contains("name=\"folder\""))
        .and(body_string_contains("hero.png"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "public_id": "site/hero",
            "secure_url": "https://res.cloudinary.com/demo/image/upload/v1/site/hero.png"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let url = adapter(&server)
        .upload(image(), UploadOptions::in_folder("site"))
        .await
        .unwrap();
    assert_eq!(url, "https://res.cloudinary.com/demo/image/upload/v1/site/hero.png");
}

#[tokio::test]
async fn test_upload_error_message_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/demo/image/upload"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"error": {"message": "Upload preset not found"}})),
        )
        .mount(&server)
        .await;

    let err = adapter(&server)
        .upload(image(), UploadOptions::default())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        AdminError::Transport("Cloudinary error: Upload preset not found".into())
    );
}

#[tokio::test]
async fn test_upload_without_error_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = adapter(&server)
        .upload(image(), UploadOptions::default())
        .await
        .unwrap_err();
    assert!(err.to_string().ends_with("Cloudinary error: Unknown error"));
}

#[tokio::test]
async fn test_delete_is_a_no_op() {
    let server = MockServer::start().await;
    let plain = adapter(&server);
    plain
        .delete("https://res.cloudinary.com/demo/image/upload/v1/site/hero.png")
        .await
        .unwrap();

    let mut settings = CloudinarySettings::new("demo", "unsigned_preset");
    settings.api_key = Some("key".to_string());
    settings.api_secret = Some("secret".to_string());
    let signed = CloudinaryAdapter::new(settings)
        .unwrap()
        .with_api_base(server.uri());
    signed.delete("https://res.cloudinary.com/demo/image/upload/hero.png").await.unwrap();

    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}
