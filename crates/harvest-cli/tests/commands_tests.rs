//! Commands against a file-backed local store and the in-memory backend

use harvest_cli::cli::PagesCommands;
use harvest_cli::commands;
use harvest_cli::factories::build_admin;
use harvest_config::{AdminSettings, BackendSettings, RestSettings};
use tempfile::TempDir;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEED: &str = r#"export default {
  "main": { "hero": { "title": "Fresh Harvest Box", "image": "/images/hero.jpg" } },
  "footer": { "hero": { "phone": "+7 900 000-00-00" } }
};
"#;

fn setup() -> (TempDir, AdminSettings, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let seed_path = dir.path().join("database.js");
    std::fs::write(&seed_path, SEED).unwrap();

    let mut settings = AdminSettings::default();
    settings.store.path = dir.path().join("store");
    (dir, settings, seed_path)
}

async fn rest_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_import_marks_store_and_skips_second_run() {
    let (_dir, mut settings, seed_path) = setup();
    let server = rest_server().await;
    settings.backend = BackendSettings::Rest(RestSettings::new(server.uri()));

    commands::import::execute(&settings, &seed_path, false)
        .await
        .unwrap();
    let marker = settings.store.path.join("auto_import_completed.json");
    assert!(marker.exists());
    let writes = server.received_requests().await.unwrap().len();

    let admin = build_admin(&settings, None).await.unwrap();
    assert_eq!(admin.config_manager().get_pages(), vec!["footer", "main"]);
    assert!(!admin.importer().needs_auto_import().await.unwrap());

    commands::import::execute(&settings, &seed_path, false)
        .await
        .unwrap();
    let posted_again = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .skip(writes)
        .any(|r| r.method.as_str() == "POST");
    assert!(!posted_again);

    commands::import::reset(&settings).await.unwrap();
    assert!(!marker.exists());
}

#[tokio::test]
async fn test_memory_backend_import_leaves_marker_unset() {
    let (_dir, settings, seed_path) = setup();

    commands::import::execute(&settings, &seed_path, false)
        .await
        .unwrap();
    assert!(!settings.store.path.join("auto_import_completed.json").exists());

    let admin = build_admin(&settings, None).await.unwrap();
    assert!(admin.importer().needs_auto_import().await.unwrap());

    let err = commands::pages::execute(
        &admin,
        PagesCommands::Create {
            name: "promo".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("needs a persistent backend"));
    assert!(commands::migrate::execute(&admin, "pages", "main")
        .await
        .is_err());
}

#[tokio::test]
async fn test_seed_commands_reject_invalid_seed() {
    let (dir, _settings, seed_path) = setup();
    commands::seed::validate(&seed_path).await.unwrap();
    commands::seed::stats(&seed_path).await.unwrap();

    let empty = dir.path().join("empty.json");
    std::fs::write(&empty, "{}").unwrap();
    assert!(commands::seed::validate(&empty).await.is_err());

    let garbage = dir.path().join("garbage.json");
    std::fs::write(&garbage, "module.exports = {}").unwrap();
    assert!(commands::seed::infer(&garbage).await.is_err());
}

#[tokio::test]
async fn test_page_schema_changes_persist_locally() {
    let (_dir, settings, _seed_path) = setup();

    let admin = build_admin(&settings, None).await.unwrap();
    commands::pages::execute(
        &admin,
        PagesCommands::Add {
            name: "promo".to_string(),
        },
    )
    .await
    .unwrap();
    drop(admin);

    let admin = build_admin(&settings, None).await.unwrap();
    assert_eq!(admin.config_manager().get_pages(), vec!["promo"]);
    commands::pages::execute(
        &admin,
        PagesCommands::Remove {
            name: "promo".to_string(),
        },
    )
    .await
    .unwrap();
    assert!(admin.config_manager().get_pages().is_empty());
}

#[tokio::test]
async fn test_upload_without_storage_fails() {
    let (dir, settings, _seed_path) = setup();
    let file = dir.path().join("hero.png");
    std::fs::write(&file, b"png").unwrap();

    let admin = build_admin(&settings, None).await.unwrap();
    let err = commands::files::upload(&admin, &file, None).await.unwrap_err();
    assert!(err.to_string().contains("storage adapter is not configured"));
}
