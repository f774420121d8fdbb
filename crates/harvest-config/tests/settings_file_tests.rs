//! Settings file loading and environment precedence

use std::path::PathBuf;

use harvest_config::{
    env, AdminSettings, BackendSettings, CloudinarySettings, ConfigError, RestSettings, RunMode,
    StorageSettings,
};
use serial_test::serial;
use tempfile::TempDir;

const REST_TOML: &str = r#"
mode = "production"

[store]
path = "/var/lib/harvest"

[backend]
type = "rest"
base_url = "https://api.example.com/v1"
poll_interval_ms = 5000

[backend.headers]
X-Site = "harvest"

[storage]
type = "cloudinary"
cloud_name = "harvest"
upload_preset = "unsigned"

[logging]
level = "debug"
"#;

fn clear_env() {
    for var in [
        env::MODE,
        env::STORE_PATH,
        env::REST_URL,
        env::REST_TOKEN,
        env::POLL_INTERVAL_MS,
        env::CLOUDINARY_CLOUD_NAME,
        env::CLOUDINARY_UPLOAD_PRESET,
        env::LOG_LEVEL,
    ] {
        std::env::remove_var(var);
    }
}

fn write_settings(dir: &TempDir, text: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, text).unwrap();
    path
}

#[test]
#[serial]
fn test_load_full_file() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_settings(&dir, REST_TOML);

    let settings = AdminSettings::load(Some(&path)).unwrap();
    assert_eq!(settings.mode, RunMode::Production);
    assert_eq!(settings.store.path, PathBuf::from("/var/lib/harvest"));
    assert_eq!(settings.store.pages_list_key, "admin_panel_pages_list");

    let rest = settings.backend.as_rest().unwrap();
    assert_eq!(rest.base_url, "https://api.example.com/v1");
    assert_eq!(rest.poll_interval_ms, 5000);
    assert_eq!(rest.timeout_secs, 30);
    assert_eq!(rest.headers.get("X-Site").map(String::as_str), Some("harvest"));

    assert_eq!(
        settings.storage,
        Some(StorageSettings::Cloudinary(CloudinarySettings::new(
            "harvest", "unsigned"
        )))
    );
    assert_eq!(settings.logging.level, "debug");
}

#[test]
#[serial]
fn test_env_overrides_file() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_settings(&dir, REST_TOML);

    std::env::set_var(env::REST_URL, "http://localhost:9000");
    std::env::set_var(env::MODE, "development");
    std::env::set_var(env::LOG_LEVEL, "WARN");
    let settings = AdminSettings::load(Some(&path));
    clear_env();

    let settings = settings.unwrap();
    assert_eq!(settings.mode, RunMode::Development);
    assert_eq!(
        settings.backend.as_rest().map(|r| r.base_url.as_str()),
        Some("http://localhost:9000")
    );
    assert_eq!(settings.logging.level, "warn");
}

#[test]
#[serial]
fn test_invalid_env_value_fails_load() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_settings(&dir, "");

    std::env::set_var(env::MODE, "staging");
    let result = AdminSettings::load(Some(&path));
    clear_env();

    assert!(matches!(result, Err(ConfigError::Env { .. })));
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = AdminSettings::from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(_)));
}

#[test]
fn test_parse_error_names_the_file() {
    let dir = TempDir::new().unwrap();
    let path = write_settings(&dir, "[backend]\ntype = \"carrier-pigeon\"\n");
    let err = AdminSettings::from_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("config.toml"));
}

#[test]
fn test_save_then_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut settings = AdminSettings::default();
    let mut rest = RestSettings::new("https://api.example.com");
    rest.auth_token = Some("token".to_string());
    settings.backend = BackendSettings::Rest(rest);
    settings.save(&path).unwrap();

    assert_eq!(AdminSettings::from_file(&path).unwrap(), settings);
}
