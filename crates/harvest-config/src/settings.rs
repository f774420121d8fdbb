//! Top-level admin settings
//!
//! Load order: the TOML file (or defaults when there is none), then
//! environment overrides, then validation. Command-line flags are applied
//! on top by the binary.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::components::{
    BackendSettings, CloudinarySettings, LoggingSettings, RestSettings, StorageSettings,
    StoreSettings, LOG_LEVELS,
};
use crate::error::{ConfigError, ConfigResult};

/// Environment variables read by [`AdminSettings::apply_env_overrides`]
pub mod env {
    pub const MODE: &str = "HARVEST_MODE";
    pub const STORE_PATH: &str = "HARVEST_STORE_PATH";
    pub const REST_URL: &str = "HARVEST_REST_URL";
    pub const REST_TOKEN: &str = "HARVEST_REST_TOKEN";
    pub const POLL_INTERVAL_MS: &str = "HARVEST_POLL_INTERVAL_MS";
    pub const CLOUDINARY_CLOUD_NAME: &str = "CLOUDINARY_CLOUD_NAME";
    pub const CLOUDINARY_UPLOAD_PRESET: &str = "CLOUDINARY_UPLOAD_PRESET";
    pub const LOG_LEVEL: &str = "HARVEST_LOG_LEVEL";
}

/// Runtime mode as written in settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Development,
    Production,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown mode {other:?}")),
        }
    }
}

/// Settings for the admin tooling
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminSettings {
    pub mode: RunMode,
    pub store: StoreSettings,
    pub backend: BackendSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageSettings>,
    pub logging: LoggingSettings,
}

impl AdminSettings {
    /// `~/.config/harvest-admin/config.toml` or the platform equivalent
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("harvest-admin").join("config.toml"))
    }

    /// Load settings the way the binary does
    ///
    /// An explicit `path` must exist. Without one the default location is
    /// used when a file is there, defaults otherwise.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => {
                    debug!("No settings file, using defaults");
                    Self::default()
                }
            },
        };
        settings.apply_env_overrides()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded settings file");
        Ok(settings)
    }

    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write the settings as TOML, creating parent directories
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let text = self.to_toml()?;
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, text).map_err(io_err)
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> ConfigResult<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from any variable lookup
    ///
    /// Empty values count as unset.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(mode) = var(env::MODE) {
            self.mode = mode.parse().map_err(|e| ConfigError::env(env::MODE, e))?;
        }
        if let Some(path) = var(env::STORE_PATH) {
            self.store.path = PathBuf::from(path);
        }

        if let Some(url) = var(env::REST_URL) {
            match &mut self.backend {
                BackendSettings::Rest(rest) => rest.base_url = url,
                BackendSettings::Memory => self.backend = BackendSettings::Rest(RestSettings::new(url)),
            }
        }
        if let Some(token) = var(env::REST_TOKEN) {
            match &mut self.backend {
                BackendSettings::Rest(rest) => rest.auth_token = Some(token),
                BackendSettings::Memory => {
                    warn!(var = env::REST_TOKEN, "Ignoring token for the memory backend")
                }
            }
        }
        if let Some(interval) = var(env::POLL_INTERVAL_MS) {
            let interval: u64 = interval
                .trim()
                .parse()
                .map_err(|_| ConfigError::env(env::POLL_INTERVAL_MS, "expected milliseconds"))?;
            match &mut self.backend {
                BackendSettings::Rest(rest) => rest.poll_interval_ms = interval,
                BackendSettings::Memory => {
                    warn!(var = env::POLL_INTERVAL_MS, "Ignoring poll interval for the memory backend")
                }
            }
        }

        let cloud_name = var(env::CLOUDINARY_CLOUD_NAME);
        let preset = var(env::CLOUDINARY_UPLOAD_PRESET);
        if cloud_name.is_some() || preset.is_some() {
            let StorageSettings::Cloudinary(cloudinary) = self
                .storage
                .get_or_insert_with(|| StorageSettings::Cloudinary(CloudinarySettings::default()));
            if let Some(cloud_name) = cloud_name {
                cloudinary.cloud_name = cloud_name;
            }
            if let Some(preset) = preset {
                cloudinary.upload_preset = preset;
            }
        }

        if let Some(level) = var(env::LOG_LEVEL) {
            self.logging.level = level.trim().to_ascii_lowercase();
        }
        Ok(())
    }

    /// Check values that parse fine but cannot work
    pub fn validate(&self) -> ConfigResult<()> {
        if let BackendSettings::Rest(rest) = &self.backend {
            if rest.base_url.trim().is_empty() {
                return Err(ConfigError::invalid("backend.base_url", "must not be empty"));
            }
            if !rest.base_url.starts_with("http://") && !rest.base_url.starts_with("https://") {
                return Err(ConfigError::invalid(
                    "backend.base_url",
                    format!("{:?} is not an http(s) url", rest.base_url),
                ));
            }
            if rest.poll_interval_ms == 0 {
                return Err(ConfigError::invalid("backend.poll_interval_ms", "must be positive"));
            }
            if rest.timeout_secs == 0 {
                return Err(ConfigError::invalid("backend.timeout_secs", "must be positive"));
            }
        }

        if let Some(StorageSettings::Cloudinary(cloudinary)) = &self.storage {
            if cloudinary.cloud_name.trim().is_empty() {
                return Err(ConfigError::invalid("storage.cloud_name", "must not be empty"));
            }
            if cloudinary.upload_preset.trim().is_empty() {
                return Err(ConfigError::invalid("storage.upload_preset", "must not be empty"));
            }
        }

        for key in self.store.keys() {
            if key.trim().is_empty() {
                return Err(ConfigError::invalid("store", "store keys must not be empty"));
            }
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::invalid(
                "logging.level",
                format!("{:?} is not one of {}", self.logging.level, LOG_LEVELS.join(", ")),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let settings = AdminSettings::default();
        assert_eq!(settings.mode, RunMode::Development);
        assert_eq!(settings.backend, BackendSettings::Memory);
        assert_eq!(settings.store.config_key, "admin_panel_config");
        assert_eq!(settings.store.import_date_key, "auto_import_date");
        assert!(settings.storage.is_none());
        settings.validate().unwrap();
    }

    #[test]
    fn test_rest_url_switches_backend() {
        let mut settings = AdminSettings::default();
        settings
            .apply_overrides(lookup(&[
                (env::REST_URL, "https://api.example.com"),
                (env::REST_TOKEN, "secret"),
                (env::POLL_INTERVAL_MS, "1500"),
            ]))
            .unwrap();

        let rest = settings.backend.as_rest().unwrap();
        assert_eq!(rest.base_url, "https://api.example.com");
        assert_eq!(rest.auth_token.as_deref(), Some("secret"));
        assert_eq!(rest.poll_interval_ms, 1500);
        settings.validate().unwrap();
    }

    #[test]
    fn test_bad_poll_interval_is_rejected() {
        let mut settings = AdminSettings::default();
        let err = settings
            .apply_overrides(lookup(&[
                (env::REST_URL, "https://api.example.com"),
                (env::POLL_INTERVAL_MS, "soon"),
            ]))
            .unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains(env::POLL_INTERVAL_MS));
    }

    #[test]
    fn test_empty_values_are_ignored() {
        let mut settings = AdminSettings::default();
        settings
            .apply_overrides(lookup(&[(env::MODE, "  "), (env::REST_URL, "")]))
            .unwrap();
        assert_eq!(settings, AdminSettings::default());
    }

    #[test]
    fn test_partial_cloudinary_fails_validation() {
        let mut settings = AdminSettings::default();
        settings
            .apply_overrides(lookup(&[(env::CLOUDINARY_CLOUD_NAME, "demo")]))
            .unwrap();
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("storage.upload_preset"));

        settings
            .apply_overrides(lookup(&[(env::CLOUDINARY_UPLOAD_PRESET, "unsigned")]))
            .unwrap();
        settings.validate().unwrap();
    }

    #[test]
    fn test_validation_rules() {
        let mut settings = AdminSettings::default();
        settings.backend = BackendSettings::Rest(RestSettings::new("ftp://example.com"));
        assert!(settings.validate().is_err());

        let mut rest = RestSettings::new("http://localhost:8080");
        rest.poll_interval_ms = 0;
        settings.backend = BackendSettings::Rest(rest);
        assert!(settings.validate().is_err());

        settings.backend = BackendSettings::Memory;
        settings.logging.level = "loud".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("prod".parse::<RunMode>().unwrap(), RunMode::Production);
        assert!("staging".parse::<RunMode>().is_err());
        assert_eq!(RunMode::Production.to_string(), "production");
    }
}
