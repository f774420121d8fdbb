//! # Harvest admin settings
//!
//! Typed settings for the admin tooling: run mode, local store location,
//! database backend, file storage and logging. Settings come from a TOML
//! file, then `HARVEST_*` / `CLOUDINARY_*` environment variables.
//!
//! ```rust,no_run
//! use harvest_config::AdminSettings;
//!
//! let settings = AdminSettings::load(None)?;
//! println!("backend: {}", settings.backend.name());
//! # Ok::<(), harvest_config::ConfigError>(())
//! ```

pub mod components;
mod error;
mod settings;

pub use components::*;
pub use error::{ConfigError, ConfigResult};
pub use settings::{env, AdminSettings, RunMode};
