use anyhow::{bail, Result};
use harvest_core::Admin;

pub mod content;
pub mod files;
pub mod import;
pub mod migrate;
pub mod pages;
pub mod seed;

/// Refuse backend writes that would vanish with the process
pub(crate) fn require_durable(admin: &Admin, action: &str) -> Result<()> {
    let database = admin.crud().database();
    if !database.is_durable() {
        bail!(
            "{action} needs a persistent backend, but the {} backend keeps nothing after exit",
            database.backend_name()
        );
    }
    Ok(())
}
