use anyhow::{bail, Result};
use harvest_core::Admin;

use super::require_durable;

pub async fn execute(admin: &Admin, collection: &str, id: &str) -> Result<()> {
    require_durable(admin, "migrate")?;
    let outcome = admin.crud().migrate_to_sections(collection, id).await?;
    println!("{collection}/{id}: {}", outcome.message());
    if !outcome.is_success() {
        bail!("nothing migrated for {collection}/{id}");
    }
    Ok(())
}
