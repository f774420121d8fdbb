use std::path::Path;

use anyhow::{Context, Result};
use harvest_config::AdminSettings;
use harvest_core::{AutoImportOutcome, ImportReport};
use tracing::info;

use crate::factories::{build_admin, read_seed};

pub fn format_report(report: &ImportReport) -> String {
    let mut out = format!(
        "Imported {} page(s): {} created, {} updated",
        report.pages.len(),
        report.created,
        report.updated
    );
    for warning in &report.warnings {
        out.push_str(&format!("\nwarning: {warning}"));
    }
    out
}

pub async fn execute(settings: &AdminSettings, file: &Path, force: bool) -> Result<()> {
    let seed = read_seed(file).await?;
    let admin = build_admin(settings, Some(&seed)).await?;
    let importer = admin.importer();

    if !admin.crud().database().is_durable() {
        let report = importer.import_seed(&seed).await.context("Import failed")?;
        println!("{}", format_report(&report));
        println!("Nothing was persisted and the import marker was left unset");
        return Ok(());
    }

    if force {
        importer.reset().await.context("Failed to reset import marker")?;
        info!("Import marker reset");
    }

    match importer
        .run_if_pending(&seed, |report| info!(pages = report.pages.len(), "Seed imported"))
        .await
    {
        AutoImportOutcome::Imported(report) => println!("{}", format_report(&report)),
        AutoImportOutcome::Skipped => match importer.completed_at().await? {
            Some(at) => println!("Already imported on {}; use --force to import again", at.to_rfc3339()),
            None => println!("Already imported; use --force to import again"),
        },
        AutoImportOutcome::Failed(e) => return Err(e).context("Import failed"),
    }
    Ok(())
}

pub async fn reset(settings: &AdminSettings) -> Result<()> {
    let admin = build_admin(settings, None).await?;
    admin.importer().reset().await?;
    println!("Import marker cleared");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_report() {
        let report = ImportReport {
            pages: vec!["main".to_string(), "footer".to_string()],
            created: 1,
            updated: 1,
            warnings: vec!["legacy: not an object".to_string()],
        };
        assert_eq!(
            format_report(&report),
            "Imported 2 page(s): 1 created, 1 updated\nwarning: legacy: not an object"
        );
    }
}
