//! Offline seed commands: validate, stats, infer

use std::path::Path;

use anyhow::{bail, Result};
use harvest_core::{infer_config, seed_stats, validate_seed, SeedValidation};

use crate::factories::read_seed;

/// Render a validation report for the terminal
pub fn format_validation(report: &SeedValidation) -> String {
    let mut out = String::new();
    for error in &report.errors {
        out.push_str(&format!("error: {error}\n"));
    }
    for warning in &report.warnings {
        out.push_str(&format!("warning: {warning}\n"));
    }
    out.push_str(&format!(
        "{} error(s), {} warning(s)",
        report.errors.len(),
        report.warnings.len()
    ));
    out
}

pub async fn validate(file: &Path) -> Result<()> {
    let seed = read_seed(file).await?;
    let report = validate_seed(&seed);
    println!("{}", format_validation(&report));
    if !report.is_valid() {
        bail!("{} is not a valid seed", file.display());
    }
    Ok(())
}

pub async fn stats(file: &Path) -> Result<()> {
    let seed = read_seed(file).await?;
    let stats = seed_stats(&seed);
    println!("Seed statistics\n");
    println!("  pages:    {}", stats.pages);
    println!("  sections: {}", stats.sections);
    println!("  fields:   {}", stats.fields);
    println!("  images:   {}", stats.images);
    Ok(())
}

pub async fn infer(file: &Path) -> Result<()> {
    let seed = read_seed(file).await?;
    println!("{}", serde_json::to_string_pretty(&infer_config(&seed))?);
    Ok(())
}
