use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use harvest_config::AdminSettings;
use harvest_core::Admin;
use tracing::debug;

use harvest_cli::{
    cli::{Cli, Commands},
    commands,
    factories::{build_admin, read_seed},
    logging,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings =
        AdminSettings::load(cli.config.as_deref()).context("Failed to load settings")?;
    if let Some(store_path) = &cli.store_path {
        settings.store.path = store_path.clone();
    }

    logging::init(cli.effective_log_level(), &settings.logging.level);
    debug!(
        mode = %settings.mode,
        backend = settings.backend.name(),
        store = %settings.store.path.display(),
        "Settings loaded"
    );

    let seed = cli.seed.as_deref();
    match cli.command {
        Commands::Validate { file } => commands::seed::validate(&file).await?,
        Commands::Stats { file } => commands::seed::stats(&file).await?,
        Commands::Infer { file } => commands::seed::infer(&file).await?,
        Commands::Import { file, force } => {
            commands::import::execute(&settings, &file, force).await?
        }
        Commands::ResetImport => commands::import::reset(&settings).await?,
        Commands::Pages(cmd) => {
            commands::pages::execute(&open_admin(&settings, seed).await?, cmd).await?
        }
        Commands::Get { path, default } => {
            let admin = open_admin(&settings, seed).await?;
            commands::content::get(&admin, &path, default.as_deref()).await?
        }
        Commands::Watch { path } => {
            commands::content::watch(&open_admin(&settings, seed).await?, &path).await?
        }
        Commands::Migrate { collection, id } => {
            let admin = open_admin(&settings, seed).await?;
            commands::migrate::execute(&admin, &collection, &id).await?
        }
        Commands::Upload { file, folder } => {
            commands::files::upload(&open_admin(&settings, seed).await?, &file, folder).await?
        }
        Commands::DeleteFile { url } => {
            commands::files::delete(&open_admin(&settings, seed).await?, &url).await?
        }
    }

    Ok(())
}

/// Admin service over the configured backend, seeded from `--seed` if given
async fn open_admin(settings: &AdminSettings, seed: Option<&Path>) -> Result<Admin> {
    let seed = match seed {
        Some(path) => Some(read_seed(path).await?),
        None => None,
    };
    build_admin(settings, seed.as_ref()).await
}
