use anyhow::Result;
use harvest_core::Admin;

use super::require_durable;
use crate::cli::PagesCommands;

pub async fn execute(admin: &Admin, cmd: PagesCommands) -> Result<()> {
    let config = admin.config_manager();
    match cmd {
        PagesCommands::List => {
            let pages = config.describe_pages();
            if pages.is_empty() {
                println!("No pages");
            }
            for (name, fields) in pages {
                println!("{name:<24} {fields} field(s)");
            }
        }
        PagesCommands::Add { name } => {
            config.add_page(&name).await?;
            println!("Added page {name}");
        }
        PagesCommands::Remove { name } => {
            if config.remove_page(&name).await? {
                println!("Removed page {name}");
            } else {
                println!("No page named {name}");
            }
        }
        PagesCommands::Create { name } => {
            require_durable(admin, "pages create")?;
            admin.create_page(&name).await?;
            println!("Created page {name}");
        }
        PagesCommands::Delete { name } => {
            require_durable(admin, "pages delete")?;
            if admin.delete_page(&name).await? {
                println!("Deleted page {name}");
            } else {
                println!("Deleted document {name}; it had no schema");
            }
        }
        PagesCommands::Export => println!("{}", config.export_config()?),
    }
    Ok(())
}
