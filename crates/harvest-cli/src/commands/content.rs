use anyhow::{Context, Result};
use harvest_core::Admin;
use serde_json::Value;
use tracing::info;

/// `--default` value: JSON when it parses, a plain string otherwise
pub fn parse_default(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

pub async fn get(admin: &Admin, path: &str, default: Option<&str>) -> Result<()> {
    let value = admin
        .content()
        .get_content(path, default.map(parse_default))
        .await
        .with_context(|| format!("Failed to read {path}"))?;
    println!("{}", render(&value));
    Ok(())
}

pub async fn watch(admin: &Admin, path: &str) -> Result<()> {
    let subscription = admin
        .content()
        .subscribe_to_content(path, |value| println!("{}", render(&value)))
        .with_context(|| format!("Failed to subscribe to {path}"))?;
    info!(path, "Watching, press Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    subscription.unsubscribe();
    info!(path, "Stopped watching");
    Ok(())
}
