use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

/// Filter for the subscriber: `RUST_LOG` when set, else the CLI level, else
/// the settings level
pub fn build_filter(cli_level: Option<LogLevel>, settings_level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let level = match cli_level {
        Some(level) => LevelFilter::from(level),
        None => settings_level.parse().unwrap_or(LevelFilter::INFO),
    };
    EnvFilter::new(level.to_string())
}

/// Install the global subscriber, logging to stderr
pub fn init(cli_level: Option<LogLevel>, settings_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(cli_level, settings_level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
