use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// Log level options for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    Off,
    /// Error messages only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages
    Info,
    /// Debug messages
    Debug,
    /// Trace-level messages (most verbose)
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Parser)]
#[command(name = "harvest-admin")]
#[command(about = "harvest-admin - manage the Fresh Harvest Box site content and schema")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Set log level (off, error, warn, info, debug, trace)
    /// If not specified, uses the settings file value
    #[arg(short = 'l', long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose logging (shortcut for --log-level=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file path (defaults to ~/.config/harvest-admin/config.toml)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Seed file whose inferred schema is the starting point before any
    /// saved schema is merged in
    #[arg(short, long, global = true)]
    pub seed: Option<PathBuf>,

    /// Local store directory (overrides settings)
    #[arg(long, global = true)]
    pub store_path: Option<PathBuf>,
}

impl Cli {
    /// Effective log level: `--verbose` beats `--log-level`
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.verbose {
            Some(LogLevel::Debug)
        } else {
            self.log_level
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check a seed file and print its errors and warnings
    Validate {
        /// Seed JSON file
        file: PathBuf,
    },

    /// Count pages, sections, fields and images in a seed file
    Stats {
        /// Seed JSON file
        file: PathBuf,
    },

    /// Print the schema inferred from a seed file
    Infer {
        /// Seed JSON file
        file: PathBuf,
    },

    /// Import a seed into the backend unless it was already imported
    Import {
        /// Seed JSON file
        file: PathBuf,

        /// Reset the import marker first
        #[arg(long)]
        force: bool,
    },

    /// Forget that the seed was imported
    ResetImport,

    /// Page schema management
    #[command(subcommand)]
    Pages(PagesCommands),

    /// Read content at a dotted path (collection.document.field...)
    Get {
        path: String,

        /// Value used when nothing is found (JSON, or a plain string)
        #[arg(short, long)]
        default: Option<String>,
    },

    /// Print content at a dotted path every time it changes, until Ctrl-C
    Watch { path: String },

    /// Rewrite a legacy flat document into hero/gallery sections
    Migrate { collection: String, id: String },

    /// Upload a file to the configured storage
    Upload {
        file: PathBuf,

        /// Target folder on the storage service
        #[arg(long)]
        folder: Option<String>,
    },

    /// Delete a previously uploaded file by url
    DeleteFile { url: String },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum PagesCommands {
    /// List pages with their field counts
    List,

    /// Add a page schema with the starter fields
    Add { name: String },

    /// Remove a page schema
    Remove { name: String },

    /// Add a page schema and create its starter document
    Create { name: String },

    /// Delete a page document and its schema
    Delete { name: String },

    /// Print the whole schema as JSON
    Export,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_import_with_force() {
        let cli = Cli::try_parse_from(["harvest-admin", "import", "seed.json", "--force"]).unwrap();
        match cli.command {
            Commands::Import { file, force } => {
                assert_eq!(file, PathBuf::from("seed.json"));
                assert!(force);
            }
            _ => panic!("expected import"),
        }
    }

    #[test]
    fn test_parse_pages_subcommand() {
        let cli = Cli::try_parse_from(["harvest-admin", "pages", "create", "promo"]).unwrap();
        match cli.command {
            Commands::Pages(cmd) => assert_eq!(
                cmd,
                PagesCommands::Create {
                    name: "promo".to_string()
                }
            ),
            _ => panic!("expected pages"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "harvest-admin",
            "get",
            "pages.main.hero.title",
            "--default",
            "\"Hi\"",
            "-l",
            "warn",
            "--seed",
            "seed.json",
        ])
        .unwrap();
        assert_eq!(cli.log_level, Some(LogLevel::Warn));
        assert_eq!(cli.seed, Some(PathBuf::from("seed.json")));
        assert!(matches!(cli.command, Commands::Get { default: Some(_), .. }));
    }

    #[test]
    fn test_verbose_wins() {
        let cli =
            Cli::try_parse_from(["harvest-admin", "-v", "-l", "error", "reset-import"]).unwrap();
        assert_eq!(cli.effective_log_level(), Some(LogLevel::Debug));
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(Cli::try_parse_from(["harvest-admin"]).is_err());
    }
}
