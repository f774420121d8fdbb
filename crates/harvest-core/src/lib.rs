//! Harvest admin core
//!
//! Content schema engine behind the site's admin panel:
//!
//! - [`schema`]: field schema model, inference from a content seed, validation
//! - [`config_manager`]: authoritative schema with merge policy and persistence
//! - [`crud`]: façade over database/storage adapters plus the sections migration
//! - [`content`]: dotted-path content access with default fallback and live updates
//! - [`import`]: one-time auto-import of the seed and manual seed import
//! - [`admin`]: the service object tying everything together
//!
//! Backends plug in through the traits in [`traits`]; in-process ones live in
//! [`adapters`] and network ones in the `harvest-adapters` crate.

pub mod adapters;
pub mod admin;
pub mod config_manager;
pub mod content;
pub mod crud;
pub mod error;
pub mod flatten;
pub mod import;
pub mod schema;
pub mod store;
pub mod traits;

pub mod test_support;

pub use adapters::{MemoryDatabase, MemoryStorage};
pub use admin::{Admin, AdminOptions, Mode};
pub use config_manager::{merge_configs, ConfigManager};
pub use content::{ContentPath, ContentService};
pub use crud::{CrudManager, CrudManagerBuilder, MigrationOutcome, WriteOutcome};
pub use error::{AdminError, AdminResult};
pub use flatten::{flatten, unflatten};
pub use import::{parse_seed_text, AutoImportOutcome, AutoImporter, ImportReport, ImportStatus};
pub use schema::{
    infer_config, seed_stats, seed_to_documents, validate_seed, FieldSchema, FieldType,
    PageSchema, SchemaConfig, SchemaNode, SchemaParser, SectionSchema, SeedStats, SeedValidation,
    PAGES_COLLECTION,
};
pub use store::{FileStore, MemoryStore, StoreKeys};
pub use traits::{
    DatabaseAdapter, Document, DocumentCallback, FileUpload, LocalStore, StorageAdapter,
    Subscription, UploadOptions,
};
