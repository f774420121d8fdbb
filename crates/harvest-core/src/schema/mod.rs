//! Field schema: data model, inference from seeds, validation.

pub mod inference;
pub mod parser;
pub mod types;

pub use inference::{
    detect_field_type, humanize_key, infer_config, is_image_url, seed_stats, seed_to_documents,
    validate_seed, SeedStats, SeedValidation,
};
pub use parser::SchemaParser;
pub use types::{
    CollectionSchema, FieldSchema, FieldType, PageSchema, SchemaConfig, SchemaNode, SectionSchema,
    PAGES_COLLECTION,
};
