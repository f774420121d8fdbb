//! Schema inference from a content seed
//!
//! A seed is a plain nested object `page -> section -> field: value`. This
//! module derives a typed [`SchemaConfig`] from it (one [`FieldSchema`] per
//! leaf), copies it verbatim into page documents, counts what it contains,
//! and validates its shape before an import.
//!
//! Every function here is pure: the same seed always yields the same output.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use super::types::{FieldSchema, FieldType, PageSchema, SchemaConfig, SchemaNode, SectionSchema};
use crate::traits::Document;

/// Strings longer than this (in characters) become `textarea` fields
pub const TEXTAREA_THRESHOLD: usize = 100;

/// Default visible rows for inferred textarea fields
pub const DEFAULT_TEXTAREA_ROWS: u32 = 5;

/// Default item limit for inferred image arrays
pub const DEFAULT_IMAGE_ARRAY_MAX: u32 = 20;

const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg", ".ico"];
const IMAGE_DIRECTORIES: &[&str] = &["/images/", "/img/", "/assets/", "/public/"];
const IMAGE_KEYWORDS: &[&str] = &["image", "photo", "picture", "icon", "logo", "avatar"];

/// Whether a value looks like a reference to an image
///
/// A string matches on any of: a known image extension, a conventional
/// asset directory segment, or an image-ish keyword. Non-strings never
/// match.
pub fn is_image_url(value: &Value) -> bool {
    value.as_str().is_some_and(is_image_str)
}

/// [`is_image_url`] for a plain string
pub fn is_image_str(s: &str) -> bool {
    let lower = s.to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
        || IMAGE_DIRECTORIES.iter().any(|dir| lower.contains(dir))
        || IMAGE_KEYWORDS.iter().any(|word| lower.contains(word))
}

/// Infer the editor field type of a seed value
pub fn detect_field_type(value: &Value) -> FieldType {
    match value {
        Value::Null => FieldType::Text,
        Value::Array(items) => match items.first() {
            None => FieldType::ImageArray,
            Some(Value::Object(first)) if has_image_attr(first) => {
                FieldType::ImageGalleryWithDescription
            }
            Some(Value::String(first)) if is_image_str(first) => FieldType::ImageArray,
            Some(Value::String(_)) | Some(Value::Object(_)) => FieldType::Text,
            Some(_) => FieldType::ImageArray,
        },
        Value::String(s) if is_image_str(s) => FieldType::Image,
        Value::String(s) if s.chars().count() > TEXTAREA_THRESHOLD => FieldType::Textarea,
        Value::String(_) | Value::Number(_) | Value::Bool(_) => FieldType::Text,
        Value::Object(_) => FieldType::Section,
    }
}

fn has_image_attr(item: &Map<String, Value>) -> bool {
    ["image", "icon"]
        .iter()
        .any(|key| item.get(*key).is_some_and(is_truthy))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Turn a camelCase key into a capitalized, space separated label
///
/// `cardDescription1` becomes `Card Description1`.
pub fn humanize_key(key: &str) -> String {
    let mut label = String::with_capacity(key.len() + 4);
    for (i, ch) in key.chars().enumerate() {
        if i == 0 {
            label.extend(ch.to_uppercase());
        } else {
            if ch.is_uppercase() {
                label.push(' ');
            }
            label.push(ch);
        }
    }
    label.trim().to_string()
}

/// Build the schema of one field from its seed value
pub fn infer_field(name: &str, value: &Value) -> FieldSchema {
    let field_type = detect_field_type(value);
    let mut field = FieldSchema::new(field_type, humanize_key(name)).with_default(value.clone());
    match field_type {
        FieldType::Textarea => field.rows = Some(DEFAULT_TEXTAREA_ROWS),
        FieldType::ImageArray => field.max = Some(DEFAULT_IMAGE_ARRAY_MAX),
        _ => {}
    }
    field
}

/// Infer a schema config from a seed
///
/// Pages and sections that are not objects are skipped with a warning.
/// A non-object root yields an empty `pages` collection.
pub fn infer_config(seed: &Value) -> SchemaConfig {
    let mut config = SchemaConfig::with_pages();
    let Some(root) = seed.as_object() else {
        warn!("Seed root is not an object, nothing to infer");
        return config;
    };

    for (page_name, page_value) in root {
        let Some(page_data) = page_value.as_object() else {
            warn!(page = %page_name, "Seed page is not an object, skipping");
            continue;
        };

        let mut page = PageSchema::new();
        for (section_name, section_value) in page_data {
            let Some(section_data) = section_value.as_object() else {
                warn!(page = %page_name, section = %section_name, "Seed section is not an object, skipping");
                continue;
            };

            let label = humanize_key(section_name);
            let mut section = SectionSchema::new(
                label.clone(),
                format!("Секция {}", label.to_lowercase()),
            );
            for (field_name, field_value) in section_data {
                section
                    .fields
                    .insert(field_name.clone(), infer_field(field_name, field_value));
            }
            page.insert(section_name.clone(), SchemaNode::Section(section));
        }
        config.pages_mut().insert(page_name.clone(), page);
    }

    config
}

/// Copy the seed's page -> section -> field structure into page documents
///
/// No type inference is applied; this is the literal content payload.
pub fn seed_to_documents(seed: &Value) -> BTreeMap<String, Document> {
    let Some(root) = seed.as_object() else {
        return BTreeMap::new();
    };

    root.iter()
        .filter_map(|(page_name, page_value)| {
            let page_data = page_value.as_object()?;
            let document: Document = page_data
                .iter()
                .map(|(section, value)| (section.clone(), value.clone()))
                .collect();
            Some((page_name.clone(), document))
        })
        .collect()
}

/// Counts over a seed, for display before an import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedStats {
    pub pages: usize,
    pub sections: usize,
    pub fields: usize,
    pub images: usize,
}

/// Count pages, sections, fields and image references in a seed
pub fn seed_stats(seed: &Value) -> SeedStats {
    let mut stats = SeedStats::default();
    let Some(root) = seed.as_object() else {
        return stats;
    };

    for page in root.values().filter_map(Value::as_object) {
        stats.pages += 1;
        for section in page.values().filter_map(Value::as_object) {
            stats.sections += 1;
            for value in section.values() {
                stats.fields += 1;
                stats.images += count_images(value);
            }
        }
    }
    stats
}

fn count_images(value: &Value) -> usize {
    if is_image_url(value) {
        return 1;
    }
    let Some(items) = value.as_array() else {
        return 0;
    };
    items
        .iter()
        .map(|item| match item {
            Value::String(s) if is_image_str(s) => 1,
            Value::Object(record) => ["image", "icon"]
                .iter()
                .filter(|key| record.get(**key).is_some_and(is_image_url))
                .count(),
            _ => 0,
        })
        .sum()
}

/// Outcome of seed validation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedValidation {
    /// Hard errors: the import must not proceed
    pub errors: Vec<String>,
    /// Soft warnings: the import proceeds, skipping what is flagged
    pub warnings: Vec<String>,
}

impl SeedValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check a seed's shape before importing it
pub fn validate_seed(seed: &Value) -> SeedValidation {
    let mut report = SeedValidation::default();

    let Some(root) = seed.as_object() else {
        report
            .errors
            .push("seed must be an object of pages".to_string());
        return report;
    };
    if root.is_empty() {
        report.errors.push("seed is empty: no pages".to_string());
        return report;
    }

    for (page_name, page_value) in root {
        let Some(page) = page_value.as_object() else {
            report
                .warnings
                .push(format!("page \"{page_name}\" is not an object"));
            continue;
        };
        if page.is_empty() {
            report
                .warnings
                .push(format!("page \"{page_name}\" is empty: no sections"));
        }

        for (section_name, section_value) in page {
            let Some(section) = section_value.as_object() else {
                report.warnings.push(format!(
                    "section \"{page_name}.{section_name}\" is not an object"
                ));
                continue;
            };
            if section.is_empty() {
                report.warnings.push(format!(
                    "section \"{page_name}.{section_name}\" is empty: no fields"
                ));
            }
        }
    }

    report
}
