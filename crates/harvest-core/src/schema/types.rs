//! Schema data model
//!
//! The schema ("config") describes every editable field of every page: its
//! type, label and default value. It is distinct from the content itself,
//! which lives in the backend as [`Document`](crate::traits::Document)s.
//!
//! ```text
//! SchemaConfig
//! └── collections: { "pages": CollectionSchema }
//!     └── page name -> PageSchema
//!         ├── section name -> SchemaNode::Section(SectionSchema)
//!         │   └── field name -> FieldSchema
//!         └── field key    -> SchemaNode::Field(FieldSchema)
//! ```
//!
//! A page holds either nested sections (as produced by schema inference) or
//! flat fields (pages created from the admin panel, and the `section.field`
//! keyed form the editor works with). Lookups accept both shapes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name of the collection holding page documents and page schemas
pub const PAGES_COLLECTION: &str = "pages";

/// Editable field kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    Text,
    Textarea,
    Image,
    ImageArray,
    ImageGalleryWithDescription,
    Section,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Image => "image",
            Self::ImageArray => "image-array",
            Self::ImageGalleryWithDescription => "image-gallery-with-description",
            Self::Section => "section",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptor of one editable leaf field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    #[serde(rename = "type")]
    pub field_type: FieldType,

    pub label: String,

    #[serde(
        rename = "defaultValue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub default_value: Option<Value>,

    /// Visible rows for textarea fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<u32>,

    /// Maximum number of items for image arrays
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
}

impl FieldSchema {
    pub fn new(field_type: FieldType, label: impl Into<String>) -> Self {
        Self {
            field_type,
            label: label.into(),
            default_value: None,
            rows: None,
            max: None,
        }
    }

    /// Builder-style: set the default value
    #[must_use]
    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Builder-style: set textarea rows
    #[must_use]
    pub fn with_rows(mut self, rows: u32) -> Self {
        self.rows = Some(rows);
        self
    }

    /// Builder-style: set the image array limit
    #[must_use]
    pub fn with_max(mut self, max: u32) -> Self {
        self.max = Some(max);
        self
    }
}

/// A named group of fields within a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionSchema {
    #[serde(rename = "_label")]
    pub label: String,

    #[serde(rename = "_description", default)]
    pub description: String,

    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldSchema>,
}

impl SectionSchema {
    pub fn new(label: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: description.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Default values of every field that declares one
    pub fn defaults(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .filter(|(name, _)| !name.starts_with('_'))
            .filter_map(|(name, field)| {
                field
                    .default_value
                    .as_ref()
                    .map(|value| (name.clone(), value.clone()))
            })
            .collect()
    }
}

/// An entry of a page schema: a field or a section of fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaNode {
    Field(FieldSchema),
    Section(SectionSchema),
}

impl SchemaNode {
    pub fn as_field(&self) -> Option<&FieldSchema> {
        match self {
            Self::Field(field) => Some(field),
            Self::Section(_) => None,
        }
    }

    pub fn as_section(&self) -> Option<&SectionSchema> {
        match self {
            Self::Section(section) => Some(section),
            Self::Field(_) => None,
        }
    }

    fn field_count(&self) -> usize {
        match self {
            Self::Field(_) => 1,
            Self::Section(section) => section.fields.len(),
        }
    }
}

/// Schema of one page, keyed by section (or field) name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageSchema(BTreeMap<String, SchemaNode>);

impl PageSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// The two-field page used for freshly added and recovered pages
    pub fn starter() -> Self {
        let mut page = Self::new();
        page.insert(
            "title1",
            SchemaNode::Field(FieldSchema::new(FieldType::Text, "Заголовок #1")),
        );
        page.insert(
            "description1",
            SchemaNode::Field(FieldSchema::new(FieldType::Textarea, "Описание #1").with_rows(5)),
        );
        page
    }

    pub fn insert(&mut self, key: impl Into<String>, node: SchemaNode) -> Option<SchemaNode> {
        self.0.insert(key.into(), node)
    }

    pub fn get(&self, key: &str) -> Option<&SchemaNode> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SchemaNode)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of leaf fields across sections and flat entries
    pub fn field_count(&self) -> usize {
        self.0.values().map(SchemaNode::field_count).sum()
    }

    /// Look up `section.field`, in nested or flat form
    pub fn field(&self, section: &str, field: &str) -> Option<&FieldSchema> {
        if let Some(SchemaNode::Section(nested)) = self.0.get(section) {
            return nested.fields.get(field);
        }
        self.0
            .get(&format!("{section}.{field}"))
            .and_then(SchemaNode::as_field)
    }

    /// Default values of everything under `section`
    ///
    /// For a nested section this collects its fields' defaults; for flat
    /// `section.field` keys it collects those entries. A page-level field
    /// named `section` yields its own default. Returns `None` when nothing
    /// declares a default.
    pub fn section_defaults(&self, section: &str) -> Option<Value> {
        match self.0.get(section) {
            Some(SchemaNode::Section(nested)) => {
                let defaults = nested.defaults();
                (!defaults.is_empty()).then_some(Value::Object(defaults))
            }
            Some(SchemaNode::Field(field)) => field.default_value.clone(),
            None => {
                let prefix = format!("{section}.");
                let defaults: Map<String, Value> = self
                    .0
                    .iter()
                    .filter_map(|(key, node)| {
                        let name = key.strip_prefix(&prefix)?;
                        if name.starts_with('_') || name.contains('.') {
                            return None;
                        }
                        let value = node.as_field()?.default_value.clone()?;
                        Some((name.to_string(), value))
                    })
                    .collect();
                (!defaults.is_empty()).then_some(Value::Object(defaults))
            }
        }
    }

    /// Rewrite nested sections into flat `section.field` keyed fields
    ///
    /// Section metadata (`_label`, `_description`) is dropped. Flat fields
    /// are kept as they are.
    pub fn flatten_sections(&self) -> PageSchema {
        let mut flat = PageSchema::new();
        for (key, node) in &self.0 {
            match node {
                SchemaNode::Section(section) => {
                    for (name, field) in &section.fields {
                        if !name.starts_with('_') {
                            flat.insert(format!("{key}.{name}"), SchemaNode::Field(field.clone()));
                        }
                    }
                }
                SchemaNode::Field(field) => {
                    flat.insert(key.clone(), SchemaNode::Field(field.clone()));
                }
            }
        }
        flat
    }
}

impl FromIterator<(String, SchemaNode)> for PageSchema {
    fn from_iter<I: IntoIterator<Item = (String, SchemaNode)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for PageSchema {
    type Item = (String, SchemaNode);
    type IntoIter = std::collections::btree_map::IntoIter<String, SchemaNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Page schemas of one collection, keyed by document id
pub type CollectionSchema = BTreeMap<String, PageSchema>;

/// The authoritative schema object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaConfig {
    #[serde(default)]
    pub collections: BTreeMap<String, CollectionSchema>,
}

impl SchemaConfig {
    /// An empty config with an empty `pages` collection
    pub fn with_pages() -> Self {
        let mut config = Self::default();
        config
            .collections
            .insert(PAGES_COLLECTION.to_string(), CollectionSchema::new());
        config
    }

    pub fn pages(&self) -> Option<&CollectionSchema> {
        self.collections.get(PAGES_COLLECTION)
    }

    /// The `pages` collection, created if missing
    pub fn pages_mut(&mut self) -> &mut CollectionSchema {
        self.collections
            .entry(PAGES_COLLECTION.to_string())
            .or_default()
    }

    pub fn has_pages(&self) -> bool {
        self.collections.contains_key(PAGES_COLLECTION)
    }

    pub fn page(&self, name: &str) -> Option<&PageSchema> {
        self.pages().and_then(|pages| pages.get(name))
    }

    pub fn page_names(&self) -> Vec<String> {
        self.pages()
            .map(|pages| pages.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Schema of `collection/id`
    pub fn document(&self, collection: &str, id: &str) -> Option<&PageSchema> {
        self.collections.get(collection).and_then(|c| c.get(id))
    }

    /// A config holding only the `pages` collection of `self`
    pub fn pages_only(&self) -> SchemaConfig {
        let mut config = SchemaConfig::default();
        config.collections.insert(
            PAGES_COLLECTION.to_string(),
            self.pages().cloned().unwrap_or_default(),
        );
        config
    }
}
