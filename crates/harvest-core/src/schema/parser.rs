//! Schema validation and read-only lookups used by the editor screens.

use serde_json::Value;

use super::types::{CollectionSchema, FieldSchema, FieldType, PageSchema, SchemaConfig, SchemaNode};
use crate::error::{AdminError, AdminResult};

/// Validated view over a [`SchemaConfig`]
#[derive(Debug, Clone)]
pub struct SchemaParser {
    config: SchemaConfig,
}

impl SchemaParser {
    pub fn new(config: SchemaConfig) -> Self {
        Self { config }
    }

    /// Validate raw schema JSON and parse it
    ///
    /// The root must carry a `collections` object; every collection and every
    /// document schema inside it must be an object.
    pub fn from_value(raw: &Value) -> AdminResult<Self> {
        let collections = raw
            .get("collections")
            .ok_or_else(|| AdminError::InvalidSchema("config must have \"collections\"".into()))?;
        let collections = collections.as_object().ok_or_else(|| {
            AdminError::InvalidSchema("\"collections\" must be an object".into())
        })?;

        for (name, collection) in collections {
            let documents = collection.as_object().ok_or_else(|| {
                AdminError::InvalidSchema(format!("collection \"{name}\" must be an object"))
            })?;
            for (doc_id, doc) in documents {
                if !doc.is_object() {
                    return Err(AdminError::InvalidSchema(format!(
                        "document \"{doc_id}\" in collection \"{name}\" must be an object"
                    )));
                }
            }
        }

        let config: SchemaConfig = serde_json::from_value(raw.clone())
            .map_err(|e| AdminError::InvalidSchema(e.to_string()))?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &SchemaConfig {
        &self.config
    }

    pub fn collections(&self) -> Vec<&str> {
        self.config.collections.keys().map(String::as_str).collect()
    }

    pub fn collection(&self, name: &str) -> Option<&CollectionSchema> {
        self.config.collections.get(name)
    }

    pub fn document(&self, collection: &str, id: &str) -> Option<&PageSchema> {
        self.config.document(collection, id)
    }

    /// Fields of a document schema, empty if unknown
    pub fn fields(&self, collection: &str, id: &str) -> PageSchema {
        self.document(collection, id).cloned().unwrap_or_default()
    }

    /// Field descriptor by page-level key (`title1` or `hero.title`)
    pub fn field_meta(&self, collection: &str, id: &str, key: &str) -> Option<&FieldSchema> {
        let page = self.document(collection, id)?;
        match page.get(key) {
            Some(SchemaNode::Field(field)) => Some(field),
            Some(SchemaNode::Section(_)) => None,
            None => {
                let (section, field) = key.split_once('.')?;
                page.field(section, field)
            }
        }
    }

    /// Field type by page-level key, `text` when unknown
    pub fn field_type(&self, collection: &str, id: &str, key: &str) -> FieldType {
        self.field_meta(collection, id, key)
            .map(|field| field.field_type)
            .unwrap_or(FieldType::Text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "collections": {
                "pages": {
                    "home": {
                        "hero": {
                            "_label": "Hero",
                            "_description": "",
                            "photo": { "type": "image", "label": "Photo" }
                        },
                        "title1": { "type": "text", "label": "Title" }
                    }
                }
            }
        })
    }

    #[test]
    fn test_rejects_missing_collections() {
        let err = SchemaParser::from_value(&json!({})).unwrap_err();
        assert!(matches!(err, AdminError::InvalidSchema(_)));
    }

    #[test]
    fn test_rejects_non_object_document() {
        let raw = json!({ "collections": { "pages": { "home": 3 } } });
        assert!(SchemaParser::from_value(&raw).is_err());
    }

    #[test]
    fn test_lookups() {
        let parser = SchemaParser::from_value(&sample()).unwrap();
        assert_eq!(parser.collections(), vec!["pages"]);
        assert_eq!(parser.field_type("pages", "home", "hero.photo"), FieldType::Image);
        assert_eq!(parser.field_type("pages", "home", "title1"), FieldType::Text);
        assert_eq!(parser.field_type("pages", "home", "missing"), FieldType::Text);
        assert_eq!(parser.field_type("pages", "nope", "title1"), FieldType::Text);
        assert!(parser.fields("pages", "nope").is_empty());
        assert_eq!(
            parser.field_meta("pages", "home", "title1").unwrap().label,
            "Title"
        );
    }
}
