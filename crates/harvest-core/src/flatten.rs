//! Dot-path flattening of documents for the field editor
//!
//! `{"hero": {"title": "x"}}` flattens to `{"hero.title": "x"}` and back.
//! Arrays are leaves and are never recursed into. Empty objects have no
//! leaves, so they do not survive a flatten.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::traits::Document;

/// Flatten nested objects into dot-path keys
pub fn flatten(doc: &Document) -> BTreeMap<String, Value> {
    let mut flat = BTreeMap::new();
    flatten_into(doc, None, &mut flat);
    flat
}

fn flatten_into(obj: &Map<String, Value>, prefix: Option<&str>, out: &mut BTreeMap<String, Value>) {
    for (key, value) in obj {
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key.clone(),
        };
        match value {
            Value::Object(nested) => flatten_into(nested, Some(&path), out),
            leaf => {
                out.insert(path, leaf.clone());
            }
        }
    }
}

/// Rebuild nested objects from dot-path keys
///
/// A non-object value sitting where an intermediate object is needed is
/// replaced by an object.
pub fn unflatten<'a, I>(flat: I) -> Document
where
    I: IntoIterator<Item = (&'a String, &'a Value)>,
{
    let mut root = Document::new();
    for (path, value) in flat {
        let segments: Vec<&str> = path.split('.').collect();
        insert_path(&mut root, &segments, value.clone());
    }
    root
}

fn insert_path(map: &mut Map<String, Value>, segments: &[&str], value: Value) {
    match segments {
        [] => {}
        [leaf] => {
            map.insert((*leaf).to_string(), value);
        }
        [head, rest @ ..] => {
            let slot = map
                .entry((*head).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            if let Value::Object(next) = slot {
                insert_path(next, rest, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_flatten_sections() {
        let flat = flatten(&doc(json!({
            "hero": { "title": "Hi", "meta": { "tag": "x" } },
            "gallery": { "images": ["/a.jpg", "/b.jpg"] },
            "title1": "Top",
            "empty": {},
            "none": null
        })));

        assert_eq!(flat.get("hero.title"), Some(&json!("Hi")));
        assert_eq!(flat.get("hero.meta.tag"), Some(&json!("x")));
        assert_eq!(flat.get("gallery.images"), Some(&json!(["/a.jpg", "/b.jpg"])));
        assert_eq!(flat.get("title1"), Some(&json!("Top")));
        assert_eq!(flat.get("none"), Some(&Value::Null));
        assert!(!flat.keys().any(|k| k.starts_with("empty")));
    }

    #[test]
    fn test_arrays_of_objects_stay_opaque() {
        let items = json!([{ "image": "/a.jpg", "description": "A" }]);
        let flat = flatten(&doc(json!({ "s": { "items": items.clone() } })));
        assert_eq!(flat.len(), 1);
        assert_eq!(flat["s.items"], items);
    }

    #[test]
    fn test_unflatten_restores_shape() {
        let original = doc(json!({
            "hero": { "title": "Hi", "subtitle": "Sub" },
            "gallery": { "images": [] },
            "title1": "Top"
        }));
        assert_eq!(unflatten(&flatten(&original)), original);
    }

    #[test]
    fn test_unflatten_replaces_scalar_intermediates() {
        let mut flat = BTreeMap::new();
        flat.insert("hero".to_string(), json!("scalar"));
        flat.insert("hero.title".to_string(), json!("Hi"));

        let nested = unflatten(&flat);
        assert_eq!(Value::Object(nested), json!({ "hero": { "title": "Hi" } }));
    }
}
