//! Path-addressed content access
//!
//! A content path is `collection.documentId[.section[.field]]`. The first two
//! segments select a document; the rest navigate into it. Lookups that find
//! nothing fall back to the schema's declared defaults, then to the caller's
//! default, then to `null`.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, warn};

use crate::admin::Mode;
use crate::config_manager::ConfigManager;
use crate::crud::CrudManager;
use crate::error::{AdminError, AdminResult};
use crate::traits::{Document, Subscription};

/// A parsed content path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentPath {
    pub collection: String,
    pub document_id: String,
    pub field_path: Vec<String>,
}

impl ContentPath {
    /// Split a dotted path; collection and document id are required
    pub fn parse(path: &str) -> AdminResult<Self> {
        let mut segments = path.split('.').map(str::to_string);
        let collection = segments
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AdminError::InvalidPath(format!("{path:?} has no collection")))?;
        let document_id = segments
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AdminError::InvalidPath(format!("{path:?} has no document id")))?;
        Ok(Self {
            collection,
            document_id,
            field_path: segments.collect(),
        })
    }

    /// Walk `field_path` into a document; `None` when a segment is missing
    pub fn navigate(&self, doc: &Document) -> Option<Value> {
        let mut segments = self.field_path.iter();
        let Some(first) = segments.next() else {
            return Some(Value::Object(doc.clone()));
        };
        let mut current = doc.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current.clone())
    }
}

impl FromStr for ContentPath {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ContentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.collection, self.document_id)?;
        for segment in &self.field_path {
            write!(f, ".{segment}")?;
        }
        Ok(())
    }
}

/// Schema default at a path
///
/// One navigation segment yields the collected defaults of that section, two
/// yield a single field's default; anything else has no default.
fn default_from_config(config: &ConfigManager, path: &ContentPath) -> Option<Value> {
    config.read(|cfg| {
        let page = cfg.document(&path.collection, &path.document_id)?;
        match path.field_path.as_slice() {
            [section] => page.section_defaults(section),
            [section, field] => page.field(section, field)?.default_value.clone(),
            _ => None,
        }
    })
}

/// Content reads and subscriptions with schema-default fallback
///
/// Values read through [`get_content`](Self::get_content) are cached by
/// path. Every subscription emission for a path evicts that path, so a later
/// one-shot read observes the newest value.
#[derive(Clone)]
pub struct ContentService {
    crud: Arc<CrudManager>,
    config: Arc<ConfigManager>,
    cache: Arc<RwLock<HashMap<String, Value>>>,
    mode: Mode,
}

impl ContentService {
    pub fn new(crud: Arc<CrudManager>, config: Arc<ConfigManager>, mode: Mode) -> Self {
        Self {
            crud,
            config,
            cache: Arc::new(RwLock::new(HashMap::new())),
            mode,
        }
    }

    /// Schema default at `path`, `None` when nothing is declared
    pub fn default_from_config(&self, path: &str) -> AdminResult<Option<Value>> {
        let parsed = ContentPath::parse(path)?;
        Ok(default_from_config(&self.config, &parsed))
    }

    /// One-shot read
    ///
    /// Backend failures propagate; a missing document or field falls back to
    /// the schema default, then `default`, then `null`. A path that does not
    /// name a document resolves to `default`, then `null`.
    pub async fn get_content(&self, path: &str, default: Option<Value>) -> AdminResult<Value> {
        let parsed = match ContentPath::parse(path) {
            Ok(parsed) => parsed,
            Err(e) => return Ok(self.unresolved(path, &e, default)),
        };

        let cached = self.cache.read().get(path).cloned();
        if let Some(cached) = cached {
            return Ok(cached);
        }

        let found = self
            .crud
            .get(&parsed.collection, &parsed.document_id)
            .await?
            .and_then(|doc| parsed.navigate(&doc));

        if let Some(value) = found {
            self.cache.write().insert(path.to_string(), value.clone());
            return Ok(value);
        }

        let value = default_from_config(&self.config, &parsed)
            .or(default)
            .unwrap_or(Value::Null);
        if value.is_null() && self.mode.is_development() {
            warn!(path, "No content found");
        }
        Ok(value)
    }

    fn unresolved(&self, path: &str, err: &AdminError, default: Option<Value>) -> Value {
        if self.mode.is_development() {
            warn!(path, error = %err, "Unresolvable content path");
        }
        default.unwrap_or(Value::Null)
    }

    /// Resolve several paths at once, keyed by the caller's names
    pub async fn get_multiple(
        &self,
        paths: &BTreeMap<String, String>,
    ) -> AdminResult<BTreeMap<String, Value>> {
        let mut values = BTreeMap::new();
        for (name, path) in paths {
            values.insert(name.clone(), self.get_content(path, None).await?);
        }
        Ok(values)
    }

    /// Live read
    ///
    /// `callback` receives the resolved value on every emission, including
    /// `null` or the schema default when the document is deleted. The
    /// returned guard must be kept alive for as long as updates are wanted.
    /// A path that does not name a document emits `null` once and returns an
    /// inert guard.
    pub fn subscribe_to_content<F>(&self, path: &str, callback: F) -> AdminResult<Subscription>
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        let parsed = match ContentPath::parse(path) {
            Ok(parsed) => parsed,
            Err(e) => {
                callback(self.unresolved(path, &e, None));
                return Ok(Subscription::noop());
            }
        };
        let collection = parsed.collection.clone();
        let document_id = parsed.document_id.clone();
        let key = path.to_string();
        let config = self.config.clone();
        let cache = self.cache.clone();
        let mode = self.mode;

        let on_snapshot = move |snapshot: Option<Document>| {
            let value = snapshot
                .and_then(|doc| parsed.navigate(&doc))
                .or_else(|| default_from_config(&config, &parsed))
                .unwrap_or(Value::Null);

            cache.write().remove(&key);
            if value.is_null() && mode.is_development() {
                warn!(path = %key, "No content found");
            }
            callback(value);
        };

        debug!(path, "Subscribing to content");
        self.crud
            .subscribe(&collection, &document_id, Arc::new(on_snapshot))
    }

    /// Evict one path, or everything when `path` is `None`
    pub fn clear_cache(&self, path: Option<&str>) {
        let mut cache = self.cache.write();
        match path {
            Some(path) => {
                cache.remove(path);
            }
            None => cache.clear(),
        }
    }

    /// Evict every cached path inside one document
    pub fn evict_document(&self, collection: &str, id: &str) {
        let prefix = format!("{collection}.{id}");
        self.cache.write().retain(|path, _| {
            !matches!(
                path.strip_prefix(&prefix),
                Some(rest) if rest.is_empty() || rest.starts_with('.')
            )
        });
    }

    pub fn is_cached(&self, path: &str) -> bool {
        self.cache.read().contains_key(path)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }
}

impl fmt::Debug for ContentService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentService")
            .field("cached", &self.cache.read().len())
            .field("mode", &self.mode)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_path() {
        let path = ContentPath::parse("pages.home.hero.title").unwrap();
        assert_eq!(path.collection, "pages");
        assert_eq!(path.document_id, "home");
        assert_eq!(path.field_path, vec!["hero", "title"]);
        assert_eq!(path.to_string(), "pages.home.hero.title");
    }

    #[test]
    fn test_parse_document_path() {
        let path: ContentPath = "pages.home".parse().unwrap();
        assert!(path.field_path.is_empty());
    }

    #[test]
    fn test_parse_requires_document() {
        assert!(matches!(
            ContentPath::parse("pages"),
            Err(AdminError::InvalidPath(_))
        ));
        assert!(ContentPath::parse("").is_err());
        assert!(ContentPath::parse("pages.").is_err());
    }

    #[test]
    fn test_navigate() {
        let doc = json!({
            "hero": { "title": "Hi", "tags": ["a"] },
            "flag": null
        })
        .as_object()
        .cloned()
        .unwrap();

        let at = |p: &str| ContentPath::parse(p).unwrap().navigate(&doc);
        assert_eq!(at("pages.home.hero.title"), Some(json!("Hi")));
        assert_eq!(at("pages.home.hero"), Some(json!({ "title": "Hi", "tags": ["a"] })));
        assert_eq!(at("pages.home.flag"), Some(Value::Null));
        assert_eq!(at("pages.home.hero.missing"), None);
        assert_eq!(at("pages.home.hero.title.deeper"), None);
        assert_eq!(at("pages.home.hero.tags.0"), None);
        assert_eq!(at("pages.home"), Some(Value::Object(doc.clone())));
    }
}
