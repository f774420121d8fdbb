//! Local durable key/value store
//!
//! Holds the schema cache (serialized config + page-name list) and the
//! auto-import marker. Values are JSON text.

use async_trait::async_trait;

use crate::error::AdminResult;

#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Read the raw value stored under `key`
    async fn get(&self, key: &str) -> AdminResult<Option<String>>;

    /// Write `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> AdminResult<()>;

    /// Remove `key`; removing a missing key is not an error
    async fn remove(&self, key: &str) -> AdminResult<()>;
}
