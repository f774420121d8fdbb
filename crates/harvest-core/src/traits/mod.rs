//! Core traits (abstractions for dependency inversion)
//!
//! The core depends only on these seams; concrete backends live in
//! `adapters`, `store` or the `harvest-adapters` crate.

pub mod database;
pub mod local_store;
pub mod storage;
pub mod subscription;

pub use database::{DatabaseAdapter, Document, DocumentCallback};
pub use local_store::LocalStore;
pub use storage::{FileUpload, StorageAdapter, UploadOptions};
pub use subscription::Subscription;
