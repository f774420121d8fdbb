//! Network adapters for the harvest admin panel
//!
//! - [`RestApiAdapter`]: database adapter over a conventional REST service,
//!   with poll-based subscriptions
//! - [`CloudinaryAdapter`]: image storage through Cloudinary unsigned uploads

pub mod cloudinary;
pub mod rest;

pub use cloudinary::{extract_public_id, CloudinaryAdapter, CLOUDINARY_API_BASE};
pub use rest::{RestApiAdapter, MIN_POLL_INTERVAL};
