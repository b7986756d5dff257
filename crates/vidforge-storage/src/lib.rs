//! Object storage for rendered artifacts.
//!
//! Chunk artifacts and assembled videos live in an R2 bucket behind a
//! public CDN base URL. Downloads take the structured S3 path when a URL
//! is ours, and fall back to a streaming HTTP GET for foreign URLs.

pub mod client;
pub mod error;
pub mod fetch;

pub use client::{render_output_key, ObjectStore, StorageConfig};
pub use error::{StorageError, StorageResult};
pub use fetch::fetch_url_to_file;
