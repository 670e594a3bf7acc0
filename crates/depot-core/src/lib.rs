//! # depot-core — Shared Domain Types
//!
//! Dependency-light leaf crate holding the registry's domain model and
//! the content-digest helpers shared by the storage layer, the catalog,
//! and the HTTP surface.
//!
//! A blob's durable name is the lowercase hex SHA-256 of its bytes; every
//! other component treats that 64-character string as an opaque address.

pub mod digest;
pub mod models;

pub use digest::{blob_prefix, is_hex_digest};
pub use models::{Artifact, GcResult, Package, PackageInfo, UploadResponse};
