//! # depot-metadata — Artifact Catalog
//!
//! SQLite-backed catalog of packages and artifact versions. The schema
//! enforces the registry's two uniqueness rules — package names and
//! `(package_id, version)` pairs — so the database, not in-process
//! locking, is the final arbiter of "this version already exists".
//!
//! The store runs in WAL mode with a busy timeout: writers serialize,
//! readers proceed without blocking them.

mod error;
mod store;

pub use error::MetadataError;
pub use store::MetadataStore;
