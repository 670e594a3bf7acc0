//! HTTP route handlers, one module per resource:
//! - [`artifacts`]: upload, download, delete of `(package, version)` blobs.
//! - [`packages`]: listing, search, per-package info.
//! - [`gc`]: operator-triggered garbage collection.

pub mod artifacts;
pub mod gc;
pub mod packages;
