//! # depot-storage — Content-Addressed Blob Store
//!
//! Streaming ingest of opaque byte blobs into an on-disk tree addressed
//! by content hash:
//!
//! ```text
//! <dataDir>/blobs/<xx>/<hash>   committed blobs (xx = first two hex chars)
//! <dataDir>/tmp/upload-*        in-flight ingest
//! ```
//!
//! Bytes are hashed while they are written ([`HashingWriter`]), so a
//! blob's final path is derived from the data actually on disk. The
//! atomic rename from `tmp/` into `blobs/` is the linearization point for
//! "the blob exists": a crash before the rename leaves only a temp file,
//! a crash after leaves a complete, correctly named blob. Concurrent
//! ingests of identical content both finish; one rename wins and the
//! other collapses into a deduplication hit.

mod disk;
mod error;
mod hashing;

pub use disk::BlobStore;
pub use error::StorageError;
pub use hashing::HashingWriter;
