//! Blob store error taxonomy.

use thiserror::Error;

/// Errors from blob store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No blob is committed under this content address.
    #[error("blob {hash} not found")]
    NotFound { hash: String },

    /// Disk read/write/rename/stat failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// True for the absent-blob case, as opposed to a disk failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
