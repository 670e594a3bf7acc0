//! Catalog error taxonomy.

use thiserror::Error;

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The `(package, version)` pair is already taken.
    #[error("artifact {package}@{version} already exists")]
    Duplicate { package: String, version: String },

    /// No artifact row matches the `(package, version)` pair.
    #[error("artifact {package}@{version} not found")]
    ArtifactNotFound { package: String, version: String },

    /// Any other database failure.
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl MetadataError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ArtifactNotFound { .. })
    }
}
