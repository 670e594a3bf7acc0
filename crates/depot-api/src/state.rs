//! Shared application state.

use std::path::PathBuf;
use std::sync::Arc;

use depot_metadata::MetadataStore;
use depot_storage::BlobStore;

use crate::error::AppError;
use crate::service::ArtifactService;

/// Handler-visible state: the artifact service behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ArtifactService>,
}

impl AppState {
    pub fn new(service: ArtifactService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    /// Open the blob store and catalog under one data directory.
    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let data_dir = data_dir.into();
        let blobs = BlobStore::open(&data_dir).await?;
        let catalog = MetadataStore::open(&data_dir).await?;
        Ok(Self::new(ArtifactService::new(blobs, catalog)))
    }
}
