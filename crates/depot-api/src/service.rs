//! Artifact service: the orchestrator over the upload gate, the catalog,
//! and the blob store.
//!
//! Consistency rules live here. Upload commits blob bytes before the
//! catalog row, so the only partial-failure residue is an unreferenced
//! blob — reclaimable by [`ArtifactService::garbage_collect`]. A catalog
//! row whose blob has gone missing is detected at download time and
//! reported as absence, not a server fault.

use chrono::SecondsFormat;
use depot_core::{Artifact, GcResult, Package, PackageInfo, UploadResponse};
use depot_metadata::MetadataStore;
use depot_storage::BlobStore;
use tokio::io::AsyncRead;
use tracing::{info, warn};

use crate::error::AppError;
use crate::gate::UploadGate;

pub struct ArtifactService {
    blobs: BlobStore,
    catalog: MetadataStore,
    gate: UploadGate,
}

impl ArtifactService {
    pub fn new(blobs: BlobStore, catalog: MetadataStore) -> Self {
        Self {
            blobs,
            catalog,
            gate: UploadGate::new(),
        }
    }

    /// Ingest one artifact version.
    ///
    /// Holds the per-key gate for the whole operation, so concurrent
    /// uploads of the same `(package, version)` resolve to exactly one
    /// success and deterministic conflicts for the rest.
    pub async fn upload<R>(
        &self,
        package: &str,
        version: &str,
        body: R,
    ) -> Result<UploadResponse, AppError>
    where
        R: AsyncRead + Unpin,
    {
        if package.is_empty() || version.is_empty() {
            return Err(AppError::BadRequest(
                "package and version are required".to_string(),
            ));
        }

        let _permit = self.gate.acquire(package, version).await;

        if self.catalog.get_artifact(package, version).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "artifact {package}@{version} already exists"
            )));
        }

        // Ingest is atomic: on failure nothing is visible, so there is
        // no partially stored blob to clean up here.
        let (hash, size) = self.blobs.store(body).await?;
        info!(package, version, hash = %hash, size, "blob stored");

        let package_id = self.catalog.create_package(package).await?;

        // A duplicate at this point means another process won the race
        // despite the in-process gate. The stored blob is left in place:
        // the winner may reference the same content, and unreferenced
        // residue belongs to the garbage collector.
        let artifact = self
            .catalog
            .create_artifact(package_id, package, version, &hash, size as i64)
            .await?;

        info!(
            package,
            version,
            hash = %artifact.hash,
            size = artifact.size,
            "artifact upload completed"
        );

        Ok(UploadResponse {
            package: package.to_string(),
            version: version.to_string(),
            hash: artifact.hash,
            size: artifact.size,
            uploaded_at: artifact
                .uploaded_at
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        })
    }

    /// Look up an artifact and open its blob for streaming.
    ///
    /// A catalog row without its blob file is an invariant violation, but
    /// a survivable one: it is reported as absence with an explanatory
    /// message rather than a server fault.
    pub async fn download(
        &self,
        package: &str,
        version: &str,
    ) -> Result<(Artifact, tokio::fs::File), AppError> {
        let artifact = self
            .catalog
            .get_artifact(package, version)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("artifact {package}@{version} not found"))
            })?;

        let file = match self.blobs.open_blob(&artifact.hash).await {
            Ok(file) => file,
            Err(err) if err.is_not_found() => {
                warn!(package, version, hash = %artifact.hash, "artifact blob missing on disk");
                return Err(AppError::NotFound(
                    "artifact blob missing on disk".to_string(),
                ));
            }
            Err(err) => return Err(err.into()),
        };

        Ok((artifact, file))
    }

    /// All packages, or those whose name contains `search`.
    pub async fn list_packages(&self, search: Option<&str>) -> Result<Vec<Package>, AppError> {
        let packages = match search {
            Some(query) if !query.is_empty() => self.catalog.search_packages(query).await?,
            _ => self.catalog.list_packages().await?,
        };
        Ok(packages)
    }

    /// A package and its versions, newest upload first.
    pub async fn package_info(&self, package: &str) -> Result<PackageInfo, AppError> {
        let found = self
            .catalog
            .get_package(package)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("package {package} not found")))?;
        let versions = self.catalog.list_artifacts(&found.name).await?;
        Ok(PackageInfo {
            name: found.name,
            versions,
        })
    }

    /// Remove the catalog row for one version.
    ///
    /// The blob stays on disk — another version may share the content —
    /// and is reclaimed by the next garbage collection if nothing else
    /// references it.
    pub async fn delete(&self, package: &str, version: &str) -> Result<(), AppError> {
        self.catalog.delete_artifact(package, version).await?;
        info!(package, version, "artifact deleted");
        Ok(())
    }

    /// Sweep blobs no artifact references.
    ///
    /// The disk is scanned *before* the reference snapshot: a blob
    /// committed after the scan is never a candidate, so an upload racing
    /// the sweep cannot lose bytes it has already durably written before
    /// its catalog row lands. Per-blob failures are logged and skipped;
    /// the sweep never aborts.
    pub async fn garbage_collect(&self) -> Result<GcResult, AppError> {
        let on_disk = self.blobs.list_blobs().await?;
        let referenced = self.catalog.referenced_hashes().await?;

        let mut result = GcResult::default();
        for hash in on_disk {
            if referenced.contains(&hash) {
                continue;
            }

            let size = match tokio::fs::metadata(self.blobs.blob_path(&hash)).await {
                Ok(meta) => meta.len(),
                Err(_) => 0,
            };

            if let Err(err) = self.blobs.delete(&hash).await {
                warn!(hash = %hash, error = %err, "failed to delete unreferenced blob");
                continue;
            }

            result.deleted_blobs += 1;
            result.freed_bytes += size;
            info!(hash = %hash, size, "garbage collected blob");
        }

        Ok(result)
    }

    /// Readiness: the catalog answers a trivial query.
    pub async fn ready(&self) -> Result<(), AppError> {
        self.catalog.ping().await?;
        Ok(())
    }
}
