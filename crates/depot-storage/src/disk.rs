//! On-disk content-addressed blob store.

use std::io;
use std::path::{Path, PathBuf};

use depot_core::{blob_prefix, is_hex_digest};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::warn;
use uuid::Uuid;

use crate::error::StorageError;
use crate::hashing::HashingWriter;

const BLOBS_DIR: &str = "blobs";
const TMP_DIR: &str = "tmp";

/// Content-addressed blob store rooted at a data directory.
///
/// Cheap to clone; all state lives on disk. Safe for concurrent use: the
/// commit rename is atomic, and losing a rename race against an identical
/// blob collapses into a deduplication hit.
#[derive(Debug, Clone)]
pub struct BlobStore {
    data_dir: PathBuf,
}

impl BlobStore {
    /// Create a store rooted at `data_dir`, creating `blobs/` if needed.
    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(data_dir.join(BLOBS_DIR)).await?;
        Ok(Self { data_dir })
    }

    /// Stream `reader` to disk, returning the content hash and byte count.
    ///
    /// Bytes land in a uniquely named temp file while being hashed, then
    /// the temp file is renamed to `blobs/<xx>/<hash>`. If that path is
    /// already occupied (an earlier upload, or a concurrent one that won
    /// the rename), the temp file is discarded and the existing blob is
    /// the result. On any failure the temp file is removed; no partial
    /// blob is ever visible under a content-addressed name.
    pub async fn store<R>(&self, reader: R) -> Result<(String, u64), StorageError>
    where
        R: AsyncRead + Unpin,
    {
        let tmp_dir = self.data_dir.join(TMP_DIR);
        fs::create_dir_all(&tmp_dir).await?;
        let tmp_path = tmp_dir.join(format!("upload-{}", Uuid::new_v4().simple()));

        match self.ingest(reader, &tmp_path).await {
            Ok(committed) => Ok(committed),
            Err(err) => {
                discard_temp(&tmp_path).await;
                Err(err)
            }
        }
    }

    async fn ingest<R>(&self, mut reader: R, tmp_path: &Path) -> Result<(String, u64), StorageError>
    where
        R: AsyncRead + Unpin,
    {
        let file = fs::File::create(tmp_path).await?;
        let mut writer = HashingWriter::new(file);
        tokio::io::copy(&mut reader, &mut writer).await?;
        writer.shutdown().await?;
        let (hash, size) = writer.finalize();

        let shard = self.data_dir.join(BLOBS_DIR).join(blob_prefix(&hash));
        fs::create_dir_all(&shard).await?;
        let final_path = shard.join(&hash);

        // Deduplication hit: identical content is already committed.
        match fs::metadata(&final_path).await {
            Ok(_) => {
                discard_temp(tmp_path).await;
                return Ok((hash, size));
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }

        if let Err(rename_err) = fs::rename(tmp_path, &final_path).await {
            // A concurrent ingest of the same content may have won the
            // race; if the final path exists now, this copy is redundant.
            if fs::metadata(&final_path).await.is_ok() {
                discard_temp(tmp_path).await;
                return Ok((hash, size));
            }
            return Err(rename_err.into());
        }

        Ok((hash, size))
    }

    /// Open a committed blob for reading.
    pub async fn open_blob(&self, hash: &str) -> Result<fs::File, StorageError> {
        match fs::File::open(self.blob_path(hash)).await {
            Ok(file) => Ok(file),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Err(StorageError::NotFound {
                hash: hash.to_string(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    /// True if a blob is committed under this hash. No content check.
    pub async fn exists(&self, hash: &str) -> bool {
        fs::metadata(self.blob_path(hash)).await.is_ok()
    }

    /// Remove a blob. Absence is not an error.
    pub async fn delete(&self, hash: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.blob_path(hash)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// The on-disk path for a hash. Pure; does not touch the filesystem.
    pub fn blob_path(&self, hash: &str) -> PathBuf {
        self.data_dir
            .join(BLOBS_DIR)
            .join(blob_prefix(hash))
            .join(hash)
    }

    /// Enumerate all committed blob hashes.
    ///
    /// Only entries shaped like a committed blob are reported: a
    /// two-character shard directory containing a file whose name is a
    /// 64-char lowercase hex digest starting with the shard prefix.
    /// Best-effort snapshot; a rename landing mid-scan may or may not be
    /// included.
    pub async fn list_blobs(&self) -> Result<Vec<String>, StorageError> {
        let blob_root = self.data_dir.join(BLOBS_DIR);
        let mut hashes = Vec::new();

        let mut shards = match fs::read_dir(&blob_root).await {
            Ok(rd) => rd,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(hashes),
            Err(err) => return Err(err.into()),
        };

        while let Some(shard) = shards.next_entry().await? {
            let shard_name = shard.file_name();
            let Some(prefix) = shard_name.to_str() else {
                continue;
            };
            if prefix.len() != 2 || !shard.file_type().await?.is_dir() {
                continue;
            }

            let mut entries = fs::read_dir(shard.path()).await?;
            while let Some(entry) = entries.next_entry().await? {
                let file_name = entry.file_name();
                let Some(name) = file_name.to_str() else {
                    continue;
                };
                if entry.file_type().await?.is_dir() {
                    continue;
                }
                if is_hex_digest(name) && name.starts_with(prefix) {
                    hashes.push(name.to_string());
                }
            }
        }

        Ok(hashes)
    }
}

async fn discard_temp(path: &Path) {
    if let Err(err) = fs::remove_file(path).await {
        if err.kind() != io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %err, "failed to remove temp upload file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tempfile::TempDir;
    use tokio::io::ReadBuf;

    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    async fn store_in(dir: &TempDir) -> BlobStore {
        BlobStore::open(dir.path()).await.unwrap()
    }

    /// Yields some bytes, then fails. Exercises the ingest cleanup path.
    struct FailingReader {
        chunk: &'static [u8],
        sent: bool,
    }

    impl AsyncRead for FailingReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if !self.sent {
                buf.put_slice(self.chunk);
                self.sent = true;
                Poll::Ready(Ok(()))
            } else {
                Poll::Ready(Err(io::Error::other("source went away")))
            }
        }
    }

    #[tokio::test]
    async fn store_names_blob_by_content_hash() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;

        let (hash, size) = store.store(&b"hello"[..]).await.unwrap();
        assert_eq!(hash, HELLO_SHA256);
        assert_eq!(size, 5);
        assert!(store.exists(&hash).await);
        assert_eq!(
            tokio::fs::read(store.blob_path(&hash)).await.unwrap(),
            b"hello"
        );
    }

    #[tokio::test]
    async fn empty_stream_stores_empty_blob() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;

        let (hash, size) = store.store(&b""[..]).await.unwrap();
        assert_eq!(hash, EMPTY_SHA256);
        assert_eq!(size, 0);
        assert!(store.exists(&hash).await);
    }

    #[tokio::test]
    async fn storing_same_content_twice_keeps_one_file() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;

        let (first, _) = store.store(&b"dup"[..]).await.unwrap();
        let (second, _) = store.store(&b"dup"[..]).await.unwrap();
        assert_eq!(first, second);

        assert_eq!(store.list_blobs().await.unwrap(), vec![first]);

        // Neither pass left a temp file behind.
        let mut tmp = fs::read_dir(dir.path().join(TMP_DIR)).await.unwrap();
        assert!(tmp.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_ingest_leaves_no_residue() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;

        let reader = FailingReader {
            chunk: b"partial",
            sent: false,
        };
        let err = store.store(reader).await.unwrap_err();
        assert!(!err.is_not_found());

        assert!(store.list_blobs().await.unwrap().is_empty());
        let mut tmp = fs::read_dir(dir.path().join(TMP_DIR)).await.unwrap();
        assert!(tmp.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn open_missing_blob_reports_not_found() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;

        let err = store.open_blob(EMPTY_SHA256).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;

        let (hash, _) = store.store(&b"gone"[..]).await.unwrap();
        store.delete(&hash).await.unwrap();
        assert!(!store.exists(&hash).await);
        store.delete(&hash).await.unwrap();
    }

    #[tokio::test]
    async fn list_blobs_skips_foreign_entries() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;
        let (hash, _) = store.store(&b"real"[..]).await.unwrap();

        let blob_root = dir.path().join(BLOBS_DIR);
        // Not a 2-char shard.
        fs::create_dir_all(blob_root.join("abc")).await.unwrap();
        fs::write(blob_root.join("abc").join(&hash), b"x")
            .await
            .unwrap();
        // Shard with a non-digest file name.
        fs::create_dir_all(blob_root.join("aa")).await.unwrap();
        fs::write(blob_root.join("aa").join("README"), b"x")
            .await
            .unwrap();
        // Digest-shaped name under the wrong shard.
        fs::write(blob_root.join("aa").join(EMPTY_SHA256), b"x")
            .await
            .unwrap();
        // Uppercase digest of the right length.
        fs::write(blob_root.join("aa").join(EMPTY_SHA256.to_uppercase()), b"x")
            .await
            .unwrap();

        assert_eq!(store.list_blobs().await.unwrap(), vec![hash]);
    }

    #[tokio::test]
    async fn list_blobs_on_fresh_store_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;
        assert!(store.list_blobs().await.unwrap().is_empty());
    }
}
