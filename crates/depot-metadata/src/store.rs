//! SQLite-backed catalog implementation.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use depot_core::{Artifact, Package};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use tracing::debug;

use crate::error::MetadataError;

const DB_FILE: &str = "registry.db";

/// Catalog of packages and artifact versions.
///
/// Cheap to clone (wraps a connection pool). All operations are safe for
/// concurrent use; WAL mode plus a 5-second busy timeout keeps writers
/// from failing under contention.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct PackageRow {
    id: i64,
    name: String,
}

#[derive(sqlx::FromRow)]
struct ArtifactRow {
    id: i64,
    package_id: i64,
    package: String,
    version: String,
    hash: String,
    size: i64,
    uploaded_at: DateTime<Utc>,
}

impl From<PackageRow> for Package {
    fn from(row: PackageRow) -> Self {
        Package {
            id: row.id,
            name: row.name,
        }
    }
}

impl From<ArtifactRow> for Artifact {
    fn from(row: ArtifactRow) -> Self {
        Artifact {
            id: row.id,
            package_id: row.package_id,
            package: row.package,
            version: row.version,
            hash: row.hash,
            size: row.size,
            uploaded_at: row.uploaded_at,
        }
    }
}

impl MetadataStore {
    /// Open (or create) `registry.db` under `data_dir` and run migrations.
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self, MetadataError> {
        let data_dir = data_dir.as_ref();
        tokio::fs::create_dir_all(data_dir)
            .await
            .map_err(sqlx::Error::Io)?;

        let options = SqliteConnectOptions::new()
            .filename(data_dir.join(DB_FILE))
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true)
            // SQLite's LIKE is case-insensitive for ASCII by default;
            // package search is specified as case-sensitive.
            .pragma("case_sensitive_like", "ON");

        Self::connect(options, 5).await
    }

    /// Open an in-memory catalog. Test-oriented; a single connection is
    /// mandatory because every in-memory connection is its own database.
    pub async fn open_in_memory() -> Result<Self, MetadataError> {
        let options = SqliteConnectOptions::new()
            .filename(":memory:")
            .foreign_keys(true)
            .pragma("case_sensitive_like", "ON");
        Self::connect(options, 1).await
    }

    async fn connect(
        options: SqliteConnectOptions,
        max_connections: u32,
    ) -> Result<Self, MetadataError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), MetadataError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS packages (
                 id   INTEGER PRIMARY KEY AUTOINCREMENT,
                 name TEXT UNIQUE NOT NULL
             )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS artifacts (
                 id          INTEGER PRIMARY KEY AUTOINCREMENT,
                 package_id  INTEGER NOT NULL,
                 version     TEXT NOT NULL,
                 hash        TEXT NOT NULL,
                 size        INTEGER NOT NULL,
                 uploaded_at TEXT NOT NULL,
                 UNIQUE (package_id, version),
                 FOREIGN KEY (package_id) REFERENCES packages(id)
             )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_artifacts_hash ON artifacts(hash)")
            .execute(&self.pool)
            .await?;

        debug!("catalog migrations applied");
        Ok(())
    }

    /// Insert a package if absent and return its id. Idempotent.
    pub async fn create_package(&self, name: &str) -> Result<i64, MetadataError> {
        sqlx::query("INSERT OR IGNORE INTO packages (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await?;

        let id: i64 = sqlx::query_scalar("SELECT id FROM packages WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(id)
    }

    pub async fn get_package(&self, name: &str) -> Result<Option<Package>, MetadataError> {
        let row = sqlx::query_as::<_, PackageRow>("SELECT id, name FROM packages WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Package::from))
    }

    /// All packages, name ascending.
    pub async fn list_packages(&self) -> Result<Vec<Package>, MetadataError> {
        let rows =
            sqlx::query_as::<_, PackageRow>("SELECT id, name FROM packages ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(Package::from).collect())
    }

    /// Packages whose name contains `query` (case-sensitive), name ascending.
    pub async fn search_packages(&self, query: &str) -> Result<Vec<Package>, MetadataError> {
        let rows = sqlx::query_as::<_, PackageRow>(
            "SELECT id, name FROM packages WHERE name LIKE ? ORDER BY name",
        )
        .bind(format!("%{query}%"))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Package::from).collect())
    }

    /// Insert an artifact row stamped with the current UTC time.
    ///
    /// A `(package_id, version)` uniqueness violation maps to
    /// [`MetadataError::Duplicate`]; the row is the authority on version
    /// collisions, including ones racing in from other processes.
    pub async fn create_artifact(
        &self,
        package_id: i64,
        package: &str,
        version: &str,
        hash: &str,
        size: i64,
    ) -> Result<Artifact, MetadataError> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO artifacts (package_id, version, hash, size, uploaded_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(package_id)
        .bind(version)
        .bind(hash)
        .bind(size)
        .bind(now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(Artifact {
                id: done.last_insert_rowid(),
                package_id,
                package: package.to_string(),
                version: version.to_string(),
                hash: hash.to_string(),
                size,
                uploaded_at: now,
            }),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(MetadataError::Duplicate {
                    package: package.to_string(),
                    version: version.to_string(),
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn get_artifact(
        &self,
        package: &str,
        version: &str,
    ) -> Result<Option<Artifact>, MetadataError> {
        let row = sqlx::query_as::<_, ArtifactRow>(
            "SELECT a.id, a.package_id, p.name AS package, a.version, a.hash, a.size, a.uploaded_at
             FROM artifacts a JOIN packages p ON a.package_id = p.id
             WHERE p.name = ? AND a.version = ?",
        )
        .bind(package)
        .bind(version)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Artifact::from))
    }

    /// All versions of a package, newest upload first (ties broken by id,
    /// newest insert first).
    pub async fn list_artifacts(&self, package: &str) -> Result<Vec<Artifact>, MetadataError> {
        let rows = sqlx::query_as::<_, ArtifactRow>(
            "SELECT a.id, a.package_id, p.name AS package, a.version, a.hash, a.size, a.uploaded_at
             FROM artifacts a JOIN packages p ON a.package_id = p.id
             WHERE p.name = ?
             ORDER BY a.uploaded_at DESC, a.id DESC",
        )
        .bind(package)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Artifact::from).collect())
    }

    /// Delete exactly one artifact row.
    pub async fn delete_artifact(
        &self,
        package: &str,
        version: &str,
    ) -> Result<(), MetadataError> {
        let done = sqlx::query(
            "DELETE FROM artifacts
             WHERE package_id = (SELECT id FROM packages WHERE name = ?) AND version = ?",
        )
        .bind(package)
        .bind(version)
        .execute(&self.pool)
        .await?;

        if done.rows_affected() == 0 {
            return Err(MetadataError::ArtifactNotFound {
                package: package.to_string(),
                version: version.to_string(),
            });
        }
        Ok(())
    }

    /// Distinct blob hashes referenced by any artifact.
    pub async fn referenced_hashes(&self) -> Result<HashSet<String>, MetadataError> {
        let hashes: Vec<String> = sqlx::query_scalar("SELECT DISTINCT hash FROM artifacts")
            .fetch_all(&self.pool)
            .await?;
        Ok(hashes.into_iter().collect())
    }

    /// Issue a trivial query; used by the readiness probe.
    pub async fn ping(&self) -> Result<(), MetadataError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> MetadataStore {
        MetadataStore::open_in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn create_package_is_idempotent() {
        let store = store().await;
        let first = store.create_package("demo").await.unwrap();
        let second = store.create_package("demo").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn get_package_absent_is_none() {
        let store = store().await;
        assert!(store.get_package("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_packages_orders_by_name() {
        let store = store().await;
        for name in ["zeta", "alpha", "mid"] {
            store.create_package(name).await.unwrap();
        }
        let names: Vec<_> = store
            .list_packages()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, ["alpha", "mid", "zeta"]);
    }

    #[tokio::test]
    async fn search_matches_substring_case_sensitively() {
        let store = store().await;
        for name in ["my-app", "my-lib", "other"] {
            store.create_package(name).await.unwrap();
        }

        let names: Vec<_> = store
            .search_packages("my")
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, ["my-app", "my-lib"]);

        assert!(store.search_packages("My").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_and_get_artifact_round_trip() {
        let store = store().await;
        let pkg_id = store.create_package("demo").await.unwrap();
        let created = store
            .create_artifact(pkg_id, "demo", "1.0.0", &"ab".repeat(32), 5)
            .await
            .unwrap();

        let fetched = store
            .get_artifact("demo", "1.0.0")
            .await
            .unwrap()
            .expect("artifact exists");
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.package, "demo");
        assert_eq!(fetched.package_id, pkg_id);
        assert_eq!(fetched.hash, "ab".repeat(32));
        assert_eq!(fetched.size, 5);
        assert_eq!(fetched.uploaded_at, created.uploaded_at);
    }

    #[tokio::test]
    async fn duplicate_version_is_rejected() {
        let store = store().await;
        let pkg_id = store.create_package("demo").await.unwrap();
        store
            .create_artifact(pkg_id, "demo", "1.0.0", "aa", 1)
            .await
            .unwrap();

        let err = store
            .create_artifact(pkg_id, "demo", "1.0.0", "bb", 2)
            .await
            .unwrap_err();
        assert!(err.is_duplicate());
        assert!(err.to_string().contains("demo@1.0.0"));
    }

    #[tokio::test]
    async fn same_version_under_different_packages_is_fine() {
        let store = store().await;
        let a = store.create_package("a").await.unwrap();
        let b = store.create_package("b").await.unwrap();
        store.create_artifact(a, "a", "1.0.0", "aa", 1).await.unwrap();
        store.create_artifact(b, "b", "1.0.0", "aa", 1).await.unwrap();
    }

    #[tokio::test]
    async fn list_artifacts_newest_first() {
        let store = store().await;
        let pkg_id = store.create_package("demo").await.unwrap();
        store
            .create_artifact(pkg_id, "demo", "1.0.0", "aa", 1)
            .await
            .unwrap();
        store
            .create_artifact(pkg_id, "demo", "1.1.0", "bb", 2)
            .await
            .unwrap();

        let versions: Vec<_> = store
            .list_artifacts("demo")
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.version)
            .collect();
        // Same-instant uploads fall back to insertion order, newest first.
        assert_eq!(versions, ["1.1.0", "1.0.0"]);
    }

    #[tokio::test]
    async fn delete_artifact_removes_exactly_one_row() {
        let store = store().await;
        let pkg_id = store.create_package("demo").await.unwrap();
        store
            .create_artifact(pkg_id, "demo", "1.0.0", "aa", 1)
            .await
            .unwrap();

        store.delete_artifact("demo", "1.0.0").await.unwrap();
        assert!(store.get_artifact("demo", "1.0.0").await.unwrap().is_none());

        let err = store.delete_artifact("demo", "1.0.0").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("demo@1.0.0"));
    }

    #[tokio::test]
    async fn referenced_hashes_deduplicates() {
        let store = store().await;
        let pkg_id = store.create_package("demo").await.unwrap();
        store
            .create_artifact(pkg_id, "demo", "1.0.0", "aa", 1)
            .await
            .unwrap();
        store
            .create_artifact(pkg_id, "demo", "1.1.0", "aa", 1)
            .await
            .unwrap();
        store
            .create_artifact(pkg_id, "demo", "2.0.0", "bb", 2)
            .await
            .unwrap();

        let refs = store.referenced_hashes().await.unwrap();
        assert_eq!(refs.len(), 2);
        assert!(refs.contains("aa") && refs.contains("bb"));
    }

    #[tokio::test]
    async fn close_drains_the_pool() {
        let store = store().await;
        store.create_package("demo").await.unwrap();
        store.close().await;
        assert!(store.ping().await.is_err());
    }

    #[tokio::test]
    async fn package_outlives_its_last_version() {
        let store = store().await;
        let pkg_id = store.create_package("demo").await.unwrap();
        store
            .create_artifact(pkg_id, "demo", "1.0.0", "aa", 1)
            .await
            .unwrap();
        store.delete_artifact("demo", "1.0.0").await.unwrap();

        assert!(store.get_package("demo").await.unwrap().is_some());
        assert!(store.list_artifacts("demo").await.unwrap().is_empty());
    }
}
