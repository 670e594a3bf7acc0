//! Domain model and wire types.
//!
//! These structs are the registry's JSON vocabulary: the catalog rows
//! (`Package`, `Artifact`) double as response bodies, so their serde
//! field names are part of the public API and must stay stable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named namespace for artifact versions.
///
/// Created implicitly on first upload under the name; never deleted by
/// the service, so a package may outlive all of its versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub id: i64,
    pub name: String,
}

/// One uploaded version under a package.
///
/// Immutable once created; `hash` is the content address of the backing
/// blob and `size` its byte length at upload time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: i64,
    pub package_id: i64,
    /// Owning package name, denormalized for response bodies.
    pub package: String,
    pub version: String,
    pub hash: String,
    pub size: i64,
    pub uploaded_at: DateTime<Utc>,
}

/// `GET /packages/{name}` response: the package and its versions,
/// newest upload first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub versions: Vec<Artifact>,
}

/// `POST /artifacts/{package}/{version}` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub package: String,
    pub version: String,
    pub hash: String,
    pub size: i64,
    /// RFC 3339 UTC timestamp.
    pub uploaded_at: String,
}

/// `POST /gc` response: what the sweep reclaimed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct GcResult {
    pub deleted_blobs: u64,
    pub freed_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn artifact_serializes_uploaded_at_as_rfc3339() {
        let artifact = Artifact {
            id: 1,
            package_id: 2,
            package: "demo".to_string(),
            version: "1.0.0".to_string(),
            hash: "ab".repeat(32),
            size: 5,
            uploaded_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
        };
        let json = serde_json::to_value(&artifact).unwrap();
        assert_eq!(json["uploaded_at"], "2024-05-01T12:30:00Z");
        assert_eq!(json["package"], "demo");
        assert_eq!(json["package_id"], 2);
    }

    #[test]
    fn gc_result_field_names() {
        let json = serde_json::to_value(GcResult {
            deleted_blobs: 3,
            freed_bytes: 1024,
        })
        .unwrap();
        assert_eq!(json["deleted_blobs"], 3);
        assert_eq!(json["freed_bytes"], 1024);
    }

    #[test]
    fn package_info_round_trips() {
        let info = PackageInfo {
            name: "my-lib".to_string(),
            versions: vec![],
        };
        let json = serde_json::to_string(&info).unwrap();
        let back: PackageInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name, "my-lib");
        assert!(back.versions.is_empty());
    }
}
