//! Directory listing
//!
//! Builds a point-in-time snapshot of the entries directly inside the served
//! directory. Any filesystem failure aborts the whole listing.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use tokio::fs;

use super::error::{Result, StorageError};
use super::hash::{self, HashAlgorithm};
use crate::logger;

/// One entry of a directory listing
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub name: String,
    pub size: u64,
    /// Unix timestamp in seconds
    pub last_modified: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash_sum: Option<String>,
}

/// List `dir`, newest first.
///
/// `algorithm` is an algorithm name as sent by the client; an empty or
/// unsupported name lists without hashes. Entries whose names are not valid
/// UTF-8 are skipped since no request path can name them.
pub async fn list_files(dir: &Path, algorithm: &str) -> Result<Vec<FileRecord>> {
    let algorithm = HashAlgorithm::from_name(algorithm);
    let mut entries = fs::read_dir(dir).await.map_err(StorageError::ReadDir)?;
    let mut records = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(StorageError::ReadDir)? {
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                logger::log_warning(&format!("Skipping non UTF-8 entry {raw:?} in listing"));
                continue;
            }
        };
        let metadata = entry.metadata().await.map_err(|source| StorageError::Metadata {
            name: name.clone(),
            source,
        })?;
        let modified = metadata.modified().map_err(|source| StorageError::Metadata {
            name: name.clone(),
            source,
        })?;

        let hash_sum = match algorithm {
            Some(algo) if !points_to_dir(&entry.path(), &metadata).await => Some(
                hash::hash_file(&entry.path(), algo)
                    .await
                    .map_err(|source| StorageError::Hash {
                        name: name.clone(),
                        source,
                    })?,
            ),
            _ => None,
        };

        records.push(FileRecord {
            name,
            size: metadata.len(),
            last_modified: DateTime::<Utc>::from(modified).timestamp(),
            hash_sum,
        });
    }

    // Stable sort keeps enumeration order for equal timestamps
    records.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
    Ok(records)
}

/// Directories, and symlinks resolving to one, are listed without a hash.
/// A dangling link counts as a file and fails when hashed.
async fn points_to_dir(path: &Path, metadata: &std::fs::Metadata) -> bool {
    if metadata.is_symlink() {
        fs::metadata(path).await.is_ok_and(|m| m.is_dir())
    } else {
        metadata.is_dir()
    }
}

/// Serialize a listing as a JSON array followed by a newline
pub fn to_json(records: &[FileRecord]) -> serde_json::Result<Vec<u8>> {
    let mut body = serde_json::to_vec(records)?;
    body.push(b'\n');
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    fn write_file(dir: &Path, name: &str, data: &[u8], mtime_secs: u64) {
        let path = dir.join(name);
        std::fs::write(&path, data).expect("write file");
        let file = std::fs::File::options()
            .write(true)
            .open(&path)
            .expect("open file");
        file.set_modified(UNIX_EPOCH + Duration::from_secs(mtime_secs))
            .expect("set mtime");
    }

    #[tokio::test]
    async fn test_list_without_hash() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        write_file(tmp.path(), "a.txt", b"hello world", 1_700_000_000);
        write_file(tmp.path(), "b.txt", b"hello", 1_700_000_100);

        let records = list_files(tmp.path(), "").await.expect("list");
        assert_eq!(
            records,
            vec![
                FileRecord {
                    name: "b.txt".to_string(),
                    size: 5,
                    last_modified: 1_700_000_100,
                    hash_sum: None,
                },
                FileRecord {
                    name: "a.txt".to_string(),
                    size: 11,
                    last_modified: 1_700_000_000,
                    hash_sum: None,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_list_with_md5() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        write_file(tmp.path(), "a.txt", b"hello", 1_700_000_000);
        write_file(tmp.path(), "b.txt", b"", 1_700_000_050);

        let records = list_files(tmp.path(), "MD5").await.expect("list");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "b.txt");
        assert_eq!(
            records[0].hash_sum.as_deref(),
            Some("d41d8cd98f00b204e9800998ecf8427e")
        );
        assert_eq!(records[1].name, "a.txt");
        assert_eq!(
            records[1].hash_sum.as_deref(),
            Some("5d41402abc4b2a76b9719d911017c592")
        );
    }

    #[tokio::test]
    async fn test_unsupported_algorithm_omits_hash() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        write_file(tmp.path(), "a.txt", b"hello", 1_700_000_000);

        let records = list_files(tmp.path(), "crc32").await.expect("list");
        assert!(records.iter().all(|r| r.hash_sum.is_none()));
    }

    #[tokio::test]
    async fn test_sorted_newest_first() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock after epoch")
            .as_secs();
        for (i, offset) in [30u64, 5, 600, 0, 45, 5].iter().enumerate() {
            write_file(tmp.path(), &format!("f{i}.bin"), b"x", now - offset);
        }

        let records = list_files(tmp.path(), "sha1").await.expect("list");
        assert_eq!(records.len(), 6);
        assert!(records
            .windows(2)
            .all(|w| w[0].last_modified >= w[1].last_modified));
    }

    #[tokio::test]
    async fn test_empty_directory() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let records = list_files(tmp.path(), "sha256").await.expect("list");
        assert!(records.is_empty());
        assert_eq!(to_json(&records).expect("json"), b"[]\n");
    }

    #[tokio::test]
    async fn test_subdirectory_listed_without_hash() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir(tmp.path().join("nested")).expect("mkdir");

        let records = list_files(tmp.path(), "md5").await.expect("list");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "nested");
        assert!(records[0].hash_sum.is_none());
    }

    #[tokio::test]
    async fn test_missing_directory_fails() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let err = list_files(&tmp.path().join("nope"), "").await.unwrap_err();
        assert!(matches!(err, StorageError::ReadDir(_)));
    }

    #[test]
    fn test_json_field_names() {
        let records = vec![
            FileRecord {
                name: "a.txt".to_string(),
                size: 5,
                last_modified: 1_700_000_000,
                hash_sum: Some("abc".to_string()),
            },
            FileRecord {
                name: "b.txt".to_string(),
                size: 0,
                last_modified: 1_600_000_000,
                hash_sum: None,
            },
        ];
        let body = String::from_utf8(to_json(&records).expect("json")).expect("utf-8");
        assert_eq!(
            body,
            "[{\"name\":\"a.txt\",\"size\":5,\"lastModified\":1700000000,\"hashSum\":\"abc\"},\
             {\"name\":\"b.txt\",\"size\":0,\"lastModified\":1600000000}]\n"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinked_directory_listed_without_hash() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let real = tmp.path().join("real");
        std::fs::create_dir(&real).expect("mkdir");
        std::os::unix::fs::symlink(&real, tmp.path().join("link")).expect("symlink");
        write_file(tmp.path(), "a.txt", b"hello", 1_700_000_000);

        let records = list_files(tmp.path(), "md5").await.expect("list");
        assert_eq!(records.len(), 3);
        for record in &records {
            match record.name.as_str() {
                "a.txt" => assert!(record.hash_sum.is_some()),
                _ => assert!(record.hash_sum.is_none(), "{} must not be hashed", record.name),
            }
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_hash_failure_aborts_listing() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        write_file(tmp.path(), "a.txt", b"hello", 1_700_000_000);
        write_file(tmp.path(), "b.txt", b"world", 1_700_000_100);
        std::os::unix::fs::symlink(tmp.path().join("gone"), tmp.path().join("dangling"))
            .expect("symlink");

        let err = list_files(tmp.path(), "sha256").await.unwrap_err();
        assert!(matches!(err, StorageError::Hash { ref name, .. } if name == "dangling"));
        assert_eq!(err.status(), hyper::StatusCode::INTERNAL_SERVER_ERROR);

        // Without hashing the same directory lists fine
        let records = list_files(tmp.path(), "").await.expect("list");
        assert_eq!(records.len(), 3);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_non_utf8_name_skipped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let tmp = tempfile::tempdir().expect("create temp dir");
        write_file(tmp.path(), "a.txt", b"hello", 1_700_000_000);
        let raw = OsStr::from_bytes(b"bad\xff.bin");
        std::fs::write(tmp.path().join(raw), b"x").expect("write file");

        let records = list_files(tmp.path(), "md5").await.expect("list");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "a.txt");
    }
}
