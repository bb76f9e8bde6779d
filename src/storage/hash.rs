//! Content hashing
//!
//! Maps an algorithm name to a streaming digest. Unknown names select no
//! algorithm, which callers treat as "do not hash".

use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::io;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

const READ_BUF_SIZE: usize = 64 * 1024;

/// Supported digest algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha256,
}

impl HashAlgorithm {
    pub const ALL: [Self; 3] = [Self::Md5, Self::Sha1, Self::Sha256];

    /// Look up an algorithm by case-insensitive name
    ///
    /// # Examples
    /// ```ignore
    /// assert_eq!(HashAlgorithm::from_name("SHA256"), Some(HashAlgorithm::Sha256));
    /// assert_eq!(HashAlgorithm::from_name("crc32"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|algo| algo.name().eq_ignore_ascii_case(name))
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
        }
    }

    /// Fresh accumulator for this algorithm
    pub fn digester(self) -> Digester {
        match self {
            Self::Md5 => Digester::Md5(Md5::new()),
            Self::Sha1 => Digester::Sha1(Sha1::new()),
            Self::Sha256 => Digester::Sha256(Sha256::new()),
        }
    }
}

/// Incremental digest accumulator
#[derive(Clone)]
pub enum Digester {
    Md5(Md5),
    Sha1(Sha1),
    Sha256(Sha256),
}

impl Digester {
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Self::Md5(h) => h.update(data),
            Self::Sha1(h) => h.update(data),
            Self::Sha256(h) => h.update(data),
        }
    }

    /// Consume the accumulator, returning the lowercase hex digest
    pub fn finalize_hex(self) -> String {
        match self {
            Self::Md5(h) => format!("{:x}", h.finalize()),
            Self::Sha1(h) => format!("{:x}", h.finalize()),
            Self::Sha256(h) => format!("{:x}", h.finalize()),
        }
    }
}

/// Stream a file through the digest and return its hex fingerprint
pub async fn hash_file(path: &Path, algorithm: HashAlgorithm) -> io::Result<String> {
    let mut file = File::open(path).await?;
    let mut digester = algorithm.digester();
    let mut buf = vec![0u8; READ_BUF_SIZE];

    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        digester.update(&buf[..n]);
    }

    Ok(digester.finalize_hex())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest_of(name: &str, data: &[u8]) -> String {
        let mut digester = HashAlgorithm::from_name(name)
            .expect("supported algorithm")
            .digester();
        digester.update(data);
        digester.finalize_hex()
    }

    #[test]
    fn test_known_digests() {
        assert_eq!(digest_of("md5", b"hello"), "5d41402abc4b2a76b9719d911017c592");
        assert_eq!(
            digest_of("sha1", b"hello"),
            "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d"
        );
        assert_eq!(
            digest_of("sha256", b"hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(digest_of("md5", b""), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn test_name_is_case_insensitive() {
        assert_eq!(HashAlgorithm::from_name("MD5"), Some(HashAlgorithm::Md5));
        assert_eq!(HashAlgorithm::from_name("Sha1"), Some(HashAlgorithm::Sha1));
        assert_eq!(HashAlgorithm::from_name("SHA256"), Some(HashAlgorithm::Sha256));
        assert_eq!(digest_of("SHA256", b"abc"), digest_of("sha256", b"abc"));
    }

    #[test]
    fn test_unknown_names_select_nothing() {
        for name in ["", "crc32", "sha512", "md 5", "sha-256"] {
            assert!(
                HashAlgorithm::from_name(name).is_none(),
                "{name} should not select a digest"
            );
        }
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        let mut digester = HashAlgorithm::Sha1.digester();
        digester.update(b"hel");
        digester.update(b"lo");
        assert_eq!(digester.finalize_hex(), digest_of("sha1", b"hello"));
    }

    #[tokio::test]
    async fn test_hash_file_is_deterministic() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let path = tmp.path().join("blob.bin");
        // Larger than one read buffer
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &data).expect("write file");

        for algo in HashAlgorithm::ALL {
            let first = hash_file(&path, algo).await.expect("hash file");
            let second = hash_file(&path, algo).await.expect("hash file");
            assert_eq!(first, second);
            assert_eq!(first, digest_of(algo.name(), &data));
        }
    }

    #[tokio::test]
    async fn test_hash_missing_file_fails() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let result = hash_file(&tmp.path().join("missing"), HashAlgorithm::Md5).await;
        assert!(result.is_err());
    }
}
