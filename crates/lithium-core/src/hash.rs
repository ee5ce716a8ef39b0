//! Content hashing for file snapshots and lockfile integrity checks.

use std::fmt;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// A blake3 content hash, stored as lowercase hex in serialized form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(#[serde(with = "hex_bytes")] [u8; 32]);

impl ContentHash {
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 32], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; 32], D::Error> {
        let s = String::deserialize(d)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected 32-byte hash"))
    }
}

/// Computes content hashes for files, used by the file tracker (C11) when
/// snapshotting a directory and by the lockfile writer for integrity checks.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentHasher;

impl ContentHasher {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Hashes a file's contents, streaming it through a fixed buffer rather
    /// than reading the whole file into memory.
    ///
    /// # Errors
    /// Propagates any I/O error encountered while reading.
    pub fn hash_file(&self, path: &Path) -> crate::Result<ContentHash> {
        let mut file =
            std::fs::File::open(path).map_err(|e| crate::Error::io(path.to_path_buf(), e))?;
        let mut hasher = blake3::Hasher::new();
        let mut buf = [0u8; 64 * 1024];
        loop {
            let n = file
                .read(&mut buf)
                .map_err(|e| crate::Error::io(path.to_path_buf(), e))?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(ContentHash(*hasher.finalize().as_bytes()))
    }

    #[must_use]
    pub fn hash_bytes(&self, bytes: &[u8]) -> ContentHash {
        ContentHash::from_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_bytes_hash_equal() {
        let h1 = ContentHash::from_bytes(b"hello");
        let h2 = ContentHash::from_bytes(b"hello");
        assert_eq!(h1, h2);
    }

    #[test]
    fn different_bytes_hash_differ() {
        let h1 = ContentHash::from_bytes(b"hello");
        let h2 = ContentHash::from_bytes(b"world");
        assert_ne!(h1, h2);
    }

    #[test]
    fn hex_roundtrip_via_serde() {
        let h = ContentHash::from_bytes(b"roundtrip");
        let json = serde_json::to_string(&h).unwrap();
        let back: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(h, back);
    }

    #[test]
    fn hash_file_matches_hash_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.txt");
        std::fs::write(&path, b"some file contents").unwrap();
        let hasher = ContentHasher::new();
        let from_file = hasher.hash_file(&path).unwrap();
        let from_bytes = hasher.hash_bytes(b"some file contents");
        assert_eq!(from_file, from_bytes);
    }
}
