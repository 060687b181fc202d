//! File content hashing
//!
//! [`ContentHash`] is a BLAKE3 digest of a file's bytes, rendered as lowercase
//! hex on the wire and in logs.

use std::fmt::{self, Display, Formatter};
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

/// A 32-byte BLAKE3 content hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    #[inline]
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hash an in-memory buffer
    #[inline]
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Hash a file's contents without loading it whole
    ///
    /// # Errors
    /// Any I/O error opening or reading the file.
    pub fn of_file(path: &Path) -> std::io::Result<Self> {
        let file = File::open(path)?;
        let mut hasher = blake3::Hasher::new();
        hasher.update_reader(file)?;
        Ok(Self(*hasher.finalize().as_bytes()))
    }

    /// First 16 hex chars, for log lines
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for ContentHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for ContentHash {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl serde::Serialize for ContentHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for ContentHash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn file_hash_matches_buffer_hash() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"console.log('x');\n").unwrap();
        let from_file = ContentHash::of_file(file.path()).unwrap();
        assert_eq!(from_file, ContentHash::compute(b"console.log('x');\n"));
    }

    #[test]
    fn different_content_different_hash() {
        assert_ne!(ContentHash::compute(b"a"), ContentHash::compute(b"b"));
    }

    #[test]
    fn hex_display_parses_back() {
        let hash = ContentHash::compute(b"remedy");
        let text = hash.to_string();
        assert_eq!(text.len(), 64);
        assert!(text.starts_with(&hash.short()));
        assert_eq!(text.parse::<ContentHash>().unwrap(), hash);
        assert!("abc".parse::<ContentHash>().is_err());
    }

    #[test]
    fn serializes_as_hex_string() {
        let hash = ContentHash::compute(b"remedy");
        let json = serde_json::to_value(hash).unwrap();
        assert_eq!(json, hash.to_string().as_str());
        let back: ContentHash = serde_json::from_value(json).unwrap();
        assert_eq!(back, hash);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ContentHash::of_file(&dir.path().join("nope")).is_err());
    }
}
