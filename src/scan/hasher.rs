use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Read size used when no chunk size is configured.
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Hex length of a digest. Both supported algorithms produce 32 bytes.
pub const FINGERPRINT_HEX_LEN: usize = 64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// SHA-256, the digest earlier baselines were written with.
    #[default]
    Sha256,
    /// BLAKE3. Faster, but baselines are not interchangeable with SHA-256 ones.
    Blake3,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Sha256 => f.write_str("sha256"),
            Algorithm::Blake3 => f.write_str("blake3"),
        }
    }
}

/// Lowercase hex digest of a file's content.
///
/// Only constructible from a well-formed hex string, so every value held in a
/// baseline record is known to be valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = InvalidFingerprint;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        if value.len() != FINGERPRINT_HEX_LEN || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(InvalidFingerprint(value));
        }
        Ok(Self(value.to_ascii_lowercase()))
    }
}

impl std::str::FromStr for Fingerprint {
    type Err = InvalidFingerprint;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::try_from(s.to_string())
    }
}

impl From<Fingerprint> for String {
    fn from(fp: Fingerprint) -> Self {
        fp.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidFingerprint(String);

impl fmt::Display for InvalidFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid fingerprint {:?}: expected {FINGERPRINT_HEX_LEN} hex characters",
            self.0
        )
    }
}

impl std::error::Error for InvalidFingerprint {}

enum Accumulator {
    Sha256(Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl Accumulator {
    fn new(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Sha256 => Accumulator::Sha256(Sha256::new()),
            Algorithm::Blake3 => Accumulator::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Accumulator::Sha256(h) => h.update(data),
            Accumulator::Blake3(h) => {
                h.update(data);
            }
        }
    }

    fn finalize(self) -> Fingerprint {
        let hex = match self {
            Accumulator::Sha256(h) => format!("{:x}", h.finalize()),
            Accumulator::Blake3(h) => h.finalize().to_hex().to_string(),
        };
        Fingerprint(hex)
    }
}

/// Streams files through the configured digest in fixed-size reads.
#[derive(Debug, Clone, Copy)]
pub struct FileHasher {
    algorithm: Algorithm,
    chunk_size: usize,
}

impl Default for FileHasher {
    fn default() -> Self {
        Self::new(Algorithm::default(), DEFAULT_CHUNK_SIZE)
    }
}

impl FileHasher {
    pub fn new(algorithm: Algorithm, chunk_size: usize) -> Self {
        Self {
            algorithm,
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Hash file contents without loading the whole file into memory.
    /// Any open or read failure is returned; no partial digest is produced.
    pub fn hash_file(&self, path: &Path) -> Result<Fingerprint> {
        let mut file = std::fs::File::open(path)
            .with_context(|| format!("opening {} for hashing", path.display()))?;
        let mut acc = Accumulator::new(self.algorithm);
        let mut buf = vec![0u8; self.chunk_size];
        loop {
            match file.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => acc.update(&buf[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(e).with_context(|| format!("reading {}", path.display()));
                }
            }
        }
        Ok(acc.finalize())
    }

    /// Hash a byte slice directly (for in-memory content).
    pub fn hash_bytes(&self, data: &[u8]) -> Fingerprint {
        let mut acc = Accumulator::new(self.algorithm);
        acc.update(data);
        acc.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    #[test]
    fn sha256_matches_known_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "hello").unwrap();

        let fp = FileHasher::default().hash_file(&path).unwrap();
        assert_eq!(fp.as_str(), HELLO_SHA256);
    }

    #[test]
    fn blake3_matches_reference_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "hello").unwrap();

        let hasher = FileHasher::new(Algorithm::Blake3, DEFAULT_CHUNK_SIZE);
        let fp = hasher.hash_file(&path).unwrap();
        assert_eq!(fp.as_str(), blake3::hash(b"hello").to_hex().as_str());
    }

    #[test]
    fn chunk_size_does_not_change_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.bin");
        let data: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &data).unwrap();

        for algorithm in [Algorithm::Sha256, Algorithm::Blake3] {
            let reference = FileHasher::new(algorithm, DEFAULT_CHUNK_SIZE).hash_bytes(&data);
            for chunk in [1, 7, 4096, DEFAULT_CHUNK_SIZE, 1 << 20] {
                let fp = FileHasher::new(algorithm, chunk).hash_file(&path).unwrap();
                assert_eq!(fp, reference, "{algorithm} with chunk size {chunk}");
            }
        }
    }

    #[test]
    fn distinct_content_gives_distinct_digest() {
        let hasher = FileHasher::default();
        assert_ne!(hasher.hash_bytes(b"hello"), hasher.hash_bytes(b"hello!"));
        assert_eq!(hasher.hash_bytes(b"hello"), hasher.hash_bytes(b"hello"));
    }

    #[test]
    fn empty_file_hashes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty");
        std::fs::write(&path, "").unwrap();

        let fp = FileHasher::default().hash_file(&path).unwrap();
        assert_eq!(
            fp.as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileHasher::default()
            .hash_file(&dir.path().join("nope"))
            .unwrap_err();
        let io = err.downcast_ref::<std::io::Error>().unwrap();
        assert_eq!(io.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn fingerprint_parse_normalizes_case() {
        let fp: Fingerprint = HELLO_SHA256.to_uppercase().parse().unwrap();
        assert_eq!(fp.as_str(), HELLO_SHA256);
    }

    #[test]
    fn fingerprint_rejects_malformed() {
        assert!("abc".parse::<Fingerprint>().is_err());
        assert!("z".repeat(FINGERPRINT_HEX_LEN).parse::<Fingerprint>().is_err());
        assert!(format!("{HELLO_SHA256}00").parse::<Fingerprint>().is_err());
    }
}
