//! # Hasher Module
//!
//! Computes content digests used to recognise exact duplicates.
//!
//! Files are streamed through SHA-256 in fixed-size chunks, so memory use
//! does not grow with file size. Two files with identical bytes always
//! produce the same [`ContentDigest`], whatever their name or metadata.
//!
//! ## Example
//! ```rust,ignore
//! use smart_file_mover::core::hasher::{ContentHasher, Sha256Hasher};
//!
//! let digest = Sha256Hasher::new().hash_file(&path)?;
//! println!("{digest}");
//! ```

use crate::error::HashError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Read buffer size (64KB)
const CHUNK_SIZE: usize = 64 * 1024;

/// A SHA-256 digest of a file's bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    /// Wrap raw digest bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lower-case hex representation
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Trait for content hashers
///
/// Implement this trait to swap the digest (e.g., for testing).
pub trait ContentHasher: Send + Sync {
    /// Hash a file's content. Opens the file read-only.
    fn hash_file(&self, path: &Path) -> Result<ContentDigest, HashError>;

    /// Hash content held in memory, such as a re-encoded image.
    /// `path` only labels errors.
    fn hash_bytes(&self, bytes: &[u8], path: &Path) -> Result<ContentDigest, HashError>;
}

/// Streaming SHA-256 hasher
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl Sha256Hasher {
    pub fn new() -> Self {
        Self
    }

    /// Hash everything a reader yields
    pub fn hash_reader<R: Read>(&self, reader: R, path: &Path) -> Result<ContentDigest, HashError> {
        let mut reader = BufReader::with_capacity(CHUNK_SIZE, reader);
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; CHUNK_SIZE];

        loop {
            let bytes_read = reader.read(&mut buffer).map_err(|e| HashError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

            if bytes_read == 0 {
                break;
            }

            hasher.update(&buffer[..bytes_read]);
        }

        Ok(ContentDigest(hasher.finalize().into()))
    }
}

impl ContentHasher for Sha256Hasher {
    fn hash_file(&self, path: &Path) -> Result<ContentDigest, HashError> {
        let file = File::open(path).map_err(|e| HashError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.hash_reader(file, path)
    }

    fn hash_bytes(&self, bytes: &[u8], path: &Path) -> Result<ContentDigest, HashError> {
        self.hash_reader(bytes, path)
    }
}
