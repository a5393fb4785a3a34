//! Hashing utilities for emitted content and stable identifiers.
//!
//! This module provides:
//! - `ContentHash`: A full 64-character SHA-256 hash for content comparison
//! - `hash_bytes()` / `hash_file()`: byte and file hashing
//! - `stable_guid()`: a GUID derived from a namespace and a name, so generated
//!   solution files keep the same project identifiers across runs

use std::fs;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::consts::HASH_DISPLAY_LEN;

/// A full 64-character SHA256 hash for content verification.
///
/// # Format
///
/// The hash is a lowercase hexadecimal string (64 characters).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl ContentHash {
  /// Shortened form for log output.
  pub fn short(&self) -> &str {
    let len = self.0.len().min(HASH_DISPLAY_LEN);
    &self.0[..len]
  }
}

impl std::fmt::Display for ContentHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Hash arbitrary bytes.
///
/// Returns the full 64-character SHA256 hash.
pub fn hash_bytes(data: &[u8]) -> ContentHash {
  let mut hasher = Sha256::new();
  hasher.update(data);
  ContentHash(hex::encode(hasher.finalize()))
}

/// Hash a file's contents.
///
/// Returns the full 64-character SHA256 hash of the file.
pub fn hash_file(path: &Path) -> std::io::Result<ContentHash> {
  let mut file = fs::File::open(path)?;

  let mut hasher = Sha256::new();
  let mut buffer = [0u8; 8192];

  loop {
    let bytes_read = file.read(&mut buffer)?;
    if bytes_read == 0 {
      break;
    }
    hasher.update(&buffer[..bytes_read]);
  }

  Ok(ContentHash(hex::encode(hasher.finalize())))
}

/// Derive an uppercase, brace-less GUID from `namespace` and `name`.
///
/// The first 16 bytes of `sha256(namespace ":" name)` are laid out as
/// `8-4-4-4-12` hex groups with the version nibble set to 5 and the variant
/// bits set to RFC 4122, so the result is well formed for tools that check.
pub fn stable_guid(namespace: &str, name: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(namespace.as_bytes());
  hasher.update(b":");
  hasher.update(name.as_bytes());
  let digest = hasher.finalize();

  let mut bytes = [0u8; 16];
  bytes.copy_from_slice(&digest[..16]);
  bytes[6] = (bytes[6] & 0x0f) | 0x50;
  bytes[8] = (bytes[8] & 0x3f) | 0x80;

  let hex = hex::encode_upper(bytes);
  format!(
    "{}-{}-{}-{}-{}",
    &hex[0..8],
    &hex[8..12],
    &hex[12..16],
    &hex[16..20],
    &hex[20..32]
  )
}
