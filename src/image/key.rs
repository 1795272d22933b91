//! Content-addressed image keys
//!
//! Same runtime version + same setup script bytes = same key = same tag.

use sha2::{Digest, Sha256};
use std::fmt;

/// Repository for customised images
pub const SETUP_IMAGE_REPOSITORY: &str = "packrun-setup";

/// Hex characters of the key used in the image tag
const TAG_HASH_LEN: usize = 16;

/// SHA-256 digest of (runtime version, setup script)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageKey(String);

impl ImageKey {
    /// Compute the key.
    ///
    /// A NUL separates the version from the script so that no
    /// (version, script) pair can collide with another by shifting bytes
    /// across the boundary.
    pub fn compute(version: &str, setup_script: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(version.as_bytes());
        hasher.update([0u8]);
        hasher.update(setup_script);
        Self(hex::encode(hasher.finalize()))
    }

    /// Full hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Image reference the built image is tagged with
    pub fn tag(&self) -> String {
        format!("{}:{}", SETUP_IMAGE_REPOSITORY, &self.0[..TAG_HASH_LEN])
    }
}

impl fmt::Display for ImageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_deterministic() {
        let a = ImageKey::compute("23", b"#!/bin/sh\necho hi\n");
        let b = ImageKey::compute("23", b"#!/bin/sh\necho hi\n");
        assert_eq!(a, b);
        assert_eq!(a.tag(), b.tag());
    }

    #[test]
    fn key_changes_with_script() {
        let a = ImageKey::compute("23", b"#!/bin/sh\necho hi\n");
        let b = ImageKey::compute("23", b"#!/bin/sh\necho bye\n");
        assert_ne!(a, b);
        assert_ne!(a.tag(), b.tag());
    }

    #[test]
    fn key_changes_with_version() {
        let a = ImageKey::compute("22", b"setup");
        let b = ImageKey::compute("23", b"setup");
        assert_ne!(a, b);
    }

    #[test]
    fn boundary_shift_does_not_collide() {
        let a = ImageKey::compute("2", b"3setup");
        let b = ImageKey::compute("23", b"setup");
        assert_ne!(a, b);
    }

    #[test]
    fn tag_format() {
        let key = ImageKey::compute("23", b"");
        assert_eq!(key.as_str().len(), 64);
        let tag = key.tag();
        assert!(tag.starts_with("packrun-setup:"));
        assert_eq!(tag.len(), "packrun-setup:".len() + 16);
        assert!(key.as_str().starts_with(tag.rsplit(':').next().unwrap()));
    }
}
