//! SHA-256 checksum utilities
//!
//! Checksums use the canonical `sha256:<hex>` format. The tag records the
//! checksum of the index page body written at the reconciled commit.

use sha2::{Digest, Sha256};

/// Prefix for all checksums produced by this module
const PREFIX: &str = "sha256:";

/// Compute the SHA-256 checksum of string content.
pub fn compute_content_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{}{:x}", PREFIX, hasher.finalize())
}
