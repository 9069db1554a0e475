//! SHA-256 content fingerprints
//!
//! Fingerprints are the only drift signal codesync has, on both the local
//! and the upstream side, so they digest the full content. The canonical
//! textual form is `sha256:<hex>`.

use std::collections::BTreeMap;
use std::fmt;

use sha2::{Digest, Sha256};

/// Prefix for all fingerprints produced by this module
const PREFIX: &str = "sha256:";

/// Deterministic digest of a text blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// The canonical `sha256:<hex>` form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a previously persisted fingerprint string refers to this one.
    pub fn matches(&self, stored: &str) -> bool {
        self.0 == stored
    }

    pub fn into_string(self) -> String {
        self.0
    }

    fn from_hasher(hasher: Sha256) -> Self {
        Self(format!("{}{:x}", PREFIX, hasher.finalize()))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Fingerprint> for String {
    fn from(value: Fingerprint) -> Self {
        value.0
    }
}

/// Fingerprint a text blob.
pub fn fingerprint(content: &str) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Fingerprint::from_hasher(hasher)
}

/// Fingerprint a set of files keyed by relative path.
///
/// Every path and content is length-prefixed before hashing so that moving
/// bytes across an entry boundary changes the digest.
pub fn fingerprint_tree(entries: &BTreeMap<String, String>) -> Fingerprint {
    let mut hasher = Sha256::new();
    for (path, content) in entries {
        hasher.update((path.len() as u64).to_le_bytes());
        hasher.update(path.as_bytes());
        hasher.update((content.len() as u64).to_le_bytes());
        hasher.update(content.as_bytes());
    }
    Fingerprint::from_hasher(hasher)
}
