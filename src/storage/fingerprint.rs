//! Content fingerprints.

use std::fmt;

use sha1::{Digest, Sha1};

use crate::error_handling::StoreError;

/// Length of a fingerprint in bytes (SHA-1).
pub const FINGERPRINT_LEN: usize = 20;

/// SHA-1 digest of a derived path string or of a script's raw bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

impl Fingerprint {
    /// Fingerprints arbitrary bytes.
    pub fn of(bytes: &[u8]) -> Self {
        Self(Sha1::digest(bytes).into())
    }

    /// Fingerprints a derived path.
    pub fn of_path(path: &str) -> Self {
        Self::of(path.as_bytes())
    }

    /// Parses a 40-digit hex string as printed in diagnostics.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidFingerprint` if the input is not exactly
    /// 20 hex-encoded bytes.
    pub fn from_hex(s: &str) -> Result<Self, StoreError> {
        let mut bytes = [0u8; FINGERPRINT_LEN];
        hex::decode_to_slice(s.trim(), &mut bytes)
            .map_err(|_| StoreError::InvalidFingerprint(s.to_string()))?;
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

/// The two disjoint fingerprint sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Fingerprints of derived paths
    Paths,
    /// Fingerprints of script bodies
    Scripts,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Paths => "path",
            Namespace::Scripts => "script",
        }
    }
}
