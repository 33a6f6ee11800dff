use std::fmt;

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

/// Digest applied to a DID to name its dataset directory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyDigest {
    /// 32 hex chars; the layout existing stores use.
    #[default]
    Md5,
    Sha256,
}

impl KeyDigest {
    pub fn hex_len(self) -> usize {
        match self {
            Self::Md5 => 32,
            Self::Sha256 => 64,
        }
    }
}

/// Lowercase hex digest of a DID. The only form in which a DID touches disk.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn from_did(did: &str, digest: KeyDigest) -> Self {
        let hex = match digest {
            KeyDigest::Md5 => hex::encode(Md5::digest(did.as_bytes())),
            KeyDigest::Sha256 => hex::encode(Sha256::digest(did.as_bytes())),
        };
        Self(hex)
    }

    /// Wrap a key read back from the storage root or supplied by a client.
    /// Not validated here; path checks happen where the key meets the disk.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
