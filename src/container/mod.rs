//! # Secure Container Format
//!
//! The hybrid envelope-encryption protocol: bulk data under a fresh
//! one-time symmetric key, that key wrapped under the recipient's
//! asymmetric key, and an integrity digest over the encrypted payload.
//!
//! ## Protocol
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       ENVELOPE ENCRYPTION                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  SEAL                                                                   │
//! │  1. Generate one-time symmetric key + IV (caller-chosen algorithm)     │
//! │  2. Key package {alg, key, iv, salt} → wrap under recipient public key │
//! │  3. Header: magic, version, optional public-key identifier,            │
//! │     length-prefixed wrapped package                                    │
//! │  4. Payload encrypted under the one-time key                           │
//! │     • streamed: fixed-size self-framed blocks (file form)              │
//! │     • single-shot: one length-prefixed padded blob (in-memory form)    │
//! │  5. SHA-512 digest over the encrypted payload bytes                    │
//! │                                                                         │
//! │  OPEN                                                                   │
//! │  1. Parse header eagerly (constructor); resolve the private key        │
//! │     directly or through a key chain by the embedded identifier         │
//! │  2. Unwrap the key package, rebuild the symmetric cipher               │
//! │  3. On demand: recompute and constant-time-compare the digest          │
//! │     BEFORE decrypting anything — never emit partial plaintext          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Because the digest covers only *encrypted* bytes, a container can be
//! integrity-checked without any key at all except the wrapped package
//! being parseable — see [`file::FileOpener::verify`].

pub mod blob;
pub mod file;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::crypto::cipher::SymmetricKey;
use crate::crypto::random::salt8;
use crate::error::{Error, Result};
use crate::keychain::KeyChain;
use crate::keys::keypair::PrivateKey;
use crate::wire;

pub use blob::{open_bytes, seal_bytes};
pub use file::{peek_public_key, secure_delete, FileOpener, FileSealer};

/// Where the private key for opening a container comes from
pub enum KeySource<'a> {
    /// A directly supplied private key
    Private(&'a PrivateKey),
    /// A key chain, searched by the container's embedded public-key
    /// identifier
    Chain(&'a KeyChain),
}

/// Metadata carried (encrypted) alongside a file container's content
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Original file name (no directory components)
    pub name: String,
    /// Original length in bytes
    pub len: u64,
    /// Modification time, seconds since the unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<u64>,
    /// Creation time, seconds since the unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<u64>,
}

impl FileMetadata {
    /// Metadata captured from a file on disk.
    pub fn for_path(path: &std::path::Path) -> Result<Self> {
        let meta = std::fs::metadata(path)?;
        let to_unix = |t: std::io::Result<std::time::SystemTime>| {
            t.ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_secs())
        };
        Ok(Self {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            len: meta.len(),
            modified: to_unix(meta.modified()),
            created: to_unix(meta.created()),
        })
    }
}

/// Serialize a one-time key into the wrappable package form:
/// `len16:algorithm len16:key len16:iv salt:8`.
pub(crate) fn encode_key_package(key: &SymmetricKey) -> Result<Vec<u8>> {
    let mut package = Vec::with_capacity(
        6 + key.algorithm().name().len() + key.key_bytes().len() + key.iv_bytes().len() + 8,
    );
    wire::put_str16(&mut package, key.algorithm().name())?;
    wire::put_bytes16(&mut package, key.key_bytes())?;
    wire::put_bytes16(&mut package, key.iv_bytes())?;
    package.extend_from_slice(&salt8());
    Ok(package)
}

/// Parse an unwrapped key package back into a symmetric key.
///
/// Any structural problem is the generic format error.
pub(crate) fn decode_key_package(package: &[u8]) -> Result<SymmetricKey> {
    let mut cursor = package;
    let algorithm = wire::get_str16(&mut cursor)?
        .parse()
        .map_err(|_| Error::InvalidFormat)?;
    let mut key = wire::get_bytes16(&mut cursor)?;
    let mut iv = wire::get_bytes16(&mut cursor)?;
    // Trailing salt, nothing more.
    if cursor.len() != 8 {
        key.zeroize();
        iv.zeroize();
        return Err(Error::InvalidFormat);
    }
    SymmetricKey::new(algorithm, key, iv).map_err(|_| Error::InvalidFormat)
}

// ============================================================================
// TESTS
// ============================================================================
