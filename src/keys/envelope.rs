//! # Asymmetric Envelope Operations
//!
//! Wrapping and unwrapping small buffers (key packages) under an
//! asymmetric key.
//!
//! ## Scheme
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      X25519 ENVELOPE WRAP                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  seal(recipient_pub, plaintext):                                       │
//! │                                                                         │
//! │  1. Ephemeral X25519 keypair (fresh per wrap)                          │
//! │  2. DH: ephemeral_secret × recipient_pub → shared secret               │
//! │  3. HKDF-SHA256(ikm = shared,                                          │
//! │                 salt = ephemeral_pub ‖ recipient_pub,                  │
//! │                 info = "sealkit-wrap-key-v1") → AES-256-GCM key        │
//! │  4. AES-256-GCM with a random nonce                                    │
//! │                                                                         │
//! │  Output: ephemeral_pub(32) ‖ nonce(12) ‖ ciphertext+tag                │
//! │                                                                         │
//! │  open(private, bytes) recomputes the same shared secret from the       │
//! │  embedded ephemeral public key. Any failure — short input, DH with     │
//! │  the wrong private key, tag mismatch — is the one generic format       │
//! │  error.                                                                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only the X25519 family is functionally supported; parsing any other
//! algorithm name fails up front with `UnknownAlgorithm`.

use std::fmt;
use std::str::FromStr;

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce as AesNonce,
};
use hkdf::Hkdf;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::Zeroize;

use crate::crypto::cipher::{NONCE_SIZE, TAG_SIZE};
use crate::error::{Error, Result};
use crate::keys::keypair::{InlineKey, KeyRef, PrivateKey, PublicKey};
use crate::keys::store::{resolve, KeyStore};

/// Domain separation for wrap-key derivation
const WRAP_INFO: &[u8] = b"sealkit-wrap-key-v1";

/// Wrapped-envelope overhead: ephemeral public key + nonce + tag
pub const ENVELOPE_OVERHEAD: usize = 32 + NONCE_SIZE + TAG_SIZE;

/// Supported asymmetric algorithm families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsymmetricAlgorithm {
    /// X25519 key agreement with an AES-256-GCM data envelope
    X25519,
}

impl AsymmetricAlgorithm {
    /// Canonical name
    pub fn name(&self) -> &'static str {
        match self {
            AsymmetricAlgorithm::X25519 => "X25519",
        }
    }
}

impl fmt::Display for AsymmetricAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AsymmetricAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "X25519" => Ok(AsymmetricAlgorithm::X25519),
            other => Err(Error::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// Derive the AES-256-GCM wrap key for one (ephemeral, recipient) pair.
fn derive_wrap_key(shared: &[u8; 32], ephemeral_pub: &[u8; 32], recipient_pub: &[u8; 32]) -> Result<[u8; 32]> {
    let mut salt = [0u8; 64];
    salt[..32].copy_from_slice(ephemeral_pub);
    salt[32..].copy_from_slice(recipient_pub);

    let hkdf = Hkdf::<Sha256>::new(Some(&salt), shared);
    let mut key = [0u8; 32];
    hkdf.expand(WRAP_INFO, &mut key)
        .map_err(|_| Error::Internal("HKDF expansion failed".into()))?;
    Ok(key)
}

/// Wrap `plaintext` for the holder of `recipient`'s private key.
pub fn seal(
    algorithm: AsymmetricAlgorithm,
    recipient: &PublicKey,
    plaintext: &[u8],
) -> Result<Vec<u8>> {
    let AsymmetricAlgorithm::X25519 = algorithm;

    let ephemeral = StaticSecret::random_from_rng(OsRng);
    let ephemeral_pub = X25519PublicKey::from(&ephemeral).to_bytes();
    let mut shared = ephemeral
        .diffie_hellman(&X25519PublicKey::from(*recipient.as_bytes()))
        .to_bytes();
    let mut wrap_key = derive_wrap_key(&shared, &ephemeral_pub, recipient.as_bytes())?;
    shared.zeroize();

    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);

    let cipher = Aes256Gcm::new_from_slice(&wrap_key)
        .map_err(|e| Error::Internal(format!("wrap cipher init: {e}")))?;
    wrap_key.zeroize();
    let ciphertext = cipher
        .encrypt(AesNonce::from_slice(&nonce), plaintext)
        .map_err(|_| Error::Internal("envelope encryption failed".into()))?;

    let mut out = Vec::with_capacity(32 + NONCE_SIZE + ciphertext.len());
    out.extend_from_slice(&ephemeral_pub);
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Unwrap an envelope with the recipient's private key.
///
/// Fails with the generic format error for short input, a non-matching
/// private key, or any tampering — indistinguishably.
pub fn open(
    algorithm: AsymmetricAlgorithm,
    private: &PrivateKey,
    bytes: &[u8],
) -> Result<Vec<u8>> {
    let AsymmetricAlgorithm::X25519 = algorithm;

    if bytes.len() < ENVELOPE_OVERHEAD {
        tracing::debug!(len = bytes.len(), "envelope shorter than its overhead");
        return Err(Error::InvalidFormat);
    }
    let mut ephemeral_pub = [0u8; 32];
    ephemeral_pub.copy_from_slice(&bytes[..32]);
    let nonce = &bytes[32..32 + NONCE_SIZE];
    let ciphertext = &bytes[32 + NONCE_SIZE..];

    let recipient_pub = private.public_key();
    let mut shared = private.diffie_hellman(&PublicKey::from_bytes(ephemeral_pub));
    let mut wrap_key = derive_wrap_key(&shared, &ephemeral_pub, recipient_pub.as_bytes())?;
    shared.zeroize();

    let cipher = Aes256Gcm::new_from_slice(&wrap_key)
        .map_err(|e| Error::Internal(format!("wrap cipher init: {e}")))?;
    wrap_key.zeroize();
    cipher
        .decrypt(AesNonce::from_slice(nonce), ciphertext)
        .map_err(|_| {
            tracing::debug!("envelope unwrap failed");
            Error::InvalidFormat
        })
}

/// Wrap under a key reference, resolving store entries as needed.
///
/// A private reference is accepted: its public half is derived and used.
pub fn seal_with_ref(
    algorithm: AsymmetricAlgorithm,
    key_ref: &KeyRef,
    store: Option<&dyn KeyStore>,
    plaintext: &[u8],
) -> Result<Vec<u8>> {
    let recipient = resolve(key_ref, store)?.public_key();
    seal(algorithm, &recipient, plaintext)
}

/// Unwrap under a key reference, which must resolve to a private key.
pub fn open_with_ref(
    algorithm: AsymmetricAlgorithm,
    key_ref: &KeyRef,
    store: Option<&dyn KeyStore>,
    bytes: &[u8],
) -> Result<Vec<u8>> {
    match resolve(key_ref, store)? {
        InlineKey::Private(sk) => open(algorithm, &sk, bytes),
        InlineKey::Public(_) => Err(Error::InvalidKey(
            "unwrapping requires a private key, got a public key".into(),
        )),
    }
}

// ============================================================================
// TESTS
// ============================================================================
