//! # Symmetric Cipher Wrapper
//!
//! Buffer-oriented symmetric encryption under a named algorithm, key, and IV.
//!
//! ## Design
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      SYMMETRIC CIPHER WRAPPER                           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  SymmetricAlgorithm   Closed enum of supported ciphers. Names are      │
//! │                       resolved once, at the boundary, through a        │
//! │                       lookup table built at startup. Unknown names     │
//! │                       are a configuration error.                       │
//! │                                                                         │
//! │  SymmetricKey         {algorithm, key, iv}. Owns its buffers and       │
//! │                       zero-fills them on drop. Serializes as           │
//! │                       NAME:base64(key):base64(iv).                     │
//! │                                                                         │
//! │  SymmetricCipher      One reusable AEAD transform plus a call          │
//! │                       counter. Call N uses nonce = iv XOR N, so a      │
//! │                       mirrored sequence of encrypt and decrypt calls   │
//! │                       never reuses a nonce under one key.              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `Plaintext` algorithm is a deliberate no-op used to disable
//! encryption in test and debug configurations. It accepts and ignores any
//! key/IV material and performs an identity transform.
//!
//! A `SymmetricCipher` instance is **not** thread-safe and is meant for one
//! logical operation (one encrypt-or-decrypt sequence). Build a fresh
//! instance per operation.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes128Gcm, Aes256Gcm, Nonce as AesNonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chacha20poly1305::ChaCha20Poly1305;
use once_cell::sync::Lazy;
use zeroize::Zeroize;

use crate::error::{Error, Result};

/// Size of AEAD nonces in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Size of the AEAD authentication tag in bytes (128 bits)
pub const TAG_SIZE: usize = 16;

/// Literal serialization token for the no-op algorithm
pub const PLAINTEXT_TOKEN: &str = "PLAINTEXT";

/// Supported symmetric algorithms
///
/// A closed set: every variant carries its exact key/nonce size
/// requirements, and name parsing rejects anything else up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymmetricAlgorithm {
    /// Identity transform, no key material (test/debug configurations)
    Plaintext,
    /// AES-128-GCM
    Aes128Gcm,
    /// AES-256-GCM
    Aes256Gcm,
    /// ChaCha20-Poly1305
    ChaCha20Poly1305,
}

/// Name lookup table, built once at first use.
static ALGORITHM_NAMES: Lazy<HashMap<&'static str, SymmetricAlgorithm>> = Lazy::new(|| {
    let mut m = HashMap::new();
    for alg in SymmetricAlgorithm::ALL {
        m.insert(alg.name(), alg);
    }
    m
});

impl SymmetricAlgorithm {
    /// All supported algorithms
    pub const ALL: [SymmetricAlgorithm; 4] = [
        SymmetricAlgorithm::Plaintext,
        SymmetricAlgorithm::Aes128Gcm,
        SymmetricAlgorithm::Aes256Gcm,
        SymmetricAlgorithm::ChaCha20Poly1305,
    ];

    /// Canonical algorithm name
    pub fn name(&self) -> &'static str {
        match self {
            SymmetricAlgorithm::Plaintext => PLAINTEXT_TOKEN,
            SymmetricAlgorithm::Aes128Gcm => "AES128-GCM",
            SymmetricAlgorithm::Aes256Gcm => "AES256-GCM",
            SymmetricAlgorithm::ChaCha20Poly1305 => "CHACHA20-POLY1305",
        }
    }

    /// Required key size in bytes
    pub fn key_size(&self) -> usize {
        match self {
            SymmetricAlgorithm::Plaintext => 0,
            SymmetricAlgorithm::Aes128Gcm => 16,
            SymmetricAlgorithm::Aes256Gcm => 32,
            SymmetricAlgorithm::ChaCha20Poly1305 => 32,
        }
    }

    /// Required IV/nonce size in bytes
    pub fn nonce_size(&self) -> usize {
        match self {
            SymmetricAlgorithm::Plaintext => 0,
            _ => NONCE_SIZE,
        }
    }
}

impl fmt::Display for SymmetricAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SymmetricAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ALGORITHM_NAMES
            .get(s.trim().to_ascii_uppercase().as_str())
            .copied()
            .ok_or_else(|| Error::UnknownAlgorithm(s.to_string()))
    }
}

/// A symmetric key: algorithm plus owned key/IV buffers
///
/// ## Security
///
/// - Key and IV bytes are zero-filled in place when the value drops, on
///   every exit path. Callers must not keep independent references and
///   expect them to stay readable.
/// - `Clone` produces a value copy with independent buffers.
/// - `Debug` prints a fingerprint, never the bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey {
    algorithm: SymmetricAlgorithm,
    key: Vec<u8>,
    iv: Vec<u8>,
}

impl SymmetricKey {
    /// Create a key, validating sizes against the algorithm.
    ///
    /// The `Plaintext` algorithm accepts and discards any supplied
    /// material; its key/IV are always empty.
    pub fn new(algorithm: SymmetricAlgorithm, key: Vec<u8>, iv: Vec<u8>) -> Result<Self> {
        if algorithm == SymmetricAlgorithm::Plaintext {
            // Zero what the caller handed us before letting go of it.
            let mut key = key;
            let mut iv = iv;
            key.zeroize();
            iv.zeroize();
            return Ok(Self::plaintext());
        }
        if key.len() != algorithm.key_size() {
            return Err(Error::InvalidParameter(format!(
                "{} requires a {}-byte key, got {}",
                algorithm,
                algorithm.key_size(),
                key.len()
            )));
        }
        if iv.len() != algorithm.nonce_size() {
            return Err(Error::InvalidParameter(format!(
                "{} requires a {}-byte IV, got {}",
                algorithm,
                algorithm.nonce_size(),
                iv.len()
            )));
        }
        Ok(Self { algorithm, key, iv })
    }

    /// The no-op key (identity transform, empty key/IV)
    pub fn plaintext() -> Self {
        Self {
            algorithm: SymmetricAlgorithm::Plaintext,
            key: Vec::new(),
            iv: Vec::new(),
        }
    }

    /// The key's algorithm
    pub fn algorithm(&self) -> SymmetricAlgorithm {
        self.algorithm
    }

    /// Raw key bytes
    pub fn key_bytes(&self) -> &[u8] {
        &self.key
    }

    /// Raw IV bytes
    pub fn iv_bytes(&self) -> &[u8] {
        &self.iv
    }

    /// Short hex fingerprint for logs (never the key itself)
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(self.algorithm.name().as_bytes());
        hasher.update(&self.key);
        hasher.update(&self.iv);
        hex::encode(&hasher.finalize()[..6])
    }
}

impl fmt::Display for SymmetricKey {
    /// `NAME:base64(key):base64(iv)`, or the bare `PLAINTEXT` token.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.algorithm == SymmetricAlgorithm::Plaintext {
            return f.write_str(PLAINTEXT_TOKEN);
        }
        write!(
            f,
            "{}:{}:{}",
            self.algorithm,
            BASE64.encode(&self.key),
            BASE64.encode(&self.iv)
        )
    }
}

impl FromStr for SymmetricKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(PLAINTEXT_TOKEN) {
            return Ok(Self::plaintext());
        }
        let mut parts = s.splitn(3, ':');
        let (name, key_b64, iv_b64) = match (parts.next(), parts.next(), parts.next()) {
            (Some(n), Some(k), Some(i)) => (n, k, i),
            _ => {
                return Err(Error::InvalidKey(
                    "expected NAME:base64(key):base64(iv)".into(),
                ))
            }
        };
        let algorithm = SymmetricAlgorithm::from_str(name)?;
        let key = BASE64
            .decode(key_b64)
            .map_err(|e| Error::InvalidKey(format!("bad key encoding: {e}")))?;
        let iv = BASE64
            .decode(iv_b64)
            .map_err(|e| Error::InvalidKey(format!("bad IV encoding: {e}")))?;
        Self::new(algorithm, key, iv)
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("algorithm", &self.algorithm)
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.key.zeroize();
        self.iv.zeroize();
    }
}

/// The cached AEAD transform inside a cipher
enum Transform {
    Plaintext,
    Aes128(Box<Aes128Gcm>),
    Aes256(Box<Aes256Gcm>),
    ChaCha(Box<ChaCha20Poly1305>),
}

/// A single-operation symmetric cipher
///
/// Holds one reusable AEAD instance (all supported algorithms allow
/// transform reuse) and a call counter. Call N derives its nonce by
/// XOR-folding N into the trailing 8 bytes of the key's IV, so repeated
/// calls under one key never collide as long as encrypt and decrypt call
/// sequences mirror each other — which every caller in this crate
/// guarantees by construction.
///
/// Not thread-safe. One logical encrypt-or-decrypt operation per instance.
pub struct SymmetricCipher {
    transform: Transform,
    iv: [u8; NONCE_SIZE],
    counter: u64,
}

impl SymmetricCipher {
    /// Build a cipher from a key.
    pub fn new(key: &SymmetricKey) -> Result<Self> {
        let transform = match key.algorithm() {
            SymmetricAlgorithm::Plaintext => Transform::Plaintext,
            SymmetricAlgorithm::Aes128Gcm => Transform::Aes128(Box::new(
                Aes128Gcm::new_from_slice(key.key_bytes())
                    .map_err(|e| Error::Internal(format!("cipher init: {e}")))?,
            )),
            SymmetricAlgorithm::Aes256Gcm => Transform::Aes256(Box::new(
                Aes256Gcm::new_from_slice(key.key_bytes())
                    .map_err(|e| Error::Internal(format!("cipher init: {e}")))?,
            )),
            SymmetricAlgorithm::ChaCha20Poly1305 => Transform::ChaCha(Box::new(
                ChaCha20Poly1305::new_from_slice(key.key_bytes())
                    .map_err(|e| Error::Internal(format!("cipher init: {e}")))?,
            )),
        };
        let mut iv = [0u8; NONCE_SIZE];
        if !matches!(transform, Transform::Plaintext) {
            iv.copy_from_slice(key.iv_bytes());
        }
        Ok(Self {
            transform,
            iv,
            counter: 0,
        })
    }

    /// Nonce for the current call: IV with the counter folded into the
    /// trailing 8 bytes. Advances the counter.
    fn next_nonce(&mut self) -> [u8; NONCE_SIZE] {
        let mut nonce = self.iv;
        let ctr = self.counter.to_be_bytes();
        for (n, c) in nonce[NONCE_SIZE - 8..].iter_mut().zip(ctr) {
            *n ^= c;
        }
        self.counter = self.counter.wrapping_add(1);
        nonce
    }

    /// Encrypt one buffer.
    ///
    /// Empty input returns empty output without touching the cipher or
    /// advancing the counter.
    pub fn encrypt(&mut self, plaintext: &[u8]) -> Result<Vec<u8>> {
        if plaintext.is_empty() {
            return Ok(Vec::new());
        }
        if matches!(self.transform, Transform::Plaintext) {
            return Ok(plaintext.to_vec());
        }
        let nonce = self.next_nonce();
        let nonce = AesNonce::from_slice(&nonce);
        let result = match &self.transform {
            Transform::Plaintext => unreachable!(),
            Transform::Aes128(c) => c.encrypt(nonce, plaintext),
            Transform::Aes256(c) => c.encrypt(nonce, plaintext),
            Transform::ChaCha(c) => c.encrypt(nonce, plaintext),
        };
        result.map_err(|_| Error::Internal("AEAD encryption failed".into()))
    }

    /// Decrypt one buffer.
    ///
    /// Empty input returns empty output. Authentication failure surfaces
    /// as the generic format error.
    pub fn decrypt(&mut self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        if ciphertext.is_empty() {
            return Ok(Vec::new());
        }
        if matches!(self.transform, Transform::Plaintext) {
            return Ok(ciphertext.to_vec());
        }
        let nonce = self.next_nonce();
        let nonce = AesNonce::from_slice(&nonce);
        let result = match &self.transform {
            Transform::Plaintext => unreachable!(),
            Transform::Aes128(c) => c.decrypt(nonce, ciphertext),
            Transform::Aes256(c) => c.decrypt(nonce, ciphertext),
            Transform::ChaCha(c) => c.decrypt(nonce, ciphertext),
        };
        result.map_err(|_| {
            tracing::debug!("AEAD authentication failed during decrypt");
            Error::InvalidFormat
        })
    }

    /// Ciphertext length for a given plaintext length
    pub fn ciphertext_len(&self, plaintext_len: usize) -> usize {
        if plaintext_len == 0 || matches!(self.transform, Transform::Plaintext) {
            plaintext_len
        } else {
            plaintext_len + TAG_SIZE
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::random::generate_key;

    #[test]
    fn test_algorithm_name_round_trip() {
        for alg in SymmetricAlgorithm::ALL {
            assert_eq!(SymmetricAlgorithm::from_str(alg.name()).unwrap(), alg);
        }
        // Lookup is case-insensitive
        assert_eq!(
            SymmetricAlgorithm::from_str("aes256-gcm").unwrap(),
            SymmetricAlgorithm::Aes256Gcm
        );
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        let err = SymmetricAlgorithm::from_str("RC4").unwrap_err();
        assert!(matches!(err, Error::UnknownAlgorithm(_)));
    }

    #[test]
    fn test_key_size_enforced() {
        let err = SymmetricKey::new(SymmetricAlgorithm::Aes256Gcm, vec![0u8; 16], vec![0u8; 12])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }

    #[test]
    fn test_plaintext_key_ignores_material() {
        let key =
            SymmetricKey::new(SymmetricAlgorithm::Plaintext, vec![1, 2, 3], vec![4, 5]).unwrap();
        assert!(key.key_bytes().is_empty());
        assert!(key.iv_bytes().is_empty());
        assert_eq!(key.to_string(), "PLAINTEXT");
    }

    #[test]
    fn test_key_serialization_round_trip() {
        for alg in [
            SymmetricAlgorithm::Aes128Gcm,
            SymmetricAlgorithm::Aes256Gcm,
            SymmetricAlgorithm::ChaCha20Poly1305,
        ] {
            let key = generate_key(alg).unwrap();
            let restored: SymmetricKey = key.to_string().parse().unwrap();
            assert_eq!(restored, key);
        }
        let plain: SymmetricKey = "PLAINTEXT".parse().unwrap();
        assert_eq!(plain.algorithm(), SymmetricAlgorithm::Plaintext);
    }

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        for alg in [
            SymmetricAlgorithm::Aes128Gcm,
            SymmetricAlgorithm::Aes256Gcm,
            SymmetricAlgorithm::ChaCha20Poly1305,
        ] {
            let key = generate_key(alg).unwrap();
            let mut enc = SymmetricCipher::new(&key).unwrap();
            let mut dec = SymmetricCipher::new(&key).unwrap();

            let ct = enc.encrypt(b"hello world").unwrap();
            assert_ne!(ct, b"hello world");
            assert_eq!(dec.decrypt(&ct).unwrap(), b"hello world");
        }
    }

    #[test]
    fn test_empty_input_bypasses_cipher() {
        let key = generate_key(SymmetricAlgorithm::Aes256Gcm).unwrap();
        let mut cipher = SymmetricCipher::new(&key).unwrap();
        assert!(cipher.encrypt(b"").unwrap().is_empty());
        assert!(cipher.decrypt(b"").unwrap().is_empty());
        // Counter untouched: the next real call still mirrors call 0
        let ct = cipher.encrypt(b"x").unwrap();
        let mut dec = SymmetricCipher::new(&key).unwrap();
        assert_eq!(dec.decrypt(&ct).unwrap(), b"x");
    }

    #[test]
    fn test_sequential_calls_mirror() {
        let key = generate_key(SymmetricAlgorithm::ChaCha20Poly1305).unwrap();
        let mut enc = SymmetricCipher::new(&key).unwrap();
        let mut dec = SymmetricCipher::new(&key).unwrap();

        let blocks: Vec<Vec<u8>> = (0u8..5).map(|i| vec![i; 100]).collect();
        let cts: Vec<Vec<u8>> = blocks.iter().map(|b| enc.encrypt(b).unwrap()).collect();
        // Same plaintext in different positions encrypts differently
        assert_ne!(cts[0], cts[1].clone());
        for (block, ct) in blocks.iter().zip(&cts) {
            assert_eq!(&dec.decrypt(ct).unwrap(), block);
        }
    }

    #[test]
    fn test_out_of_order_decrypt_fails() {
        let key = generate_key(SymmetricAlgorithm::Aes256Gcm).unwrap();
        let mut enc = SymmetricCipher::new(&key).unwrap();
        let first = enc.encrypt(b"first").unwrap();
        let second = enc.encrypt(b"second").unwrap();

        let mut dec = SymmetricCipher::new(&key).unwrap();
        // Decrypting the second block at position 0 uses the wrong nonce
        assert!(matches!(dec.decrypt(&second), Err(Error::InvalidFormat)));
        let _ = first;
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = generate_key(SymmetricAlgorithm::Aes256Gcm).unwrap();
        let mut enc = SymmetricCipher::new(&key).unwrap();
        let mut ct = enc.encrypt(b"payload").unwrap();
        ct[0] ^= 0xFF;
        let mut dec = SymmetricCipher::new(&key).unwrap();
        assert!(matches!(dec.decrypt(&ct), Err(Error::InvalidFormat)));
    }

    #[test]
    fn test_plaintext_algorithm_is_identity() {
        let key = SymmetricKey::plaintext();
        let mut cipher = SymmetricCipher::new(&key).unwrap();
        assert_eq!(cipher.encrypt(b"clear").unwrap(), b"clear");
        assert_eq!(cipher.decrypt(b"clear").unwrap(), b"clear");
    }

    #[test]
    fn test_debug_redacts_key() {
        let key = generate_key(SymmetricAlgorithm::Aes256Gcm).unwrap();
        let debug = format!("{key:?}");
        assert!(!debug.contains(&BASE64.encode(key.key_bytes())));
        assert!(debug.contains("fingerprint"));
    }
}
