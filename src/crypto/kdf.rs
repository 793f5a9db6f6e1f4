//! # Key Derivation Functions
//!
//! Password/secret-derived symmetric keys via PBKDF2-HMAC-SHA256.
//!
//! ## Compatibility Defaults
//!
//! The historical wire format this crate interoperates with used a very low
//! iteration count and a fixed fallback salt when the caller supplied none.
//! Both defaults are preserved here byte-for-byte so existing material keeps
//! round-tripping, but they are **inadequate against modern brute-force
//! hardware**. New deployments must pass their own salt (≥ 8 bytes) and an
//! iteration count in the hundreds of thousands. Using either default emits
//! a `tracing` warning.

use hmac::Hmac;
use pbkdf2::pbkdf2;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::crypto::cipher::{SymmetricAlgorithm, SymmetricKey};
use crate::error::{Error, Result};

/// Compatibility iteration count. Known-weak; see module docs.
pub const DEFAULT_ITERATIONS: u32 = 100;

/// Compatibility fallback salt. Known-weak; see module docs.
pub const FALLBACK_SALT: [u8; 8] = [0x73, 0x65, 0x61, 0x6C, 0x6B, 0x69, 0x74, 0x31]; // "sealkit1"

/// Minimum accepted caller-supplied salt length
pub const MIN_SALT_LEN: usize = 8;

/// Derive a symmetric key (key and IV) from a password or shared secret.
///
/// PBKDF2-HMAC-SHA256 stretches `secret` into `key_size + nonce_size`
/// output bytes, split into the key and the IV.
///
/// - `salt: None` falls back to [`FALLBACK_SALT`] (compatibility only).
/// - `iterations: None` falls back to [`DEFAULT_ITERATIONS`] (compatibility
///   only).
/// - A supplied salt shorter than [`MIN_SALT_LEN`] bytes is a configuration
///   error.
pub fn derive_key(
    algorithm: SymmetricAlgorithm,
    secret: &[u8],
    salt: Option<&[u8]>,
    iterations: Option<u32>,
) -> Result<SymmetricKey> {
    if algorithm == SymmetricAlgorithm::Plaintext {
        return Ok(SymmetricKey::plaintext());
    }
    let salt = match salt {
        Some(s) if s.len() < MIN_SALT_LEN => {
            return Err(Error::InvalidParameter(format!(
                "salt must be at least {MIN_SALT_LEN} bytes, got {}",
                s.len()
            )));
        }
        Some(s) => s,
        None => {
            tracing::warn!("derive_key called without a salt; using the weak built-in fallback");
            &FALLBACK_SALT[..]
        }
    };
    let iterations = match iterations {
        Some(0) => {
            return Err(Error::InvalidParameter(
                "iteration count must be at least 1".into(),
            ));
        }
        Some(n) => n,
        None => {
            tracing::warn!(
                iterations = DEFAULT_ITERATIONS,
                "derive_key called without an iteration count; using the weak default"
            );
            DEFAULT_ITERATIONS
        }
    };

    let mut output = vec![0u8; algorithm.key_size() + algorithm.nonce_size()];
    pbkdf2::<Hmac<Sha256>>(secret, salt, iterations, &mut output)
        .map_err(|_| Error::Internal("PBKDF2 expansion failed".into()))?;

    let key = output[..algorithm.key_size()].to_vec();
    let iv = output[algorithm.key_size()..].to_vec();
    output.zeroize();
    SymmetricKey::new(algorithm, key, iv)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_is_deterministic() {
        let a = derive_key(
            SymmetricAlgorithm::Aes256Gcm,
            b"correct horse battery staple",
            Some(b"static-salt"),
            Some(1000),
        )
        .unwrap();
        let b = derive_key(
            SymmetricAlgorithm::Aes256Gcm,
            b"correct horse battery staple",
            Some(b"static-salt"),
            Some(1000),
        )
        .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_salts_different_keys() {
        let a = derive_key(
            SymmetricAlgorithm::Aes256Gcm,
            b"secret",
            Some(b"salt-one!"),
            Some(100),
        )
        .unwrap();
        let b = derive_key(
            SymmetricAlgorithm::Aes256Gcm,
            b"secret",
            Some(b"salt-two!"),
            Some(100),
        )
        .unwrap();
        assert_ne!(a.key_bytes(), b.key_bytes());
    }

    #[test]
    fn test_fallback_defaults_stable() {
        // The compatibility defaults must keep producing the same key.
        let a = derive_key(SymmetricAlgorithm::Aes128Gcm, b"pw", None, None).unwrap();
        let b = derive_key(SymmetricAlgorithm::Aes128Gcm, b"pw", None, None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_short_salt_rejected() {
        let err = derive_key(
            SymmetricAlgorithm::Aes256Gcm,
            b"pw",
            Some(b"short"),
            Some(100),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let err = derive_key(SymmetricAlgorithm::Aes256Gcm, b"pw", None, Some(0)).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }

    #[test]
    fn test_plaintext_algorithm_short_circuits() {
        let key = derive_key(SymmetricAlgorithm::Plaintext, b"pw", None, None).unwrap();
        assert!(key.key_bytes().is_empty());
    }
}
