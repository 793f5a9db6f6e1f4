//! # Randomness Helpers
//!
//! Cryptographically-secure random bytes, fixed-size salts, bounded random
//! padding, and fresh symmetric key generation.
//!
//! All helpers draw from the operating system CSPRNG (`OsRng`) and are safe
//! for concurrent callers.

use rand::rngs::OsRng;
use rand::{Rng, RngCore};

use crate::crypto::cipher::{SymmetricAlgorithm, SymmetricKey};
use crate::error::Result;

/// Size of a short salt in bytes
pub const SALT4_SIZE: usize = 4;

/// Size of a long salt in bytes
pub const SALT8_SIZE: usize = 8;

/// Fill a fresh buffer with `len` random bytes.
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// 4 random salt bytes.
pub fn salt4() -> [u8; SALT4_SIZE] {
    let mut salt = [0u8; SALT4_SIZE];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// 8 random salt bytes.
pub fn salt8() -> [u8; SALT8_SIZE] {
    let mut salt = [0u8; SALT8_SIZE];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Random padding of random length in `1..=max_len`.
///
/// Used to blur plaintext lengths before encryption. `max_len == 0` yields
/// an empty buffer.
pub fn random_padding(max_len: usize) -> Vec<u8> {
    if max_len == 0 {
        return Vec::new();
    }
    let len = OsRng.gen_range(1..=max_len);
    random_bytes(len)
}

/// Generate a fresh key and IV for `algorithm`.
///
/// The `Plaintext` algorithm yields the empty no-op key.
pub fn generate_key(algorithm: SymmetricAlgorithm) -> Result<SymmetricKey> {
    SymmetricKey::new(
        algorithm,
        random_bytes(algorithm.key_size()),
        random_bytes(algorithm.nonce_size()),
    )
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_bytes_len_and_variance() {
        let a = random_bytes(32);
        let b = random_bytes(32);
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
    }

    #[test]
    fn test_salt_sizes() {
        assert_eq!(salt4().len(), SALT4_SIZE);
        assert_eq!(salt8().len(), SALT8_SIZE);
    }

    #[test]
    fn test_random_padding_bounds() {
        assert!(random_padding(0).is_empty());
        for _ in 0..50 {
            let pad = random_padding(16);
            assert!((1..=16).contains(&pad.len()));
        }
    }

    #[test]
    fn test_generate_key_sizes() {
        for alg in SymmetricAlgorithm::ALL {
            let key = generate_key(alg).unwrap();
            assert_eq!(key.key_bytes().len(), alg.key_size());
            assert_eq!(key.iv_bytes().len(), alg.nonce_size());
        }
    }

    #[test]
    fn test_generated_keys_are_unique() {
        let a = generate_key(SymmetricAlgorithm::Aes256Gcm).unwrap();
        let b = generate_key(SymmetricAlgorithm::Aes256Gcm).unwrap();
        assert_ne!(a.key_bytes(), b.key_bytes());
    }
}
