//! # Salted Encryption Helpers
//!
//! Convenience encrypt/decrypt passes that prepend 4 or 8 bytes of random
//! salt to the plaintext before encrypting and strip it after decrypting.
//!
//! The salt defeats ciphertext-only frequency analysis for short, repeated
//! plaintexts: two encryptions of the same bytes under the same key never
//! share a ciphertext prefix.

use zeroize::Zeroize;

use crate::crypto::cipher::{SymmetricCipher, SymmetricKey};
use crate::crypto::random::{salt4, salt8, SALT4_SIZE, SALT8_SIZE};
use crate::error::{Error, Result};

fn encrypt_salted(key: &SymmetricKey, salt: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut salted = Vec::with_capacity(salt.len() + plaintext.len());
    salted.extend_from_slice(salt);
    salted.extend_from_slice(plaintext);
    let result = SymmetricCipher::new(key)?.encrypt(&salted);
    salted.zeroize();
    result
}

fn decrypt_salted(key: &SymmetricKey, salt_len: usize, ciphertext: &[u8]) -> Result<Vec<u8>> {
    let mut salted = SymmetricCipher::new(key)?.decrypt(ciphertext)?;
    if salted.len() < salt_len {
        salted.zeroize();
        tracing::debug!("salted payload shorter than its salt");
        return Err(Error::InvalidFormat);
    }
    let plaintext = salted[salt_len..].to_vec();
    salted.zeroize();
    Ok(plaintext)
}

/// Encrypt with 4 bytes of random salt prepended.
pub fn encrypt_salted4(key: &SymmetricKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    encrypt_salted(key, &salt4(), plaintext)
}

/// Decrypt and strip the 4-byte salt.
pub fn decrypt_salted4(key: &SymmetricKey, ciphertext: &[u8]) -> Result<Vec<u8>> {
    decrypt_salted(key, SALT4_SIZE, ciphertext)
}

/// Encrypt with 8 bytes of random salt prepended.
pub fn encrypt_salted8(key: &SymmetricKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    encrypt_salted(key, &salt8(), plaintext)
}

/// Decrypt and strip the 8-byte salt.
pub fn decrypt_salted8(key: &SymmetricKey, ciphertext: &[u8]) -> Result<Vec<u8>> {
    decrypt_salted(key, SALT8_SIZE, ciphertext)
}

// ============================================================================
// TESTS
// ============================================================================
