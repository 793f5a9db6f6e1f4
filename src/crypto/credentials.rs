//! # Casual Credential Envelope
//!
//! Lightweight obfuscated storage for `{realm, account, password}` triples.
//!
//! "Casual" is deliberate: the built-in default key ships with every copy of
//! this library, so the default envelope only defends against shoulder-surfing
//! a config file, not against an attacker who has the binary. Construct the
//! codec with your own [`SymmetricKey`] for anything stronger.
//!
//! ## Failure Policy
//!
//! `open` never explains itself. Whatever went wrong — wrong key, truncated
//! bytes, bad magic, mangled UTF-8 — the caller sees [`Error::AccessDenied`]
//! and nothing else, so the envelope cannot be used as a decryption oracle.

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::cipher::{SymmetricAlgorithm, SymmetricKey};
use crate::crypto::salted::{decrypt_salted8, encrypt_salted8};
use crate::error::{Error, Result};
use crate::wire::{self, CREDENTIAL_MAGIC};

/// A credential triple.
///
/// The password buffer is zeroized when the value drops.
#[derive(Clone, ZeroizeOnDrop)]
pub struct Credentials {
    /// Realm or service the credential applies to
    #[zeroize(skip)]
    pub realm: String,
    /// Account / user name
    #[zeroize(skip)]
    pub account: String,
    /// Secret
    pub password: String,
}

impl Credentials {
    /// Build a credential triple.
    pub fn new(
        realm: impl Into<String>,
        account: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            realm: realm.into(),
            account: account.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("realm", &self.realm)
            .field("account", &self.account)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Encrypts and decrypts credential envelopes under an explicit key.
///
/// The key is ordinary owned state, passed in at construction. There is no
/// process-wide default that callers mutate; code that wants the historical
/// shared-key behavior opts in through [`CredentialCodec::with_default_key`].
pub struct CredentialCodec {
    key: SymmetricKey,
}

// Built-in key material for `with_default_key`. Compatibility obfuscation
// only; see module docs.
const DEFAULT_KEY: [u8; 32] = [
    0x9A, 0x1F, 0x5D, 0xC3, 0x27, 0x88, 0x41, 0xEE, 0x60, 0x0B, 0xB4, 0x72, 0xD9, 0x35, 0xAC,
    0x07, 0x58, 0xE1, 0x93, 0x4A, 0xF6, 0x2C, 0x81, 0xBD, 0x14, 0x6F, 0xCA, 0x39, 0xE7, 0x50,
    0x0D, 0x96,
];
const DEFAULT_IV: [u8; 12] = [
    0x33, 0xA8, 0x11, 0xE4, 0x7C, 0x09, 0xD2, 0x5B, 0xC6, 0x1D, 0x8F, 0x62,
];

impl CredentialCodec {
    /// Codec over a caller-supplied key.
    pub fn new(key: SymmetricKey) -> Self {
        Self { key }
    }

    /// Codec over the built-in shared key (compatibility only).
    pub fn with_default_key() -> Self {
        let key = SymmetricKey::new(
            SymmetricAlgorithm::Aes256Gcm,
            DEFAULT_KEY.to_vec(),
            DEFAULT_IV.to_vec(),
        )
        .expect("built-in key material has the correct sizes");
        Self { key }
    }

    /// Serialize and encrypt a credential triple.
    pub fn seal(&self, credentials: &Credentials) -> Result<Vec<u8>> {
        let mut plain = Vec::with_capacity(
            4 + 6
                + credentials.realm.len()
                + credentials.account.len()
                + credentials.password.len(),
        );
        plain.extend_from_slice(&CREDENTIAL_MAGIC.to_be_bytes());
        wire::put_str16(&mut plain, &credentials.realm)?;
        wire::put_str16(&mut plain, &credentials.account)?;
        wire::put_str16(&mut plain, &credentials.password)?;
        let sealed = encrypt_salted8(&self.key, &plain);
        plain.zeroize();
        sealed
    }

    /// Decrypt and parse a credential envelope.
    ///
    /// Any failure at all surfaces as [`Error::AccessDenied`].
    pub fn open(&self, bytes: &[u8]) -> Result<Credentials> {
        self.open_inner(bytes).map_err(|e| {
            tracing::debug!(cause = %e, "credential envelope rejected");
            Error::AccessDenied
        })
    }

    fn open_inner(&self, bytes: &[u8]) -> Result<Credentials> {
        let mut plain = decrypt_salted8(&self.key, bytes)?;
        let parsed = (|| {
            let mut cursor = plain.as_slice();
            if wire::get_u32(&mut cursor)? != CREDENTIAL_MAGIC {
                return Err(Error::InvalidFormat);
            }
            let realm = wire::get_str16(&mut cursor)?;
            let account = wire::get_str16(&mut cursor)?;
            let password = wire::get_str16(&mut cursor)?;
            Ok(Credentials {
                realm,
                account,
                password,
            })
        })();
        plain.zeroize();
        parsed
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
    fn test_round_trip_with_explicit_key() {
        let codec = CredentialCodec::new(generate_key(SymmetricAlgorithm::Aes256Gcm).unwrap());
        let creds = Credentials::new("mail.example.com", "alice", "hunter2");
        let sealed = codec.seal(&creds).unwrap();
        let opened = codec.open(&sealed).unwrap();
        assert_eq!(opened.realm, "mail.example.com");
        assert_eq!(opened.account, "alice");
        assert_eq!(opened.password, "hunter2");
    }

    #[test]
    fn test_round_trip_with_default_key() {
        let codec = CredentialCodec::with_default_key();
        let creds = Credentials::new("r", "a", "p");
        let sealed = codec.seal(&creds).unwrap();
        assert_eq!(codec.open(&sealed).unwrap().password, "p");
    }

    #[test]
    fn test_wrong_key_is_access_denied() {
        let codec = CredentialCodec::new(generate_key(SymmetricAlgorithm::Aes256Gcm).unwrap());
        let other = CredentialCodec::with_default_key();
        let sealed = codec.seal(&Credentials::new("r", "a", "p")).unwrap();
        assert!(matches!(other.open(&sealed), Err(Error::AccessDenied)));
    }

    #[test]
    fn test_garbage_is_access_denied() {
        let codec = CredentialCodec::with_default_key();
        assert!(matches!(codec.open(b"junk"), Err(Error::AccessDenied)));
        assert!(matches!(codec.open(b""), Err(Error::AccessDenied)));
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = Credentials::new("r", "a", "s3cret");
        let debug = format!("{creds:?}");
        assert!(!debug.contains("s3cret"));
    }
}
