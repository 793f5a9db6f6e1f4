//! # Key Chain
//!
//! A thread-safe registry mapping normalized public keys to their matching
//! private keys, used to pick the right private key when a container
//! records which public key wrapped it.
//!
//! ## Serialized Form
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  KEY CHAIN ENCRYPTED LAYOUT                             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  plaintext:  magic:u32  count:u32  (len16:private-key-utf8)*count      │
//! │              salt:8                                                    │
//! │                                                                         │
//! │  ...encrypted in one symmetric pass (no asymmetric step).              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Opening with a mismatched key fails with the one generic format error;
//! the caller cannot tell whether the magic, the count, or an entry parse
//! was the first thing to break.

use std::collections::HashMap;

use parking_lot::RwLock;
use zeroize::Zeroize;

use crate::crypto::cipher::{SymmetricCipher, SymmetricKey};
use crate::crypto::random::salt8;
use crate::error::{Error, Result};
use crate::keys::keypair::{InlineKey, KeyRef, PrivateKey};
use crate::wire::{self, KEYCHAIN_MAGIC};

/// Thread-safe public-key → private-key registry.
///
/// All operations take the internal lock; concurrent callers always
/// observe a consistent mapping.
#[derive(Default)]
pub struct KeyChain {
    /// normalized public encoding → private encoding
    entries: RwLock<HashMap<String, String>>,
}

impl KeyChain {
    /// Empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain holding the given private keys.
    pub fn from_keys<I, S>(keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let chain = Self::new();
        for key in keys {
            chain.add(key.as_ref())?;
        }
        Ok(chain)
    }

    /// Normalize a query key to its public encoding.
    ///
    /// Accepts an inline private key (public half derived) or an inline
    /// public key. Store references are not resolvable here.
    fn normalize(query: &str) -> Result<String> {
        match KeyRef::parse(query)? {
            KeyRef::Inline(inline) => Ok(inline.public_key().encode()),
            KeyRef::Store { .. } => Err(Error::InvalidKey(
                "key chain queries require inline key material".into(),
            )),
        }
    }

    /// Add a private key. Fails if `private` is not a valid inline
    /// private key.
    pub fn add(&self, private: &str) -> Result<()> {
        let sk = PrivateKey::from_encoded(private.trim())?;
        self.entries
            .write()
            .insert(sk.public_key().encode(), sk.encode());
        Ok(())
    }

    /// Remove a key (by private or public form). No-op when absent.
    pub fn remove(&self, key: &str) -> Result<()> {
        let public = Self::normalize(key)?;
        self.entries.write().remove(&public);
        Ok(())
    }

    /// Look up the private key matching `query` (public or private form).
    pub fn get_private_key(&self, query: &str) -> Result<PrivateKey> {
        let public = Self::normalize(query)?;
        let entries = self.entries.read();
        let encoded = entries.get(&public).ok_or(Error::KeyNotFound)?;
        PrivateKey::from_encoded(encoded)
    }

    /// Number of keys held.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Remove every key.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Snapshot of the held private-key encodings.
    pub fn to_vec(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().values().cloned().collect();
        keys.sort();
        keys
    }

    /// Serialize the chain, encrypted under `key` in one symmetric pass.
    pub fn seal(&self, key: &SymmetricKey) -> Result<Vec<u8>> {
        let keys = self.to_vec();
        let mut plain = Vec::new();
        plain.extend_from_slice(&KEYCHAIN_MAGIC.to_be_bytes());
        plain.extend_from_slice(&(keys.len() as u32).to_be_bytes());
        for private in &keys {
            wire::put_str16(&mut plain, private)?;
        }
        plain.extend_from_slice(&salt8());

        let sealed = SymmetricCipher::new(key)?.encrypt(&plain);
        plain.zeroize();
        sealed
    }

    /// Reconstruct a chain from its encrypted serialization.
    ///
    /// Every failure — wrong key, bad magic, bad count, entry parse —
    /// surfaces as the one generic format error.
    pub fn open(key: &SymmetricKey, bytes: &[u8]) -> Result<Self> {
        let mut plain = SymmetricCipher::new(key)?.decrypt(bytes)?;
        let parsed = Self::parse_plain(&plain);
        plain.zeroize();
        parsed.map_err(|e| {
            tracing::debug!(cause = %e, "key chain rejected");
            Error::InvalidFormat
        })
    }

    fn parse_plain(plain: &[u8]) -> Result<Self> {
        let mut cursor = plain;
        if wire::get_u32(&mut cursor)? != KEYCHAIN_MAGIC {
            return Err(Error::InvalidFormat);
        }
        let count = wire::get_u32(&mut cursor)?;
        let chain = Self::new();
        for _ in 0..count {
            let encoded = wire::get_str16(&mut cursor)?;
            chain.add(&encoded).map_err(|_| Error::InvalidFormat)?;
        }
        // Exactly the trailing salt may remain.
        if cursor.len() != 8 {
            return Err(Error::InvalidFormat);
        }
        Ok(chain)
    }
}

impl std::fmt::Debug for KeyChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyChain")
            .field("len", &self.len())
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================
