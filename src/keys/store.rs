//! # Secure Key Store Capability
//!
//! The external named-key-store collaborator, modeled as an injectable
//! trait so the envelope layer can resolve store references without
//! knowing what backs them (OS keychain, HSM, a file — or a test map).

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::keys::keypair::{InlineKey, KeyRef};

/// A named store of key strings.
///
/// Entries are addressed by `name` plus an optional `provider` identifier.
/// Implementations must be safe for concurrent callers.
pub trait KeyStore: Send + Sync {
    /// Load the key string stored under `name`.
    fn load(&self, name: &str, provider: Option<&str>) -> Result<String>;

    /// Store `key` under `name`, replacing any existing entry.
    fn save(&self, name: &str, provider: Option<&str>, key: &str) -> Result<()>;

    /// Delete the entry under `name`. Missing entries are not an error.
    fn delete(&self, name: &str, provider: Option<&str>) -> Result<()>;
}

/// In-memory [`KeyStore`] for tests and ephemeral use.
#[derive(Default)]
pub struct MemoryKeyStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryKeyStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(name: &str, provider: Option<&str>) -> String {
        match provider {
            Some(p) => format!("{name}@{p}"),
            None => name.to_string(),
        }
    }
}

impl KeyStore for MemoryKeyStore {
    fn load(&self, name: &str, provider: Option<&str>) -> Result<String> {
        self.entries
            .read()
            .get(&Self::slot(name, provider))
            .cloned()
            .ok_or(Error::KeyNotFound)
    }

    fn save(&self, name: &str, provider: Option<&str>, key: &str) -> Result<()> {
        self.entries
            .write()
            .insert(Self::slot(name, provider), key.to_string());
        Ok(())
    }

    fn delete(&self, name: &str, provider: Option<&str>) -> Result<()> {
        self.entries.write().remove(&Self::slot(name, provider));
        Ok(())
    }
}

/// Resolve a key reference to inline material.
///
/// Inline references resolve to themselves. Store references are loaded
/// through `store` and the loaded string must itself be inline material —
/// stores may not chain to further store references.
pub fn resolve(key_ref: &KeyRef, store: Option<&dyn KeyStore>) -> Result<InlineKey> {
    match key_ref {
        KeyRef::Inline(inline) => Ok(inline.clone()),
        KeyRef::Store { name, provider } => {
            let store = store.ok_or_else(|| {
                Error::InvalidKey(format!(
                    "key reference {name:?} names a store entry but no key store was supplied"
                ))
            })?;
            let loaded = store.load(name, provider.as_deref())?;
            InlineKey::parse(&loaded)
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::keypair::PrivateKey;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryKeyStore::new();
        store.save("backup", None, "value").unwrap();
        assert_eq!(store.load("backup", None).unwrap(), "value");
        store.delete("backup", None).unwrap();
        assert!(matches!(
            store.load("backup", None),
            Err(Error::KeyNotFound)
        ));
    }

    #[test]
    fn test_providers_are_separate_namespaces() {
        let store = MemoryKeyStore::new();
        store.save("k", Some("hsm1"), "one").unwrap();
        store.save("k", Some("hsm2"), "two").unwrap();
        assert_eq!(store.load("k", Some("hsm1")).unwrap(), "one");
        assert_eq!(store.load("k", Some("hsm2")).unwrap(), "two");
        assert!(store.load("k", None).is_err());
    }

    #[test]
    fn test_delete_missing_is_silent() {
        let store = MemoryKeyStore::new();
        store.delete("never-existed", None).unwrap();
    }

    #[test]
    fn test_resolve_inline_passthrough() {
        let sk = PrivateKey::generate();
        let key_ref = KeyRef::parse(&sk.encode()).unwrap();
        let resolved = resolve(&key_ref, None).unwrap();
        assert_eq!(resolved.public_key(), sk.public_key());
    }

    #[test]
    fn test_resolve_store_reference() {
        let sk = PrivateKey::generate();
        let store = MemoryKeyStore::new();
        store.save("mykey", None, &sk.encode()).unwrap();

        let key_ref = KeyRef::parse("mykey").unwrap();
        let resolved = resolve(&key_ref, Some(&store)).unwrap();
        assert_eq!(resolved.public_key(), sk.public_key());
    }

    #[test]
    fn test_resolve_store_reference_without_store_fails() {
        let key_ref = KeyRef::parse("mykey").unwrap();
        assert!(matches!(
            resolve(&key_ref, None),
            Err(Error::InvalidKey(_))
        ));
    }

    #[test]
    fn test_resolve_rejects_non_inline_store_content() {
        let store = MemoryKeyStore::new();
        store.save("alias", None, "another-name").unwrap();
        let key_ref = KeyRef::parse("alias").unwrap();
        assert!(matches!(
            resolve(&key_ref, Some(&store)),
            Err(Error::InvalidKey(_))
        ));
    }
}
