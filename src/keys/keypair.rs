//! # Key Material and Key References
//!
//! X25519 keypairs, their self-describing text encodings, and the one-time
//! classification of key strings into inline material versus named
//! key-store references.
//!
//! ## Inline Encodings
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        KEY STRING FORMS                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  sealkit:sec:3Kf9...      Inline private key (base58 of 32 bytes)      │
//! │  sealkit:pub:9hQz...      Inline public key  (base58 of 32 bytes)      │
//! │  backup-key-2024          Key store entry name                         │
//! │  backup-key-2024@hsm1     Key store entry name with provider           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Classification happens exactly once, at [`KeyRef::parse`]: the
//! `sealkit:` marker selects inline material; anything else must be a
//! well-formed store name (1–64 chars of letters, digits, dot, dash).
//! Nothing downstream re-sniffs strings.

use std::fmt;

use rand::rngs::OsRng;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::ZeroizeOnDrop;

use crate::error::{Error, Result};

/// Marker shared by all inline key encodings
pub const INLINE_MARKER: &str = "sealkit:";

/// Prefix of an inline private key
pub const PRIVATE_KEY_PREFIX: &str = "sealkit:sec:";

/// Prefix of an inline public key
pub const PUBLIC_KEY_PREFIX: &str = "sealkit:pub:";

/// Maximum length of a key store entry name
pub const MAX_STORE_NAME_LEN: usize = 64;

/// An X25519 private key
///
/// ## Security
///
/// The secret scalar is zeroized when this struct is dropped
/// (`x25519_dalek::StaticSecret` handles its own zeroization).
#[derive(Clone, ZeroizeOnDrop)]
pub struct PrivateKey {
    #[zeroize(skip)]
    secret: StaticSecret,
}

impl PrivateKey {
    /// Generate a fresh private key from the OS CSPRNG.
    pub fn generate() -> Self {
        Self {
            secret: StaticSecret::random_from_rng(OsRng),
        }
    }

    /// Rebuild from raw scalar bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self {
            secret: StaticSecret::from(bytes),
        }
    }

    /// The matching public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(X25519PublicKey::from(&self.secret).to_bytes())
    }

    /// Raw scalar bytes (for secure storage only — never log these).
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.secret.to_bytes()
    }

    /// Diffie-Hellman against a public key.
    pub(crate) fn diffie_hellman(&self, their_public: &PublicKey) -> [u8; 32] {
        self.secret
            .diffie_hellman(&X25519PublicKey::from(their_public.0))
            .to_bytes()
    }

    /// Inline text encoding (`sealkit:sec:` + base58).
    pub fn encode(&self) -> String {
        format!(
            "{PRIVATE_KEY_PREFIX}{}",
            bs58::encode(self.secret.to_bytes()).into_string()
        )
    }

    /// Parse an inline private key encoding.
    pub fn from_encoded(s: &str) -> Result<Self> {
        let payload = s
            .trim()
            .strip_prefix(PRIVATE_KEY_PREFIX)
            .ok_or_else(|| Error::InvalidKey("not an inline private key".into()))?;
        Ok(Self::from_bytes(decode_base58_32(payload)?))
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public", &self.public_key().fingerprint())
            .finish()
    }
}

/// An X25519 public key
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; 32]);

impl PublicKey {
    /// Rebuild from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Inline text encoding (`sealkit:pub:` + base58).
    pub fn encode(&self) -> String {
        format!(
            "{PUBLIC_KEY_PREFIX}{}",
            bs58::encode(self.0).into_string()
        )
    }

    /// Parse an inline public key encoding.
    pub fn from_encoded(s: &str) -> Result<Self> {
        let payload = s
            .trim()
            .strip_prefix(PUBLIC_KEY_PREFIX)
            .ok_or_else(|| Error::InvalidKey("not an inline public key".into()))?;
        Ok(Self(decode_base58_32(payload)?))
    }

    /// Short hex fingerprint for logs and Debug output.
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        hex::encode(&Sha256::digest(self.0)[..6])
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.fingerprint())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

fn decode_base58_32(payload: &str) -> Result<[u8; 32]> {
    let bytes = bs58::decode(payload)
        .into_vec()
        .map_err(|e| Error::InvalidKey(format!("bad base58 key payload: {e}")))?;
    bytes
        .try_into()
        .map_err(|_| Error::InvalidKey("key payload must decode to 32 bytes".into()))
}

/// Inline key material: a parsed private or public key
#[derive(Clone, Debug)]
pub enum InlineKey {
    /// A private key (implies knowledge of the public key)
    Private(PrivateKey),
    /// A public key only
    Public(PublicKey),
}

impl InlineKey {
    /// Parse an inline encoding of either polarity.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.starts_with(PRIVATE_KEY_PREFIX) {
            Ok(InlineKey::Private(PrivateKey::from_encoded(s)?))
        } else if s.starts_with(PUBLIC_KEY_PREFIX) {
            Ok(InlineKey::Public(PublicKey::from_encoded(s)?))
        } else {
            // Truncate on char boundaries; the input is untrusted.
            let preview: String = s.chars().take(12).collect();
            Err(Error::InvalidKey(format!(
                "unrecognized inline key marker in {preview:?}..."
            )))
        }
    }

    /// The public half, derived when this is a private key.
    pub fn public_key(&self) -> PublicKey {
        match self {
            InlineKey::Private(sk) => sk.public_key(),
            InlineKey::Public(pk) => *pk,
        }
    }
}

/// How a key string classifies
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyKind {
    /// Inline private key material
    Private,
    /// Inline public key material
    Public,
    /// A named key store entry, polarity unknown until resolved
    StoreReference,
}

/// A classified key reference
///
/// Parse once at the boundary where a key string enters the system; pass
/// the parsed value around instead of re-classifying the raw string.
#[derive(Clone, Debug)]
pub enum KeyRef {
    /// Inline key material carried in the string itself
    Inline(InlineKey),
    /// A named entry in an external secure key store
    Store {
        /// Entry name (1–64 chars of `[A-Za-z0-9.-]`)
        name: String,
        /// Optional store/provider identifier
        provider: Option<String>,
    },
}

impl KeyRef {
    /// Classify and parse a key string.
    ///
    /// The `sealkit:` marker selects inline parsing; anything else must be
    /// a well-formed store name, optionally suffixed `@provider`.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.starts_with(INLINE_MARKER) {
            return Ok(KeyRef::Inline(InlineKey::parse(s)?));
        }
        let (name, provider) = match s.split_once('@') {
            Some((n, p)) => (n, Some(p)),
            None => (s, None),
        };
        if !is_valid_store_name(name) {
            return Err(Error::InvalidKey(format!(
                "malformed key store name {name:?}"
            )));
        }
        if let Some(p) = provider {
            if !is_valid_store_name(p) {
                return Err(Error::InvalidKey(format!(
                    "malformed key store provider {p:?}"
                )));
            }
        }
        Ok(KeyRef::Store {
            name: name.to_string(),
            provider: provider.map(str::to_string),
        })
    }

    /// Structural classification of this reference.
    pub fn kind(&self) -> KeyKind {
        match self {
            KeyRef::Inline(InlineKey::Private(_)) => KeyKind::Private,
            KeyRef::Inline(InlineKey::Public(_)) => KeyKind::Public,
            KeyRef::Store { .. } => KeyKind::StoreReference,
        }
    }
}

/// Store names: 1–64 chars, letters/digits/dot/dash only.
fn is_valid_store_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_STORE_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
}

/// Compare two inline public key encodings after stripping whitespace.
pub fn public_keys_equal(a: &str, b: &str) -> bool {
    let strip = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
    strip(a) == strip(b)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_and_derive_public() {
        let sk = PrivateKey::generate();
        let pk1 = sk.public_key();
        let pk2 = sk.public_key();
        assert_eq!(pk1, pk2);
    }

    #[test]
    fn test_private_key_encoding_round_trip() {
        let sk = PrivateKey::generate();
        let encoded = sk.encode();
        assert!(encoded.starts_with(PRIVATE_KEY_PREFIX));
        let restored = PrivateKey::from_encoded(&encoded).unwrap();
        assert_eq!(restored.public_key(), sk.public_key());
    }

    #[test]
    fn test_public_key_encoding_round_trip() {
        let pk = PrivateKey::generate().public_key();
        let restored = PublicKey::from_encoded(&pk.encode()).unwrap();
        assert_eq!(restored, pk);
    }

    #[test]
    fn test_classification() {
        let sk = PrivateKey::generate();
        assert_eq!(KeyRef::parse(&sk.encode()).unwrap().kind(), KeyKind::Private);
        assert_eq!(
            KeyRef::parse(&sk.public_key().encode()).unwrap().kind(),
            KeyKind::Public
        );
        assert_eq!(
            KeyRef::parse("backup-key.2024").unwrap().kind(),
            KeyKind::StoreReference
        );
        assert_eq!(
            KeyRef::parse("backup-key@hsm1").unwrap().kind(),
            KeyKind::StoreReference
        );
    }

    #[test]
    fn test_malformed_store_names_rejected() {
        for bad in ["", "has space", "semi;colon", "slash/name", &"x".repeat(65)] {
            assert!(
                matches!(KeyRef::parse(bad), Err(Error::InvalidKey(_))),
                "expected rejection of {bad:?}"
            );
        }
    }

    #[test]
    fn test_unknown_inline_marker_rejected() {
        assert!(matches!(
            KeyRef::parse("sealkit:xyz:abcdef"),
            Err(Error::InvalidKey(_))
        ));
    }

    #[test]
    fn test_multibyte_inline_marker_rejected() {
        // Multi-byte characters near the truncation point must not
        // break error construction.
        for bad in ["sealkit:€€€€", "sealkit:ααααααααα", "sealkit:日本語の鍵"] {
            assert!(matches!(
                KeyRef::parse(bad),
                Err(Error::InvalidKey(_))
            ));
        }
    }

    #[test]
    fn test_truncated_inline_payload_rejected() {
        assert!(matches!(
            PublicKey::from_encoded("sealkit:pub:abc"),
            Err(Error::InvalidKey(_))
        ));
    }

    #[test]
    fn test_public_keys_equal_ignores_whitespace() {
        let pk = PrivateKey::generate().public_key().encode();
        let spaced = format!("  {}\n", pk);
        assert!(public_keys_equal(&pk, &spaced));
        let other = PrivateKey::generate().public_key().encode();
        assert!(!public_keys_equal(&pk, &other));
    }

    #[test]
    fn test_debug_never_prints_secret() {
        let sk = PrivateKey::generate();
        let debug = format!("{sk:?}");
        assert!(!debug.contains(&bs58::encode(sk.secret_bytes()).into_string()));
    }
}
