//! # Asymmetric Key Abstraction
//!
//! X25519 key material, self-describing key encodings, the named
//! key-store capability, and envelope wrap/unwrap operations.
//!
//! - [`keypair`] — key types, inline encodings, [`KeyRef`] classification
//! - [`store`] — the injectable [`KeyStore`] capability and reference
//!   resolution
//! - [`envelope`] — seal/open under a public/private key or a key
//!   reference

pub mod envelope;
pub mod keypair;
pub mod store;

pub use envelope::{open, open_with_ref, seal, seal_with_ref, AsymmetricAlgorithm};
pub use keypair::{public_keys_equal, InlineKey, KeyKind, KeyRef, PrivateKey, PublicKey};
pub use store::{resolve, KeyStore, MemoryKeyStore};
