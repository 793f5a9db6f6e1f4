//! # Cryptography Module
//!
//! Symmetric primitives and the utility layer built on them.
//!
//! ## Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        CRYPTO SUBSYSTEM                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  cipher       SymmetricAlgorithm / SymmetricKey / SymmetricCipher      │
//! │               AES-128/256-GCM, ChaCha20-Poly1305, and the no-op        │
//! │               Plaintext algorithm. Counter-derived nonces.             │
//! │                                                                         │
//! │  random       OS-random bytes, 4-/8-byte salts, bounded padding,       │
//! │               fresh key generation.                                    │
//! │                                                                         │
//! │  kdf          PBKDF2-HMAC-SHA256 password-derived keys, with the       │
//! │               preserved weak compatibility defaults.                   │
//! │                                                                         │
//! │  salted       Encrypt/decrypt passes that blind short plaintexts       │
//! │               with 4 or 8 bytes of random salt.                        │
//! │                                                                         │
//! │  credentials  The "casual" {realm, account, password} envelope over    │
//! │               an explicit codec key.                                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here is synchronous and allocation-light. `SymmetricCipher`
//! instances are single-operation; the free functions are safe for
//! concurrent callers.

pub mod cipher;
pub mod credentials;
pub mod kdf;
pub mod random;
pub mod salted;

pub use cipher::{SymmetricAlgorithm, SymmetricCipher, SymmetricKey, NONCE_SIZE, TAG_SIZE};
pub use credentials::{CredentialCodec, Credentials};
pub use kdf::{derive_key, DEFAULT_ITERATIONS, FALLBACK_SALT, MIN_SALT_LEN};
pub use random::{generate_key, random_bytes, random_padding, salt4, salt8};
pub use salted::{decrypt_salted4, decrypt_salted8, encrypt_salted4, encrypt_salted8};
