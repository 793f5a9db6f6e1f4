//! # Sealkit
//!
//! A hybrid envelope-encryption library: symmetric ciphers, X25519 key
//! wrapping, key chains, secure containers for files and buffers, and
//! short-lived authorization tickets.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          SEALKIT MODULES                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────┐      │
//! │  │    Container     │  │    Key Chain     │  │      Ticket      │      │
//! │  │                  │  │                  │  │                  │      │
//! │  │ - File (stream)  │  │ - pub → priv map │  │ - Issue/claims   │      │
//! │  │ - Blob (1-shot)  │  │ - Encrypted save │  │ - Public section │      │
//! │  │ - Secure delete  │  │ - Thread-safe    │  │ - Expiry         │      │
//! │  └────────┬─────────┘  └────────┬─────────┘  └────────┬─────────┘      │
//! │           │                     │                     │                │
//! │           └─────────────────────┴─────────────────────┘                │
//! │                                 │                                       │
//! │  ┌──────────────────┐  ┌────────┴─────────┐                            │
//! │  │      Crypto      │  │       Keys       │                            │
//! │  │                  │  │                  │                            │
//! │  │ - AES-GCM        │  │ - X25519 pairs   │                            │
//! │  │ - ChaCha20       │  │ - Key refs       │                            │
//! │  │ - PBKDF2, salts  │  │ - Envelope wrap  │                            │
//! │  │ - Credentials    │  │ - Key stores     │                            │
//! │  └──────────────────┘  └──────────────────┘                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`crypto`] - Symmetric ciphers, randomness, key derivation, credentials
//! - [`keys`] - X25519 key material, key references, envelope wrap/unwrap
//! - [`keychain`] - Thread-safe public-to-private key registry
//! - [`container`] - Streamed and single-shot secure containers
//! - [`ticket`] - Partially-public time-limited authorization tokens
//!
//! ## Security Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          SECURITY LAYERS                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Layer 1: Payload Encryption (AES-GCM / ChaCha20-Poly1305)              │
//! │  ─────────────────────────────────────────────────────────              │
//! │  Every container encrypts its payload under a freshly generated        │
//! │  one-time symmetric key. A key never covers two containers.            │
//! │                                                                         │
//! │  Layer 2: Key Wrapping (X25519 + HKDF-SHA256 + AES-256-GCM)             │
//! │  ──────────────────────────────────────────────────────────             │
//! │  The one-time key travels inside the container, wrapped under the      │
//! │  recipient's public key via an ephemeral Diffie-Hellman exchange.      │
//! │                                                                         │
//! │  Layer 3: Integrity (SHA-512 digest over encrypted payload)             │
//! │  ──────────────────────────────────────────────────────────             │
//! │  Streamed containers carry a digest that is checked, in constant       │
//! │  time, before any byte is decrypted. Tampering is detected without     │
//! │  producing partial plaintext.                                          │
//! │                                                                         │
//! │  Layer 4: Opaque Failures                                               │
//! │  ────────────────────────                                               │
//! │  Wrong key, bad magic, flipped byte, truncation — all surface as       │
//! │  one generic error. Parsers never become decryption oracles. Causes    │
//! │  go to debug-level traces only.                                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Key material (symmetric keys, unwrapped key packages, decrypted
//! intermediate buffers) is zeroed on drop along every exit path.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod container;
pub mod crypto;
pub mod error;
pub mod keychain;
pub mod keys;
pub mod ticket;

mod wire;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use container::{
    open_bytes, peek_public_key, seal_bytes, secure_delete, FileMetadata, FileOpener, FileSealer,
    KeySource,
};
pub use crypto::cipher::{SymmetricAlgorithm, SymmetricCipher, SymmetricKey};
pub use error::{Error, Result};
pub use keychain::KeyChain;
pub use keys::{AsymmetricAlgorithm, KeyRef, KeyStore, PrivateKey, PublicKey};
pub use ticket::SecureTicket;
