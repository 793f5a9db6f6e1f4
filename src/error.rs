//! # Error Handling
//!
//! Crate-wide error types.
//!
//! ## Error Categories
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR CATEGORIES                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Configuration  - Unknown algorithm, bad parameters. Raised             │
//! │                   synchronously at call time with full detail.          │
//! │                                                                         │
//! │  Format         - Bad magic, wrong version, digest mismatch,            │
//! │                   unwrap failure. Always the single generic             │
//! │                   `InvalidFormat` so a caller (or attacker) cannot      │
//! │                   tell which check failed.                              │
//! │                                                                         │
//! │  Credential     - Generic `AccessDenied`, deliberately opaque.          │
//! │                                                                         │
//! │  Ticket         - Generic `InvalidTicket`, deliberately opaque.         │
//! │                                                                         │
//! │  Lookup / I/O   - `KeyNotFound`, `Io`. Ordinary detail-carrying         │
//! │                   errors with no oracle concerns.                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The opaque variants intentionally carry no payload. Components that map a
//! low-level failure onto one of them log the original cause at `debug`
//! level first, so diagnostics stay available without leaking through the
//! error value itself.

use thiserror::Error;

/// Result type alias for sealkit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for sealkit
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Algorithm name not recognized
    #[error("Unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    /// Invalid parameter (wrong key size, bad salt length, out-of-range value)
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Key material could not be parsed or has the wrong form
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    // ========================================================================
    // Opaque Errors (deliberately detail-free, see module docs)
    // ========================================================================
    /// Container, key chain, or envelope bytes are invalid or corrupt.
    ///
    /// Covers bad magic, unsupported version, malformed sections, digest
    /// mismatch, and unwrap-with-wrong-key, indistinguishably.
    #[error("Invalid or corrupt encrypted data")]
    InvalidFormat,

    /// Credential envelope could not be opened
    #[error("Access denied")]
    AccessDenied,

    /// Ticket bytes could not be parsed or decrypted
    #[error("Invalid ticket")]
    InvalidTicket,

    // ========================================================================
    // Lookup / I/O Errors
    // ========================================================================
    /// No matching key in the key chain or key store
    #[error("Key not found")]
    KeyNotFound,

    /// Underlying stream or file I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ========================================================================
    // Internal Errors
    // ========================================================================
    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error is one of the deliberately opaque variants.
    ///
    /// Opaque errors are safe to show to untrusted callers; everything they
    /// could reveal has already been stripped.
    pub fn is_opaque(&self) -> bool {
        matches!(
            self,
            Error::InvalidFormat | Error::AccessDenied | Error::InvalidTicket
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================
