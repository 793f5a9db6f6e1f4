//! # Secure Ticket
//!
//! A short, time-limited, partially-public authorization token.
//!
//! ## Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SECURE TICKET LAYOUT                             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  len16: encrypted private section                                      │
//! │         salted pass over "name=value" lines:                           │
//! │           resource, lifespan, expires, every custom claim              │
//! │  len16: plaintext public section                                       │
//! │         "name=value" lines: resource, lifespan only                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The public section lets the ticket *holder* read the resource and
//! lifespan — enough to schedule renewal — without the symmetric key. Only
//! the issuer, holding the key, can read or trust the full claim set; the
//! issuer-side expiration inside the private section is the only value
//! authorization decisions may use.
//!
//! Claim names are case-insensitive. Lifespans serialize at whole-second
//! granularity.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use zeroize::Zeroize;

use crate::crypto::cipher::SymmetricKey;
use crate::crypto::salted::{decrypt_salted8, encrypt_salted8};
use crate::error::{Error, Result};
use crate::wire;

/// Claim name carrying the resource identifier
pub const CLAIM_RESOURCE: &str = "resource";

/// Claim name carrying the lifespan in seconds
pub const CLAIM_LIFESPAN: &str = "lifespan";

/// Claim name carrying the issuer-side expiration (unix seconds)
pub const CLAIM_EXPIRES: &str = "expires";

const RESERVED_CLAIMS: [&str; 3] = [CLAIM_RESOURCE, CLAIM_LIFESPAN, CLAIM_EXPIRES];

/// A time-limited authorization token with a public and a private face
///
/// Not thread-safe; one instance per logical operation.
#[derive(Clone)]
pub struct SecureTicket {
    resource: String,
    lifespan: Duration,
    /// Authoritative expiration, set at issue time. Absent on tickets
    /// reconstructed from the public section alone.
    issuer_expires_at: Option<SystemTime>,
    /// Local estimate recomputed at parse time, for renewal scheduling
    client_expires_at: Option<SystemTime>,
    /// lowercase name → value
    claims: HashMap<String, String>,
}

impl SecureTicket {
    /// Issue a ticket for `resource`, expiring `lifespan` from now.
    pub fn issue(resource: &str, lifespan: Duration) -> Result<Self> {
        validate_value(resource)?;
        let expires_at = SystemTime::now().checked_add(lifespan).ok_or_else(|| {
            Error::InvalidParameter("lifespan overflows the representable time range".into())
        })?;
        Ok(Self {
            resource: resource.to_string(),
            lifespan,
            issuer_expires_at: Some(expires_at),
            client_expires_at: None,
            claims: HashMap::new(),
        })
    }

    /// The resource this ticket authorizes.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// The lifespan the ticket was issued with.
    pub fn lifespan(&self) -> Duration {
        self.lifespan
    }

    /// Authoritative expiration. `None` on client-side parses, which
    /// never see the private section.
    pub fn issuer_expires_at(&self) -> Option<SystemTime> {
        self.issuer_expires_at
    }

    /// Local expiration estimate (now + lifespan at parse time).
    /// Informational only — never use it for authorization.
    pub fn client_expires_at(&self) -> Option<SystemTime> {
        self.client_expires_at
    }

    /// Whether the issuer-side expiration has passed.
    pub fn is_expired(&self) -> bool {
        match self.issuer_expires_at {
            Some(at) => SystemTime::now() >= at,
            None => false,
        }
    }

    /// Read a custom claim. Names are case-insensitive.
    pub fn get_claim(&self, name: &str) -> Option<&str> {
        self.claims
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Set a custom claim, replacing any previous value.
    ///
    /// Reserved names (`resource`, `lifespan`, `expires`) are rejected,
    /// as are names containing `=` or either side containing a newline.
    pub fn set_claim(&mut self, name: &str, value: &str) -> Result<()> {
        let lower = name.to_ascii_lowercase();
        if RESERVED_CLAIMS.contains(&lower.as_str()) {
            return Err(Error::InvalidParameter(format!(
                "claim name {name:?} is reserved"
            )));
        }
        if lower.is_empty() || lower.contains('=') || lower.contains('\n') {
            return Err(Error::InvalidParameter(format!(
                "malformed claim name {name:?}"
            )));
        }
        validate_value(value)?;
        self.claims.insert(lower, value.to_string());
        Ok(())
    }

    /// Remove a custom claim. No-op when absent.
    pub fn remove_claim(&mut self, name: &str) {
        self.claims.remove(&name.to_ascii_lowercase());
    }

    /// Serialize the ticket: private section encrypted under `key`, then
    /// the plaintext public section.
    pub fn to_bytes(&self, key: &SymmetricKey) -> Result<Vec<u8>> {
        let expires = self
            .issuer_expires_at
            .ok_or_else(|| {
                Error::InvalidParameter(
                    "a client-side ticket carries no issuer expiration and cannot be serialized"
                        .into(),
                )
            })?
            .duration_since(UNIX_EPOCH)
            .map_err(|_| Error::InvalidParameter("ticket expires before the unix epoch".into()))?
            .as_secs();

        let mut names: Vec<&str> = self.claims.keys().map(String::as_str).collect();
        names.sort_unstable();
        let mut private = format!(
            "{CLAIM_RESOURCE}={}\n{CLAIM_LIFESPAN}={}\n{CLAIM_EXPIRES}={}",
            self.resource,
            self.lifespan.as_secs(),
            expires
        );
        for name in names {
            private.push('\n');
            private.push_str(name);
            private.push('=');
            private.push_str(&self.claims[name]);
        }
        let public = format!(
            "{CLAIM_RESOURCE}={}\n{CLAIM_LIFESPAN}={}",
            self.resource,
            self.lifespan.as_secs()
        );

        let mut private = private.into_bytes();
        let private_ct = encrypt_salted8(key, &private);
        private.zeroize();

        let mut out = Vec::new();
        wire::put_bytes16(&mut out, &private_ct?)?;
        wire::put_str16(&mut out, &public)?;
        Ok(out)
    }

    /// Parse a ticket with the issuer's key, recovering the full claim
    /// set and recomputing the client-side expiration estimate.
    pub fn parse_as_issuer(key: &SymmetricKey, bytes: &[u8]) -> Result<Self> {
        Self::parse_as_issuer_inner(key, bytes).map_err(|e| {
            tracing::debug!(cause = %e, "ticket rejected");
            Error::InvalidTicket
        })
    }

    fn parse_as_issuer_inner(key: &SymmetricKey, bytes: &[u8]) -> Result<Self> {
        let (private_ct, _public) = split_sections(bytes)?;
        let mut plain = decrypt_salted8(key, private_ct)?;
        let parsed = std::str::from_utf8(&plain)
            .map_err(|_| Error::InvalidFormat)
            .and_then(parse_lines);
        plain.zeroize();
        let mut lines = parsed?;

        let resource = lines.remove(CLAIM_RESOURCE).ok_or(Error::InvalidFormat)?;
        let lifespan = parse_secs(&lines.remove(CLAIM_LIFESPAN).ok_or(Error::InvalidFormat)?)?;
        let expires = parse_secs(&lines.remove(CLAIM_EXPIRES).ok_or(Error::InvalidFormat)?)?;

        Ok(Self {
            resource,
            lifespan,
            issuer_expires_at: Some(
                UNIX_EPOCH.checked_add(expires).ok_or(Error::InvalidFormat)?,
            ),
            client_expires_at: Some(client_expiry_estimate(lifespan)?),
            claims: lines,
        })
    }

    /// Parse only the public section — no key required. The result knows
    /// the resource, the lifespan, and a local expiration estimate; it
    /// carries no claims and no issuer expiration.
    pub fn parse_as_client(bytes: &[u8]) -> Result<Self> {
        Self::parse_as_client_inner(bytes).map_err(|e| {
            tracing::debug!(cause = %e, "ticket public section rejected");
            Error::InvalidTicket
        })
    }

    fn parse_as_client_inner(bytes: &[u8]) -> Result<Self> {
        let (_private_ct, public) = split_sections(bytes)?;
        let mut lines =
            parse_lines(std::str::from_utf8(public).map_err(|_| Error::InvalidFormat)?)?;

        let resource = lines.remove(CLAIM_RESOURCE).ok_or(Error::InvalidFormat)?;
        let lifespan = parse_secs(&lines.remove(CLAIM_LIFESPAN).ok_or(Error::InvalidFormat)?)?;

        Ok(Self {
            resource,
            lifespan,
            issuer_expires_at: None,
            client_expires_at: Some(client_expiry_estimate(lifespan)?),
            claims: HashMap::new(),
        })
    }
}

impl fmt::Debug for SecureTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureTicket")
            .field("resource", &self.resource)
            .field("lifespan", &self.lifespan)
            .field("claims", &self.claims.len())
            .finish()
    }
}

fn validate_value(value: &str) -> Result<()> {
    if value.contains('\n') {
        return Err(Error::InvalidParameter(
            "ticket values may not contain newlines".into(),
        ));
    }
    Ok(())
}

fn split_sections(bytes: &[u8]) -> Result<(&[u8], &[u8])> {
    let mut cursor = bytes;
    let private_len = wire::get_u16(&mut cursor)? as usize;
    if cursor.len() < private_len {
        return Err(Error::InvalidFormat);
    }
    let (private_ct, mut cursor) = cursor.split_at(private_len);
    let public_len = wire::get_u16(&mut cursor)? as usize;
    if cursor.len() != public_len {
        return Err(Error::InvalidFormat);
    }
    Ok((private_ct, cursor))
}

fn parse_lines(text: &str) -> Result<HashMap<String, String>> {
    let mut lines = HashMap::new();
    for line in text.split('\n') {
        let (name, value) = line.split_once('=').ok_or(Error::InvalidFormat)?;
        if name.is_empty() {
            return Err(Error::InvalidFormat);
        }
        lines.insert(name.to_ascii_lowercase(), value.to_string());
    }
    Ok(lines)
}

fn parse_secs(value: &str) -> Result<Duration> {
    value
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| Error::InvalidFormat)
}

/// now + lifespan, rejecting lifespans that push past the representable
/// time range instead of overflowing.
fn client_expiry_estimate(lifespan: Duration) -> Result<SystemTime> {
    SystemTime::now()
        .checked_add(lifespan)
        .ok_or(Error::InvalidFormat)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::cipher::SymmetricAlgorithm;
    use crate::crypto::random::generate_key;

    const TOLERANCE: Duration = Duration::from_secs(2);

    fn close(a: SystemTime, b: SystemTime) -> bool {
        match a.duration_since(b) {
            Ok(d) => d <= TOLERANCE,
            Err(e) => e.duration() <= TOLERANCE,
        }
    }

    #[test]
    fn test_issue_sets_expiration_from_lifespan() {
        let lifespan = Duration::from_secs(3600);
        let ticket = SecureTicket::issue("vault/backups", lifespan).unwrap();
        let expected = SystemTime::now() + lifespan;
        assert!(close(ticket.issuer_expires_at().unwrap(), expected));
        assert!(!ticket.is_expired());
    }

    #[test]
    fn test_issuer_round_trip_preserves_claims() {
        let key = generate_key(SymmetricAlgorithm::Aes256Gcm).unwrap();
        let mut ticket = SecureTicket::issue("vault/backups", Duration::from_secs(900)).unwrap();
        ticket.set_claim("Role", "admin").unwrap();
        ticket.set_claim("scope", "read=write").unwrap();

        let bytes = ticket.to_bytes(&key).unwrap();
        let parsed = SecureTicket::parse_as_issuer(&key, &bytes).unwrap();

        assert_eq!(parsed.resource(), "vault/backups");
        assert_eq!(parsed.lifespan(), Duration::from_secs(900));
        assert!(close(
            parsed.issuer_expires_at().unwrap(),
            ticket.issuer_expires_at().unwrap()
        ));
        assert_eq!(parsed.get_claim("role"), Some("admin"));
        assert_eq!(parsed.get_claim("SCOPE"), Some("read=write"));
        // client estimate recomputed at parse time
        assert!(close(
            parsed.client_expires_at().unwrap(),
            SystemTime::now() + Duration::from_secs(900)
        ));
    }

    #[test]
    fn test_client_parse_agrees_with_issuer_parse() {
        let key = generate_key(SymmetricAlgorithm::ChaCha20Poly1305).unwrap();
        let mut ticket = SecureTicket::issue("api/v1", Duration::from_secs(120)).unwrap();
        ticket.set_claim("tenant", "acme").unwrap();
        let bytes = ticket.to_bytes(&key).unwrap();

        let issuer_view = SecureTicket::parse_as_issuer(&key, &bytes).unwrap();
        let client_view = SecureTicket::parse_as_client(&bytes).unwrap();

        assert_eq!(client_view.resource(), issuer_view.resource());
        assert_eq!(client_view.lifespan(), issuer_view.lifespan());
        // The private section stays private.
        assert!(client_view.issuer_expires_at().is_none());
        assert!(client_view.get_claim("tenant").is_none());
        assert!(client_view.client_expires_at().is_some());
    }

    #[test]
    fn test_claim_names_case_insensitive() {
        let mut ticket = SecureTicket::issue("r", Duration::from_secs(60)).unwrap();
        ticket.set_claim("Device-ID", "abc123").unwrap();
        assert_eq!(ticket.get_claim("device-id"), Some("abc123"));
        ticket.set_claim("DEVICE-ID", "xyz789").unwrap();
        assert_eq!(ticket.get_claim("Device-Id"), Some("xyz789"));
        ticket.remove_claim("device-ID");
        assert!(ticket.get_claim("device-id").is_none());
    }

    #[test]
    fn test_reserved_and_malformed_claims_rejected() {
        let mut ticket = SecureTicket::issue("r", Duration::from_secs(60)).unwrap();
        for name in ["resource", "Lifespan", "EXPIRES"] {
            assert!(matches!(
                ticket.set_claim(name, "v"),
                Err(Error::InvalidParameter(_))
            ));
        }
        assert!(ticket.set_claim("a=b", "v").is_err());
        assert!(ticket.set_claim("nl", "line\nbreak").is_err());
        assert!(ticket.set_claim("", "v").is_err());
    }

    #[test]
    fn test_wrong_key_is_invalid_ticket() {
        let key = generate_key(SymmetricAlgorithm::Aes256Gcm).unwrap();
        let other = generate_key(SymmetricAlgorithm::Aes256Gcm).unwrap();
        let bytes = SecureTicket::issue("r", Duration::from_secs(60))
            .unwrap()
            .to_bytes(&key)
            .unwrap();
        assert!(matches!(
            SecureTicket::parse_as_issuer(&other, &bytes),
            Err(Error::InvalidTicket)
        ));
    }

    #[test]
    fn test_garbage_is_invalid_ticket() {
        let key = generate_key(SymmetricAlgorithm::Aes256Gcm).unwrap();
        for garbage in [&b""[..], b"\x00\x01", &[0xFFu8; 64][..]] {
            assert!(matches!(
                SecureTicket::parse_as_issuer(&key, garbage),
                Err(Error::InvalidTicket)
            ));
            assert!(matches!(
                SecureTicket::parse_as_client(garbage),
                Err(Error::InvalidTicket)
            ));
        }
    }

    #[test]
    fn test_truncated_ticket_is_invalid() {
        let key = generate_key(SymmetricAlgorithm::Aes256Gcm).unwrap();
        let bytes = SecureTicket::issue("r", Duration::from_secs(60))
            .unwrap()
            .to_bytes(&key)
            .unwrap();
        assert!(matches!(
            SecureTicket::parse_as_client(&bytes[..bytes.len() - 3]),
            Err(Error::InvalidTicket)
        ));
    }

    #[test]
    fn test_overflowing_lifespan_in_public_section_is_invalid() {
        // A lifespan of u64::MAX seconds cannot be added to the current
        // time; the parse must fail cleanly, not crash.
        let public = format!("resource=r\nlifespan={}", u64::MAX);
        let mut bytes = Vec::new();
        crate::wire::put_bytes16(&mut bytes, b"opaque").unwrap();
        crate::wire::put_str16(&mut bytes, &public).unwrap();
        assert!(matches!(
            SecureTicket::parse_as_client(&bytes),
            Err(Error::InvalidTicket)
        ));
    }

    #[test]
    fn test_overflowing_private_section_is_invalid() {
        let key = generate_key(SymmetricAlgorithm::Aes256Gcm).unwrap();
        for private in [
            // lifespan overflows now + lifespan
            format!("resource=r\nlifespan={}\nexpires=0", u64::MAX),
            // expires overflows epoch + expires
            format!("resource=r\nlifespan=60\nexpires={}", u64::MAX),
        ] {
            let ct = encrypt_salted8(&key, private.as_bytes()).unwrap();
            let mut bytes = Vec::new();
            crate::wire::put_bytes16(&mut bytes, &ct).unwrap();
            crate::wire::put_str16(&mut bytes, "resource=r\nlifespan=60").unwrap();
            assert!(matches!(
                SecureTicket::parse_as_issuer(&key, &bytes),
                Err(Error::InvalidTicket)
            ));
        }
    }

    #[test]
    fn test_issue_rejects_overflowing_lifespan() {
        assert!(matches!(
            SecureTicket::issue("r", Duration::MAX),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_client_side_ticket_cannot_reserialize() {
        let key = generate_key(SymmetricAlgorithm::Aes256Gcm).unwrap();
        let bytes = SecureTicket::issue("r", Duration::from_secs(60))
            .unwrap()
            .to_bytes(&key)
            .unwrap();
        let client_view = SecureTicket::parse_as_client(&bytes).unwrap();
        assert!(matches!(
            client_view.to_bytes(&key),
            Err(Error::InvalidParameter(_))
        ));
    }
}
