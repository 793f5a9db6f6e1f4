//! # Wire Codec Helpers
//!
//! Big-endian framing primitives shared by every binary format in the
//! crate: magic numbers, length-prefixed byte runs, and length-prefixed
//! UTF-8 strings.
//!
//! Readers take `&mut &[u8]` cursors and fail with the generic
//! [`Error::InvalidFormat`] on any truncation or bad length, so parse-layer
//! failures are indistinguishable from cryptographic ones at component
//! boundaries.

use bytes::{Buf, BufMut};

use crate::error::{Error, Result};

/// Magic number opening a streamed (file) container
pub(crate) const CONTAINER_MAGIC: u32 = 0x5343_4654; // "SCFT"

/// Magic number opening each plaintext content block inside a container
pub(crate) const BLOCK_MAGIC: u32 = 0x5342_4C4B; // "SBLK"

/// Magic number opening a single-shot sealed blob
pub(crate) const BLOB_MAGIC: u32 = 0x5342_4F58; // "SBOX"

/// Magic number opening a serialized key chain
pub(crate) const KEYCHAIN_MAGIC: u32 = 0x534B_4348; // "SKCH"

/// Magic number opening a credential envelope
pub(crate) const CREDENTIAL_MAGIC: u32 = 0x4352_4544; // "CRED"

/// Container format version written and accepted by this crate
pub(crate) const FORMAT_VERSION: u32 = 1;

// ----------------------------------------------------------------------------
// Writers
// ----------------------------------------------------------------------------

/// Append a 16-bit length prefix and `data`.
pub(crate) fn put_bytes16(out: &mut Vec<u8>, data: &[u8]) -> Result<()> {
    let len = u16::try_from(data.len()).map_err(|_| {
        Error::InvalidParameter(format!("section of {} bytes exceeds 16-bit frame", data.len()))
    })?;
    out.put_u16(len);
    out.put_slice(data);
    Ok(())
}

/// Append a 32-bit length prefix and `data`.
pub(crate) fn put_bytes32(out: &mut Vec<u8>, data: &[u8]) -> Result<()> {
    let len = u32::try_from(data.len()).map_err(|_| {
        Error::InvalidParameter(format!("section of {} bytes exceeds 32-bit frame", data.len()))
    })?;
    out.put_u32(len);
    out.put_slice(data);
    Ok(())
}

/// Append a 16-bit length prefix and a UTF-8 string.
pub(crate) fn put_str16(out: &mut Vec<u8>, s: &str) -> Result<()> {
    put_bytes16(out, s.as_bytes())
}

// ----------------------------------------------------------------------------
// Readers
// ----------------------------------------------------------------------------

/// Read a big-endian u32.
pub(crate) fn get_u32(buf: &mut &[u8]) -> Result<u32> {
    if buf.remaining() < 4 {
        return Err(Error::InvalidFormat);
    }
    Ok(buf.get_u32())
}

/// Read a big-endian u16.
pub(crate) fn get_u16(buf: &mut &[u8]) -> Result<u16> {
    if buf.remaining() < 2 {
        return Err(Error::InvalidFormat);
    }
    Ok(buf.get_u16())
}

/// Read `N` raw bytes.
pub(crate) fn get_array<const N: usize>(buf: &mut &[u8]) -> Result<[u8; N]> {
    if buf.remaining() < N {
        return Err(Error::InvalidFormat);
    }
    let mut out = [0u8; N];
    buf.copy_to_slice(&mut out);
    Ok(out)
}

/// Read a 16-bit length-prefixed byte run.
pub(crate) fn get_bytes16(buf: &mut &[u8]) -> Result<Vec<u8>> {
    let len = get_u16(buf)? as usize;
    if buf.remaining() < len {
        return Err(Error::InvalidFormat);
    }
    Ok(buf.copy_to_bytes(len).to_vec())
}

/// Read a 32-bit length-prefixed byte run.
pub(crate) fn get_bytes32(buf: &mut &[u8]) -> Result<Vec<u8>> {
    let len = get_u32(buf)? as usize;
    if buf.remaining() < len {
        return Err(Error::InvalidFormat);
    }
    Ok(buf.copy_to_bytes(len).to_vec())
}

/// Read a 16-bit length-prefixed UTF-8 string.
pub(crate) fn get_str16(buf: &mut &[u8]) -> Result<String> {
    String::from_utf8(get_bytes16(buf)?).map_err(|_| Error::InvalidFormat)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes16_round_trip() {
        let mut out = Vec::new();
        put_bytes16(&mut out, b"hello").unwrap();
        let mut cursor = out.as_slice();
        assert_eq!(get_bytes16(&mut cursor).unwrap(), b"hello");
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_bytes32_round_trip() {
        let mut out = Vec::new();
        put_bytes32(&mut out, &[7u8; 100_000]).unwrap();
        let mut cursor = out.as_slice();
        assert_eq!(get_bytes32(&mut cursor).unwrap().len(), 100_000);
    }

    #[test]
    fn test_str16_round_trip() {
        let mut out = Vec::new();
        put_str16(&mut out, "realm:König").unwrap();
        let mut cursor = out.as_slice();
        assert_eq!(get_str16(&mut cursor).unwrap(), "realm:König");
    }

    #[test]
    fn test_truncated_reads_are_generic_format_errors() {
        let mut cursor: &[u8] = &[0x00];
        assert!(matches!(get_u32(&mut cursor), Err(Error::InvalidFormat)));

        // Length prefix larger than the remaining payload
        let mut cursor: &[u8] = &[0x00, 0x10, 0xAA];
        assert!(matches!(
            get_bytes16(&mut cursor),
            Err(Error::InvalidFormat)
        ));
    }

    #[test]
    fn test_oversized_section_rejected_at_write() {
        let mut out = Vec::new();
        let err = put_bytes16(&mut out, &vec![0u8; 70_000]).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }

    #[test]
    fn test_non_utf8_string_is_generic_format_error() {
        let mut out = Vec::new();
        put_bytes16(&mut out, &[0xFF, 0xFE]).unwrap();
        let mut cursor = out.as_slice();
        assert!(matches!(get_str16(&mut cursor), Err(Error::InvalidFormat)));
    }
}
