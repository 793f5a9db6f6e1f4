//! # Single-Shot Sealed Blobs
//!
//! The in-memory counterpart of the streamed file container: the same
//! envelope scheme, collapsed to one encrypted block with no metadata
//! section and no trailing digest (the AEAD tag already authenticates a
//! single block).
//!
//! ```text
//! magic:u32  version:u32
//! len16: wrapped key package
//! len32: encrypted block
//!   block = magic:u32  salt:8  content_len:u32  content  zero pad
//! ```
//!
//! Blocks are padded up to a [`MIN_BLOCK_SIZE`]-byte floor so that short
//! secrets (passwords, tokens, small keys) do not reveal their length.

use zeroize::Zeroize;

use crate::container::{decode_key_package, encode_key_package};
use crate::crypto::cipher::{SymmetricAlgorithm, SymmetricCipher};
use crate::crypto::random::{generate_key, salt8};
use crate::error::{Error, Result};
use crate::keys::envelope::{self, AsymmetricAlgorithm};
use crate::keys::keypair::{PrivateKey, PublicKey};
use crate::wire::{self, BLOB_MAGIC, BLOCK_MAGIC, FORMAT_VERSION};

/// Minimum plaintext block size before encryption
pub const MIN_BLOCK_SIZE: usize = 256;

/// Block header: magic + salt + content length
const BLOCK_HEADER_SIZE: usize = 4 + 8 + 4;

/// Seal `plaintext` into a self-contained blob for `recipient`.
pub fn seal_bytes(
    algorithm: SymmetricAlgorithm,
    recipient: &PublicKey,
    plaintext: &[u8],
) -> Result<Vec<u8>> {
    let key = generate_key(algorithm)?;
    let mut package = encode_key_package(&key)?;
    let wrapped = envelope::seal(AsymmetricAlgorithm::X25519, recipient, &package);
    package.zeroize();
    let wrapped = wrapped?;

    let block_len = (BLOCK_HEADER_SIZE + plaintext.len()).max(MIN_BLOCK_SIZE);
    let mut block = Vec::with_capacity(block_len);
    block.extend_from_slice(&BLOCK_MAGIC.to_be_bytes());
    block.extend_from_slice(&salt8());
    block.extend_from_slice(&(plaintext.len() as u32).to_be_bytes());
    block.extend_from_slice(plaintext);
    block.resize(block_len, 0);

    let ct = SymmetricCipher::new(&key)?.encrypt(&block);
    block.zeroize();
    let ct = ct?;

    let mut out = Vec::with_capacity(8 + 2 + wrapped.len() + 4 + ct.len());
    out.extend_from_slice(&BLOB_MAGIC.to_be_bytes());
    out.extend_from_slice(&FORMAT_VERSION.to_be_bytes());
    wire::put_bytes16(&mut out, &wrapped)?;
    wire::put_bytes32(&mut out, &ct)?;
    Ok(out)
}

/// Open a sealed blob with the recipient's private key.
///
/// Short input, wrong key, tampering, and structural damage all fail
/// with the one generic format error.
pub fn open_bytes(private: &PrivateKey, bytes: &[u8]) -> Result<Vec<u8>> {
    let mut cursor = bytes;
    if wire::get_u32(&mut cursor)? != BLOB_MAGIC {
        return Err(Error::InvalidFormat);
    }
    if wire::get_u32(&mut cursor)? != FORMAT_VERSION {
        return Err(Error::InvalidFormat);
    }
    let wrapped = wire::get_bytes16(&mut cursor)?;
    let ct = wire::get_bytes32(&mut cursor)?;
    if !cursor.is_empty() {
        return Err(Error::InvalidFormat);
    }

    let mut package = envelope::open(AsymmetricAlgorithm::X25519, private, &wrapped)?;
    let key = decode_key_package(&package);
    package.zeroize();
    let key = key?;

    let mut block = SymmetricCipher::new(&key)?.decrypt(&ct)?;
    let content = parse_block(&block).map(|range| block[range].to_vec());
    block.zeroize();
    content
}

fn parse_block(block: &[u8]) -> Result<std::ops::Range<usize>> {
    let mut cursor = block;
    if wire::get_u32(&mut cursor)? != BLOCK_MAGIC {
        return Err(Error::InvalidFormat);
    }
    let _salt = wire::get_array::<8>(&mut cursor)?;
    let content_len = wire::get_u32(&mut cursor)? as usize;
    if content_len > cursor.len() {
        return Err(Error::InvalidFormat);
    }
    Ok(BLOCK_HEADER_SIZE..BLOCK_HEADER_SIZE + content_len)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let sk = PrivateKey::generate();
        for content in [&b""[..], b"pw", &[0xAB; 10_000][..]] {
            let sealed =
                seal_bytes(SymmetricAlgorithm::Aes256Gcm, &sk.public_key(), content).unwrap();
            assert_eq!(open_bytes(&sk, &sealed).unwrap(), content);
        }
    }

    #[test]
    fn test_short_secrets_pad_to_floor() {
        let sk = PrivateKey::generate();
        let a = seal_bytes(SymmetricAlgorithm::Aes256Gcm, &sk.public_key(), b"a").unwrap();
        let b = seal_bytes(
            SymmetricAlgorithm::Aes256Gcm,
            &sk.public_key(),
            b"a much longer secret than one byte",
        )
        .unwrap();
        // Both fall under the padding floor, so the lengths match.
        assert_eq!(a.len(), b.len());
    }

    #[test]
    fn test_wrong_key_is_generic() {
        let alice = PrivateKey::generate();
        let mallory = PrivateKey::generate();
        let sealed =
            seal_bytes(SymmetricAlgorithm::ChaCha20Poly1305, &alice.public_key(), b"s").unwrap();
        assert!(matches!(
            open_bytes(&mallory, &sealed),
            Err(Error::InvalidFormat)
        ));
    }

    #[test]
    fn test_tampering_is_generic() {
        let sk = PrivateKey::generate();
        let mut sealed =
            seal_bytes(SymmetricAlgorithm::Aes256Gcm, &sk.public_key(), b"secret").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        assert!(matches!(
            open_bytes(&sk, &sealed),
            Err(Error::InvalidFormat)
        ));
    }

    #[test]
    fn test_truncation_and_garbage_are_generic() {
        let sk = PrivateKey::generate();
        let sealed =
            seal_bytes(SymmetricAlgorithm::Aes256Gcm, &sk.public_key(), b"secret").unwrap();
        assert!(matches!(
            open_bytes(&sk, &sealed[..sealed.len() / 2]),
            Err(Error::InvalidFormat)
        ));
        assert!(matches!(
            open_bytes(&sk, b"not a blob at all"),
            Err(Error::InvalidFormat)
        ));
        assert!(matches!(open_bytes(&sk, b""), Err(Error::InvalidFormat)));
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        let sk = PrivateKey::generate();
        let mut sealed =
            seal_bytes(SymmetricAlgorithm::Aes256Gcm, &sk.public_key(), b"secret").unwrap();
        sealed.push(0);
        assert!(matches!(
            open_bytes(&sk, &sealed),
            Err(Error::InvalidFormat)
        ));
    }
}
