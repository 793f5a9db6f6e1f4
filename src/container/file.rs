//! # Streamed File Containers
//!
//! Sealing and opening file-sized payloads in constant memory.
//!
//! ## Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      FILE CONTAINER LAYOUT                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  magic:u32  version:u32                                                 │
//! │  len16: recipient public key encoding (may be empty)                   │
//! │  len32: wrapped key package                                            │
//! │  ───────────────── digest coverage starts here ─────────────────────── │
//! │  len32: encrypted metadata (JSON)                                      │
//! │  repeat:                                                               │
//! │    len16: encrypted 4096-byte frame                                    │
//! │      frame = magic:u32  salt:4  content_len:u16  content  zero pad     │
//! │  ───────────────── digest coverage ends here ───────────────────────── │
//! │  SHA-512 digest: 64 bytes                                              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every frame is exactly [`BLOCK_SIZE`] bytes before encryption, so the
//! container leaks only a coarse payload size. The first frame whose
//! content is shorter than [`BLOCK_CAPACITY`] terminates the stream; a
//! payload that is an exact multiple of the capacity gets one trailing
//! all-padding frame so the terminator always exists.
//!
//! The digest covers encrypted bytes only, which lets [`FileOpener::verify`]
//! check integrity before a single byte is decrypted.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::container::{decode_key_package, encode_key_package, FileMetadata, KeySource};
use crate::crypto::cipher::{SymmetricAlgorithm, SymmetricCipher, SymmetricKey};
use crate::crypto::random::{generate_key, salt4};
use crate::error::{Error, Result};
use crate::keys::envelope::{self, AsymmetricAlgorithm};
use crate::keys::keypair::{PrivateKey, PublicKey};
use crate::wire::{BLOCK_MAGIC, CONTAINER_MAGIC, FORMAT_VERSION};

/// Plaintext frame size: every content block is padded to this before
/// encryption
pub const BLOCK_SIZE: usize = 4096;

/// Frame header: magic + salt + content length
const BLOCK_HEADER_SIZE: usize = 4 + 4 + 2;

/// Content capacity of one frame
pub const BLOCK_CAPACITY: usize = BLOCK_SIZE - BLOCK_HEADER_SIZE;

/// Size of the trailing SHA-512 digest
pub const DIGEST_SIZE: usize = 64;

/// Upper bound on a wrapped key package claimed by a header
const MAX_WRAPPED_LEN: usize = 4096;

/// Upper bound on the encrypted metadata section
const MAX_METADATA_LEN: u64 = 1 << 20;

/// One-shot sealer for a file-sized payload.
///
/// Generates a fresh one-time symmetric key at construction and wraps it
/// for the recipient; `seal_stream` then consumes the sealer, so one key
/// never covers two containers.
pub struct FileSealer {
    key: SymmetricKey,
    wrapped_package: Vec<u8>,
    recipient_id: Option<String>,
}

impl FileSealer {
    /// Prepare a sealer for `recipient`.
    ///
    /// With `include_recipient_id` set, the container header records the
    /// recipient's public key encoding so openers can pick the matching
    /// private key out of a chain. Omitting it keeps the container
    /// recipient-anonymous at the cost of chain lookup.
    pub fn new(
        algorithm: SymmetricAlgorithm,
        recipient: &PublicKey,
        include_recipient_id: bool,
    ) -> Result<Self> {
        let key = generate_key(algorithm)?;
        let mut package = encode_key_package(&key)?;
        let wrapped = envelope::seal(AsymmetricAlgorithm::X25519, recipient, &package);
        package.zeroize();
        Ok(Self {
            key,
            wrapped_package: wrapped?,
            recipient_id: include_recipient_id.then(|| recipient.encode()),
        })
    }

    /// Seal everything `reader` yields into `writer`.
    pub fn seal_stream<R: Read, W: Write>(
        self,
        reader: &mut R,
        metadata: &FileMetadata,
        writer: &mut W,
    ) -> Result<()> {
        let mut header = Vec::new();
        header.extend_from_slice(&CONTAINER_MAGIC.to_be_bytes());
        header.extend_from_slice(&FORMAT_VERSION.to_be_bytes());
        crate::wire::put_str16(&mut header, self.recipient_id.as_deref().unwrap_or(""))?;
        crate::wire::put_bytes32(&mut header, &self.wrapped_package)?;
        writer.write_all(&header)?;

        let mut cipher = SymmetricCipher::new(&self.key)?;
        let mut hasher = Sha512::new();

        let mut meta_json = serde_json::to_vec(metadata)
            .map_err(|e| Error::Internal(format!("metadata serialization: {e}")))?;
        let meta_ct = cipher.encrypt(&meta_json)?;
        meta_json.zeroize();
        let mut section = Vec::with_capacity(4 + meta_ct.len());
        crate::wire::put_bytes32(&mut section, &meta_ct)?;
        hasher.update(&section);
        writer.write_all(&section)?;

        let mut frame = [0u8; BLOCK_SIZE];
        loop {
            frame[..4].copy_from_slice(&BLOCK_MAGIC.to_be_bytes());
            frame[4..8].copy_from_slice(&salt4());
            let content_len = read_up_to(reader, &mut frame[BLOCK_HEADER_SIZE..]);
            let content_len = match content_len {
                Ok(n) => n,
                Err(e) => {
                    frame.zeroize();
                    return Err(e);
                }
            };
            frame[8..10].copy_from_slice(&(content_len as u16).to_be_bytes());
            frame[BLOCK_HEADER_SIZE + content_len..].fill(0);

            let ct = cipher.encrypt(&frame);
            let ct = match ct {
                Ok(ct) => ct,
                Err(e) => {
                    frame.zeroize();
                    return Err(e);
                }
            };
            let mut section = Vec::with_capacity(2 + ct.len());
            crate::wire::put_bytes16(&mut section, &ct)?;
            hasher.update(&section);
            writer.write_all(&section)?;

            if content_len < BLOCK_CAPACITY {
                break;
            }
        }
        frame.zeroize();

        writer.write_all(&hasher.finalize())?;
        writer.flush()?;
        Ok(())
    }

    /// Seal the file at `src` into a container at `dst`.
    ///
    /// Captures `src`'s metadata. A partially written `dst` is removed on
    /// failure.
    pub fn seal_file(self, src: &Path, dst: &Path) -> Result<FileMetadata> {
        let metadata = FileMetadata::for_path(src)?;
        let mut reader = File::open(src)?;
        let mut writer = File::create(dst)?;
        match self.seal_stream(&mut reader, &metadata, &mut writer) {
            Ok(()) => Ok(metadata),
            Err(e) => {
                drop(writer);
                let _ = std::fs::remove_file(dst);
                Err(e)
            }
        }
    }
}

/// Read the recipient public key encoding out of a container header
/// without resolving any key or touching the payload.
pub fn peek_public_key<R: Read>(reader: &mut R) -> Result<Option<String>> {
    let (recipient_id, _wrapped) = read_header(reader)?;
    Ok(recipient_id)
}

fn read_header<R: Read>(reader: &mut R) -> Result<(Option<String>, Vec<u8>)> {
    let mut fixed = [0u8; 8];
    reader
        .read_exact(&mut fixed)
        .map_err(|_| Error::InvalidFormat)?;
    if u32::from_be_bytes([fixed[0], fixed[1], fixed[2], fixed[3]]) != CONTAINER_MAGIC {
        return Err(Error::InvalidFormat);
    }
    if u32::from_be_bytes([fixed[4], fixed[5], fixed[6], fixed[7]]) != FORMAT_VERSION {
        return Err(Error::InvalidFormat);
    }

    let id_len = read_u16(reader)? as usize;
    let mut id_bytes = vec![0u8; id_len];
    reader
        .read_exact(&mut id_bytes)
        .map_err(|_| Error::InvalidFormat)?;
    let recipient_id = if id_bytes.is_empty() {
        None
    } else {
        Some(String::from_utf8(id_bytes).map_err(|_| Error::InvalidFormat)?)
    };

    let wrapped_len = read_u32(reader)? as usize;
    if wrapped_len > MAX_WRAPPED_LEN {
        return Err(Error::InvalidFormat);
    }
    let mut wrapped = vec![0u8; wrapped_len];
    reader
        .read_exact(&mut wrapped)
        .map_err(|_| Error::InvalidFormat)?;
    Ok((recipient_id, wrapped))
}

/// An opened container: header parsed, one-time key recovered, payload
/// untouched.
///
/// The constructor resolves keys and unwraps the key package eagerly, so
/// a `FileOpener` in hand means decryption *can* succeed; whether the
/// payload is intact is decided by [`verify`](Self::verify), which
/// [`unseal_to`](Self::unseal_to) always runs first.
pub struct FileOpener<R: Read + Seek> {
    reader: R,
    key: SymmetricKey,
    recipient_id: Option<String>,
    payload_start: u64,
    payload_end: u64,
}

impl<R: Read + Seek> FileOpener<R> {
    /// Parse the header of `reader` and recover the one-time key.
    pub fn new(mut reader: R, source: KeySource<'_>) -> Result<Self> {
        let (recipient_id, wrapped) = read_header(&mut reader)?;

        let private: PrivateKey = match source {
            KeySource::Private(sk) => sk.clone(),
            KeySource::Chain(chain) => {
                // An anonymous container carries nothing to look up with.
                let id = recipient_id.as_deref().ok_or(Error::InvalidFormat)?;
                chain.get_private_key(id).map_err(|e| {
                    tracing::debug!(cause = %e, "chain lookup for container recipient failed");
                    Error::KeyNotFound
                })?
            }
        };

        let mut package = envelope::open(AsymmetricAlgorithm::X25519, &private, &wrapped)?;
        let key = decode_key_package(&package);
        package.zeroize();
        let key = key?;

        let payload_start = reader.stream_position()?;
        let total = reader.seek(SeekFrom::End(0))?;
        if total < payload_start + DIGEST_SIZE as u64 {
            return Err(Error::InvalidFormat);
        }
        Ok(Self {
            reader,
            key,
            recipient_id,
            payload_start,
            payload_end: total - DIGEST_SIZE as u64,
        })
    }

    /// The recipient public key encoding recorded in the header, if any.
    pub fn public_key(&self) -> Option<&str> {
        self.recipient_id.as_deref()
    }

    /// Recompute the payload digest and compare it, in constant time,
    /// against the stored one. Decrypts nothing.
    pub fn verify(&mut self) -> Result<()> {
        self.reader.seek(SeekFrom::Start(self.payload_start))?;
        let mut hasher = Sha512::new();
        let mut remaining = self.payload_end - self.payload_start;
        let mut buf = [0u8; 8192];
        while remaining > 0 {
            let n = buf.len().min(remaining as usize);
            self.reader.read_exact(&mut buf[..n])?;
            hasher.update(&buf[..n]);
            remaining -= n as u64;
        }
        let mut stored = [0u8; DIGEST_SIZE];
        self.reader.read_exact(&mut stored)?;

        if hasher.finalize().as_slice().ct_eq(&stored).into() {
            Ok(())
        } else {
            tracing::debug!("container digest mismatch");
            Err(Error::InvalidFormat)
        }
    }

    /// Verify the container, then decrypt its content into `writer`.
    ///
    /// Runs [`verify`](Self::verify) first: a tampered container writes
    /// nothing. Returns the decrypted metadata.
    pub fn unseal_to<W: Write>(mut self, writer: &mut W) -> Result<FileMetadata> {
        self.verify()?;
        self.reader.seek(SeekFrom::Start(self.payload_start))?;
        let mut cipher = SymmetricCipher::new(&self.key)?;
        let mut pos = self.payload_start;

        let meta_len = read_u32(&mut self.reader)? as u64;
        pos += 4;
        if meta_len > MAX_METADATA_LEN || pos + meta_len > self.payload_end {
            return Err(Error::InvalidFormat);
        }
        let mut meta_ct = vec![0u8; meta_len as usize];
        self.reader
            .read_exact(&mut meta_ct)
            .map_err(|_| Error::InvalidFormat)?;
        pos += meta_len;
        let mut meta_plain = cipher.decrypt(&meta_ct)?;
        let metadata = serde_json::from_slice::<FileMetadata>(&meta_plain);
        meta_plain.zeroize();
        let metadata = metadata.map_err(|e| {
            tracing::debug!(cause = %e, "container metadata rejected");
            Error::InvalidFormat
        })?;

        loop {
            if pos >= self.payload_end {
                // Ran out of payload without seeing a terminating short block.
                return Err(Error::InvalidFormat);
            }
            let ct_len = read_u16(&mut self.reader)? as u64;
            pos += 2;
            if pos + ct_len > self.payload_end {
                return Err(Error::InvalidFormat);
            }
            let mut ct = vec![0u8; ct_len as usize];
            self.reader
                .read_exact(&mut ct)
                .map_err(|_| Error::InvalidFormat)?;
            pos += ct_len;

            let mut frame = cipher.decrypt(&ct)?;
            let content_len = match parse_block(&frame) {
                Ok(n) => n,
                Err(e) => {
                    frame.zeroize();
                    return Err(e);
                }
            };
            let write_result =
                writer.write_all(&frame[BLOCK_HEADER_SIZE..BLOCK_HEADER_SIZE + content_len]);
            frame.zeroize();
            write_result?;

            if content_len < BLOCK_CAPACITY {
                // The terminator must be the last payload section.
                if pos != self.payload_end {
                    return Err(Error::InvalidFormat);
                }
                break;
            }
        }
        writer.flush()?;
        Ok(metadata)
    }

    /// Verify and decrypt the whole payload, discarding the plaintext.
    ///
    /// Stronger than [`verify`](Self::verify): also proves every block
    /// decrypts and frames correctly. Returns the metadata.
    pub fn validate(self) -> Result<FileMetadata> {
        self.unseal_to(&mut std::io::sink())
    }

    /// Verify the container, then decrypt its content to a file at `dst`.
    ///
    /// A partially written `dst` is removed on failure.
    pub fn unseal_file(self, dst: &Path) -> Result<FileMetadata> {
        let mut writer = File::create(dst)?;
        match self.unseal_to(&mut writer) {
            Ok(metadata) => Ok(metadata),
            Err(e) => {
                drop(writer);
                let _ = std::fs::remove_file(dst);
                Err(e)
            }
        }
    }
}

fn parse_block(frame: &[u8]) -> Result<usize> {
    if frame.len() != BLOCK_SIZE {
        return Err(Error::InvalidFormat);
    }
    if u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]) != BLOCK_MAGIC {
        return Err(Error::InvalidFormat);
    }
    let content_len = u16::from_be_bytes([frame[8], frame[9]]) as usize;
    if content_len > BLOCK_CAPACITY {
        return Err(Error::InvalidFormat);
    }
    Ok(content_len)
}

/// Fill `buf` from `reader`, stopping early only at end of input.
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

fn read_u16<R: Read>(reader: &mut R) -> Result<u16> {
    let mut bytes = [0u8; 2];
    reader
        .read_exact(&mut bytes)
        .map_err(|_| Error::InvalidFormat)?;
    Ok(u16::from_be_bytes(bytes))
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32> {
    let mut bytes = [0u8; 4];
    reader
        .read_exact(&mut bytes)
        .map_err(|_| Error::InvalidFormat)?;
    Ok(u32::from_be_bytes(bytes))
}

/// Overwrite the file at `path` with alternating 0x00/0xFF passes, sync
/// each pass to disk, then remove it.
///
/// `passes` below 1 is treated as 1. A path that does not exist succeeds
/// silently.
pub fn secure_delete(path: &Path, passes: u32) -> Result<()> {
    let mut file = match OpenOptions::new().write(true).open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    let len = file.metadata()?.len();
    let mut chunk = [0u8; 8192];
    for pass in 0..passes.max(1) {
        chunk.fill(if pass % 2 == 0 { 0x00 } else { 0xFF });
        file.seek(SeekFrom::Start(0))?;
        let mut remaining = len;
        while remaining > 0 {
            let n = chunk.len().min(remaining as usize);
            file.write_all(&chunk[..n])?;
            remaining -= n as u64;
        }
        file.sync_all()?;
    }
    drop(file);
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

// ============================================================================
// TESTS
// ============================================================================
