//! MD5 checksums in the two text encodings the upload API expects.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use base64::{Engine, engine::general_purpose::STANDARD};
use md5::{Digest, Md5};

use crate::ChunkError;

/// MD5 digest of a byte stream, rendered as text.
///
/// The `base64` field encodes the hexadecimal text of the digest, not the
/// raw digest bytes. Consumers of the upload coordinator match on exactly
/// that encoding, so it must not be "fixed" to plain base64-of-digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checksum {
    /// Lowercase hex digest (32 characters).
    pub hex: String,
    /// Base64 of the hex text.
    pub base64: String,
}

fn encode(sum: impl AsRef<[u8]>) -> Checksum {
    let hex = hex::encode(sum);
    let base64 = STANDARD.encode(hex.as_bytes());
    Checksum { hex, base64 }
}

/// Computes the MD5 checksum of an in-memory buffer.
pub fn checksum_bytes(data: &[u8]) -> Checksum {
    let mut hasher = Md5::new();
    hasher.update(data);
    encode(hasher.finalize())
}

/// Computes the MD5 checksum of everything `reader` yields.
///
/// The reader is consumed to exhaustion through a fixed 8 KiB buffer.
pub fn checksum_reader<R: Read>(reader: &mut R) -> Result<Checksum, ChunkError> {
    let mut hasher = Md5::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(encode(hasher.finalize()))
}

/// Computes the MD5 checksum of an entire file.
pub fn checksum_file(path: &Path) -> Result<Checksum, ChunkError> {
    let mut file = File::open(path)?;
    checksum_reader(&mut file)
}
