//! Obfuscation-at-rest for stored audio clips.
//!
//! A 4-byte marker followed by every byte XORed with 0xFF, applied in
//! 1024-byte chunks. This keeps casual file browsers from double-clicking
//! the clips; it is not a security control and has no key material.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{Result, SoundpadError};

pub const MAGIC: [u8; 4] = [0xDE, 0xAD, 0xBE, 0xEF];
const CHUNK_SIZE: usize = 1024;

/// Obfuscate raw audio bytes.
pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(MAGIC.len() + data.len());
    out.extend_from_slice(&MAGIC);
    for chunk in data.chunks(CHUNK_SIZE) {
        out.extend(chunk.iter().map(|b| b ^ 0xFF));
    }
    out
}

/// Reverse [`encode`]. Fails with [`SoundpadError::BadMagic`] when the
/// marker is missing.
pub fn decode(data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < MAGIC.len() || data[..MAGIC.len()] != MAGIC {
        return Err(SoundpadError::BadMagic);
    }
    Ok(data[MAGIC.len()..].iter().map(|b| b ^ 0xFF).collect())
}

pub fn encode_file(source: &Path, target: &Path) -> Result<()> {
    let data = fs::read(source)?;
    fs::write(target, encode(&data))?;
    debug!(source = %source.display(), target = %target.display(), bytes = data.len(), "audio encoded");
    Ok(())
}

pub fn decode_file(source: &Path) -> Result<Vec<u8>> {
    let data = fs::read(source)?;
    let decoded = decode(&data)?;
    debug!(source = %source.display(), bytes = decoded.len(), "audio decoded");
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_prepends_marker_and_inverts_bytes() {
        let encoded = encode(&[0x00, 0x01, 0xFF]);
        assert_eq!(&encoded[..4], &MAGIC);
        assert_eq!(&encoded[4..], &[0xFF, 0xFE, 0x00]);
    }

    #[test]
    fn decode_reverses_encode() {
        let original = b"RIFF....WAVEfmt ".to_vec();
        assert_eq!(decode(&encode(&original)).unwrap(), original);
    }

    #[test]
    fn decode_rejects_missing_marker() {
        assert!(matches!(decode(b"not audio"), Err(SoundpadError::BadMagic)));
        assert!(matches!(decode(&MAGIC[..2]), Err(SoundpadError::BadMagic)));
    }

    #[test]
    fn empty_payload_round_trips() {
        let encoded = encode(&[]);
        assert_eq!(encoded, MAGIC.to_vec());
        assert_eq!(decode(&encoded).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn file_helpers_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("clip.wav");
        let masked = dir.path().join("clip.bin");
        std::fs::write(&plain, b"audio-bytes").unwrap();

        encode_file(&plain, &masked).unwrap();
        assert_ne!(std::fs::read(&masked).unwrap(), b"audio-bytes");
        assert_eq!(decode_file(&masked).unwrap(), b"audio-bytes");
    }
}
