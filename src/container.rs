use crate::error::{PatchError, Result};
use crate::fingerprint::Fingerprint;

/// Identifies a file as a delta-OTA patch. Stored little-endian at offset 0.
pub const MAGIC: u32 = 0xFCCD_DE10;
pub const MAGIC_LEN: usize = 4;
/// Raw length of the base image's validation fingerprint (SHA-256 class).
pub const FINGERPRINT_LEN: usize = 32;
/// Total header length, fixed across all format revisions described here.
pub const HEADER_LEN: usize = 64;
/// Zero-filled on write; reserved for future header fields.
pub const RESERVED_LEN: usize = HEADER_LEN - (MAGIC_LEN + FINGERPRINT_LEN);

/// The fixed 64-byte prefix of a patch container. The variable-length diff
/// payload follows immediately after; its format is owned by the diff
/// engine, not by this container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub base_fingerprint: Fingerprint,
}

impl Header {
    pub fn new(base_fingerprint: Fingerprint) -> Self {
        Header { base_fingerprint }
    }

    /// Serialize to the exact on-disk layout: magic (LE), fingerprint,
    /// reserved padding.
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[..MAGIC_LEN].copy_from_slice(&MAGIC.to_le_bytes());
        out[MAGIC_LEN..MAGIC_LEN + FINGERPRINT_LEN]
            .copy_from_slice(self.base_fingerprint.as_bytes());
        // Bytes [36..64) stay zero.
        out
    }

    /// Parse a header from the start of a container. The reserved region is
    /// opaque: future format revisions may use it, so its contents are
    /// ignored rather than validated.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(PatchError::FormatViolation {
                reason: format!(
                    "container too short for header: {} bytes, need {}",
                    data.len(),
                    HEADER_LEN
                ),
            });
        }
        let magic = u32::from_le_bytes(data[..MAGIC_LEN].try_into().unwrap());
        if magic != MAGIC {
            return Err(PatchError::FormatViolation {
                reason: format!("bad magic number: {magic:#010x}, expected {MAGIC:#010x}"),
            });
        }
        let fingerprint =
            Fingerprint::from_bytes(&data[MAGIC_LEN..MAGIC_LEN + FINGERPRINT_LEN])?;
        Ok(Header::new(fingerprint))
    }
}

/// Split a complete container into its header and diff payload.
pub fn split_container(data: &[u8]) -> Result<(Header, &[u8])> {
    let header = Header::decode(data)?;
    Ok((header, &data[HEADER_LEN..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fingerprint(byte: u8) -> Fingerprint {
        Fingerprint::from_bytes(&[byte; FINGERPRINT_LEN]).unwrap()
    }

    #[test]
    fn header_layout() {
        let encoded = Header::new(fingerprint(0xAB)).encode();
        assert_eq!(encoded.len(), HEADER_LEN);
        assert_eq!(&encoded[..4], &[0x10, 0xDE, 0xCD, 0xFC]);
        assert_eq!(&encoded[4..36], &[0xAB; 32]);
        assert!(encoded[36..].iter().all(|&b| b == 0));
    }

    #[test]
    fn reserved_length_derivation() {
        assert_eq!(RESERVED_LEN, 28);
        assert_eq!(MAGIC_LEN + FINGERPRINT_LEN + RESERVED_LEN, HEADER_LEN);
    }

    #[test]
    fn decode_round_trip() {
        let header = Header::new(fingerprint(0x5C));
        let decoded = Header::decode(&header.encode()).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn decode_rejects_short_input() {
        let err = Header::decode(&[0u8; HEADER_LEN - 1]).unwrap_err();
        assert!(matches!(err, PatchError::FormatViolation { .. }));
    }

    #[test]
    fn decode_rejects_wrong_magic() {
        let mut encoded = Header::new(fingerprint(1)).encode();
        encoded[0] ^= 0xFF;
        let err = Header::decode(&encoded).unwrap_err();
        assert!(matches!(err, PatchError::FormatViolation { .. }));
    }

    #[test]
    fn decode_ignores_reserved_contents() {
        let mut encoded = Header::new(fingerprint(2)).encode();
        for b in &mut encoded[36..] {
            *b = 0xEE;
        }
        let decoded = Header::decode(&encoded).unwrap();
        assert_eq!(decoded.base_fingerprint, fingerprint(2));
    }

    #[test]
    fn split_recovers_payload() {
        let mut container = Header::new(fingerprint(3)).encode().to_vec();
        container.extend_from_slice(b"opaque diff payload");
        let (header, payload) = split_container(&container).unwrap();
        assert_eq!(header.base_fingerprint, fingerprint(3));
        assert_eq!(payload, b"opaque diff payload");
    }
}
