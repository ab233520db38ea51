//! Text <-> page bytes
//!
//! Decoding is lossy: a 0x00 byte terminates the text, printable ASCII
//! (32..=126) is kept and everything else is skipped.

use crate::error::TagError;

/// Decode page bytes into trimmed text
pub fn bytes_to_text(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for &b in bytes {
        if b == 0x00 {
            break;
        }
        if (32..=126).contains(&b) {
            text.push(b as char);
        }
    }
    text.trim().to_string()
}

/// Encode text for writing
pub fn text_to_bytes(text: &str) -> Vec<u8> {
    text.as_bytes().to_vec()
}

/// Zero-pad to exactly `size` bytes; oversize input is an error, never truncated
pub fn pad(bytes: &[u8], size: usize) -> Result<Vec<u8>, TagError> {
    if bytes.len() > size {
        return Err(TagError::PayloadTooLarge {
            size: bytes.len(),
            max: size,
        });
    }
    let mut out = bytes.to_vec();
    out.resize(size, 0x00);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stops_at_null() {
        assert_eq!(bytes_to_text(b"42\0\0"), "42");
        assert_eq!(bytes_to_text(b"AB\0CD"), "AB");
        assert_eq!(bytes_to_text(b"\0ABC"), "");
    }

    #[test]
    fn test_skips_non_printable() {
        assert_eq!(bytes_to_text(&[0x41, 0x07, 0x42, 0xFF, 0x43]), "ABC");
        // Non-printables before the terminator do not stop decoding
        assert_eq!(bytes_to_text(&[0x01, 0x02, 0x41, 0x00, 0x42]), "A");
    }

    #[test]
    fn test_trims_whitespace() {
        assert_eq!(bytes_to_text(b"  hi  \0"), "hi");
        assert_eq!(bytes_to_text(b"   "), "");
    }

    #[test]
    fn test_output_only_printable() {
        let all: Vec<u8> = (1..=255u8).collect();
        let text = bytes_to_text(&all);
        assert!(text.bytes().all(|b| (32..=126).contains(&b)));
        assert_eq!(text.len(), 94); // 95 printable, leading space trimmed
    }

    #[test]
    fn test_pad() {
        assert_eq!(pad(b"42", 4).unwrap(), b"42\0\0".to_vec());
        assert_eq!(pad(b"ABCD", 4).unwrap(), b"ABCD".to_vec());
        assert_eq!(
            pad(b"12345", 4),
            Err(TagError::PayloadTooLarge { size: 5, max: 4 })
        );
    }

    #[test]
    fn test_padded_roundtrip_printable() {
        // Pseudo-random printable strings of every length that fits 16 bytes
        let mut state: u32 = 0x2545_F491;
        for len in 0..=16 {
            for _ in 0..64 {
                let text: String = (0..len)
                    .map(|_| {
                        state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                        char::from(32 + ((state >> 16) % 95) as u8)
                    })
                    .collect();
                let padded = pad(&text_to_bytes(&text), 16).unwrap();
                assert_eq!(padded.len(), 16);
                assert_eq!(bytes_to_text(&padded), text.trim(), "text {:?}", text);
            }
        }
    }

    #[test]
    fn test_non_ascii_is_dropped() {
        let bytes = text_to_bytes("café");
        assert_eq!(bytes.len(), 5);
        assert_eq!(bytes_to_text(&bytes), "caf");
    }
}
