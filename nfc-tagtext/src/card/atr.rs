//! ATR (Answer To Reset) decoding for contactless cards
//!
//! PC/SC readers synthesize an ATR for storage cards following PC/SC part 3:
//!
//! ```text
//! 3B 8F 80 01 80 4F 0C A0 00 00 03 06 SS NN NN 00 00 00 00 TCK
//!                   |  |  `-- RID --' |  `----- card name
//!                   |  length         standard
//!                   application identifier tag
//! ```
//!
//! ISO 14443-4 cards carry their own historical bytes instead.

use serde::Serialize;

/// Registered application provider identifier of PC/SC
pub const PCSC_RID: &[u8] = &[0xA0, 0x00, 0x00, 0x03, 0x06];

/// ATR reported by common readers for an NTAG / MIFARE Ultralight tag
pub const NTAG_ATR: &[u8] = &[
    0x3B, // TS: Direct convention
    0x8F, // T0: TD1 present, 15 historical bytes
    0x80, // TD1
    0x01, // TD2: T=1
    0x80, // Category indicator
    0x4F, // Application identifier tag
    0x0C, // Length
    0xA0, 0x00, 0x00, 0x03, 0x06, // PC/SC RID
    0x03, // Standard: ISO 14443 A part 3
    0x00, 0x03, // Card name: MIFARE Ultralight family
    0x00, 0x00, 0x00, 0x00, // RFU
    0x68, // TCK
];

const AID_TAG_OFFSET: usize = 5;
const AID_TAG: u8 = 0x4F;

/// Tag category derived from the ATR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CardType {
    /// Storage card addressed through reader pseudo-APDUs
    #[serde(rename = "TAG_ISO_14443_3")]
    Iso14443_3,
    /// Processor card speaking ISO 7816-4 APDUs
    #[serde(rename = "TAG_ISO_14443_4")]
    Iso14443_4,
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl CardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardType::Iso14443_3 => "TAG_ISO_14443_3",
            CardType::Iso14443_4 => "TAG_ISO_14443_4",
            CardType::Unknown => "UNKNOWN",
        }
    }
}

/// Storage card fields carried in a PC/SC part 3 ATR
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageCardAtr {
    pub standard: u8,
    pub card_name: u16,
}

/// Classify a card from its ATR
pub fn card_type(atr: &[u8]) -> CardType {
    if atr.len() <= AID_TAG_OFFSET {
        CardType::Unknown
    } else if atr[AID_TAG_OFFSET] == AID_TAG {
        CardType::Iso14443_3
    } else {
        CardType::Iso14443_4
    }
}

/// Extract the standard and card name bytes from a storage card ATR
pub fn parse_storage_card(atr: &[u8]) -> Option<StorageCardAtr> {
    if card_type(atr) != CardType::Iso14443_3 {
        return None;
    }
    let aid_len = *atr.get(AID_TAG_OFFSET + 1)? as usize;
    let aid = atr.get(AID_TAG_OFFSET + 2..AID_TAG_OFFSET + 2 + aid_len)?;
    if aid.len() < 8 || &aid[..5] != PCSC_RID {
        return None;
    }
    Some(StorageCardAtr {
        standard: aid[5],
        card_name: u16::from_be_bytes([aid[6], aid[7]]),
    })
}

/// Name of a PC/SC part 3 standard byte
pub fn standard_name(standard: u8) -> &'static str {
    match standard {
        0x01 => "ISO 14443 A, part 1",
        0x02 => "ISO 14443 A, part 2",
        0x03 => "ISO 14443 A, part 3",
        0x05 => "ISO 14443 B, part 1",
        0x06 => "ISO 14443 B, part 2",
        0x07 => "ISO 14443 B, part 3",
        0x09 => "ISO 15693, part 1",
        0x0A => "ISO 15693, part 2",
        0x0B => "ISO 15693, part 3",
        0x0C => "ISO 15693, part 4",
        0x11 => "FeliCa",
        _ => "Unknown standard",
    }
}

/// Name of a PC/SC part 3 card name code
pub fn card_name(code: u16) -> &'static str {
    match code {
        0x0001 => "MIFARE Classic 1K",
        0x0002 => "MIFARE Classic 4K",
        0x0003 => "MIFARE Ultralight / NTAG",
        0x0026 => "MIFARE Mini",
        0x003A => "MIFARE Ultralight C",
        _ => "Unknown card",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ntag_atr_is_storage_card() {
        assert_eq!(card_type(NTAG_ATR), CardType::Iso14443_3);
        let info = parse_storage_card(NTAG_ATR).unwrap();
        assert_eq!(info.standard, 0x03);
        assert_eq!(info.card_name, 0x0003);
        assert_eq!(standard_name(info.standard), "ISO 14443 A, part 3");
        assert_eq!(card_name(info.card_name), "MIFARE Ultralight / NTAG");
    }

    #[test]
    fn test_ntag_atr_checksum() {
        // TCK is the XOR of all bytes from T0
        let tck: u8 = NTAG_ATR[1..NTAG_ATR.len() - 1].iter().fold(0u8, |acc, &b| acc ^ b);
        assert_eq!(NTAG_ATR[NTAG_ATR.len() - 1], tck);
    }

    #[test]
    fn test_processor_card() {
        let atr = [0x3B, 0x88, 0x80, 0x01, 0x00, 0x73, 0xC8, 0x40, 0x13, 0x00, 0x90, 0x00, 0x71];
        assert_eq!(card_type(&atr), CardType::Iso14443_4);
        assert!(parse_storage_card(&atr).is_none());
    }

    #[test]
    fn test_short_atr() {
        assert_eq!(card_type(&[0x3B, 0x80]), CardType::Unknown);
        assert_eq!(card_type(&[]), CardType::Unknown);
    }

    #[test]
    fn test_truncated_aid() {
        let atr = [0x3B, 0x8F, 0x80, 0x01, 0x80, 0x4F, 0x0C, 0xA0, 0x00];
        assert_eq!(card_type(&atr), CardType::Iso14443_3);
        assert!(parse_storage_card(&atr).is_none());
    }
}
