//! Identity of the card currently on the reader

use serde::Serialize;

use super::atr::{self, CardType};

/// Custom serde module for uppercase hex encoding of byte vectors
pub(crate) mod hex_bytes {
    use serde::Serializer;

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode_upper(bytes))
    }

    pub mod option {
        use serde::Serializer;

        pub fn serialize<S>(bytes: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match bytes {
                Some(b) => serializer.serialize_some(&hex::encode_upper(b)),
                None => serializer.serialize_none(),
            }
        }
    }
}

/// UID, type, standard and ATR of an attached card
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardIdentity {
    #[serde(with = "hex_bytes")]
    pub uid: Vec<u8>,
    #[serde(rename = "type")]
    pub card_type: CardType,
    pub standard: String,
    #[serde(with = "hex_bytes::option")]
    pub atr: Option<Vec<u8>>,
}

impl CardIdentity {
    /// Build an identity, deriving type and standard from the ATR when present
    pub fn new(uid: Vec<u8>, atr: Option<Vec<u8>>) -> Self {
        let (card_type, standard) = match atr.as_deref() {
            Some(bytes) => {
                let card_type = atr::card_type(bytes);
                let standard = match atr::parse_storage_card(bytes) {
                    Some(info) => format!(
                        "{} ({})",
                        atr::standard_name(info.standard),
                        atr::card_name(info.card_name)
                    ),
                    None => card_type.as_str().to_string(),
                };
                (card_type, standard)
            }
            None => (CardType::Unknown, CardType::Unknown.as_str().to_string()),
        };

        Self {
            uid,
            card_type,
            standard,
            atr,
        }
    }

    /// UID as uppercase hex
    pub fn uid_hex(&self) -> String {
        hex::encode_upper(&self.uid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_from_ntag_atr() {
        let card = CardIdentity::new(vec![0x04, 0xA2, 0x3B, 0x12], Some(atr::NTAG_ATR.to_vec()));
        assert_eq!(card.card_type, CardType::Iso14443_3);
        assert_eq!(card.standard, "ISO 14443 A, part 3 (MIFARE Ultralight / NTAG)");
        assert_eq!(card.uid_hex(), "04A23B12");
    }

    #[test]
    fn test_identity_without_atr() {
        let card = CardIdentity::new(vec![0x01], None);
        assert_eq!(card.card_type, CardType::Unknown);
        assert_eq!(card.standard, "UNKNOWN");
    }

    #[test]
    fn test_identity_serialization() {
        let card = CardIdentity::new(vec![0xDE, 0xAD], None);
        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["uid"], "DEAD");
        assert_eq!(json["type"], "UNKNOWN");
        assert!(json["atr"].is_null());
    }
}
