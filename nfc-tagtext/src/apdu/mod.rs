//! PC/SC pseudo-APDUs for contactless storage tags
//!
//! Readers following PC/SC part 3 expose memory cards through a small set of
//! class `FF` commands. Only the three needed for page access are built here:
//!
//! - READ BINARY   `FF B0 00 <page> <le>`
//! - UPDATE BINARY `FF D6 00 <page> <lc> <data>`
//! - GET DATA      `FF CA 00 00 00` (card UID)
//!
//! # Example
//! ```
//! use nfc_tagtext::apdu::{APDU, Response};
//!
//! let cmd = APDU::read_binary(4, 16);
//! assert_eq!(cmd.to_bytes().unwrap(), vec![0xFF, 0xB0, 0x00, 0x04, 0x10]);
//!
//! let response = Response::from_bytes(&[0x41, 0x42, 0x90, 0x00]).unwrap();
//! assert!(response.is_okay());
//! ```

mod response;
mod status;

pub use response::Response;
pub use status::SW;

use thiserror::Error;

/// Class byte used by all PC/SC pseudo-APDUs
pub const CLA_PCSC: u8 = 0xFF;

pub const INS_READ_BINARY: u8 = 0xB0;
pub const INS_UPDATE_BINARY: u8 = 0xD6;
pub const INS_GET_DATA: u8 = 0xCA;

/// Errors that can occur while building or parsing APDUs
#[derive(Debug, Error, PartialEq, Eq)]
pub enum APDUError {
    #[error("Response too short: expected at least 2 bytes, got {0}")]
    TooShort(usize),

    #[error("Command data too long for a short APDU: {0} bytes")]
    DataTooLong(usize),
}

/// A short APDU command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct APDU {
    /// Class byte (CLA)
    pub cla: u8,
    /// Instruction byte (INS)
    pub ins: u8,
    /// Parameter 1 (P1)
    pub p1: u8,
    /// Parameter 2 (P2)
    pub p2: u8,
    /// Command data (may be empty)
    pub data: Vec<u8>,
    /// Expected response length (Le), 0 means 256
    pub le: Option<u8>,
}

impl APDU {
    /// Create a new APDU with just the header (CLA, INS, P1, P2)
    pub fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: Vec::new(),
            le: None,
        }
    }

    /// Create a new APDU with data
    pub fn with_data(cla: u8, ins: u8, p1: u8, p2: u8, data: Vec<u8>) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data,
            le: None,
        }
    }

    /// Set the expected response length
    pub fn expect(mut self, le: u8) -> Self {
        self.le = Some(le);
        self
    }

    /// READ BINARY starting at `page`
    pub fn read_binary(page: u8, length: u8) -> Self {
        Self::new(CLA_PCSC, INS_READ_BINARY, 0x00, page).expect(length)
    }

    /// UPDATE BINARY writing `data` at `page`
    pub fn update_binary(page: u8, data: &[u8]) -> Self {
        Self::with_data(CLA_PCSC, INS_UPDATE_BINARY, 0x00, page, data.to_vec())
    }

    /// GET DATA for the card UID
    pub fn get_uid() -> Self {
        Self::new(CLA_PCSC, INS_GET_DATA, 0x00, 0x00).expect(0x00)
    }

    /// Serialize to the short APDU wire format
    pub fn to_bytes(&self) -> Result<Vec<u8>, APDUError> {
        if self.data.len() > 255 {
            return Err(APDUError::DataTooLong(self.data.len()));
        }

        let mut out = Vec::with_capacity(6 + self.data.len());
        out.extend_from_slice(&[self.cla, self.ins, self.p1, self.p2]);
        if !self.data.is_empty() {
            out.push(self.data.len() as u8);
            out.extend_from_slice(&self.data);
        }
        if let Some(le) = self.le {
            out.push(le);
        }
        Ok(out)
    }
}
