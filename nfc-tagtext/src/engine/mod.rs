//! Read / write / verify against the active configuration
//!
//! Writes try the full padded buffer first ("direct"). When that is refused
//! and the payload spans more than one page, the first page alone is written
//! ("single-page"). Whatever was accepted is read back and compared.

pub mod codec;

pub use codec::{bytes_to_text, pad, text_to_bytes};

use log::{debug, info, warn};
use serde::Serialize;

use crate::error::TagError;
use crate::page::{PageConfig, PAGE_SIZE};
use crate::transport::ReaderHandle;

/// Decoded content of the configured page range
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadData {
    pub text: String,
    pub hex: String,
    pub byte_count: usize,
    pub is_empty: bool,
}

/// Write strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteMethod {
    Direct,
    SinglePage,
}

impl WriteMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteMethod::Direct => "direct",
            WriteMethod::SinglePage => "single-page",
        }
    }
}

/// One write strategy that was tried
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteAttempt {
    pub method: WriteMethod,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of an accepted write
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteReport {
    pub text: String,
    pub method: WriteMethod,
    pub attempts: Vec<WriteAttempt>,
    /// Padded buffer as uppercase hex
    pub hex: String,
    pub bytes_written: usize,
    pub verified: bool,
    pub read_back: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verify_error: Option<String>,
}

/// Operations on the card of the current session
pub struct Engine<'a> {
    reader: &'a ReaderHandle,
    config: &'a PageConfig,
}

impl<'a> Engine<'a> {
    pub fn new(reader: &'a ReaderHandle, config: &'a PageConfig) -> Self {
        Self { reader, config }
    }

    /// Read the whole configured range and decode it
    pub fn read_text(&self) -> Result<ReadData, TagError> {
        let address = self.config.byte_address();
        let length = self.config.max_data_size();
        debug!("Reading {} bytes at address {}", length, address);

        let raw = self.reader.lock().read(address, length)?;
        let text = bytes_to_text(&raw);

        Ok(ReadData {
            is_empty: text.is_empty(),
            hex: hex::encode_upper(&raw),
            byte_count: raw.len(),
            text,
        })
    }

    /// Write `text`, then read it back
    pub fn write_text(&self, text: &str) -> Result<WriteReport, TagError> {
        if text.trim().is_empty() {
            return Err(TagError::EmptyInput);
        }

        let max = self.config.max_data_size();
        let padded = pad(&text_to_bytes(text), max)?;
        let address = self.config.byte_address();

        let mut attempts = Vec::new();
        let mut accepted = None;

        match self.reader.lock().write(address, &padded) {
            Ok(()) => {
                attempts.push(WriteAttempt {
                    method: WriteMethod::Direct,
                    success: true,
                    error: None,
                });
                accepted = Some((WriteMethod::Direct, padded.len()));
            }
            Err(e) => {
                warn!("Direct write of {} bytes at {} failed: {}", padded.len(), address, e);
                attempts.push(WriteAttempt {
                    method: WriteMethod::Direct,
                    success: false,
                    error: Some(e.to_string()),
                });
            }
        }

        if accepted.is_none() && max > PAGE_SIZE {
            match self.reader.lock().write(address, &padded[..PAGE_SIZE]) {
                Ok(()) => {
                    attempts.push(WriteAttempt {
                        method: WriteMethod::SinglePage,
                        success: true,
                        error: None,
                    });
                    accepted = Some((WriteMethod::SinglePage, PAGE_SIZE));
                }
                Err(e) => {
                    warn!("Single-page write at {} failed: {}", address, e);
                    attempts.push(WriteAttempt {
                        method: WriteMethod::SinglePage,
                        success: false,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        let (method, bytes_written) = match accepted {
            Some(found) => found,
            None => {
                let message = attempts
                    .last()
                    .and_then(|a| a.error.clone())
                    .unwrap_or_default();
                return Err(TagError::WriteFailed { attempts, message });
            }
        };
        info!("Wrote {} bytes at {} using {} method", bytes_written, address, method.as_str());

        let expected = text.trim();
        let (verified, read_back, verify_error) = match self.read_text() {
            Ok(data) => (data.text == expected, Some(data.text), None),
            Err(e) => (false, None, Some(e.to_string())),
        };
        if !verified {
            warn!("Verification failed: wrote {:?}, read back {:?}", expected, read_back);
        }

        Ok(WriteReport {
            text: text.to_string(),
            method,
            attempts,
            hex: hex::encode_upper(&padded),
            bytes_written,
            verified,
            read_back,
            verify_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use parking_lot::Mutex;

    use crate::error::TransportError;
    use crate::page;
    use crate::transport::SimulatedTag;

    fn setup(tag: SimulatedTag) -> (Arc<Mutex<SimulatedTag>>, ReaderHandle) {
        let tag = Arc::new(Mutex::new(tag));
        let handle: ReaderHandle = tag.clone();
        (tag, handle)
    }

    fn page5() -> PageConfig {
        PageConfig::new("PAGE_5_SINGLE", 5, 4, "Page 5 single page (4 bytes)")
    }

    #[test]
    fn test_read_decodes_range() {
        let (_, handle) = setup(SimulatedTag::ntag213().with_data(16, b"Hello\0\x07X"));
        let config = page::lookup("PAGE_4").unwrap();
        let data = Engine::new(&handle, &config).read_text().unwrap();
        assert_eq!(data.text, "Hello");
        assert_eq!(data.byte_count, 16);
        assert_eq!(&data.hex[..16], "48656C6C6F000758");
        assert!(!data.is_empty);
    }

    #[test]
    fn test_read_blank_is_empty() {
        let (_, handle) = setup(SimulatedTag::ntag213());
        let config = page5();
        let data = Engine::new(&handle, &config).read_text().unwrap();
        assert!(data.is_empty);
        assert_eq!(data.hex, "00000000");
    }

    #[test]
    fn test_read_transport_failure() {
        let (_, handle) = setup(SimulatedTag::ntag213().allow_only_reads(&[]));
        let config = page5();
        let err = Engine::new(&handle, &config).read_text().unwrap_err();
        assert_eq!(err, TagError::Transport(TransportError::Status(0x6300)));
    }

    #[test]
    fn test_write_page5_verified() {
        let (tag, handle) = setup(SimulatedTag::ntag213());
        let config = page5();
        let report = Engine::new(&handle, &config).write_text("42").unwrap();

        assert_eq!(report.method, WriteMethod::Direct);
        assert!(report.verified);
        assert_eq!(report.read_back.as_deref(), Some("42"));
        assert_eq!(report.hex, "34320000");
        assert_eq!(tag.lock().writes(), &[(20u16, b"42\0\0".to_vec())]);
    }

    #[test]
    fn test_write_empty_input_touches_nothing() {
        let (tag, handle) = setup(SimulatedTag::ntag213());
        let config = page5();
        let engine = Engine::new(&handle, &config);
        assert_eq!(engine.write_text(""), Err(TagError::EmptyInput));
        assert_eq!(engine.write_text("  \t\n"), Err(TagError::EmptyInput));
        assert_eq!(tag.lock().read_count(), 0);
        assert!(tag.lock().writes().is_empty());
    }

    #[test]
    fn test_write_too_large_touches_nothing() {
        let (tag, handle) = setup(SimulatedTag::ntag213());
        let config = page::lookup("PAGE_4").unwrap();
        let err = Engine::new(&handle, &config)
            .write_text("12345678901234567")
            .unwrap_err();
        assert_eq!(err, TagError::PayloadTooLarge { size: 17, max: 16 });
        assert!(tag.lock().writes().is_empty());
        assert_eq!(tag.lock().read_count(), 0);
    }

    #[test]
    fn test_write_exactly_max_fits() {
        let (_, handle) = setup(SimulatedTag::ntag213());
        let config = page::lookup("PAGE_4").unwrap();
        let report = Engine::new(&handle, &config)
            .write_text("1234567890123456")
            .unwrap();
        assert!(report.verified);
        assert_eq!(report.bytes_written, 16);
    }

    #[test]
    fn test_single_page_fallback() {
        let (tag, handle) = setup(SimulatedTag::ntag213().max_write_len(4));
        let config = page::lookup("PAGE_4").unwrap();
        let report = Engine::new(&handle, &config).write_text("ABC").unwrap();

        assert_eq!(report.method, WriteMethod::SinglePage);
        assert_eq!(report.attempts.len(), 2);
        assert!(!report.attempts[0].success);
        assert!(report.attempts[1].success);
        assert_eq!(report.bytes_written, 4);
        // Verification reads the whole configured range
        assert!(report.verified);
        assert_eq!(tag.lock().read_count(), 1);
    }

    #[test]
    fn test_fallback_unverified_when_payload_exceeds_page() {
        let (_, handle) = setup(SimulatedTag::ntag213().max_write_len(4));
        let config = page::lookup("PAGE_4").unwrap();
        let report = Engine::new(&handle, &config).write_text("ABCDEFGH").unwrap();
        assert_eq!(report.method, WriteMethod::SinglePage);
        assert!(!report.verified);
        assert_eq!(report.read_back.as_deref(), Some("ABCD"));
    }

    #[test]
    fn test_no_fallback_for_single_page_config() {
        let (tag, handle) = setup(SimulatedTag::ntag213().failing_writes());
        let config = page5();
        let err = Engine::new(&handle, &config).write_text("42").unwrap_err();
        assert_eq!(
            err,
            TagError::WriteFailed {
                attempts: vec![WriteAttempt {
                    method: WriteMethod::Direct,
                    success: false,
                    error: Some("Write operation failed".to_string()),
                }],
                message: "Write operation failed".to_string(),
            }
        );
        assert_eq!(tag.lock().writes().len(), 1);
    }

    #[test]
    fn test_both_methods_fail() {
        let (tag, handle) = setup(SimulatedTag::ntag213().failing_writes());
        let config = page::lookup("PAGE_4").unwrap();
        let err = Engine::new(&handle, &config).write_text("hello").unwrap_err();
        match err {
            TagError::WriteFailed { attempts, message } => {
                let methods: Vec<_> = attempts.iter().map(|a| a.method).collect();
                assert_eq!(methods, vec![WriteMethod::Direct, WriteMethod::SinglePage]);
                assert!(attempts.iter().all(|a| !a.success));
                assert_eq!(message, "Write operation failed");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(tag.lock().writes().len(), 2);
        assert_eq!(tag.lock().read_count(), 0);
    }

    #[test]
    fn test_write_success_independent_of_verification() {
        let (_, handle) = setup(SimulatedTag::ntag213().dropping_writes());
        let config = page5();
        let report = Engine::new(&handle, &config).write_text("42").unwrap();
        assert!(!report.verified);
        assert_eq!(report.read_back.as_deref(), Some(""));
    }

    #[test]
    fn test_verify_read_failure() {
        let (_, handle) = setup(SimulatedTag::ntag213().allow_only_reads(&[]));
        let config = page5();
        let report = Engine::new(&handle, &config).write_text("42").unwrap();
        assert!(!report.verified);
        assert!(report.read_back.is_none());
        assert!(report.verify_error.is_some());
    }
}
