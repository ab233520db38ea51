//! In-memory tag for tests and the simulator binary
//!
//! Behaves like an NTAG213 by default and can be scripted to reject
//! particular reads, fail or silently drop writes.

use log::debug;

use super::TagTransport;
use crate::apdu::SW;
use crate::error::TransportError;

/// NTAG213 has 45 pages of 4 bytes
const NTAG213_SIZE: usize = 45 * 4;

/// Scriptable stand-in for a reader with a tag on it
#[derive(Debug, Clone)]
pub struct SimulatedTag {
    memory: Vec<u8>,
    allowed_reads: Option<Vec<(u16, usize)>>,
    rejected_reads: Vec<(u16, usize)>,
    max_write_len: Option<usize>,
    fail_writes: bool,
    drop_writes: bool,
    read_count: usize,
    writes: Vec<(u16, Vec<u8>)>,
}

impl SimulatedTag {
    /// Blank tag of `size` bytes accepting every in-range access
    pub fn new(size: usize) -> Self {
        Self {
            memory: vec![0u8; size],
            allowed_reads: None,
            rejected_reads: Vec::new(),
            max_write_len: None,
            fail_writes: false,
            drop_writes: false,
            read_count: 0,
            writes: Vec::new(),
        }
    }

    /// NTAG213 with a plausible header in pages 0-3
    pub fn ntag213() -> Self {
        let mut tag = Self::new(NTAG213_SIZE);
        tag.memory[..16].copy_from_slice(&[
            0x04, 0xA2, 0x3B, 0x1D, 0x12, 0x8C, 0x64, 0x80, 0x46, 0x48, 0x00, 0x00, 0xE1, 0x10,
            0x12, 0x00,
        ]);
        tag
    }

    /// Accept only the listed (address, length) reads
    pub fn allow_only_reads(mut self, reads: &[(u16, usize)]) -> Self {
        self.allowed_reads = Some(reads.to_vec());
        self
    }

    /// Reject one (address, length) read
    pub fn reject_read(mut self, address: u16, length: usize) -> Self {
        self.rejected_reads.push((address, length));
        self
    }

    /// Fail writes longer than `len` bytes
    pub fn max_write_len(mut self, len: usize) -> Self {
        self.max_write_len = Some(len);
        self
    }

    /// Fail every write
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Report writes as accepted without storing them
    pub fn dropping_writes(mut self) -> Self {
        self.drop_writes = true;
        self
    }

    /// Preload bytes at an address
    pub fn with_data(mut self, address: u16, data: &[u8]) -> Self {
        let start = address as usize;
        self.memory[start..start + data.len()].copy_from_slice(data);
        self
    }

    /// Number of read calls seen, accepted or not
    pub fn read_count(&self) -> usize {
        self.read_count
    }

    /// Every write call seen, accepted or not
    pub fn writes(&self) -> &[(u16, Vec<u8>)] {
        &self.writes
    }

    fn read_allowed(&self, address: u16, length: usize) -> bool {
        if self.rejected_reads.contains(&(address, length)) {
            return false;
        }
        match &self.allowed_reads {
            Some(allowed) => allowed.contains(&(address, length)),
            None => true,
        }
    }
}

impl TagTransport for SimulatedTag {
    fn read(&mut self, address: u16, length: usize) -> Result<Vec<u8>, TransportError> {
        self.read_count += 1;
        debug!("sim read: address={} length={}", address, length);

        if !self.read_allowed(address, length) {
            return Err(TransportError::Status(SW::OPERATION_FAILED));
        }
        let start = address as usize;
        self.memory
            .get(start..start + length)
            .map(|bytes| bytes.to_vec())
            .ok_or_else(|| {
                TransportError::Device(format!("Read out of range: {}+{}", address, length))
            })
    }

    fn write(&mut self, address: u16, data: &[u8]) -> Result<(), TransportError> {
        self.writes.push((address, data.to_vec()));
        debug!("sim write: address={} length={}", address, data.len());

        if self.fail_writes {
            return Err(TransportError::Device("Write operation failed".to_string()));
        }
        if let Some(max) = self.max_write_len {
            if data.len() > max {
                return Err(TransportError::Status(SW::WRONG_LENGTH));
            }
        }
        let start = address as usize;
        let target = self
            .memory
            .get_mut(start..start + data.len())
            .ok_or_else(|| {
                TransportError::Device(format!("Write out of range: {}+{}", address, data.len()))
            })?;
        if !self.drop_writes {
            target.copy_from_slice(data);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write_roundtrip() {
        let mut tag = SimulatedTag::ntag213();
        tag.write(16, b"ABCD").unwrap();
        assert_eq!(tag.read(16, 4).unwrap(), b"ABCD".to_vec());
        assert_eq!(tag.read_count(), 1);
        assert_eq!(tag.writes().len(), 1);
    }

    #[test]
    fn test_allow_only_reads() {
        let mut tag = SimulatedTag::ntag213().allow_only_reads(&[(20, 4)]);
        assert!(tag.read(20, 4).is_ok());
        assert_eq!(tag.read(16, 4), Err(TransportError::Status(0x6300)));
    }

    #[test]
    fn test_out_of_range() {
        let mut tag = SimulatedTag::new(8);
        assert!(tag.read(4, 8).is_err());
        assert!(tag.write(4, &[0; 8]).is_err());
    }

    #[test]
    fn test_max_write_len() {
        let mut tag = SimulatedTag::ntag213().max_write_len(4);
        assert_eq!(tag.write(16, &[1; 16]), Err(TransportError::Status(0x6700)));
        assert!(tag.write(16, &[1; 4]).is_ok());
    }

    #[test]
    fn test_dropping_writes() {
        let mut tag = SimulatedTag::ntag213().dropping_writes();
        tag.write(16, b"ABCD").unwrap();
        assert_eq!(tag.read(16, 4).unwrap(), vec![0; 4]);
    }
}
