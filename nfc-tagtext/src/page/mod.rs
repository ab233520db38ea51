//! Page addressing configurations
//!
//! NTAG-family tags expose memory as 4-byte pages. A `PageConfig` names the
//! page the text payload lives in and how many bytes are read and written
//! starting from it.

mod registry;

pub use registry::{default_config, lookup, names, DEFAULT_CONFIG_NAME};

use serde::Serialize;

/// Size of one tag page in bytes
pub const PAGE_SIZE: usize = 4;

/// Addressing scheme for the text payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageConfig {
    name: String,
    page_number: u16,
    byte_address: u16,
    max_data_size: usize,
    description: String,
}

impl PageConfig {
    /// Create a configuration; the byte address is always derived from the page
    pub fn new(name: &str, page_number: u16, max_data_size: usize, description: &str) -> Self {
        Self {
            name: name.to_string(),
            page_number,
            byte_address: page_number * PAGE_SIZE as u16,
            max_data_size,
            description: description.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn page_number(&self) -> u16 {
        self.page_number
    }

    pub fn byte_address(&self) -> u16 {
        self.byte_address
    }

    pub fn max_data_size(&self) -> usize {
        self.max_data_size
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Number of physical pages a full payload covers
    pub fn spans_pages(&self) -> usize {
        self.max_data_size.div_ceil(PAGE_SIZE).max(1)
    }

    /// Last page touched by a full payload
    pub fn last_page(&self) -> u16 {
        self.page_number + self.spans_pages() as u16 - 1
    }
}
