//! Compatibility probing
//!
//! Cards differ in which page offsets and read lengths they accept. Every
//! newly attached card is put through the same seven reads; the outcome
//! decides which addressing scheme the session uses for it.
//!
//! Selection is a fixed priority list, first success wins:
//!
//! 1. `PAGE_4_EXTENDED`  -> page 4, 16 bytes
//! 2. `PAGE_4_SINGLE`    -> page 4, 4 bytes
//! 3. `PAGE_5_SINGLE`    -> page 5, 4 bytes
//! 4. `MULTI_PAGE_BLOCK` -> page 4, 64 bytes
//!
//! `PAGE_6_SINGLE`, `PAGE_7_SINGLE` and `HEADER_READ` are recorded for
//! diagnostics only.

use std::collections::BTreeSet;

use log::{debug, info, warn};
use serde::Serialize;

use crate::page::{PageConfig, PAGE_SIZE};
use crate::transport::TagTransport;

/// One read attempt of the battery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeTest {
    pub name: &'static str,
    pub address: u16,
    pub length: usize,
}

pub const PAGE_4_SINGLE: &str = "PAGE_4_SINGLE";
pub const PAGE_4_EXTENDED: &str = "PAGE_4_EXTENDED";
pub const PAGE_5_SINGLE: &str = "PAGE_5_SINGLE";
pub const PAGE_6_SINGLE: &str = "PAGE_6_SINGLE";
pub const PAGE_7_SINGLE: &str = "PAGE_7_SINGLE";
pub const MULTI_PAGE_BLOCK: &str = "MULTI_PAGE_BLOCK";
pub const HEADER_READ: &str = "HEADER_READ";

/// The battery, in execution order
pub const PROBE_TESTS: [ProbeTest; 7] = [
    ProbeTest {
        name: PAGE_4_SINGLE,
        address: 16,
        length: 4,
    },
    ProbeTest {
        name: PAGE_4_EXTENDED,
        address: 16,
        length: 16,
    },
    ProbeTest {
        name: PAGE_5_SINGLE,
        address: 20,
        length: 4,
    },
    ProbeTest {
        name: PAGE_6_SINGLE,
        address: 24,
        length: 4,
    },
    ProbeTest {
        name: PAGE_7_SINGLE,
        address: 28,
        length: 4,
    },
    ProbeTest {
        name: MULTI_PAGE_BLOCK,
        address: 16,
        length: 64,
    },
    ProbeTest {
        name: HEADER_READ,
        address: 0,
        length: 16,
    },
];

/// (test, page, max data size, description), highest priority first
const SELECTION_ORDER: [(&str, u16, usize, &str); 4] = [
    (PAGE_4_EXTENDED, 4, 16, "Page 4 extended read (16 bytes)"),
    (PAGE_4_SINGLE, 4, 4, "Page 4 single page (4 bytes)"),
    (PAGE_5_SINGLE, 5, 4, "Page 5 single page (4 bytes)"),
    (MULTI_PAGE_BLOCK, 4, 64, "Pages 4-7 block read (64 bytes)"),
];

/// Default number of bytes kept as hex sample per test
pub const DEFAULT_SAMPLE_LEN: usize = 8;

/// Result of a single test
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestOutcome {
    pub name: String,
    pub address: u16,
    pub length: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byte_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Configuration chosen from the battery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub name: String,
    pub config: PageConfig,
}

/// Outcome of probing one card
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResult {
    pub tests: Vec<TestOutcome>,
    pub recommended: Option<Recommendation>,
    pub working_pages: BTreeSet<u16>,
}

impl ProbeResult {
    pub fn outcome(&self, name: &str) -> Option<&TestOutcome> {
        self.tests.iter().find(|t| t.name == name)
    }

    pub fn succeeded(&self, name: &str) -> bool {
        self.outcome(name).map(|t| t.success).unwrap_or(false)
    }

    pub fn recommended_name(&self) -> Option<&str> {
        self.recommended.as_ref().map(|r| r.name.as_str())
    }

    pub fn recommended_config(&self) -> Option<&PageConfig> {
        self.recommended.as_ref().map(|r| &r.config)
    }

    pub fn is_inconclusive(&self) -> bool {
        self.recommended.is_none()
    }
}

/// Run the whole battery against a card
///
/// Every test runs regardless of earlier failures.
pub fn probe(reader: &mut (dyn TagTransport + Send), sample_len: usize) -> ProbeResult {
    let mut tests = Vec::with_capacity(PROBE_TESTS.len());
    let mut working_pages = BTreeSet::new();

    for test in PROBE_TESTS.iter() {
        let outcome = match reader.read(test.address, test.length) {
            Ok(data) => {
                let sample = hex::encode_upper(&data[..data.len().min(sample_len)]);
                debug!("Probe {}: {} bytes [{}]", test.name, data.len(), sample);
                if test.name.contains("PAGE_") {
                    working_pages.insert(test.address / PAGE_SIZE as u16);
                }
                TestOutcome {
                    name: test.name.to_string(),
                    address: test.address,
                    length: test.length,
                    success: true,
                    byte_count: Some(data.len()),
                    sample: Some(sample),
                    error: None,
                }
            }
            Err(e) => {
                debug!("Probe {} failed: {}", test.name, e);
                TestOutcome {
                    name: test.name.to_string(),
                    address: test.address,
                    length: test.length,
                    success: false,
                    byte_count: None,
                    sample: None,
                    error: Some(e.to_string()),
                }
            }
        };
        tests.push(outcome);
    }

    let mut result = ProbeResult {
        tests,
        recommended: None,
        working_pages,
    };
    result.recommended = select(|name| result.succeeded(name));

    match &result.recommended {
        Some(r) => info!(
            "Probe recommends {} (page {}, {} bytes)",
            r.name,
            r.config.page_number(),
            r.config.max_data_size()
        ),
        None => warn!("Probe inconclusive: no read method worked"),
    }

    result
}

/// Pick a configuration given which tests succeeded
pub fn select<F>(succeeded: F) -> Option<Recommendation>
where
    F: Fn(&str) -> bool,
{
    SELECTION_ORDER
        .iter()
        .find(|entry| succeeded(entry.0))
        .map(|&(test, page, max, description)| Recommendation {
            name: test.to_string(),
            config: PageConfig::new(test, page, max, description),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::SimulatedTag;

    fn run(tag: &mut SimulatedTag) -> ProbeResult {
        probe(tag, DEFAULT_SAMPLE_LEN)
    }

    #[test]
    fn test_all_tests_run_on_dead_card() {
        let mut tag = SimulatedTag::ntag213().allow_only_reads(&[]);
        let result = run(&mut tag);
        assert_eq!(tag.read_count(), 7);
        assert_eq!(result.tests.len(), 7);
        assert!(result.tests.iter().all(|t| !t.success && t.error.is_some()));
        assert!(result.is_inconclusive());
        assert!(result.working_pages.is_empty());
    }

    #[test]
    fn test_battery_order() {
        let mut tag = SimulatedTag::ntag213();
        let result = run(&mut tag);
        let names: Vec<&str> = result.tests.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                PAGE_4_SINGLE,
                PAGE_4_EXTENDED,
                PAGE_5_SINGLE,
                PAGE_6_SINGLE,
                PAGE_7_SINGLE,
                MULTI_PAGE_BLOCK,
                HEADER_READ
            ]
        );
    }

    #[test]
    fn test_full_card_prefers_extended() {
        let mut tag = SimulatedTag::ntag213();
        let result = run(&mut tag);
        let config = result.recommended_config().unwrap();
        assert_eq!(result.recommended_name(), Some(PAGE_4_EXTENDED));
        assert_eq!(config.page_number(), 4);
        assert_eq!(config.byte_address(), 16);
        assert_eq!(config.max_data_size(), 16);
    }

    #[test]
    fn test_working_pages() {
        let mut tag = SimulatedTag::ntag213();
        let result = run(&mut tag);
        // HEADER_READ does not count, MULTI_PAGE_BLOCK adds page 4
        assert_eq!(result.working_pages.into_iter().collect::<Vec<_>>(), vec![4, 5, 6, 7]);
    }

    #[test]
    fn test_sample_is_first_eight_bytes() {
        let mut tag = SimulatedTag::ntag213();
        let result = run(&mut tag);
        let header = result.outcome(HEADER_READ).unwrap();
        assert_eq!(header.byte_count, Some(16));
        assert_eq!(header.sample.as_deref(), Some("04A23B1D128C6480"));

        let single = result.outcome(PAGE_5_SINGLE).unwrap();
        assert_eq!(single.sample.as_deref(), Some("00000000"));
    }

    #[test]
    fn test_only_page_5() {
        let mut tag = SimulatedTag::ntag213().allow_only_reads(&[(20, 4)]);
        let result = run(&mut tag);
        let config = result.recommended_config().unwrap();
        assert_eq!(config.page_number(), 5);
        assert_eq!(config.byte_address(), 20);
        assert_eq!(config.max_data_size(), 4);
        assert_eq!(result.working_pages.into_iter().collect::<Vec<_>>(), vec![5]);
    }

    #[test]
    fn test_only_multi_page() {
        let mut tag = SimulatedTag::ntag213().allow_only_reads(&[(16, 64)]);
        let result = run(&mut tag);
        assert_eq!(result.recommended_name(), Some(MULTI_PAGE_BLOCK));
        assert_eq!(result.recommended_config().unwrap().max_data_size(), 64);
    }

    #[test]
    fn test_header_only_is_inconclusive() {
        let mut tag = SimulatedTag::ntag213().allow_only_reads(&[(0, 16)]);
        let result = run(&mut tag);
        assert!(result.succeeded(HEADER_READ));
        assert!(result.is_inconclusive());
    }

    #[test]
    fn test_selection_priority() {
        let pick = |ok: &[&str]| select(|name| ok.iter().any(|o| *o == name)).map(|r| r.name);

        assert_eq!(pick(&[MULTI_PAGE_BLOCK, PAGE_4_EXTENDED]).as_deref(), Some(PAGE_4_EXTENDED));
        assert_eq!(pick(&[MULTI_PAGE_BLOCK, PAGE_4_SINGLE]).as_deref(), Some(PAGE_4_SINGLE));
        assert_eq!(pick(&[PAGE_5_SINGLE, PAGE_4_SINGLE]).as_deref(), Some(PAGE_4_SINGLE));
        assert_eq!(pick(&[PAGE_5_SINGLE, MULTI_PAGE_BLOCK]).as_deref(), Some(PAGE_5_SINGLE));
        assert_eq!(pick(&[PAGE_6_SINGLE, PAGE_7_SINGLE, HEADER_READ]), None);
    }

    #[test]
    fn test_selection_is_deterministic_over_all_subsets() {
        for mask in 0u32..(1 << PROBE_TESTS.len()) {
            let ok: Vec<&str> = PROBE_TESTS
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, t)| t.name)
                .collect();
            let first = select(|name| ok.iter().any(|o| *o == name));
            let second = select(|name| ok.iter().any(|o| *o == name));
            assert_eq!(first, second);

            let expected = SELECTION_ORDER
                .iter()
                .map(|(name, ..)| *name)
                .find(|name| ok.contains(name));
            assert_eq!(first.map(|r| r.name), expected.map(str::to_string));
        }
    }
}
