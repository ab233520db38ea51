//! Per-card session and its lifecycle

use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;

use crate::card::CardIdentity;
use crate::probe::{self, ProbeResult};
use crate::transport::ReaderHandle;

/// Lifecycle of a card on the reader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CardPhase {
    /// Detected, not probed yet
    Attached,
    /// Probe ran without a recommendation, prior configuration kept
    Probed,
    /// Probe recommendation committed as active configuration
    Active,
}

/// The card currently on the reader
pub struct CardSession {
    reader_name: String,
    reader: ReaderHandle,
    identity: CardIdentity,
    phase: CardPhase,
    probe: Option<ProbeResult>,
    attached_at: DateTime<Utc>,
}

impl CardSession {
    pub fn new(reader_name: &str, reader: ReaderHandle, identity: CardIdentity) -> Self {
        Self {
            reader_name: reader_name.to_string(),
            reader,
            identity,
            phase: CardPhase::Attached,
            probe: None,
            attached_at: Utc::now(),
        }
    }

    /// Run the battery once; later calls return `None`
    pub(crate) fn run_probe(&mut self, sample_len: usize) -> Option<&ProbeResult> {
        if self.phase != CardPhase::Attached {
            debug!("Probe already ran for card {}", self.identity.uid_hex());
            return None;
        }

        let result = {
            let mut reader = self.reader.lock();
            probe::probe(&mut *reader, sample_len)
        };
        self.phase = if result.is_inconclusive() {
            CardPhase::Probed
        } else {
            CardPhase::Active
        };
        self.probe = Some(result);
        self.probe.as_ref()
    }

    pub fn reader_name(&self) -> &str {
        &self.reader_name
    }

    pub fn reader(&self) -> &ReaderHandle {
        &self.reader
    }

    pub fn identity(&self) -> &CardIdentity {
        &self.identity
    }

    pub fn phase(&self) -> CardPhase {
        self.phase
    }

    pub fn probe(&self) -> Option<&ProbeResult> {
        self.probe.as_ref()
    }

    pub fn attached_at(&self) -> DateTime<Utc> {
        self.attached_at
    }
}
