//! Session state
//!
//! Tracks attached readers (the most recent one is current), the card on the
//! reader and the active page configuration. The active configuration
//! survives card removal so the next card of the same kind on the same
//! reader keeps using what the probe discovered.

mod card;

pub use card::{CardPhase, CardSession};

use log::{info, warn};

use crate::card::CardIdentity;
use crate::engine::Engine;
use crate::error::TagError;
use crate::page::{self, PageConfig};
use crate::probe::ProbeResult;
use crate::transport::ReaderHandle;

/// A reader known to the session
pub struct AttachedReader {
    pub name: String,
    pub handle: ReaderHandle,
}

/// State shared by the dispatch loop and the exposed operations
pub struct Session {
    readers: Vec<AttachedReader>,
    card: Option<CardSession>,
    active_config: PageConfig,
    sample_len: usize,
}

impl Session {
    pub fn new(initial_config: PageConfig, sample_len: usize) -> Self {
        Self {
            readers: Vec::new(),
            card: None,
            active_config: initial_config,
            sample_len,
        }
    }

    /// Record a reader; re-attaching a known name moves it to the front
    pub fn reader_attached(&mut self, name: &str, handle: ReaderHandle) {
        self.readers.retain(|r| r.name != name);
        self.readers.push(AttachedReader {
            name: name.to_string(),
            handle,
        });
        info!("Reader attached: {}", name);
    }

    /// Forget a reader, and its card if it had one; returns whether a card went with it
    pub fn reader_detached(&mut self, name: &str) -> bool {
        self.readers.retain(|r| r.name != name);
        info!("Reader detached: {}", name);
        self.card_removed(name)
    }

    /// Most recently attached reader
    pub fn current_reader(&self) -> Option<&AttachedReader> {
        self.readers.last()
    }

    pub fn reader_names(&self) -> Vec<String> {
        self.readers.iter().map(|r| r.name.clone()).collect()
    }

    /// Start a new card session and probe it
    ///
    /// Any previous card session is replaced. The active configuration only
    /// changes when the probe recommends one.
    pub fn card_attached(
        &mut self,
        reader: &str,
        identity: CardIdentity,
    ) -> Result<ProbeResult, TagError> {
        let handle = self
            .readers
            .iter()
            .find(|r| r.name == reader)
            .map(|r| r.handle.clone())
            .ok_or_else(|| TagError::ReaderNotAttached(reader.to_string()))?;

        info!(
            "Card attached on {}: uid={} type={}",
            reader,
            identity.uid_hex(),
            identity.card_type.as_str()
        );
        let mut session = CardSession::new(reader, handle, identity);
        let result = match session.run_probe(self.sample_len) {
            Some(result) => result.clone(),
            None => return Err(TagError::ProbeInconclusive),
        };

        match result.recommended_config() {
            Some(config) => {
                info!("Active configuration set to {}", config.name());
                self.active_config = config.clone();
            }
            None => warn!(
                "No read method worked, keeping configuration {}",
                self.active_config.name()
            ),
        }
        self.card = Some(session);

        Ok(result)
    }

    /// Clear the card if it sits on `reader`; returns whether one was removed
    pub fn card_removed(&mut self, reader: &str) -> bool {
        match &self.card {
            Some(card) if card.reader_name() == reader => {
                info!("Card removed from {}", reader);
                self.card = None;
                true
            }
            _ => false,
        }
    }

    pub fn card(&self) -> Option<&CardSession> {
        self.card.as_ref()
    }

    pub fn is_present(&self) -> bool {
        self.card.is_some()
    }

    pub fn active_config(&self) -> &PageConfig {
        &self.active_config
    }

    /// Replace the active configuration by a registered one
    pub fn set_active_config(&mut self, name: &str) -> Result<&PageConfig, TagError> {
        match page::lookup(name) {
            Some(config) => {
                info!("Active configuration switched to {}", name);
                self.active_config = config;
                Ok(&self.active_config)
            }
            None => {
                warn!("Unknown configuration requested: {}", name);
                Err(TagError::UnknownConfig {
                    name: name.to_string(),
                    available: page::names(),
                })
            }
        }
    }

    /// Engine bound to the present card and the active configuration
    pub fn engine(&self) -> Result<Engine<'_>, TagError> {
        let card = self.card.as_ref().ok_or(TagError::NoCardPresent)?;
        Ok(Engine::new(card.reader(), &self.active_config))
    }

    /// Drop all readers and the card
    pub fn clear(&mut self) {
        self.readers.clear();
        self.card = None;
    }
}
