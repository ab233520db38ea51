//! Event broadcast to external subscribers
//!
//! Fire-and-forget: every subscriber gets its own unbounded channel, events
//! are never replayed and subscribers that went away are dropped on the next
//! broadcast.

use chrono::{DateTime, Utc};
use crossbeam::channel::{self, Receiver, Sender};
use log::debug;
use parking_lot::Mutex;
use serde::Serialize;

use crate::card::CardIdentity;
use crate::probe::ProbeResult;

/// Origin of an error event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Reader,
    System,
}

/// Notification relayed to subscribers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum Event {
    #[serde(rename_all = "camelCase")]
    CardAttached {
        card: CardIdentity,
        probe: ProbeResult,
    },
    #[serde(rename_all = "camelCase")]
    CardRemoved { timestamp: DateTime<Utc> },
    #[serde(rename_all = "camelCase")]
    Error {
        category: ErrorCategory,
        message: String,
    },
}

/// Broadcasts events to every registered subscriber
#[derive(Default)]
pub struct EventDispatcher {
    subscribers: Mutex<Vec<Sender<Event>>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber; only events fired from now on are delivered
    pub fn subscribe(&self) -> Receiver<Event> {
        let (tx, rx) = channel::unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Deliver an event to all live subscribers
    pub fn broadcast(&self, event: Event) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        debug!("Broadcast event to {} subscriber(s)", subscribers.len());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}
