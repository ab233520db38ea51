//! Operations exposed to the front end
//!
//! `TagService` owns the session and the event dispatcher. Once started, a
//! single dispatch thread drains a bounded channel of transport
//! [`Notification`]s; handlers run to completion one at a time, so a card is
//! always probed before a queued read or write can see it.

pub mod config;
pub mod outcome;

pub use config::ServiceConfig;
pub use outcome::{
    CardInfoOutcome, ConfigOutcome, ControlOutcome, ReadOutcome, StatusOutcome, WriteOutcome,
};

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use chrono::Utc;
use crossbeam::channel::{self, Receiver, Sender};
use log::{debug, error, info, warn};
use parking_lot::Mutex;

use crate::error::TagError;
use crate::events::{ErrorCategory, Event, EventDispatcher};
use crate::session::Session;
use crate::transport::Notification;

enum Message {
    Notify(Notification),
    Shutdown,
}

/// Sending side of the notification channel, handed to the transport driver
#[derive(Clone)]
pub struct Notifier {
    tx: Sender<Message>,
}

impl Notifier {
    /// Queue a notification, blocking while the channel is full
    pub fn send(&self, notification: Notification) -> Result<(), TagError> {
        self.tx
            .send(Message::Notify(notification))
            .map_err(|_| TagError::NotRunning)
    }
}

struct Runtime {
    tx: Sender<Message>,
    worker: JoinHandle<()>,
}

/// Card session service
pub struct TagService {
    settings: ServiceConfig,
    session: Arc<Mutex<Session>>,
    events: Arc<EventDispatcher>,
    runtime: Mutex<Option<Runtime>>,
}

impl TagService {
    pub fn new(settings: ServiceConfig) -> Self {
        let session = Session::new(settings.initial_page_config(), settings.sample_len);
        Self {
            settings,
            session: Arc::new(Mutex::new(session)),
            events: Arc::new(EventDispatcher::new()),
            runtime: Mutex::new(None),
        }
    }

    /// Receive card-attached, card-removed and error events from now on
    pub fn subscribe(&self) -> Receiver<Event> {
        self.events.subscribe()
    }

    /// Start the dispatch thread; no-op when already running
    pub fn start(&self) -> ControlOutcome {
        let mut runtime = self.runtime.lock();
        if runtime.is_some() {
            return ControlOutcome::ok("Already running");
        }

        let (tx, rx) = channel::bounded(self.settings.channel_capacity());
        let session = Arc::clone(&self.session);
        let events = Arc::clone(&self.events);

        let spawned = thread::Builder::new()
            .name("tagtext-dispatch".to_string())
            .spawn(move || run_dispatch(rx, &session, &events));

        match spawned {
            Ok(worker) => {
                *runtime = Some(Runtime { tx, worker });
                info!("Service started");
                ControlOutcome::ok("Started")
            }
            Err(e) => {
                error!("Failed to spawn dispatch thread: {}", e);
                ControlOutcome::failure(&TagError::NotRunning, &format!("Failed to start: {}", e))
            }
        }
    }

    /// Stop the dispatch thread and forget readers and card
    pub fn stop(&self) -> ControlOutcome {
        let runtime = match self.runtime.lock().take() {
            Some(runtime) => runtime,
            None => return ControlOutcome::ok("Not running"),
        };

        // The worker may already be gone if it panicked
        let _ = runtime.tx.send(Message::Shutdown);
        let joined = runtime.worker.join();
        self.session.lock().clear();

        match joined {
            Ok(()) => {
                info!("Service stopped");
                ControlOutcome::ok("Stopped")
            }
            Err(_) => {
                error!("Dispatch thread panicked");
                ControlOutcome::failure(&TagError::NotRunning, "Dispatch thread panicked")
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.runtime.lock().is_some()
    }

    /// Handle for the transport driver to push notifications
    pub fn notifier(&self) -> Option<Notifier> {
        self.runtime
            .lock()
            .as_ref()
            .map(|r| Notifier { tx: r.tx.clone() })
    }

    /// Process a notification on the calling thread
    pub fn handle_notification(&self, notification: Notification) {
        dispatch(&self.session, &self.events, notification);
    }

    pub fn status(&self) -> StatusOutcome {
        let initialized = self.is_running();
        let session = self.session.lock();
        let reader_names = session.reader_names();

        StatusOutcome {
            initialized,
            reader_count: reader_names.len(),
            reader_names,
            current_reader: session.current_reader().map(|r| r.name.clone()),
            has_card: session.is_present(),
            card_phase: session.card().map(|c| c.phase()),
            active_config: session.active_config().clone(),
        }
    }

    pub fn read_text(&self) -> ReadOutcome {
        let session = self.session.lock();
        let config = session.active_config().clone();
        let result = session.engine().and_then(|engine| engine.read_text());
        ReadOutcome::from_result(result, config)
    }

    pub fn write_text(&self, text: &str) -> WriteOutcome {
        let session = self.session.lock();
        let config = session.active_config().clone();
        let result = session.engine().and_then(|engine| engine.write_text(text));
        WriteOutcome::from_result(text, result, config)
    }

    /// Card identity plus a test read with the active configuration
    pub fn get_card_info(&self) -> CardInfoOutcome {
        let session = self.session.lock();
        let card = match session.card() {
            Some(card) => card,
            None => return CardInfoOutcome::failure(&TagError::NoCardPresent),
        };

        let config = session.active_config().clone();
        let test_read = ReadOutcome::from_result(
            session.engine().and_then(|engine| engine.read_text()),
            config,
        );

        CardInfoOutcome {
            success: true,
            message: format!("Card {} on {}", card.identity().uid_hex(), card.reader_name()),
            card: Some(card.identity().clone()),
            reader: Some(card.reader_name().to_string()),
            phase: Some(card.phase()),
            attached_at: Some(card.attached_at()),
            probe: card.probe().cloned(),
            test_read: Some(test_read),
            error: None,
        }
    }

    pub fn set_config(&self, name: &str) -> ConfigOutcome {
        let mut session = self.session.lock();
        ConfigOutcome::from_result(session.set_active_config(name).cloned())
    }
}

impl Drop for TagService {
    fn drop(&mut self) {
        if self.is_running() {
            self.stop();
        }
    }
}

fn run_dispatch(rx: Receiver<Message>, session: &Mutex<Session>, events: &EventDispatcher) {
    debug!("Dispatch loop running");
    for message in rx.iter() {
        match message {
            Message::Notify(notification) => dispatch(session, events, notification),
            Message::Shutdown => break,
        }
    }
    debug!("Dispatch loop finished");
}

fn dispatch(session: &Mutex<Session>, events: &EventDispatcher, notification: Notification) {
    debug!("Notification: {}", notification.label());

    match notification {
        Notification::ReaderAttached { name, handle } => {
            session.lock().reader_attached(&name, handle);
        }
        Notification::ReaderDetached { name } => {
            let had_card = session.lock().reader_detached(&name);
            if had_card {
                events.broadcast(Event::CardRemoved { timestamp: Utc::now() });
            }
        }
        Notification::CardAttached { reader, card } => {
            let probed = session.lock().card_attached(&reader, card.clone());
            match probed {
                Ok(probe) => {
                    let inconclusive = probe.is_inconclusive();
                    events.broadcast(Event::CardAttached { card, probe });
                    if inconclusive {
                        events.broadcast(Event::Error {
                            category: ErrorCategory::Reader,
                            message: TagError::ProbeInconclusive.to_string(),
                        });
                    }
                }
                Err(e) => {
                    warn!("Card attach on {} not handled: {}", reader, e);
                    events.broadcast(Event::Error {
                        category: ErrorCategory::System,
                        message: e.to_string(),
                    });
                }
            }
        }
        Notification::CardRemoved { reader } => {
            session.lock().card_removed(&reader);
            events.broadcast(Event::CardRemoved { timestamp: Utc::now() });
        }
        Notification::ReaderError { reader, message } => {
            error!("Reader {} error: {}", reader, message);
            events.broadcast(Event::Error {
                category: ErrorCategory::Reader,
                message,
            });
        }
        Notification::SystemError { message } => {
            error!("System error: {}", message);
            events.broadcast(Event::Error {
                category: ErrorCategory::System,
                message,
            });
        }
    }
}
