//! Reader capability consumed by the core
//!
//! The physical driver lives outside this crate. It hands the core a
//! [`ReaderHandle`] when a reader attaches and feeds attach/detach/error
//! [`Notification`]s into the service.

mod apdu_transport;
mod sim;

pub use apdu_transport::{ApduTransport, CardChannel};
pub use sim::SimulatedTag;

use std::sync::Arc;

use parking_lot::Mutex;

use crate::card::CardIdentity;
use crate::error::TransportError;

/// Byte addressed access to the tag memory
pub trait TagTransport {
    /// Read `length` bytes starting at `address`
    fn read(&mut self, address: u16, length: usize) -> Result<Vec<u8>, TransportError>;

    /// Write all of `data` starting at `address`
    fn write(&mut self, address: u16, data: &[u8]) -> Result<(), TransportError>;
}

/// Shared handle to an attached reader
///
/// Owned by the transport collaborator; the session keeps a clone only while
/// the reader stays attached. The lock serializes bus access.
pub type ReaderHandle = Arc<Mutex<dyn TagTransport + Send>>;

/// Wrap a transport into a handle
pub fn reader_handle<T: TagTransport + Send + 'static>(transport: T) -> ReaderHandle {
    Arc::new(Mutex::new(transport))
}

/// Events delivered by the transport collaborator
pub enum Notification {
    ReaderAttached { name: String, handle: ReaderHandle },
    ReaderDetached { name: String },
    CardAttached { reader: String, card: CardIdentity },
    CardRemoved { reader: String },
    ReaderError { reader: String, message: String },
    SystemError { message: String },
}

impl Notification {
    /// Short label for logging
    pub fn label(&self) -> &'static str {
        match self {
            Notification::ReaderAttached { .. } => "reader-attached",
            Notification::ReaderDetached { .. } => "reader-detached",
            Notification::CardAttached { .. } => "card-attached",
            Notification::CardRemoved { .. } => "card-removed",
            Notification::ReaderError { .. } => "reader-error",
            Notification::SystemError { .. } => "system-error",
        }
    }
}
