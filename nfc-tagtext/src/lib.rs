//! Text payloads on NTAG-family tags
//!
//! Detects a tag placed on a contactless reader, probes which page offsets
//! and read lengths the card accepts, and reads, writes and verifies a short
//! text stored in one memory page.
//!
//! The reader driver is not part of this crate. It is consumed through the
//! [`transport::TagTransport`] capability and feeds attach/detach/error
//! [`transport::Notification`]s into a [`service::TagService`]:
//!
//! ```
//! use nfc_tagtext::card::{CardIdentity, NTAG_ATR};
//! use nfc_tagtext::service::{ServiceConfig, TagService};
//! use nfc_tagtext::transport::{reader_handle, Notification, SimulatedTag};
//!
//! let service = TagService::new(ServiceConfig::default());
//! service.handle_notification(Notification::ReaderAttached {
//!     name: "Reader 0".to_string(),
//!     handle: reader_handle(SimulatedTag::ntag213()),
//! });
//! service.handle_notification(Notification::CardAttached {
//!     reader: "Reader 0".to_string(),
//!     card: CardIdentity::new(vec![0x04, 0x11, 0x22], Some(NTAG_ATR.to_vec())),
//! });
//!
//! let written = service.write_text("42");
//! assert!(written.success && written.verified);
//! assert_eq!(service.read_text().text(), Some("42"));
//! ```

pub mod apdu;
pub mod card;
pub mod engine;
pub mod error;
pub mod events;
pub mod page;
pub mod probe;
pub mod service;
pub mod session;
pub mod transport;

pub use card::CardIdentity;
pub use engine::{bytes_to_text, Engine};
pub use error::{ErrorKind, TagError, TransportError};
pub use events::{Event, EventDispatcher};
pub use page::PageConfig;
pub use probe::ProbeResult;
pub use service::{ServiceConfig, TagService};
pub use session::Session;
pub use transport::{Notification, ReaderHandle, TagTransport};
