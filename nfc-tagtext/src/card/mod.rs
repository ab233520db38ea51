//! Card identity and ATR handling

pub mod atr;
pub mod identity;

pub use atr::{CardType, NTAG_ATR};
pub use identity::CardIdentity;
