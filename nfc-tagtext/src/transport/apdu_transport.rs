//! `TagTransport` over a raw APDU channel
//!
//! Maps byte addressed reads and writes onto READ BINARY / UPDATE BINARY
//! pseudo-APDUs. Reads go out in chunks of at most 16 bytes (four pages),
//! writes one page at a time.

use log::debug;

use super::TagTransport;
use crate::apdu::{APDU, Response};
use crate::error::TransportError;
use crate::page::PAGE_SIZE;

/// Largest READ BINARY most readers answer in one exchange
const READ_CHUNK: usize = 16;

/// Raw APDU exchange with the card, as provided by the PC/SC driver
pub trait CardChannel {
    /// Send a command APDU, return the response including SW1 SW2
    fn transmit(&mut self, apdu: &[u8]) -> Result<Vec<u8>, TransportError>;
}

/// Page access for storage tags built on a [`CardChannel`]
pub struct ApduTransport<C> {
    channel: C,
}

impl<C: CardChannel> ApduTransport<C> {
    pub fn new(channel: C) -> Self {
        Self { channel }
    }

    pub fn into_inner(self) -> C {
        self.channel
    }

    /// Read the card UID with GET DATA
    pub fn get_uid(&mut self) -> Result<Vec<u8>, TransportError> {
        self.exchange(&APDU::get_uid())
    }

    fn exchange(&mut self, cmd: &APDU) -> Result<Vec<u8>, TransportError> {
        let raw = cmd
            .to_bytes()
            .map_err(|e| TransportError::Device(e.to_string()))?;
        debug!("APDU: {:02X?}", raw);

        let reply = self.channel.transmit(&raw)?;
        debug!("Response: {:02X?}", reply);

        Response::from_bytes(&reply)
            .map_err(|e| TransportError::Device(e.to_string()))?
            .into_data()
    }
}

/// Page number for a byte address
fn page_of(address: u16) -> Result<u8, TransportError> {
    if address as usize % PAGE_SIZE != 0 {
        return Err(TransportError::Unaligned(address));
    }
    u8::try_from(address as usize / PAGE_SIZE)
        .map_err(|_| TransportError::Device(format!("address {} out of range", address)))
}

impl<C: CardChannel> TagTransport for ApduTransport<C> {
    fn read(&mut self, address: u16, length: usize) -> Result<Vec<u8>, TransportError> {
        let first_page = page_of(address)?;
        let mut out = Vec::with_capacity(length);

        while out.len() < length {
            let chunk = (length - out.len()).min(READ_CHUNK);
            let page = first_page as usize + out.len() / PAGE_SIZE;
            let page = u8::try_from(page)
                .map_err(|_| TransportError::Device(format!("page {} out of range", page)))?;

            let data = self.exchange(&APDU::read_binary(page, chunk as u8))?;
            if data.len() < chunk {
                return Err(TransportError::ShortResponse {
                    expected: chunk,
                    got: data.len(),
                });
            }
            out.extend_from_slice(&data[..chunk]);
        }

        Ok(out)
    }

    fn write(&mut self, address: u16, data: &[u8]) -> Result<(), TransportError> {
        let first_page = page_of(address)?;

        for (i, chunk) in data.chunks(PAGE_SIZE).enumerate() {
            let page = u8::try_from(first_page as usize + i)
                .map_err(|_| TransportError::Device("write runs past last page".to_string()))?;
            // UPDATE BINARY always carries a whole page
            let mut block = [0u8; PAGE_SIZE];
            block[..chunk.len()].copy_from_slice(chunk);
            self.exchange(&APDU::update_binary(page, &block))?;
        }

        Ok(())
    }
}
