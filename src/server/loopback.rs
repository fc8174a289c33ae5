//! In-process transport over a server's register image

use std::sync::Arc;

use super::SunSpecServer;
use crate::protocol::Error;
use crate::transport::{RegisterTransport, TransportError};

/// Modbus "illegal data address" exception
const ILLEGAL_DATA_ADDRESS: u8 = 0x02;
/// Modbus "gateway target device failed to respond" exception
const TARGET_FAILED_TO_RESPOND: u8 = 0x0B;

/// [`RegisterTransport`] reading and writing a [`SunSpecServer`] directly.
///
/// Writes go through the change dispatcher exactly like writes from a
/// network peer.
#[derive(Debug, Clone)]
pub struct LoopbackTransport {
    server: Arc<SunSpecServer>,
}

impl LoopbackTransport {
    /// Transport talking to `server`
    #[must_use]
    pub const fn new(server: Arc<SunSpecServer>) -> Self {
        Self { server }
    }

    fn check_unit(&self, unit: u8) -> Result<(), TransportError> {
        if unit == self.server.config().unit_id {
            Ok(())
        } else {
            Err(TransportError::Exception {
                code: TARGET_FAILED_TO_RESPOND,
            })
        }
    }
}

impl RegisterTransport for LoopbackTransport {
    async fn read_holding_registers(
        &mut self,
        unit: u8,
        start: u16,
        count: u16,
    ) -> Result<Vec<u8>, TransportError> {
        self.check_unit(unit)?;
        self.server
            .image()
            .read(start, usize::from(count))
            .map_err(into_transport)
    }

    async fn write_registers(
        &mut self,
        unit: u8,
        start: u16,
        bytes: &[u8],
    ) -> Result<(), TransportError> {
        self.check_unit(unit)?;
        self.server
            .write_registers(start, bytes)
            .map_err(into_transport)
    }
}

fn into_transport(err: Error) -> TransportError {
    match err {
        Error::AddressOutOfRange { .. } => TransportError::Exception {
            code: ILLEGAL_DATA_ADDRESS,
        },
        Error::Transport(err) => err,
        other => TransportError::other(other),
    }
}
