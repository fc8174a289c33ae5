//! Register transport
//!
//! The core never frames Modbus itself. It consumes a [`RegisterTransport`]
//! that reads and writes holding registers as raw big-endian bytes, and wraps
//! it in a [`RegisterPager`] so callers never see the per-transaction register
//! limit.

mod error;
mod link;
mod paging;
#[cfg(feature = "tokio-modbus")]
mod tcp;

use std::future::Future;

pub use error::{BoxError, TransportError};
pub use link::DeviceLink;
pub use paging::RegisterPager;
#[cfg(feature = "tokio-modbus")]
pub use tcp::TokioModbusTransport;

/// Holding-register access to one Modbus connection.
///
/// Implementations must preserve register order and big-endian layout. A
/// transport carries at most one outstanding transaction; the core never
/// issues calls concurrently on the same transport.
pub trait RegisterTransport: Send {
    /// Read `count` holding registers starting at `start`, returning
    /// `count * 2` bytes.
    fn read_holding_registers(
        &mut self,
        unit: u8,
        start: u16,
        count: u16,
    ) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;

    /// Write `bytes` (an even number of bytes) starting at register `start`.
    fn write_registers(
        &mut self,
        unit: u8,
        start: u16,
        bytes: &[u8],
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}
