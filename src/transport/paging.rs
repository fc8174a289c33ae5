//! Register paging
//!
//! Splits oversized register reads and writes into sequential transactions of
//! at most [`MAX_REGISTERS_PER_TRANSACTION`] registers and reassembles the
//! results, so the caller sees what an unrestricted single transaction would
//! have produced.

use tracing::{instrument, trace};

use super::RegisterTransport;
use crate::protocol::{Error, MAX_REGISTERS_PER_TRANSACTION, Result};

/// Exclusive upper bound of the 16-bit register address space
const ADDRESS_SPACE: usize = 0x1_0000;

/// Stateless paging adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterPager {
    width: u16,
}

impl RegisterPager {
    /// Create a pager issuing at most `width` registers per transaction.
    ///
    /// `width` is clamped to `1..=125`.
    #[must_use]
    pub fn new(width: u16) -> Self {
        Self {
            width: width.clamp(1, MAX_REGISTERS_PER_TRANSACTION),
        }
    }

    /// Registers per transaction
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Read `count` registers starting at `start`.
    ///
    /// Sub-requests are issued strictly in order; the first failure aborts
    /// the whole read.
    #[instrument(level = "debug", skip(self, transport))]
    pub async fn read<T>(&self, transport: &mut T, unit: u8, start: u16, count: usize) -> Result<Vec<u8>>
    where
        T: RegisterTransport + ?Sized,
    {
        check_range(start, count)?;
        let mut out = Vec::with_capacity(count * 2);
        let mut address = usize::from(start);
        let mut remaining = count;

        while remaining > 0 {
            let chunk = remaining.min(usize::from(self.width));
            let (chunk_start, chunk_len) = narrow(address, chunk)?;
            trace!(start = chunk_start, count = chunk_len, "read transaction");

            let bytes = transport
                .read_holding_registers(unit, chunk_start, chunk_len)
                .await?;
            if bytes.len() != chunk * 2 {
                return Err(Error::UnexpectedResponseLength {
                    expected: chunk * 2,
                    got: bytes.len(),
                });
            }
            out.extend_from_slice(&bytes);

            address = address.saturating_add(chunk);
            remaining -= chunk;
        }
        Ok(out)
    }

    /// Write `bytes` starting at register `start`.
    ///
    /// `bytes` must hold whole registers. Sub-requests are issued strictly in
    /// order; the first failure aborts the remaining writes.
    #[instrument(level = "debug", skip(self, transport, bytes), fields(len = bytes.len()))]
    pub async fn write<T>(&self, transport: &mut T, unit: u8, start: u16, bytes: &[u8]) -> Result<()>
    where
        T: RegisterTransport + ?Sized,
    {
        if bytes.len() % 2 != 0 {
            return Err(Error::InvalidOperation(format!(
                "cannot write {} bytes, registers are 2 bytes wide",
                bytes.len()
            )));
        }
        check_range(start, bytes.len() / 2)?;

        let mut address = usize::from(start);
        for chunk in bytes.chunks(usize::from(self.width) * 2) {
            let (chunk_start, chunk_len) = narrow(address, chunk.len() / 2)?;
            trace!(start = chunk_start, count = chunk_len, "write transaction");

            transport.write_registers(unit, chunk_start, chunk).await?;
            address = address.saturating_add(chunk.len() / 2);
        }
        Ok(())
    }
}

impl Default for RegisterPager {
    fn default() -> Self {
        Self::new(MAX_REGISTERS_PER_TRANSACTION)
    }
}

fn check_range(start: u16, count: usize) -> Result<()> {
    if usize::from(start) + count > ADDRESS_SPACE {
        return Err(Error::AddressOutOfRange {
            start: u32::from(start),
            count: u32::try_from(count).unwrap_or(u32::MAX),
        });
    }
    Ok(())
}

fn narrow(address: usize, count: usize) -> Result<(u16, u16)> {
    match (u16::try_from(address), u16::try_from(count)) {
        (Ok(address), Ok(count)) => Ok((address, count)),
        _ => Err(Error::AddressOutOfRange {
            start: u32::try_from(address).unwrap_or(u32::MAX),
            count: u32::try_from(count).unwrap_or(u32::MAX),
        }),
    }
}
