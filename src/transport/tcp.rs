//! Modbus TCP client transport backed by `tokio-modbus`

use std::net::SocketAddr;

use tokio_modbus::client::Context;
use tokio_modbus::prelude::{ExceptionCode, Reader, Slave, SlaveContext, Writer, tcp};
use tracing::debug;

use super::{RegisterTransport, TransportError};

/// [`RegisterTransport`] over a `tokio-modbus` client context.
#[derive(Debug)]
pub struct TokioModbusTransport {
    ctx: Context,
}

impl TokioModbusTransport {
    /// Connect to a Modbus TCP server
    pub async fn connect(addr: SocketAddr) -> Result<Self, TransportError> {
        debug!(%addr, "connecting");
        let ctx = tcp::connect(addr).await?;
        Ok(Self { ctx })
    }

    /// Wrap an already connected context
    #[must_use]
    pub const fn from_context(ctx: Context) -> Self {
        Self { ctx }
    }

    /// Release the underlying context
    #[must_use]
    pub fn into_inner(self) -> Context {
        self.ctx
    }
}

impl RegisterTransport for TokioModbusTransport {
    async fn read_holding_registers(
        &mut self,
        unit: u8,
        start: u16,
        count: u16,
    ) -> Result<Vec<u8>, TransportError> {
        self.ctx.set_slave(Slave(unit));
        let words = self
            .ctx
            .read_holding_registers(start, count)
            .await
            .map_err(modbus_error)?
            .map_err(exception)?;
        Ok(words.iter().flat_map(|w| w.to_be_bytes()).collect())
    }

    async fn write_registers(
        &mut self,
        unit: u8,
        start: u16,
        bytes: &[u8],
    ) -> Result<(), TransportError> {
        self.ctx.set_slave(Slave(unit));
        let words: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        self.ctx
            .write_multiple_registers(start, &words)
            .await
            .map_err(modbus_error)?
            .map_err(exception)
    }
}

fn modbus_error(err: tokio_modbus::Error) -> TransportError {
    match err {
        tokio_modbus::Error::Transport(err) => TransportError::Io(err),
        other => TransportError::other(other),
    }
}

fn exception(code: ExceptionCode) -> TransportError {
    let code = match code {
        ExceptionCode::IllegalFunction => 0x01,
        ExceptionCode::IllegalDataAddress => 0x02,
        ExceptionCode::IllegalDataValue => 0x03,
        ExceptionCode::ServerDeviceFailure => 0x04,
        ExceptionCode::Acknowledge => 0x05,
        ExceptionCode::ServerDeviceBusy => 0x06,
        ExceptionCode::MemoryParityError => 0x08,
        ExceptionCode::GatewayPathUnavailable => 0x0A,
        ExceptionCode::GatewayTargetDevice => 0x0B,
        other => return TransportError::other(format!("modbus exception {other:?}")),
    };
    TransportError::Exception { code }
}
