//! Modbus TCP service backed by `tokio-modbus`

use std::future;
use std::io;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_modbus::prelude::{ExceptionCode, Request, Response};
use tokio_modbus::server::tcp::{Server, accept_tcp_connection};
use tracing::{debug, error};

use super::SunSpecServer;
use crate::protocol::Error;

/// `tokio-modbus` service exposing a [`SunSpecServer`] image.
///
/// Serves read holding registers and write single/multiple registers;
/// writes are dispatched to the owning models before the response is sent.
#[derive(Debug, Clone)]
pub struct ImageService {
    server: Arc<SunSpecServer>,
}

impl ImageService {
    /// Service over `server`
    #[must_use]
    pub const fn new(server: Arc<SunSpecServer>) -> Self {
        Self { server }
    }

    /// Accept connections on `listener` until it fails.
    pub async fn serve(self, listener: TcpListener) -> io::Result<()> {
        let server = Server::new(listener);
        let on_connected = move |stream, socket_addr| {
            let service = self.clone();
            async move {
                accept_tcp_connection(stream, socket_addr, move |_| Ok(Some(service.clone())))
            }
        };
        let on_process_error = |err| {
            error!("modbus connection error: {err}");
        };
        server.serve(&on_connected, on_process_error).await
    }
}

impl tokio_modbus::server::Service for ImageService {
    type Request = Request<'static>;
    type Response = Response;
    type Exception = ExceptionCode;
    type Future = future::Ready<Result<Self::Response, Self::Exception>>;

    fn call(&self, req: Self::Request) -> Self::Future {
        debug!(?req, "modbus request");
        let res = match req {
            Request::ReadHoldingRegisters(addr, cnt) => self
                .server
                .image()
                .read_words(addr, usize::from(cnt))
                .map(Response::ReadHoldingRegisters)
                .map_err(exception),
            Request::WriteMultipleRegisters(addr, values) => {
                let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
                let count = u16::try_from(values.len()).unwrap_or(u16::MAX);
                self.server
                    .write_registers(addr, &bytes)
                    .map(|()| Response::WriteMultipleRegisters(addr, count))
                    .map_err(exception)
            }
            Request::WriteSingleRegister(addr, value) => self
                .server
                .write_registers(addr, &value.to_be_bytes())
                .map(|()| Response::WriteSingleRegister(addr, value))
                .map_err(exception),
            _ => Err(ExceptionCode::IllegalFunction),
        };
        if let Err(code) = &res {
            error!(?code, "modbus request failed");
        }
        future::ready(res)
    }
}

fn exception(err: Error) -> ExceptionCode {
    match err {
        Error::AddressOutOfRange { .. } | Error::BufferTooSmall { .. } => {
            ExceptionCode::IllegalDataAddress
        }
        Error::InvalidValue { .. } => ExceptionCode::IllegalDataValue,
        other => {
            error!(error = %other, "write dispatch failed");
            ExceptionCode::ServerDeviceFailure
        }
    }
}
