//! SunSpec - register-level protocol engine for SunSpec Modbus devices
//!
//! SunSpec is a register layout and data-model convention for solar
//! inverters, batteries, and other distributed energy resources. This crate
//! implements both sides of it:
//!
//! - a **client** that discovers and decodes the models a device exposes with
//!   no prior knowledge of which are present, and
//! - a **server** that aggregates any number of models into one consistent
//!   register map and routes peer writes back to the owning model.
//!
//! Modbus framing stays outside the core: anything implementing
//! [`RegisterTransport`] can carry the registers.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sunspec::{
//!     ClientConfig, LoopbackTransport, SchemaRegistry, ServerConfig, SunSpecClient,
//!     SunSpecServer,
//! };
//!
//! # async fn run() -> sunspec::Result<()> {
//! let server = Arc::new(SunSpecServer::new(ServerConfig::default())?);
//!
//! let transport = LoopbackTransport::new(Arc::clone(&server));
//! let mut client = SunSpecClient::new(transport, ClientConfig::default(), SchemaRegistry::new());
//! client.scan().await?;
//!
//! for model in client.models() {
//!     for point in model.values() {
//!         println!("{}.{} = {}", model.id(), point.name(), point.value());
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Transparent paging** - reads and writes of any size are split into
//!   125-register transactions
//! - **Typed values** - absent values, scale factors, enums, and bitfields
//!   decode into [`PointValue`]
//! - **`serde`** - serialize and deserialize schemas and configuration
//! - **`tokio-modbus`** - Modbus TCP client transport and server service

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod client;
pub mod protocol;
pub mod schema;
pub mod server;
pub mod transport;

pub use client::{BoundModel, ClientConfig, ScanState, SunSpecClient};
pub use protocol::{Error, Identification, PointType, PointValue, Result};
pub use schema::{Model, Point, SchemaProvider, SchemaRegistry};
pub use server::{
    DeviceIdentity, LoopbackTransport, SchemaModelBuilder, ServerConfig, SunSpecServer,
};
pub use transport::{RegisterTransport, TransportError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default Modbus TCP port
pub const DEFAULT_PORT: u16 = 502;
