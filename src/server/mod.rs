//! SunSpec server
//!
//! A [`SunSpecServer`] aggregates independently built models into one
//! register image:
//!
//! ```text
//! register 0      "SunS"
//! register 2      common model (ID 1)
//! ...             registered models, contiguous
//! end             0xFFFF 0xFFFF
//! ```
//!
//! Peer writes are routed back to the owning model through
//! [`SunSpecServer::notify_registers_changed`].

mod config;
mod dispatcher;
mod image;
mod loopback;
mod model;
mod registry;
mod schema_model;
#[cfg(feature = "tokio-modbus")]
mod tcp;

pub use config::{DeviceIdentity, ServerConfig};
pub use image::RegisterImage;
pub use loopback::LoopbackTransport;
pub use model::{BuildContext, BuiltModel, ModelBuilder, ServerModel};
pub use registry::SunSpecServer;
pub use schema_model::{ModelSlot, PointChange, SchemaModelBuilder, SchemaServerModel};
#[cfg(feature = "tokio-modbus")]
pub use tcp::ImageService;
