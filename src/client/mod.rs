//! SunSpec client
//!
//! [`SunSpecClient::scan`] discovers the models a device exposes with no
//! prior knowledge of which are present and binds each one to its register
//! window as a [`BoundModel`].

mod bound_model;
mod config;
mod proxy;
mod scanner;

pub use bound_model::BoundModel;
pub use config::ClientConfig;
pub use proxy::{ProxyFactory, RawModel, RawModelFactory, SunSpecModel};
pub use scanner::{ScanState, SunSpecClient};
