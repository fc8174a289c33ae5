//! Typed model proxies
//!
//! A scan hands every model's raw bytes to a [`ProxyFactory`], which may
//! decode them into a strongly typed, per-model accessor. Proxies are
//! independent snapshots: they do not observe later refreshes.

use std::any::Any;

use bytes::Bytes;

use crate::protocol::Result;

/// Typed view of one model instance.
pub trait SunSpecModel: Any + Send + Sync {
    /// Model ID
    fn id(&self) -> u16;

    /// Length in registers, header included
    fn length(&self) -> usize;

    /// Downcasting hook for concrete proxy types
    fn as_any(&self) -> &dyn Any;
}

/// Builds typed proxies from raw model bytes.
pub trait ProxyFactory: Send + Sync {
    /// Create the proxy for model `id` from its register bytes (header
    /// included).
    fn create_proxy(&self, id: u16, buffer: Bytes) -> Result<Box<dyn SunSpecModel>>;
}

/// Proxy factory yielding [`RawModel`] for every ID.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawModelFactory;

impl ProxyFactory for RawModelFactory {
    fn create_proxy(&self, id: u16, buffer: Bytes) -> Result<Box<dyn SunSpecModel>> {
        Ok(Box::new(RawModel { id, buffer }))
    }
}

/// Untyped proxy holding an immutable copy of the model's registers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawModel {
    id: u16,
    buffer: Bytes,
}

impl RawModel {
    /// Register bytes, header included
    #[must_use]
    pub const fn bytes(&self) -> &Bytes {
        &self.buffer
    }

    /// Register at `index` (model-relative, header included)
    #[must_use]
    pub fn register(&self, index: usize) -> Option<u16> {
        let pair = self.buffer.get(index * 2..index * 2 + 2)?;
        Some(u16::from_be_bytes([pair[0], pair[1]]))
    }
}

impl SunSpecModel for RawModel {
    fn id(&self) -> u16 {
        self.id
    }

    fn length(&self) -> usize {
        self.buffer.len() / 2
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
