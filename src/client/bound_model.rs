//! Schema-described model bound to a live register window

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::protocol::{BindingTable, BoundValue, Error, PointValue, Result};
use crate::schema::Model;
use crate::transport::{DeviceLink, RegisterTransport};

/// One model instance on a device.
///
/// The buffer mirrors the model's registers (header included) as of the last
/// [`refresh`](Self::refresh) or confirmed [`set`](Self::set). Values are
/// decoded from it on every access.
#[derive(Debug)]
pub struct BoundModel<T> {
    link: DeviceLink<T>,
    start: u16,
    table: BindingTable,
    buffer: Vec<u8>,
}

impl<T: RegisterTransport> BoundModel<T> {
    /// Bind `schema` to `length` registers starting at absolute address `start`.
    pub fn new(schema: Arc<Model>, link: DeviceLink<T>, start: u16, length: usize) -> Result<Self> {
        if usize::from(start) + length > 0x1_0000 {
            return Err(Error::AddressOutOfRange {
                start: u32::from(start),
                count: u32::try_from(length).unwrap_or(u32::MAX),
            });
        }
        let buffer = vec![0u8; length * 2];
        let table = BindingTable::new(schema, buffer.len())?;
        Ok(Self {
            link,
            start,
            table,
            buffer,
        })
    }

    /// Re-read the whole model window in one paged read.
    ///
    /// The buffer is only replaced when the read succeeds.
    #[instrument(level = "debug", skip(self), fields(model = self.id(), start = self.start))]
    pub async fn refresh(&mut self) -> Result<()> {
        let bytes = self.link.read(self.start, self.length()).await?;
        self.buffer = bytes;
        Ok(())
    }

    /// Decode the named point from the buffer.
    pub fn value(&self, name: &str) -> Result<PointValue> {
        let index = self.table.require(name)?;
        Ok(self.table.read(index, &self.buffer))
    }

    /// Views of every bound point in declaration order
    pub fn values(&self) -> impl Iterator<Item = BoundValue<'_>> {
        self.table.views(&self.buffer)
    }

    /// Write a value to the device and mirror it into the buffer.
    ///
    /// Read-only points are rejected before any I/O. The buffer is updated
    /// only after the transport confirms the write.
    #[instrument(level = "debug", skip(self, value), fields(model = self.id()))]
    pub async fn set(&mut self, name: &str, value: impl Into<PointValue>) -> Result<()> {
        let index = self.table.require(name)?;
        let binding = *self.table.binding(index).ok_or_else(|| Error::UnknownPoint {
            name: name.to_owned(),
        })?;
        if !self.table.point(&binding).is_writable() {
            return Err(Error::InvalidOperation(format!(
                "point {name} of model {} is read-only",
                self.id()
            )));
        }

        let scratch = self.table.encode(index, &value.into(), &self.buffer)?;
        let address = u16::try_from(usize::from(self.start) + binding.register_offset())
            .map_err(|_| Error::AddressOutOfRange {
                start: u32::from(self.start),
                count: u32::try_from(binding.register_offset()).unwrap_or(u32::MAX),
            })?;
        self.link.write(address, &scratch).await?;

        self.buffer[binding.offset()..binding.offset() + binding.len()].copy_from_slice(&scratch);
        debug!(point = name, address, "point written");
        Ok(())
    }
}

impl<T> BoundModel<T> {
    /// Model ID
    #[must_use]
    pub fn id(&self) -> u16 {
        self.table.schema().id
    }

    /// Absolute register address of the model header
    #[must_use]
    pub const fn start_address(&self) -> u16 {
        self.start
    }

    /// Length in registers, header included
    #[must_use]
    pub fn length(&self) -> usize {
        self.buffer.len() / 2
    }

    /// Raw register mirror
    #[must_use]
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Schema the model is bound to
    #[must_use]
    pub fn schema(&self) -> &Arc<Model> {
        self.table.schema()
    }

    /// Point bindings
    #[must_use]
    pub const fn bindings(&self) -> &BindingTable {
        &self.table
    }
}
