//! Schema-driven server models
//!
//! [`SchemaModelBuilder`] lays any schema out in the register image with
//! every point absent except the ones given initial values. The
//! [`SchemaServerModel`] it builds reads and writes points directly in the
//! image and maps peer writes back to point names.

use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{debug, trace};

use super::{BuildContext, BuiltModel, ModelBuilder, RegisterImage, ServerModel};
use crate::protocol::{BindingTable, Error, HEADER_REGISTERS, PointValue, Result};
use crate::schema::Model;

type ChangeListener = Arc<dyn Fn(&PointChange) -> Result<()> + Send + Sync>;

/// Peer write observed on a point.
#[derive(Debug, Clone, PartialEq)]
pub struct PointChange {
    /// Point covering the written register
    pub point: String,
    /// Relative register index as delivered by the dispatcher
    pub relative: usize,
    /// Point value after the write
    pub value: PointValue,
}

/// Shared handle to the model a builder produced on its last build.
#[derive(Clone, Default)]
pub struct ModelSlot {
    inner: Arc<Mutex<Option<Arc<SchemaServerModel>>>>,
}

impl ModelSlot {
    /// Model from the latest build, if the builder has run
    #[must_use]
    pub fn get(&self) -> Option<Arc<SchemaServerModel>> {
        self.inner.lock().expect("model slot lock poisoned").clone()
    }

    fn set(&self, model: Arc<SchemaServerModel>) {
        *self.inner.lock().expect("model slot lock poisoned") = Some(model);
    }
}

impl fmt::Debug for ModelSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSlot")
            .field("built", &self.get().is_some())
            .finish()
    }
}

/// Builder laying out a model from its schema.
#[derive(Debug, Clone)]
pub struct SchemaModelBuilder {
    schema: Arc<Model>,
    values: Vec<(String, PointValue)>,
    slot: ModelSlot,
}

impl SchemaModelBuilder {
    /// Builder for `schema`
    #[must_use]
    pub fn new(schema: Arc<Model>) -> Self {
        Self {
            schema,
            values: Vec::new(),
            slot: ModelSlot::default(),
        }
    }

    /// Initial value of a point.
    ///
    /// Values are applied in the order given, so a scale factor must be set
    /// before the points it scales.
    #[must_use]
    pub fn with_value(mut self, point: impl Into<String>, value: impl Into<PointValue>) -> Self {
        self.values.push((point.into(), value.into()));
        self
    }

    /// Slot receiving the built model
    #[must_use]
    pub fn slot(&self) -> ModelSlot {
        self.slot.clone()
    }

    /// Publish built models into an existing slot
    #[must_use]
    pub fn with_slot(mut self, slot: ModelSlot) -> Self {
        self.slot = slot;
        self
    }
}

impl ModelBuilder for SchemaModelBuilder {
    fn build(&mut self, ctx: BuildContext<'_>) -> Result<Option<BuiltModel>> {
        let length = self.schema.register_length();
        if length <= usize::from(HEADER_REGISTERS) {
            trace!(model = self.schema.id, "declined: no data registers");
            return Ok(None);
        }
        let data_length = u16::try_from(length - usize::from(HEADER_REGISTERS)).map_err(|_| {
            Error::InvalidSchema(format!("model {} is too long", self.schema.id))
        })?;
        if ctx.tail.len() < length * 2 {
            return Err(Error::BufferTooSmall {
                needed: length * 2,
                got: ctx.tail.len(),
            });
        }

        let window = &mut ctx.tail[..length * 2];
        let table = BindingTable::new(Arc::clone(&self.schema), window.len())?;
        for (index, binding) in table.bindings().enumerate() {
            let absent = table.encode(index, &PointValue::Absent, window)?;
            window[binding.offset()..binding.offset() + binding.len()].copy_from_slice(&absent);
        }
        window[0..2].copy_from_slice(&self.schema.id.to_be_bytes());
        window[2..4].copy_from_slice(&data_length.to_be_bytes());

        for (name, value) in &self.values {
            let index = table.require(name)?;
            let binding = *table.binding(index).ok_or_else(|| Error::UnknownPoint {
                name: name.clone(),
            })?;
            let bytes = table.encode(index, value, window)?;
            window[binding.offset()..binding.offset() + binding.len()].copy_from_slice(&bytes);
        }

        let model = Arc::new(SchemaServerModel {
            table,
            image: ctx.image.clone(),
            start: ctx.start,
            length,
            listeners: Mutex::new(Vec::new()),
            changes: Mutex::new(Vec::new()),
        });
        self.slot.set(Arc::clone(&model));
        debug!(model = self.schema.id, start = ctx.start, length, "model laid out");
        Ok(Some(BuiltModel { length, model }))
    }
}

/// Schema-described model living in a server's register image.
pub struct SchemaServerModel {
    table: BindingTable,
    image: RegisterImage,
    start: u16,
    length: usize,
    listeners: Mutex<Vec<ChangeListener>>,
    changes: Mutex<Vec<PointChange>>,
}

impl SchemaServerModel {
    /// Absolute register address of the model header
    #[must_use]
    pub const fn start_address(&self) -> u16 {
        self.start
    }

    /// Schema the model was built from
    #[must_use]
    pub fn schema(&self) -> &Arc<Model> {
        self.table.schema()
    }

    /// Decode the named point from the image
    pub fn get(&self, name: &str) -> Result<PointValue> {
        let index = self.table.require(name)?;
        let image = self.image.lock();
        Ok(self.table.read(index, self.window(&image)))
    }

    /// Encode a value into the image.
    ///
    /// The server owns its values, so read-only points are writable here.
    pub fn set(&self, name: &str, value: impl Into<PointValue>) -> Result<()> {
        let index = self.table.require(name)?;
        let binding = *self.table.binding(index).ok_or_else(|| Error::UnknownPoint {
            name: name.to_owned(),
        })?;
        let mut image = self.image.lock();
        let from = usize::from(self.start) * 2;
        let window = &mut image[from..from + self.length * 2];
        let bytes = self.table.encode(index, &value.into(), window)?;
        window[binding.offset()..binding.offset() + binding.len()].copy_from_slice(&bytes);
        Ok(())
    }

    /// Call `listener` for every peer write into this model
    pub fn on_change(&self, listener: impl Fn(&PointChange) -> Result<()> + Send + Sync + 'static) {
        self.listeners
            .lock()
            .expect("listener lock poisoned")
            .push(Arc::new(listener));
    }

    /// Drain the peer writes recorded since the last call
    pub fn take_changes(&self) -> Vec<PointChange> {
        std::mem::take(&mut *self.changes.lock().expect("change log lock poisoned"))
    }

    fn window<'a>(&self, image: &'a [u8]) -> &'a [u8] {
        let from = usize::from(self.start) * 2;
        &image[from..from + self.length * 2]
    }
}

impl ServerModel for SchemaServerModel {
    fn id(&self) -> u16 {
        self.table.schema().id
    }

    fn length(&self) -> usize {
        self.length
    }

    fn notify_value_changed(&self, relative: usize) -> Result<()> {
        let Some(binding) = self
            .table
            .index_at_register(relative + 1)
            .and_then(|index| self.table.binding(index))
        else {
            trace!(model = self.id(), relative, "write outside any point");
            return Ok(());
        };
        let point = self.table.point(binding).name.clone();
        let value = self.get(&point)?;
        let change = PointChange {
            point,
            relative,
            value,
        };
        trace!(model = self.id(), point = %change.point, "point changed");

        let listeners = self.listeners.lock().expect("listener lock poisoned").clone();
        self.changes
            .lock()
            .expect("change log lock poisoned")
            .push(change.clone());
        for listener in listeners {
            listener(&change)?;
        }
        Ok(())
    }
}

impl fmt::Debug for SchemaServerModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaServerModel")
            .field("id", &self.id())
            .field("start", &self.start)
            .field("length", &self.length)
            .finish_non_exhaustive()
    }
}
