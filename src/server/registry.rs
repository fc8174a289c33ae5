//! Model register builder registry
//!
//! Lays registered builders out contiguously after the `"SunS"` preamble and
//! closes the map with the end marker. Registry mutation and offset lookups
//! share one lock, so change dispatch never observes a half-built map. When
//! both locks are needed the registry lock is taken before the image lock.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, instrument};

use super::{
    BuildContext, ModelBuilder, ModelSlot, RegisterImage, SchemaModelBuilder, SchemaServerModel,
    ServerConfig, ServerModel,
};
use crate::protocol::{END_MODEL_ID, Error, HEADER_REGISTERS, PREAMBLE, PREAMBLE_REGISTERS, Result};
use crate::schema::common_model;

pub(super) struct Registry {
    pub(super) builders: Vec<Box<dyn ModelBuilder>>,
    /// Models keyed by the register of their header
    pub(super) models: BTreeMap<u16, Arc<dyn ServerModel>>,
    pub(super) cursor: usize,
    /// Register of the end marker once built
    pub(super) end: Option<usize>,
}

/// SunSpec server: a register image aggregating any number of models.
pub struct SunSpecServer {
    config: ServerConfig,
    image: RegisterImage,
    registry: Mutex<Registry>,
    common: ModelSlot,
}

impl SunSpecServer {
    /// Create a server holding only the common model, built and ready to
    /// serve.
    pub fn new(config: ServerConfig) -> Result<Self> {
        let server = Self {
            image: RegisterImage::new(config.register_count),
            config,
            registry: Mutex::new(Registry {
                builders: Vec::new(),
                models: BTreeMap::new(),
                cursor: 0,
                end: None,
            }),
            common: ModelSlot::default(),
        };
        server.initialise();
        server.build()?;
        Ok(server)
    }

    /// Reset the layout: drop every builder and model, write the preamble,
    /// and register the common model builder.
    #[instrument(level = "debug", skip(self))]
    pub fn initialise(&self) {
        let mut registry = self.registry();
        registry.builders.clear();
        registry.models.clear();
        registry.end = None;
        {
            let mut image = self.image.lock();
            image.fill(0);
            let n = PREAMBLE.len().min(image.len());
            image[..n].copy_from_slice(&PREAMBLE[..n]);
        }
        registry.cursor = usize::from(PREAMBLE_REGISTERS);

        let identity = &self.config.identity;
        let common = SchemaModelBuilder::new(Arc::new(common_model()))
            .with_value("Mn", identity.manufacturer.as_str())
            .with_value("Md", identity.model.as_str())
            .with_value("Opt", identity.options.as_str())
            .with_value("Vr", identity.version.as_str())
            .with_value("SN", identity.serial_number.as_str())
            .with_value("DA", identity.device_address)
            .with_slot(self.common.clone());
        registry.builders.push(Box::new(common));
    }

    /// Queue a builder; nothing is laid out until [`build`](Self::build).
    pub fn register_builder(&self, builder: impl ModelBuilder + 'static) {
        self.registry().builders.push(Box::new(builder));
    }

    /// Lay out every registered builder and write the end marker.
    ///
    /// Fails with [`Error::InvalidOperation`] unless [`initialise`](Self::initialise)
    /// ran since the last build.
    #[instrument(level = "debug", skip(self))]
    pub fn build(&self) -> Result<()> {
        let mut registry = self.registry();
        if registry.cursor != usize::from(PREAMBLE_REGISTERS) {
            return Err(Error::InvalidOperation(
                "build requires a fresh initialise".to_owned(),
            ));
        }

        let Registry {
            builders,
            models,
            cursor,
            end,
        } = &mut *registry;
        for builder in builders.iter_mut() {
            let start = u16::try_from(*cursor).map_err(|_| Error::AddressOutOfRange {
                start: u32::try_from(*cursor).unwrap_or(u32::MAX),
                count: 0,
            })?;
            // Builders lay out into a copy of the tail so the image stays
            // unlocked while they run.
            let mut scratch = self
                .image
                .lock()
                .get(*cursor * 2..)
                .map(<[u8]>::to_vec)
                .unwrap_or_default();
            let ctx = BuildContext {
                tail: &mut scratch,
                start,
                image: &self.image,
            };
            let Some(built) = builder.build(ctx)? else {
                continue;
            };
            if built.length < usize::from(HEADER_REGISTERS) || built.length * 2 > scratch.len() {
                return Err(Error::InvalidOperation(format!(
                    "model {} at register {start} reported length {} with {} registers free",
                    built.model.id(),
                    built.length,
                    scratch.len() / 2
                )));
            }
            self.image.write(start, &scratch[..built.length * 2])?;
            debug!(id = built.model.id(), start, length = built.length, "model registered");
            models.insert(start, built.model);
            *cursor += built.length;
        }

        let mut image = self.image.lock();
        let footer = *cursor * 2..(*cursor + usize::from(HEADER_REGISTERS)) * 2;
        let Some(marker) = image.get_mut(footer) else {
            return Err(Error::BufferTooSmall {
                needed: (*cursor + usize::from(HEADER_REGISTERS)) * 2,
                got: image.len(),
            });
        };
        marker[..2].copy_from_slice(&END_MODEL_ID.to_be_bytes());
        marker[2..].copy_from_slice(&END_MODEL_ID.to_be_bytes());
        *end = Some(*cursor);
        debug!(models = models.len(), end = *cursor, "register map built");
        Ok(())
    }

    /// Configuration the server was created with
    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Served register image
    #[must_use]
    pub const fn image(&self) -> &RegisterImage {
        &self.image
    }

    /// The implicit common model
    #[must_use]
    pub fn common_model(&self) -> Option<Arc<SchemaServerModel>> {
        self.common.get()
    }

    /// Built models with the register of their header, ascending
    #[must_use]
    pub fn models(&self) -> Vec<(u16, Arc<dyn ServerModel>)> {
        self.registry()
            .models
            .iter()
            .map(|(&offset, model)| (offset, Arc::clone(model)))
            .collect()
    }

    /// Register of the end marker, once built
    #[must_use]
    pub fn end_address(&self) -> Option<usize> {
        self.registry().end
    }

    pub(super) fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().expect("registry lock poisoned")
    }
}

impl std::fmt::Debug for SunSpecServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SunSpecServer")
            .field("config", &self.config)
            .field("end", &self.end_address())
            .finish_non_exhaustive()
    }
}
