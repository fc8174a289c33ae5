//! Device scanner
//!
//! Walks a device's register map from the base address: validates the
//! `"SunS"` preamble and the common model, then follows model headers until
//! the end marker, binding every model it finds.
//!
//! ```text
//! AwaitPreamble -> AwaitCommonModel -> WalkModels -> Done
//!       \________________\_________________\______-> Failed
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, instrument, trace};

use super::{BoundModel, ClientConfig, ProxyFactory, RawModelFactory, SunSpecModel};
use crate::protocol::{
    COMMON_MODEL_ID, END_MODEL_ID, Error, HEADER_REGISTERS, Identification, PREAMBLE,
    PREAMBLE_REGISTERS, Result,
};
use crate::schema::SchemaProvider;
use crate::transport::{DeviceLink, RegisterTransport};

/// Scanner state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    /// No scan has run yet
    #[default]
    Idle,
    /// Reading the preamble
    AwaitPreamble,
    /// Checking the first model ID
    AwaitCommonModel,
    /// Following model headers; `cursor` is relative to the base address
    WalkModels {
        /// Register of the next header
        cursor: u32,
    },
    /// Last scan succeeded
    Done,
    /// Last scan failed
    Failed,
}

/// SunSpec client for one device.
pub struct SunSpecClient<T> {
    link: DeviceLink<T>,
    config: ClientConfig,
    schemas: Arc<dyn SchemaProvider>,
    factory: Arc<dyn ProxyFactory>,
    state: ScanState,
    models: Vec<BoundModel<T>>,
    groups: BTreeMap<u16, Vec<usize>>,
    proxies: Vec<Box<dyn SunSpecModel>>,
}

impl<T: RegisterTransport> SunSpecClient<T> {
    /// Create a client over `transport`, resolving schemas through `schemas`.
    pub fn new(transport: T, config: ClientConfig, schemas: impl SchemaProvider + 'static) -> Self {
        Self {
            link: DeviceLink::new(transport, config.unit_id, config.pager()),
            config,
            schemas: Arc::new(schemas),
            factory: Arc::new(RawModelFactory),
            state: ScanState::Idle,
            models: Vec::new(),
            groups: BTreeMap::new(),
            proxies: Vec::new(),
        }
    }

    /// Use `factory` to build typed proxies
    #[must_use]
    pub fn with_proxy_factory(mut self, factory: impl ProxyFactory + 'static) -> Self {
        self.factory = Arc::new(factory);
        self
    }

    /// Discover and bind every model on the device.
    ///
    /// Previous results are discarded before the scan starts and replaced
    /// only when the whole scan succeeds; a failed scan leaves no models.
    #[instrument(level = "debug", skip(self), fields(unit = self.config.unit_id, base = self.config.base_address))]
    pub async fn scan(&mut self) -> Result<()> {
        self.models.clear();
        self.groups.clear();
        self.proxies.clear();

        match self.walk().await {
            Ok((models, proxies)) => {
                for (index, model) in models.iter().enumerate() {
                    self.groups.entry(model.id()).or_default().push(index);
                }
                debug!(models = models.len(), "scan complete");
                self.models = models;
                self.proxies = proxies;
                self.state = ScanState::Done;
                Ok(())
            }
            Err(err) => {
                debug!(error = %err, "scan failed");
                self.state = ScanState::Failed;
                Err(err)
            }
        }
    }

    async fn walk(&mut self) -> Result<(Vec<BoundModel<T>>, Vec<Box<dyn SunSpecModel>>)> {
        let mut models = Vec::new();
        let mut proxies = Vec::new();
        let mut head = Vec::new();
        self.state = ScanState::AwaitPreamble;

        loop {
            let next = match self.state {
                ScanState::AwaitPreamble => {
                    head = self.link.read(self.config.base_address, 4).await?;
                    let found: [u8; 4] = [head[0], head[1], head[2], head[3]];
                    if &found != PREAMBLE {
                        return Err(Identification::MissingPreamble { found }.into());
                    }
                    ScanState::AwaitCommonModel
                }
                ScanState::AwaitCommonModel => {
                    let found = u16::from_be_bytes([head[4], head[5]]);
                    if found != COMMON_MODEL_ID {
                        return Err(Identification::MissingCommonModel { found }.into());
                    }
                    ScanState::WalkModels {
                        cursor: u32::from(PREAMBLE_REGISTERS),
                    }
                }
                ScanState::WalkModels { cursor } => {
                    let address = self.address(cursor, u32::from(HEADER_REGISTERS))?;
                    let header = self.link.read(address, usize::from(HEADER_REGISTERS)).await?;
                    let id = u16::from_be_bytes([header[0], header[1]]);
                    let data_length = u16::from_be_bytes([header[2], header[3]]);
                    trace!(cursor, id, data_length, "model header");

                    if id == END_MODEL_ID {
                        ScanState::Done
                    } else if id == 0 {
                        ScanState::WalkModels {
                            cursor: cursor + u32::from(HEADER_REGISTERS),
                        }
                    } else {
                        let length = u32::from(data_length) + u32::from(HEADER_REGISTERS);
                        self.address(cursor, length)?;
                        let schema = self.schemas.model_schema(id)?;
                        let mut model =
                            BoundModel::new(schema, self.link.clone(), address, length as usize)?;
                        model.refresh().await?;
                        proxies.push(
                            self.factory
                                .create_proxy(id, Bytes::copy_from_slice(model.buffer()))?,
                        );
                        debug!(id, address, length, "model found");
                        models.push(model);
                        ScanState::WalkModels {
                            cursor: cursor + length,
                        }
                    }
                }
                ScanState::Done => return Ok((models, proxies)),
                ScanState::Idle | ScanState::Failed => {
                    return Err(Error::InvalidOperation(format!(
                        "scanner entered {:?} mid-scan",
                        self.state
                    )));
                }
            };
            self.state = next;
        }
    }

    /// Absolute address of `count` registers at relative `cursor`
    fn address(&self, cursor: u32, count: u32) -> Result<u16> {
        let start = u32::from(self.config.base_address) + cursor;
        if start + count > 0x1_0000 {
            return Err(Error::AddressOutOfRange { start, count });
        }
        u16::try_from(start).map_err(|_| Error::AddressOutOfRange { start, count })
    }
}

impl<T> SunSpecClient<T> {
    /// Scanner state
    #[must_use]
    pub const fn state(&self) -> ScanState {
        self.state
    }

    /// Client configuration
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Every bound model in device order
    #[must_use]
    pub fn models(&self) -> &[BoundModel<T>] {
        &self.models
    }

    /// Mutable access to the bound models, for refreshing and writing
    pub fn models_mut(&mut self) -> &mut [BoundModel<T>] {
        &mut self.models
    }

    /// Every instance of model `id` in device order
    pub fn models_by_id(&self, id: u16) -> impl Iterator<Item = &BoundModel<T>> {
        self.groups
            .get(&id)
            .into_iter()
            .flatten()
            .map(|&index| &self.models[index])
    }

    /// Mutable access to the first instance of model `id`
    pub fn model_mut(&mut self, id: u16) -> Option<&mut BoundModel<T>> {
        let index = *self.groups.get(&id)?.first()?;
        self.models.get_mut(index)
    }

    /// Distinct model IDs found, ascending
    pub fn model_ids(&self) -> impl Iterator<Item = u16> + '_ {
        self.groups.keys().copied()
    }

    /// The common model, present after every successful scan
    #[must_use]
    pub fn common(&self) -> Option<&BoundModel<T>> {
        self.models_by_id(COMMON_MODEL_ID).next()
    }

    /// Typed proxies, parallel to [`models`](Self::models)
    #[must_use]
    pub fn proxies(&self) -> &[Box<dyn SunSpecModel>] {
        &self.proxies
    }
}
