//! Shared handle to one device connection

use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;

use super::{RegisterPager, RegisterTransport};
use crate::protocol::Result;

/// Cloneable handle to a transport, addressed to one unit.
///
/// Every bound model of a scan holds a link to the same connection. The
/// transport is locked for the duration of a whole paged operation, so two
/// paged reads never interleave their sub-requests.
pub struct DeviceLink<T> {
    transport: Arc<Mutex<T>>,
    unit: u8,
    pager: RegisterPager,
}

impl<T: RegisterTransport> DeviceLink<T> {
    /// Wrap `transport` for unit `unit`
    pub fn new(transport: T, unit: u8, pager: RegisterPager) -> Self {
        Self {
            transport: Arc::new(Mutex::new(transport)),
            unit,
            pager,
        }
    }

    /// Modbus unit identifier
    #[must_use]
    pub const fn unit(&self) -> u8 {
        self.unit
    }

    /// Pager used for every operation
    #[must_use]
    pub const fn pager(&self) -> RegisterPager {
        self.pager
    }

    /// Paged read of `count` registers at `start`
    pub async fn read(&self, start: u16, count: usize) -> Result<Vec<u8>> {
        let mut transport = self.transport.lock().await;
        self.pager.read(&mut *transport, self.unit, start, count).await
    }

    /// Paged write of `bytes` at `start`
    pub async fn write(&self, start: u16, bytes: &[u8]) -> Result<()> {
        let mut transport = self.transport.lock().await;
        self.pager.write(&mut *transport, self.unit, start, bytes).await
    }

    /// Run `f` with exclusive access to the underlying transport.
    pub async fn with_transport<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut transport = self.transport.lock().await;
        f(&mut transport)
    }
}

impl<T> Clone for DeviceLink<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            unit: self.unit,
            pager: self.pager,
        }
    }
}

impl<T> fmt::Debug for DeviceLink<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceLink")
            .field("unit", &self.unit)
            .field("pager", &self.pager)
            .finish_non_exhaustive()
    }
}
