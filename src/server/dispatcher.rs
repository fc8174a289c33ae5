//! Register change dispatcher
//!
//! Routes register-write notifications to the model owning the written
//! register. The owner of index `i` is the model with the greatest header
//! offset strictly below `i`; it receives `i - offset - 1`, so the first data
//! register of a model at `offset` arrives as relative index 1.

use std::sync::Arc;

use tracing::{instrument, trace, warn};

use super::{ServerModel, SunSpecServer};
use crate::protocol::Result;

impl SunSpecServer {
    /// Notify owning models that `indices` were written.
    ///
    /// Writes inside the preamble or at or past the end marker are ignored.
    /// Callbacks run synchronously after the registry lock is released; the
    /// first callback error is returned.
    #[instrument(level = "debug", skip(self, indices))]
    pub fn notify_registers_changed(&self, indices: impl IntoIterator<Item = usize>) -> Result<()> {
        let targets: Vec<(Arc<dyn ServerModel>, usize)> = {
            let registry = self.registry();
            indices
                .into_iter()
                .filter_map(|index| {
                    if registry.end.is_none_or(|end| index >= end) {
                        warn!(index, "write outside every model ignored");
                        return None;
                    }
                    let key = u16::try_from(index).ok()?;
                    let Some((&offset, model)) = registry.models.range(..key).next_back() else {
                        warn!(index, "write outside every model ignored");
                        return None;
                    };
                    let relative = index - usize::from(offset) - 1;
                    trace!(index, offset, model = model.id(), relative, "dispatch");
                    Some((Arc::clone(model), relative))
                })
                .collect()
        };

        for (model, relative) in targets {
            model.notify_value_changed(relative)?;
        }
        Ok(())
    }

    /// Apply a peer write to the image and dispatch it.
    pub fn write_registers(&self, start: u16, bytes: &[u8]) -> Result<()> {
        self.image().write(start, bytes)?;
        let first = usize::from(start);
        self.notify_registers_changed(first..first + bytes.len() / 2)
    }
}
