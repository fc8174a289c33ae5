//! Server model interfaces
//!
//! A [`ModelBuilder`] lays one model out in the register image when the
//! server is built; the [`ServerModel`] it yields receives notifications for
//! peer writes into its registers.

use std::fmt;
use std::sync::Arc;

use super::RegisterImage;
use crate::protocol::Result;

/// Model instance hosted by a server.
pub trait ServerModel: Send + Sync {
    /// Model ID
    fn id(&self) -> u16;

    /// Length in registers, header included
    fn length(&self) -> usize;

    /// A peer wrote register `relative`, counted from the model's length
    /// register (the register after the ID register is 0).
    ///
    /// Errors propagate to whoever delivered the write.
    fn notify_value_changed(&self, relative: usize) -> Result<()>;
}

/// Input handed to a builder: the unused tail of the register image.
pub struct BuildContext<'a> {
    /// Registers from `start` to the end of the image. The first
    /// [`BuiltModel::length`] registers are committed to the image after
    /// `build` returns.
    pub tail: &'a mut [u8],
    /// Absolute register address of `tail[0]`
    pub start: u16,
    /// Handle to the whole image; it is unlocked while builders run
    pub image: &'a RegisterImage,
}

impl fmt::Debug for BuildContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildContext")
            .field("start", &self.start)
            .field("tail_registers", &(self.tail.len() / 2))
            .finish_non_exhaustive()
    }
}

/// Model produced by a builder.
pub struct BuiltModel {
    /// Registers consumed, header included; at least the two header
    /// registers and no more than the tail holds
    pub length: usize,
    /// Model receiving change notifications
    pub model: Arc<dyn ServerModel>,
}

impl fmt::Debug for BuiltModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltModel")
            .field("id", &self.model.id())
            .field("length", &self.length)
            .finish()
    }
}

/// Lays out one model at the start of the image tail.
pub trait ModelBuilder: Send {
    /// Write the model into `ctx.tail`, or return `None` to decline (for
    /// example an empty repeating group).
    fn build(&mut self, ctx: BuildContext<'_>) -> Result<Option<BuiltModel>>;
}
