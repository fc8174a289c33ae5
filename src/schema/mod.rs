//! SunSpec model schemas
//!
//! Schemas are immutable descriptions of a model's points. They are supplied
//! by a [`SchemaProvider`]; the crate ships the common model (ID 1) and leaves
//! loading the full SunSpec model catalogue to the embedding application
//! (enable the `serde` feature to deserialize the official JSON definitions).

mod common;
mod model;
mod provider;

pub use common::{COMMON_MODEL_LENGTH, common_model};
pub use model::{Group, GroupCount, GroupType, Model, Point, Symbol};
pub use provider::{SchemaProvider, SchemaRegistry};
