//! SunSpec protocol core
//!
//! This module provides the register-level value codec, the point type
//! table, and the binding of schema points onto model buffers.

mod binding;
mod codec;
mod error;
mod types;
mod value;

pub use binding::{BindingTable, BoundValue, PointBinding};
pub use codec::{
    Acc16, Acc32, Acc64, Nullable, decode, decode_eui48, decode_ipv4, decode_ipv6, decode_string,
    encode, encode_eui48, encode_ipv4, encode_ipv6, encode_string,
};
pub use error::{Error, Identification, Result};
pub use types::{Access, Mandatory, PointType, Static};
pub use value::PointValue;

/// `"SunS"` marker at the base address of every SunSpec register map
pub const PREAMBLE: &[u8; 4] = b"SunS";

/// Registers occupied by the preamble
pub const PREAMBLE_REGISTERS: u16 = 2;

/// ID of the common model, always the first model
pub const COMMON_MODEL_ID: u16 = 1;

/// Registers occupied by a model header (ID and length)
pub const HEADER_REGISTERS: u16 = 2;

/// Model ID marking the end of the model chain
pub const END_MODEL_ID: u16 = 0xFFFF;

/// Largest register count of a single Modbus read or write
pub const MAX_REGISTERS_PER_TRANSACTION: u16 = 125;
