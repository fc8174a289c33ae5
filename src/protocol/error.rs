//! SunSpec error types

use thiserror::Error;

use crate::transport::TransportError;

/// Reason a device failed SunSpec identification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Identification {
    /// First four bytes of the register map are not `"SunS"`
    #[error("missing \"SunS\" preamble, found {found:02x?}")]
    MissingPreamble {
        /// Bytes found at the preamble position
        found: [u8; 4],
    },

    /// First model after the preamble is not the common model
    #[error("first model is {found}, expected the common model (1)")]
    MissingCommonModel {
        /// Model ID found directly after the preamble
        found: u16,
    },
}

/// SunSpec protocol errors
#[derive(Error, Debug)]
pub enum Error {
    /// Device is not a SunSpec device
    #[error("device identification failed: {0}")]
    DeviceIdentification(Identification),

    /// No schema is known for a model ID encountered on the device
    #[error("no schema for model {model_id}")]
    SchemaNotFound {
        /// Unresolved model ID
        model_id: u16,
    },

    /// Register read or write failed
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Operation is not permitted in the current state
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Buffer too small
    #[error("buffer too small: need {needed} bytes, got {got}")]
    BufferTooSmall {
        /// Needed size
        needed: usize,
        /// Actual size
        got: usize,
    },

    /// Point name is not part of the model
    #[error("unknown point: {name}")]
    UnknownPoint {
        /// Requested point name
        name: String,
    },

    /// Value cannot be encoded into the point
    #[error("invalid value for point {point}: {reason}")]
    InvalidValue {
        /// Point name
        point: String,
        /// Why the value was rejected
        reason: String,
    },

    /// Schema definition is inconsistent
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// Register range does not fit in the 16-bit address space
    #[error("register range out of bounds: start {start}, count {count}")]
    AddressOutOfRange {
        /// First register of the range
        start: u32,
        /// Number of registers
        count: u32,
    },

    /// Transport returned a different amount of data than requested
    #[error("unexpected response length: expected {expected} bytes, got {got}")]
    UnexpectedResponseLength {
        /// Requested byte count
        expected: usize,
        /// Received byte count
        got: usize,
    },
}

impl Error {
    /// Whether this error means the device does not speak SunSpec.
    #[must_use]
    pub const fn is_device_identification(&self) -> bool {
        matches!(self, Self::DeviceIdentification(_))
    }

    pub(crate) fn invalid_value(point: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            point: point.to_owned(),
            reason: reason.into(),
        }
    }
}

impl From<Identification> for Error {
    fn from(reason: Identification) -> Self {
        Self::DeviceIdentification(reason)
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
