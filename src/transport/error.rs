//! Transport-level error types covering I/O, Modbus exceptions, and adapter failures.

use core::fmt;
use std::io;

/// Boxed error produced by an external transport implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure of a single register transaction.
#[derive(Debug)]
pub enum TransportError {
    /// Underlying socket or serial I/O failure.
    Io(io::Error),
    /// Device answered with a Modbus exception response.
    Exception {
        /// Modbus exception code (e.g. `0x02` illegal data address).
        code: u8,
    },
    /// Connection was closed before the transaction completed.
    Closed,
    /// Any other adapter-specific failure.
    Other(BoxError),
}

impl TransportError {
    /// Wrap an arbitrary adapter error.
    pub fn other(err: impl Into<BoxError>) -> Self {
        Self::Other(err.into())
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::Exception { code } => write!(f, "modbus exception {code:#04x}"),
            Self::Closed => write!(f, "connection closed"),
            Self::Other(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Other(err) => Some(err.as_ref()),
            Self::Exception { .. } | Self::Closed => None,
        }
    }
}

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}
