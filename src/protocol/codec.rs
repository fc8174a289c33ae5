//! Nullable primitive codec
//!
//! SunSpec reserves one bit pattern per primitive type to mean "not
//! implemented / absent". This module converts big-endian register bytes to
//! `Option<T>` and back, centralizing those reserved patterns in one table:
//!
//! | Type | Absent pattern |
//! |------|----------------|
//! | `int16` / `sunssf` | `0x8000` |
//! | `uint16`, `enum16`, `bitfield16` | `0xFFFF` |
//! | `int32` / `int64` | minimum value |
//! | `uint32`, `enum32`, `bitfield32` / `uint64`, `bitfield64` | all ones |
//! | `acc16` / `acc32` / `acc64` | all zeros |
//! | `float32` / `float64` | NaN |
//! | `string` | leading `0x00` byte |
//!
//! Accumulators share their absent pattern with a legitimate zero reading;
//! a zero accumulator therefore always decodes as absent.

use std::net::{Ipv4Addr, Ipv6Addr};

use super::{Error, Result};

/// A fixed-width primitive with a reserved "absent" bit pattern.
pub trait Nullable: Copy {
    /// Encoded width in bytes.
    const WIDTH: usize;
    /// Value written when encoding `None`.
    const NULL: Self;

    /// Read from exactly [`Self::WIDTH`] big-endian bytes.
    fn from_be_slice(bytes: &[u8]) -> Self;

    /// Write as big-endian into exactly [`Self::WIDTH`] bytes.
    fn write_be(self, dest: &mut [u8]);

    /// Whether this value is the reserved absent pattern.
    fn is_null(self) -> bool;
}

macro_rules! nullable_int {
    ($ty:ty, $null:expr) => {
        impl Nullable for $ty {
            const WIDTH: usize = core::mem::size_of::<$ty>();
            const NULL: Self = $null;

            fn from_be_slice(bytes: &[u8]) -> Self {
                let mut raw = [0u8; core::mem::size_of::<$ty>()];
                raw.copy_from_slice(&bytes[..Self::WIDTH]);
                <$ty>::from_be_bytes(raw)
            }

            fn write_be(self, dest: &mut [u8]) {
                dest[..Self::WIDTH].copy_from_slice(&self.to_be_bytes());
            }

            fn is_null(self) -> bool {
                self == Self::NULL
            }
        }
    };
}

nullable_int!(i16, i16::MIN);
nullable_int!(u16, u16::MAX);
nullable_int!(i32, i32::MIN);
nullable_int!(u32, u32::MAX);
nullable_int!(i64, i64::MIN);
nullable_int!(u64, u64::MAX);

macro_rules! nullable_float {
    ($ty:ty) => {
        impl Nullable for $ty {
            const WIDTH: usize = core::mem::size_of::<$ty>();
            const NULL: Self = <$ty>::NAN;

            fn from_be_slice(bytes: &[u8]) -> Self {
                let mut raw = [0u8; core::mem::size_of::<$ty>()];
                raw.copy_from_slice(&bytes[..Self::WIDTH]);
                <$ty>::from_be_bytes(raw)
            }

            fn write_be(self, dest: &mut [u8]) {
                dest[..Self::WIDTH].copy_from_slice(&self.to_be_bytes());
            }

            fn is_null(self) -> bool {
                self.is_nan()
            }
        }
    };
}

nullable_float!(f32);
nullable_float!(f64);

macro_rules! accumulator {
    ($(#[$meta:meta])* $name:ident, $inner:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub $inner);

        impl Nullable for $name {
            const WIDTH: usize = core::mem::size_of::<$inner>();
            const NULL: Self = Self(0);

            fn from_be_slice(bytes: &[u8]) -> Self {
                let mut raw = [0u8; core::mem::size_of::<$inner>()];
                raw.copy_from_slice(&bytes[..Self::WIDTH]);
                Self(<$inner>::from_be_bytes(raw))
            }

            fn write_be(self, dest: &mut [u8]) {
                dest[..Self::WIDTH].copy_from_slice(&self.0.to_be_bytes());
            }

            fn is_null(self) -> bool {
                self.0 == 0
            }
        }
    };
}

accumulator!(
    /// 16-bit monotonically increasing counter (`acc16`)
    Acc16,
    u16
);
accumulator!(
    /// 32-bit monotonically increasing counter (`acc32`)
    Acc32,
    u32
);
accumulator!(
    /// 64-bit monotonically increasing counter (`acc64`)
    Acc64,
    u64
);

/// Decode a nullable primitive.
///
/// Returns `None` for the reserved absent pattern, and also when `bytes` is
/// shorter than the primitive's width.
#[must_use]
pub fn decode<T: Nullable>(bytes: &[u8]) -> Option<T> {
    let bytes = bytes.get(..T::WIDTH)?;
    let value = T::from_be_slice(bytes);
    (!value.is_null()).then_some(value)
}

/// Encode a nullable primitive, writing the absent pattern for `None`.
pub fn encode<T: Nullable>(value: Option<T>, dest: &mut [u8]) -> Result<()> {
    if dest.len() < T::WIDTH {
        return Err(Error::BufferTooSmall {
            needed: T::WIDTH,
            got: dest.len(),
        });
    }
    value.unwrap_or(T::NULL).write_be(dest);
    Ok(())
}

/// Decode a fixed-length string field.
///
/// A leading `0x00` byte marks the field absent. Trailing NUL padding is
/// stripped; invalid UTF-8 is replaced rather than rejected.
#[must_use]
pub fn decode_string(bytes: &[u8]) -> Option<String> {
    if bytes.first().is_none_or(|&b| b == 0) {
        return None;
    }
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    Some(String::from_utf8_lossy(&bytes[..end]).into_owned())
}

/// Encode a fixed-length string field, NUL-padding to the full width.
pub fn encode_string(value: Option<&str>, dest: &mut [u8]) -> Result<()> {
    let text = value.unwrap_or_default().as_bytes();
    if text.len() > dest.len() {
        return Err(Error::BufferTooSmall {
            needed: text.len(),
            got: dest.len(),
        });
    }
    dest.fill(0);
    dest[..text.len()].copy_from_slice(text);
    Ok(())
}

/// Decode an `ipaddr` field; `0.0.0.0` is absent.
#[must_use]
pub fn decode_ipv4(bytes: &[u8]) -> Option<Ipv4Addr> {
    let raw: [u8; 4] = bytes.get(..4)?.try_into().ok()?;
    let addr = Ipv4Addr::from(raw);
    (!addr.is_unspecified()).then_some(addr)
}

/// Encode an `ipaddr` field.
pub fn encode_ipv4(value: Option<Ipv4Addr>, dest: &mut [u8]) -> Result<()> {
    let raw = value.map_or(0, u32::from);
    encode(Some(raw), dest)
}

/// Decode an `ipv6addr` field; `::` is absent.
#[must_use]
pub fn decode_ipv6(bytes: &[u8]) -> Option<Ipv6Addr> {
    let raw: [u8; 16] = bytes.get(..16)?.try_into().ok()?;
    let addr = Ipv6Addr::from(raw);
    (!addr.is_unspecified()).then_some(addr)
}

/// Encode an `ipv6addr` field.
pub fn encode_ipv6(value: Option<Ipv6Addr>, dest: &mut [u8]) -> Result<()> {
    if dest.len() < 16 {
        return Err(Error::BufferTooSmall {
            needed: 16,
            got: dest.len(),
        });
    }
    let raw = value.map_or([0u8; 16], |addr| addr.octets());
    dest[..16].copy_from_slice(&raw);
    Ok(())
}

/// Decode an `eui48` field (MAC address in the low 48 bits of a 64-bit
/// register group); all ones is absent.
#[must_use]
pub fn decode_eui48(bytes: &[u8]) -> Option<[u8; 6]> {
    let raw: u64 = decode(bytes)?;
    let octets = raw.to_be_bytes();
    let mut mac = [0u8; 6];
    mac.copy_from_slice(&octets[2..]);
    Some(mac)
}

/// Encode an `eui48` field.
pub fn encode_eui48(value: Option<[u8; 6]>, dest: &mut [u8]) -> Result<()> {
    let raw = value.map(|mac| {
        let mut octets = [0u8; 8];
        octets[2..].copy_from_slice(&mac);
        u64::from_be_bytes(octets)
    });
    encode(raw, dest)
}
