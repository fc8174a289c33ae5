//! SunSpec point types and access flags

use std::fmt;

/// Declared type of a SunSpec point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum PointType {
    /// Signed 16-bit integer
    Int16,
    /// Signed 32-bit integer
    Int32,
    /// Signed 64-bit integer
    Int64,
    /// Opaque 16-bit register
    Raw16,
    /// Unsigned 16-bit integer
    UInt16,
    /// Unsigned 32-bit integer
    UInt32,
    /// Unsigned 64-bit integer
    UInt64,
    /// 16-bit accumulator
    Acc16,
    /// 32-bit accumulator
    Acc32,
    /// 64-bit accumulator
    Acc64,
    /// 16-bit set of flags
    Bitfield16,
    /// 32-bit set of flags
    Bitfield32,
    /// 64-bit set of flags
    Bitfield64,
    /// 16-bit enumeration
    Enum16,
    /// 32-bit enumeration
    Enum32,
    /// IEEE 754 single precision
    Float32,
    /// IEEE 754 double precision
    Float64,
    /// Fixed-length UTF-8 string
    String,
    /// Legacy scale factor marker
    Sf,
    /// Padding register, never bound
    Pad,
    /// IPv4 address
    IpAddr,
    /// IPv6 address
    Ipv6Addr,
    /// 48-bit MAC address
    Eui48,
    /// Scale factor (signed power of ten)
    SunSsf,
    /// Repeating group count
    Count,
}

/// Wire representation selected by a point type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Primitive {
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    Acc16,
    Acc32,
    Acc64,
    F32,
    F64,
    Str,
    Ipv4,
    Ipv6,
    Eui48,
    Pad,
}

impl Primitive {
    /// Minimum point size in registers.
    pub(crate) const fn registers(self) -> u16 {
        match self {
            Self::I16 | Self::U16 | Self::Acc16 | Self::Pad | Self::Str => 1,
            Self::I32 | Self::U32 | Self::Acc32 | Self::F32 | Self::Ipv4 => 2,
            Self::I64 | Self::U64 | Self::Acc64 | Self::F64 | Self::Eui48 => 4,
            Self::Ipv6 => 8,
        }
    }
}

impl PointType {
    const ALL: [Self; 25] = [
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::Raw16,
        Self::UInt16,
        Self::UInt32,
        Self::UInt64,
        Self::Acc16,
        Self::Acc32,
        Self::Acc64,
        Self::Bitfield16,
        Self::Bitfield32,
        Self::Bitfield64,
        Self::Enum16,
        Self::Enum32,
        Self::Float32,
        Self::Float64,
        Self::String,
        Self::Sf,
        Self::Pad,
        Self::IpAddr,
        Self::Ipv6Addr,
        Self::Eui48,
        Self::SunSsf,
        Self::Count,
    ];

    /// Schema name of the type (e.g. `"uint16"`).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Raw16 => "raw16",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Acc16 => "acc16",
            Self::Acc32 => "acc32",
            Self::Acc64 => "acc64",
            Self::Bitfield16 => "bitfield16",
            Self::Bitfield32 => "bitfield32",
            Self::Bitfield64 => "bitfield64",
            Self::Enum16 => "enum16",
            Self::Enum32 => "enum32",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::String => "string",
            Self::Sf => "sf",
            Self::Pad => "pad",
            Self::IpAddr => "ipaddr",
            Self::Ipv6Addr => "ipv6addr",
            Self::Eui48 => "eui48",
            Self::SunSsf => "sunssf",
            Self::Count => "count",
        }
    }

    /// Parse a schema type name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.name() == name)
    }

    /// Check if this is an enumeration type
    #[must_use]
    pub const fn is_enum(self) -> bool {
        matches!(self, Self::Enum16 | Self::Enum32)
    }

    /// Check if this is a bitfield type
    #[must_use]
    pub const fn is_bitfield(self) -> bool {
        matches!(self, Self::Bitfield16 | Self::Bitfield32 | Self::Bitfield64)
    }

    /// Check if this type decodes through a symbol table
    #[must_use]
    pub const fn is_enum_or_bitfield(self) -> bool {
        self.is_enum() || self.is_bitfield()
    }

    /// Check if this is a scale factor type
    #[must_use]
    pub const fn is_scale_factor(self) -> bool {
        matches!(self, Self::SunSsf | Self::Sf)
    }

    /// Check if this is an accumulator type
    #[must_use]
    pub const fn is_accumulator(self) -> bool {
        matches!(self, Self::Acc16 | Self::Acc32 | Self::Acc64)
    }

    /// Check if values of this type are integers that a scale factor may apply to
    #[must_use]
    pub const fn is_scalable(self) -> bool {
        matches!(
            self.primitive(),
            Primitive::I16
                | Primitive::U16
                | Primitive::I32
                | Primitive::U32
                | Primitive::I64
                | Primitive::U64
                | Primitive::Acc16
                | Primitive::Acc32
                | Primitive::Acc64
        ) && !self.is_enum_or_bitfield()
            && !self.is_scale_factor()
    }

    /// Minimum size in registers a point of this type must declare.
    #[must_use]
    pub const fn min_size(self) -> u16 {
        self.primitive().registers()
    }

    pub(crate) const fn primitive(self) -> Primitive {
        match self {
            Self::Int16 | Self::SunSsf | Self::Sf => Primitive::I16,
            Self::UInt16 | Self::Raw16 | Self::Count | Self::Enum16 | Self::Bitfield16 => {
                Primitive::U16
            }
            Self::Int32 => Primitive::I32,
            Self::UInt32 | Self::Enum32 | Self::Bitfield32 => Primitive::U32,
            Self::Int64 => Primitive::I64,
            Self::UInt64 | Self::Bitfield64 => Primitive::U64,
            Self::Acc16 => Primitive::Acc16,
            Self::Acc32 => Primitive::Acc32,
            Self::Acc64 => Primitive::Acc64,
            Self::Float32 => Primitive::F32,
            Self::Float64 => Primitive::F64,
            Self::String => Primitive::Str,
            Self::IpAddr => Primitive::Ipv4,
            Self::Ipv6Addr => Primitive::Ipv6,
            Self::Eui48 => Primitive::Eui48,
            Self::Pad => Primitive::Pad,
        }
    }
}

impl fmt::Display for PointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Point access mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Access {
    /// Read-only (`"R"`)
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "R"))]
    ReadOnly,
    /// Read-write (`"RW"`)
    #[cfg_attr(feature = "serde", serde(rename = "RW"))]
    ReadWrite,
}

/// Whether a device must implement a point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mandatory {
    /// Mandatory (`"M"`)
    #[cfg_attr(feature = "serde", serde(rename = "M"))]
    Mandatory,
    /// Optional (`"O"`)
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "O"))]
    Optional,
}

/// Whether a point's value changes at runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Static {
    /// Static (`"S"`)
    #[cfg_attr(feature = "serde", serde(rename = "S"))]
    Static,
    /// Dynamic (`"D"`)
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "D"))]
    Dynamic,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_type_name_roundtrip() {
        for ty in PointType::ALL {
            assert_eq!(PointType::from_name(ty.name()), Some(ty));
        }
        assert_eq!(PointType::from_name("uint128"), None);
    }

    #[test]
    fn test_classification() {
        assert!(PointType::Enum32.is_enum());
        assert!(PointType::Bitfield64.is_bitfield());
        assert!(PointType::SunSsf.is_scale_factor());
        assert!(PointType::Acc32.is_scalable());
        assert!(PointType::Int16.is_scalable());
        assert!(!PointType::Enum16.is_scalable());
        assert!(!PointType::Float32.is_scalable());
        assert_eq!(PointType::Ipv6Addr.min_size(), 8);
        assert_eq!(PointType::Float64.min_size(), 4);
    }
}
