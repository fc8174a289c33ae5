//! Decoded point values

use std::fmt;

/// Value of a point as seen by callers.
///
/// Decoding never yields a runtime-typed "any" value: callers match on the
/// variant instead.
#[derive(Debug, Clone, PartialEq)]
pub enum PointValue {
    /// Point holds its reserved "not implemented" pattern
    Absent,
    /// Unscaled integer (also unmatched enum values)
    Integer(i128),
    /// Floating point or scaled integer
    Real(f64),
    /// String, address, or matched enum symbol
    Text(String),
    /// Names of the set bits of a bitfield, lowest bit first
    Symbols(Vec<String>),
}

impl PointValue {
    /// Check if the value is absent
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Integer payload, if this is an integer
    #[must_use]
    pub const fn as_integer(&self) -> Option<i128> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric payload as `f64` (integers are widened)
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Real(v) => Some(*v),
            _ => None,
        }
    }

    /// Text payload, if this is text
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Bitfield symbol names, if this is a symbol list
    #[must_use]
    pub fn as_symbols(&self) -> Option<&[String]> {
        match self {
            Self::Symbols(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for PointValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "-"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
            Self::Symbols(v) => write!(f, "[{}]", v.join(", ")),
        }
    }
}

impl<T> From<Option<T>> for PointValue
where
    T: Into<Self>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Into::into)
    }
}

macro_rules! from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for PointValue {
                fn from(value: $ty) -> Self {
                    Self::Integer(i128::from(value))
                }
            }
        )*
    };
}

from_integer!(i8, i16, i32, i64, u8, u16, u32, u64);

impl From<f32> for PointValue {
    fn from(value: f32) -> Self {
        Self::Real(f64::from(value))
    }
}

impl From<f64> for PointValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<&str> for PointValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for PointValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for PointValue {
    fn from(value: Vec<String>) -> Self {
        Self::Symbols(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(PointValue::from(7u16), PointValue::Integer(7));
        assert_eq!(PointValue::from(None::<u16>), PointValue::Absent);
        assert_eq!(PointValue::from(Some("abc")), PointValue::Text("abc".into()));
        assert_eq!(PointValue::Integer(3).as_f64(), Some(3.0));
        assert_eq!(PointValue::Text("x".into()).as_integer(), None);
    }

    #[test]
    fn test_display() {
        let flags = PointValue::Symbols(vec!["GROUND_FAULT".into(), "DC_OVER_VOLT".into()]);
        assert_eq!(flags.to_string(), "[GROUND_FAULT, DC_OVER_VOLT]");
        assert_eq!(PointValue::Absent.to_string(), "-");
    }
}
