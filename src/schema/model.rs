//! Model, group, point and symbol definitions

use crate::protocol::{Access, Mandatory, PointType, Static};

/// Named integer in an enum or bitfield symbol table.
///
/// For bitfields `value` is the bit index.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Symbol {
    /// Symbol name
    pub name: String,
    /// Enum value or bit index
    pub value: i64,
    /// Human readable label
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub label: Option<String>,
}

impl Symbol {
    /// Create a symbol
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
            label: None,
        }
    }
}

/// One scalar or string field within a model.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    /// Point name, unique within its group
    pub name: String,
    /// Declared type
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub point_type: PointType,
    /// Size in registers
    pub size: u16,
    /// Name of the scale factor point applied to this point
    #[cfg_attr(feature = "serde", serde(rename = "sf", default, skip_serializing_if = "Option::is_none"))]
    pub scale_factor: Option<String>,
    /// Engineering units
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub units: Option<String>,
    /// Access mode
    #[cfg_attr(feature = "serde", serde(default))]
    pub access: Access,
    /// Whether the point must be implemented
    #[cfg_attr(feature = "serde", serde(default))]
    pub mandatory: Mandatory,
    /// Whether the value is static
    #[cfg_attr(feature = "serde", serde(default, rename = "static"))]
    pub static_value: Static,
    /// Human readable label
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub label: Option<String>,
    /// Description
    #[cfg_attr(feature = "serde", serde(default, rename = "desc", skip_serializing_if = "Option::is_none"))]
    pub description: Option<String>,
    /// Symbol table for enum and bitfield points
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
    pub symbols: Vec<Symbol>,
}

impl Point {
    /// Create a read-only, optional point
    pub fn new(name: impl Into<String>, point_type: PointType, size: u16) -> Self {
        Self {
            name: name.into(),
            point_type,
            size,
            scale_factor: None,
            units: None,
            access: Access::ReadOnly,
            mandatory: Mandatory::Optional,
            static_value: Static::Dynamic,
            label: None,
            description: None,
            symbols: Vec::new(),
        }
    }

    /// Scale this point by the named scale factor point
    #[must_use]
    pub fn with_scale_factor(mut self, name: impl Into<String>) -> Self {
        self.scale_factor = Some(name.into());
        self
    }

    /// Mark the point writable
    #[must_use]
    pub const fn read_write(mut self) -> Self {
        self.access = Access::ReadWrite;
        self
    }

    /// Mark the point mandatory
    #[must_use]
    pub const fn mandatory(mut self) -> Self {
        self.mandatory = Mandatory::Mandatory;
        self
    }

    /// Attach engineering units
    #[must_use]
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    /// Attach a symbol table
    #[must_use]
    pub fn with_symbols(mut self, symbols: impl IntoIterator<Item = Symbol>) -> Self {
        self.symbols = symbols.into_iter().collect();
        self
    }

    /// Check if the point accepts writes
    #[must_use]
    pub const fn is_writable(&self) -> bool {
        matches!(self.access, Access::ReadWrite)
    }

    /// Size in bytes
    #[must_use]
    pub const fn byte_len(&self) -> usize {
        self.size as usize * 2
    }
}

/// Repeat count of a nested group.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(untagged)
)]
pub enum GroupCount {
    /// Fixed number of repetitions
    Fixed(u16),
    /// Number of repetitions is held in the named point
    Point(String),
}

/// Group kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum GroupType {
    /// Plain group
    #[default]
    Group,
    /// Points that must be written together
    Sync,
}

/// Ordered collection of points, optionally with nested repeating groups.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Group {
    /// Group name
    pub name: String,
    /// Group kind
    #[cfg_attr(feature = "serde", serde(rename = "type", default))]
    pub group_type: GroupType,
    /// Points in declaration order
    #[cfg_attr(feature = "serde", serde(default))]
    pub points: Vec<Point>,
    /// Nested groups
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
    pub groups: Vec<Group>,
    /// Repeat count for nested groups
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub count: Option<GroupCount>,
    /// Human readable label
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub label: Option<String>,
}

impl Group {
    /// Create a group from its points
    pub fn new(name: impl Into<String>, points: Vec<Point>) -> Self {
        Self {
            name: name.into(),
            group_type: GroupType::Group,
            points,
            groups: Vec::new(),
            count: None,
            label: None,
        }
    }

    /// Find a point by name
    #[must_use]
    pub fn point(&self, name: &str) -> Option<&Point> {
        self.points.iter().find(|p| p.name == name)
    }
}

/// Immutable schema of one SunSpec model.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Model {
    /// Model ID (1..=65535)
    pub id: u16,
    /// Top-level group
    pub group: Group,
}

impl Model {
    /// Create a model
    #[must_use]
    pub const fn new(id: u16, group: Group) -> Self {
        Self { id, group }
    }

    /// Model name (the top-level group name)
    #[must_use]
    pub fn name(&self) -> &str {
        &self.group.name
    }

    /// Registers covered by the top-level points, header included
    #[must_use]
    pub fn register_length(&self) -> usize {
        self.group.points.iter().map(|p| usize::from(p.size)).sum()
    }
}
