//! Point bindings
//!
//! A [`BindingTable`] maps every point of a model schema onto a byte range of
//! a model buffer and wires scale-factor references between points. Values
//! are decoded from the buffer on every read and never cached.
//!
//! Binding runs in two passes: the first materializes one binding per
//! non-pad point and records them by name, the second resolves each point's
//! `sf` reference to the binding of the named scale factor point. Point order
//! within the schema therefore does not matter for scaling.

use std::collections::HashMap;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use tracing::trace;

use super::codec::{self, Acc16, Acc32, Acc64, Nullable};
use super::types::Primitive;
use super::{Error, PointValue, Result};
use crate::schema::{Model, Point};

/// One schema point bound to a byte range of a model buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointBinding {
    point: usize,
    offset: usize,
    len: usize,
    scale: Option<usize>,
}

impl PointBinding {
    /// Byte offset of the point within the model buffer
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Byte length of the point
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Check whether the point covers no bytes
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Register offset of the point within the model
    #[must_use]
    pub const fn register_offset(&self) -> usize {
        self.offset / 2
    }
}

/// Point bindings of one model schema.
#[derive(Debug, Clone)]
pub struct BindingTable {
    schema: Arc<Model>,
    bindings: Vec<PointBinding>,
    by_name: HashMap<String, usize>,
}

impl BindingTable {
    /// Bind `schema` onto a buffer of `byte_len` bytes.
    ///
    /// Points that do not fit entirely within the buffer are left unbound.
    pub fn new(schema: Arc<Model>, byte_len: usize) -> Result<Self> {
        let mut bindings = Vec::with_capacity(schema.group.points.len());
        let mut by_name = HashMap::with_capacity(schema.group.points.len());

        // Pass 1: materialize bindings in declaration order.
        let mut offset = 0usize;
        for (index, point) in schema.group.points.iter().enumerate() {
            if point.size < point.point_type.min_size() {
                return Err(Error::InvalidSchema(format!(
                    "model {} point {} declares {} registers, {} needs at least {}",
                    schema.id,
                    point.name,
                    point.size,
                    point.point_type,
                    point.point_type.min_size()
                )));
            }
            let len = point.byte_len();
            if point.point_type.primitive() != Primitive::Pad {
                if offset + len <= byte_len {
                    by_name.insert(point.name.clone(), bindings.len());
                    bindings.push(PointBinding {
                        point: index,
                        offset,
                        len,
                        scale: None,
                    });
                } else {
                    trace!(model = schema.id, point = %point.name, "point outside model window");
                }
            }
            offset += len;
        }

        // Pass 2: wire scale factor references.
        let scales: Vec<Option<usize>> = bindings
            .iter()
            .map(|binding| {
                let point = &schema.group.points[binding.point];
                let sf_name = point.scale_factor.as_deref()?;
                let scale = by_name.get(sf_name).copied().filter(|&sf| {
                    schema.group.points[bindings[sf].point]
                        .point_type
                        .is_scale_factor()
                });
                if scale.is_none() {
                    trace!(model = schema.id, point = %point.name, sf = sf_name, "unresolved scale factor");
                }
                scale
            })
            .collect();
        for (binding, scale) in bindings.iter_mut().zip(scales) {
            binding.scale = scale;
        }

        Ok(Self {
            schema,
            bindings,
            by_name,
        })
    }

    /// Schema the table was built from
    #[must_use]
    pub fn schema(&self) -> &Arc<Model> {
        &self.schema
    }

    /// Number of bound points
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check whether no point is bound
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bindings in declaration order
    pub fn bindings(&self) -> impl Iterator<Item = &PointBinding> {
        self.bindings.iter()
    }

    /// Binding index of the named point
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Binding by index
    #[must_use]
    pub fn binding(&self, index: usize) -> Option<&PointBinding> {
        self.bindings.get(index)
    }

    /// Schema point of a binding
    #[must_use]
    pub fn point(&self, binding: &PointBinding) -> &Point {
        &self.schema.group.points[binding.point]
    }

    /// Binding index of the point covering register `register` (model-relative,
    /// header included)
    #[must_use]
    pub fn index_at_register(&self, register: usize) -> Option<usize> {
        let byte = register * 2;
        self.bindings
            .iter()
            .position(|b| byte >= b.offset && byte < b.offset + b.len)
    }

    /// Lookup a binding index by name, failing for unknown points
    pub fn require(&self, name: &str) -> Result<usize> {
        self.index_of(name).ok_or_else(|| Error::UnknownPoint {
            name: name.to_owned(),
        })
    }

    /// Decode the value of binding `index` from `buffer`.
    ///
    /// Enum values map to the first matching symbol name, bitfields to the
    /// names of their set bits, and scaled integers to `raw * 10^sf` when the
    /// scale factor point holds a value.
    #[must_use]
    pub fn read(&self, index: usize, buffer: &[u8]) -> PointValue {
        let binding = &self.bindings[index];
        let point = self.point(binding);
        let bytes = &buffer[binding.offset..binding.offset + binding.len];
        let raw = decode_raw(point.point_type.primitive(), bytes);

        if point.point_type.is_enum() {
            if let PointValue::Integer(v) = raw {
                return point
                    .symbols
                    .iter()
                    .find(|s| i128::from(s.value) == v)
                    .map_or(raw, |s| PointValue::Text(s.name.clone()));
            }
        }

        if point.point_type.is_bitfield() {
            if let PointValue::Integer(v) = raw {
                let mut set: Vec<_> = point
                    .symbols
                    .iter()
                    .filter(|s| (0..128).contains(&s.value) && v & (1i128 << s.value) != 0)
                    .collect();
                set.sort_by_key(|s| s.value);
                return PointValue::Symbols(set.into_iter().map(|s| s.name.clone()).collect());
            }
        }

        match (raw, self.scale_exponent(binding, buffer)) {
            (PointValue::Integer(v), Some(sf)) if point.point_type.is_scalable() => {
                PointValue::Real(scale(v, sf))
            }
            (raw, _) => raw,
        }
    }

    /// Encode `value` for binding `index` into a scratch buffer sized to the
    /// point, descaling against the scale factor currently held in `buffer`.
    pub fn encode(&self, index: usize, value: &PointValue, buffer: &[u8]) -> Result<Vec<u8>> {
        let binding = &self.bindings[index];
        let point = self.point(binding);
        let mut scratch = vec![0u8; binding.len];
        let sf = self.scale_exponent(binding, buffer);

        match point.point_type.primitive() {
            Primitive::I16 => encode_int::<i16>(point, value, sf, &mut scratch)?,
            Primitive::U16 => encode_int::<u16>(point, value, sf, &mut scratch)?,
            Primitive::I32 => encode_int::<i32>(point, value, sf, &mut scratch)?,
            Primitive::U32 => encode_int::<u32>(point, value, sf, &mut scratch)?,
            Primitive::I64 => encode_int::<i64>(point, value, sf, &mut scratch)?,
            Primitive::U64 => encode_int::<u64>(point, value, sf, &mut scratch)?,
            Primitive::Acc16 => {
                let raw = narrow::<u16>(point, integer_of(point, value, sf)?)?;
                codec::encode(raw.map(Acc16), &mut scratch)?;
            }
            Primitive::Acc32 => {
                let raw = narrow::<u32>(point, integer_of(point, value, sf)?)?;
                codec::encode(raw.map(Acc32), &mut scratch)?;
            }
            Primitive::Acc64 => {
                let raw = narrow::<u64>(point, integer_of(point, value, sf)?)?;
                codec::encode(raw.map(Acc64), &mut scratch)?;
            }
            #[allow(clippy::cast_possible_truncation)]
            Primitive::F32 => {
                codec::encode(real_of(point, value)?.map(|v| v as f32), &mut scratch)?;
            }
            Primitive::F64 => codec::encode(real_of(point, value)?, &mut scratch)?,
            Primitive::Str => {
                codec::encode_string(text_of(point, value)?, &mut scratch).map_err(|_| {
                    Error::invalid_value(&point.name, format!("longer than {} bytes", binding.len))
                })?;
            }
            Primitive::Ipv4 => {
                let addr = parse_text::<Ipv4Addr>(point, value)?;
                codec::encode_ipv4(addr, &mut scratch)?;
            }
            Primitive::Ipv6 => {
                let addr = parse_text::<Ipv6Addr>(point, value)?;
                codec::encode_ipv6(addr, &mut scratch)?;
            }
            Primitive::Eui48 => {
                let mac = text_of(point, value)?.map(|t| parse_mac(point, t)).transpose()?;
                codec::encode_eui48(mac, &mut scratch)?;
            }
            Primitive::Pad => {
                return Err(Error::InvalidOperation(format!(
                    "pad point {} cannot be written",
                    point.name
                )));
            }
        }
        Ok(scratch)
    }

    /// Borrowed views of every bound point over `buffer`
    pub fn views<'a>(&'a self, buffer: &'a [u8]) -> impl Iterator<Item = BoundValue<'a>> {
        (0..self.bindings.len()).map(move |index| BoundValue {
            table: self,
            index,
            buffer,
        })
    }

    fn scale_exponent(&self, binding: &PointBinding, buffer: &[u8]) -> Option<i16> {
        let sf = &self.bindings[binding.scale?];
        codec::decode::<i16>(&buffer[sf.offset..sf.offset + sf.len])
    }
}

/// One bound point viewed over a model buffer.
///
/// The view borrows the buffer, so it can never outlive it; the value is
/// decoded on every call.
#[derive(Debug, Clone, Copy)]
pub struct BoundValue<'a> {
    table: &'a BindingTable,
    index: usize,
    buffer: &'a [u8],
}

impl<'a> BoundValue<'a> {
    /// Schema point
    #[must_use]
    pub fn point(&self) -> &'a Point {
        self.table.point(&self.table.bindings[self.index])
    }

    /// Point name
    #[must_use]
    pub fn name(&self) -> &'a str {
        &self.point().name
    }

    /// Byte range binding
    #[must_use]
    pub fn binding(&self) -> &'a PointBinding {
        &self.table.bindings[self.index]
    }

    /// Raw bytes of the point
    #[must_use]
    pub fn raw(&self) -> &'a [u8] {
        let binding = self.binding();
        &self.buffer[binding.offset..binding.offset + binding.len]
    }

    /// Decoded value
    #[must_use]
    pub fn value(&self) -> PointValue {
        self.table.read(self.index, self.buffer)
    }
}

fn decode_raw(primitive: Primitive, bytes: &[u8]) -> PointValue {
    match primitive {
        Primitive::I16 => codec::decode::<i16>(bytes).into(),
        Primitive::U16 => codec::decode::<u16>(bytes).into(),
        Primitive::I32 => codec::decode::<i32>(bytes).into(),
        Primitive::U32 => codec::decode::<u32>(bytes).into(),
        Primitive::I64 => codec::decode::<i64>(bytes).into(),
        Primitive::U64 => codec::decode::<u64>(bytes).into(),
        Primitive::Acc16 => codec::decode::<Acc16>(bytes).map(|a| a.0).into(),
        Primitive::Acc32 => codec::decode::<Acc32>(bytes).map(|a| a.0).into(),
        Primitive::Acc64 => codec::decode::<Acc64>(bytes).map(|a| a.0).into(),
        Primitive::F32 => codec::decode::<f32>(bytes).into(),
        Primitive::F64 => codec::decode::<f64>(bytes).into(),
        Primitive::Str => codec::decode_string(bytes).into(),
        Primitive::Ipv4 => codec::decode_ipv4(bytes).map(|a| a.to_string()).into(),
        Primitive::Ipv6 => codec::decode_ipv6(bytes).map(|a| a.to_string()).into(),
        Primitive::Eui48 => codec::decode_eui48(bytes).map(format_mac).into(),
        Primitive::Pad => PointValue::Absent,
    }
}

#[allow(clippy::cast_precision_loss)]
fn scale(raw: i128, sf: i16) -> f64 {
    let factor = 10f64.powi(i32::from(sf.unsigned_abs()));
    if sf >= 0 {
        raw as f64 * factor
    } else {
        raw as f64 / factor
    }
}

#[allow(clippy::cast_possible_truncation)]
fn descale(value: f64, sf: i16) -> f64 {
    let factor = 10f64.powi(i32::from(sf.unsigned_abs()));
    let raw = if sf >= 0 {
        value / factor
    } else {
        value * factor
    };
    raw.round()
}

fn integer_of(point: &Point, value: &PointValue, sf: Option<i16>) -> Result<Option<i128>> {
    let ty = point.point_type;
    let raw = match value {
        PointValue::Absent => return Ok(None),
        PointValue::Integer(v) => match sf {
            Some(sf) if ty.is_scalable() => real_to_integer(point, scale_back(*v, sf))?,
            _ => *v,
        },
        PointValue::Real(v) => match sf {
            Some(sf) if ty.is_scalable() => real_to_integer(point, descale(*v, sf))?,
            _ => real_to_integer(point, *v)?,
        },
        PointValue::Text(name) if ty.is_enum() => point
            .symbols
            .iter()
            .find(|s| &s.name == name)
            .map(|s| i128::from(s.value))
            .ok_or_else(|| Error::invalid_value(&point.name, format!("unknown symbol {name}")))?,
        PointValue::Symbols(names) if ty.is_bitfield() => {
            let mut bits = 0i128;
            for name in names {
                let symbol = point
                    .symbols
                    .iter()
                    .find(|s| &s.name == name)
                    .filter(|s| (0..64).contains(&s.value))
                    .ok_or_else(|| {
                        Error::invalid_value(&point.name, format!("unknown flag {name}"))
                    })?;
                bits |= 1i128 << symbol.value;
            }
            bits
        }
        other => {
            return Err(Error::invalid_value(
                &point.name,
                format!("{other:?} is not valid for {ty}"),
            ));
        }
    };
    Ok(Some(raw))
}

#[allow(clippy::cast_precision_loss)]
fn scale_back(value: i128, sf: i16) -> f64 {
    descale(value as f64, sf)
}

#[allow(clippy::cast_possible_truncation)]
fn real_to_integer(point: &Point, value: f64) -> Result<i128> {
    if !value.is_finite() {
        return Err(Error::invalid_value(&point.name, format!("{value} is not finite")));
    }
    Ok(value.round() as i128)
}

fn narrow<T: TryFrom<i128>>(point: &Point, raw: Option<i128>) -> Result<Option<T>> {
    raw.map(|v| {
        T::try_from(v).map_err(|_| {
            Error::invalid_value(
                &point.name,
                format!("{v} out of range for {}", point.point_type),
            )
        })
    })
    .transpose()
}

fn encode_int<T>(point: &Point, value: &PointValue, sf: Option<i16>, dest: &mut [u8]) -> Result<()>
where
    T: Nullable + TryFrom<i128>,
{
    let raw = narrow::<T>(point, integer_of(point, value, sf)?)?;
    codec::encode(raw, dest)
}

fn real_of(point: &Point, value: &PointValue) -> Result<Option<f64>> {
    match value {
        PointValue::Absent => Ok(None),
        PointValue::Integer(_) | PointValue::Real(_) => Ok(value.as_f64()),
        other => Err(Error::invalid_value(
            &point.name,
            format!("{other:?} is not a number"),
        )),
    }
}

fn text_of<'a>(point: &Point, value: &'a PointValue) -> Result<Option<&'a str>> {
    match value {
        PointValue::Absent => Ok(None),
        PointValue::Text(text) => Ok(Some(text)),
        other => Err(Error::invalid_value(
            &point.name,
            format!("{other:?} is not text"),
        )),
    }
}

fn parse_text<T>(point: &Point, value: &PointValue) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    text_of(point, value)?
        .map(|t| {
            t.parse::<T>()
                .map_err(|err| Error::invalid_value(&point.name, err.to_string()))
        })
        .transpose()
}

fn format_mac(mac: [u8; 6]) -> String {
    mac.iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}

fn parse_mac(point: &Point, text: &str) -> Result<[u8; 6]> {
    let mut mac = [0u8; 6];
    let mut parts = text.split([':', '-']);
    for octet in &mut mac {
        let part = parts
            .next()
            .ok_or_else(|| Error::invalid_value(&point.name, "MAC address too short"))?;
        *octet = u8::from_str_radix(part, 16)
            .map_err(|err| Error::invalid_value(&point.name, err.to_string()))?;
    }
    if parts.next().is_some() {
        return Err(Error::invalid_value(&point.name, "MAC address too long"));
    }
    Ok(mac)
}
