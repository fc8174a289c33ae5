//! Built-in SunSpec common model (ID 1)

use crate::protocol::{COMMON_MODEL_ID, PointType};

use super::{Group, Model, Point};

/// Data registers of the common model, header excluded.
pub const COMMON_MODEL_LENGTH: u16 = 66;

/// Schema of the common model every SunSpec device exposes first.
#[must_use]
pub fn common_model() -> Model {
    let points = vec![
        Point::new("ID", PointType::UInt16, 1).mandatory(),
        Point::new("L", PointType::UInt16, 1).mandatory(),
        Point::new("Mn", PointType::String, 16).mandatory(),
        Point::new("Md", PointType::String, 16).mandatory(),
        Point::new("Opt", PointType::String, 8),
        Point::new("Vr", PointType::String, 8),
        Point::new("SN", PointType::String, 16).mandatory(),
        Point::new("DA", PointType::UInt16, 1).read_write(),
        Point::new("Pad", PointType::Pad, 1),
    ];
    Model::new(COMMON_MODEL_ID, Group::new("common", points))
}
