#![cfg(feature = "serde")]

use std::sync::Arc;

use sunspec::protocol::{Access, BindingTable, Mandatory, PointType, PointValue, Static};
use sunspec::schema::{GroupCount, Model, SchemaProvider, SchemaRegistry};

const MPPT_JSON: &str = r#"{
    "id": 160,
    "group": {
        "name": "mppt",
        "type": "group",
        "label": "Multiple MPPT Inverter Extension Model",
        "points": [
            {"name": "ID", "type": "uint16", "size": 1, "mandatory": "M", "static": "S", "value": 160},
            {"name": "L", "type": "uint16", "size": 1, "mandatory": "M", "static": "S"},
            {"name": "DCA_SF", "type": "sunssf", "size": 1},
            {"name": "DCV_SF", "type": "sunssf", "size": 1},
            {"name": "Evt", "type": "bitfield32", "size": 2, "symbols": [
                {"name": "GROUND_FAULT", "value": 0},
                {"name": "INPUT_OVER_VOLTAGE", "value": 1}
            ]},
            {"name": "N", "type": "count", "size": 1},
            {"name": "Ctl", "type": "enum16", "size": 1, "access": "RW", "symbols": [
                {"name": "OFF", "value": 0, "label": "Off"},
                {"name": "ON", "value": 1}
            ]}
        ],
        "groups": [
            {
                "name": "module",
                "type": "group",
                "count": "N",
                "points": [
                    {"name": "DCA", "type": "uint16", "size": 1, "sf": "DCA_SF", "units": "A"},
                    {"name": "DCV", "type": "uint16", "size": 1, "sf": "DCV_SF", "units": "V"}
                ]
            }
        ]
    }
}"#;

#[test]
fn sunspec_json_model_deserializes() {
    let model: Model = serde_json::from_str(MPPT_JSON).unwrap();
    assert_eq!(model.id, 160);
    assert_eq!(model.name(), "mppt");
    assert_eq!(model.register_length(), 8);

    let id = model.group.point("ID").unwrap();
    assert_eq!(id.mandatory, Mandatory::Mandatory);
    assert_eq!(id.static_value, Static::Static);
    assert_eq!(id.access, Access::ReadOnly);

    let ctl = model.group.point("Ctl").unwrap();
    assert_eq!(ctl.point_type, PointType::Enum16);
    assert!(ctl.is_writable());
    assert_eq!(ctl.symbols[0].label.as_deref(), Some("Off"));

    let module = &model.group.groups[0];
    assert_eq!(module.count, Some(GroupCount::Point("N".into())));
    assert_eq!(module.points[0].scale_factor.as_deref(), Some("DCA_SF"));
}

#[test]
fn deserialized_model_binds_and_decodes() {
    let model: Model = serde_json::from_str(MPPT_JSON).unwrap();
    let registry = SchemaRegistry::new().with_model(model);
    let schema = registry.model_schema(160).unwrap();

    let mut buffer = vec![0u8; schema.register_length() * 2];
    buffer[0..2].copy_from_slice(&160u16.to_be_bytes());
    buffer[8..12].copy_from_slice(&0b11u32.to_be_bytes());
    buffer[14..16].copy_from_slice(&1u16.to_be_bytes());

    let table = BindingTable::new(Arc::clone(&schema), buffer.len()).unwrap();
    let evt = table.require("Evt").unwrap();
    assert_eq!(
        table.read(evt, &buffer),
        PointValue::Symbols(vec!["GROUND_FAULT".into(), "INPUT_OVER_VOLTAGE".into()])
    );
    let ctl = table.require("Ctl").unwrap();
    assert_eq!(table.read(ctl, &buffer), PointValue::Text("ON".into()));
}

#[test]
fn model_roundtrips_through_json() {
    let model: Model = serde_json::from_str(MPPT_JSON).unwrap();
    let json = serde_json::to_string(&model).unwrap();
    let back: Model = serde_json::from_str(&json).unwrap();
    assert_eq!(back, model);
}
