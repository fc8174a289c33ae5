//! Serve a battery model and scan it back through the in-process transport.
//!
//! Run with `cargo run --example loopback`.

use std::sync::Arc;

use sunspec::protocol::PointType;
use sunspec::schema::{Group, Model, Point};
use sunspec::{
    ClientConfig, DeviceIdentity, LoopbackTransport, SchemaModelBuilder, SchemaRegistry,
    ServerConfig, SunSpecClient, SunSpecServer,
};

fn storage_model() -> Model {
    Model::new(
        124,
        Group::new(
            "storage",
            vec![
                Point::new("ID", PointType::UInt16, 1),
                Point::new("L", PointType::UInt16, 1),
                Point::new("WChaMax", PointType::UInt16, 1)
                    .with_scale_factor("WChaMax_SF")
                    .with_units("W"),
                Point::new("ChaState", PointType::UInt16, 1)
                    .with_scale_factor("ChaState_SF")
                    .with_units("%")
                    .read_write(),
                Point::new("WChaMax_SF", PointType::SunSsf, 1),
                Point::new("ChaState_SF", PointType::SunSsf, 1),
            ],
        ),
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::default().with_identity(DeviceIdentity {
        manufacturer: "Example Energy".into(),
        model: "Storage 5".into(),
        version: "1.2.0".into(),
        serial_number: "S5-000123".into(),
        device_address: 1,
        ..DeviceIdentity::default()
    });
    let server = SunSpecServer::new(config)?;
    server.initialise();
    let storage = SchemaModelBuilder::new(Arc::new(storage_model()))
        .with_value("WChaMax_SF", 1)
        .with_value("ChaState_SF", -1)
        .with_value("WChaMax", 5000)
        .with_value("ChaState", 64.2);
    let slot = storage.slot();
    server.register_builder(storage);
    server.build()?;
    let server = Arc::new(server);

    if let Some(model) = slot.get() {
        model.on_change(|change| {
            println!("server: {} changed to {}", change.point, change.value);
            Ok(())
        });
    }

    let schemas = SchemaRegistry::new().with_model(storage_model());
    let transport = LoopbackTransport::new(Arc::clone(&server));
    let mut client = SunSpecClient::new(transport, ClientConfig::default(), schemas);
    client.scan().await?;

    for model in client.models() {
        println!("model {} at register {}", model.id(), model.start_address());
        for point in model.values() {
            println!("  {:<12} {}", point.name(), point.value());
        }
    }

    if let Some(storage) = client.model_mut(124) {
        storage.set("ChaState", 80.0).await?;
        println!("client: ChaState = {}", storage.value("ChaState")?);
    }
    Ok(())
}
