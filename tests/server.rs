mod common;

use std::sync::{Arc, Mutex};

use common::{battery_model, string_model};
use sunspec::protocol::HEADER_REGISTERS;
use sunspec::server::{BuildContext, BuiltModel, ModelBuilder, ServerModel};
use sunspec::{Error, PointValue, SchemaModelBuilder, ServerConfig, SunSpecServer};

/// Model recording every relative index it is notified with.
struct RecordingModel {
    id: u16,
    length: usize,
    seen: Mutex<Vec<usize>>,
    fail: bool,
}

impl ServerModel for RecordingModel {
    fn id(&self) -> u16 {
        self.id
    }

    fn length(&self) -> usize {
        self.length
    }

    fn notify_value_changed(&self, relative: usize) -> sunspec::Result<()> {
        self.seen.lock().unwrap().push(relative);
        if self.fail {
            return Err(Error::InvalidOperation("rejected".into()));
        }
        Ok(())
    }
}

/// Builder writing a bare header and handing out a [`RecordingModel`].
struct RecordingBuilder {
    model: Arc<RecordingModel>,
}

impl RecordingBuilder {
    fn new(id: u16, length: usize, fail: bool) -> (Self, Arc<RecordingModel>) {
        let model = Arc::new(RecordingModel {
            id,
            length,
            seen: Mutex::new(Vec::new()),
            fail,
        });
        (
            Self {
                model: Arc::clone(&model),
            },
            model,
        )
    }
}

impl ModelBuilder for RecordingBuilder {
    fn build(&mut self, ctx: BuildContext<'_>) -> sunspec::Result<Option<BuiltModel>> {
        let data_length = (self.model.length - usize::from(HEADER_REGISTERS)) as u16;
        ctx.tail[0..2].copy_from_slice(&self.model.id.to_be_bytes());
        ctx.tail[2..4].copy_from_slice(&data_length.to_be_bytes());
        Ok(Some(BuiltModel {
            length: self.model.length,
            model: self.model.clone(),
        }))
    }
}

/// Builder that never produces a model.
struct DecliningBuilder;

impl ModelBuilder for DecliningBuilder {
    fn build(&mut self, _ctx: BuildContext<'_>) -> sunspec::Result<Option<BuiltModel>> {
        Ok(None)
    }
}

fn server() -> SunSpecServer {
    SunSpecServer::new(ServerConfig {
        register_count: 1024,
        ..ServerConfig::default()
    })
    .unwrap()
}

#[test]
fn new_server_serves_common_model_only() {
    let server = server();
    let words = server.image().read_words(0, 72).unwrap();
    assert_eq!(&words[..2], &[0x5375, 0x6e53]);
    assert_eq!(&words[2..4], &[1, 66]);
    assert_eq!(&words[70..72], &[0xFFFF, 0xFFFF]);
    assert_eq!(server.end_address(), Some(70));

    let models = server.models();
    assert_eq!(models.len(), 1);
    assert_eq!(models[0].0, 2);
    assert_eq!(models[0].1.id(), 1);
}

#[test]
fn builders_are_laid_out_contiguously() {
    let server = server();
    server.initialise();
    let battery = SchemaModelBuilder::new(Arc::new(battery_model()))
        .with_value("W_SF", -2)
        .with_value("WHRtg", 25.0)
        .with_value("St", "CONNECTED");
    let slot = battery.slot();
    server.register_builder(battery);
    server.register_builder(DecliningBuilder);
    server.register_builder(SchemaModelBuilder::new(Arc::new(string_model())));
    server.build().unwrap();

    let offsets: Vec<_> = server
        .models()
        .iter()
        .map(|(offset, model)| (*offset, model.id()))
        .collect();
    assert_eq!(offsets, vec![(2, 1), (70, 802), (77, 805)]);
    assert_eq!(server.end_address(), Some(81));
    assert_eq!(server.image().read_words(70, 4).unwrap(), vec![802, 5, 2500, (-2i16) as u16]);
    assert_eq!(server.image().read_words(81, 2).unwrap(), vec![0xFFFF, 0xFFFF]);

    let battery = slot.get().unwrap();
    assert_eq!(battery.start_address(), 70);
    assert_eq!(battery.get("WHRtg").unwrap(), PointValue::Real(25.0));
    assert_eq!(battery.get("SoC").unwrap(), PointValue::Absent);
    assert_eq!(battery.get("St").unwrap(), PointValue::Text("CONNECTED".into()));
}

#[test]
fn build_requires_fresh_initialise() {
    let server = server();
    assert!(matches!(server.build(), Err(Error::InvalidOperation(_))));

    server.initialise();
    server.build().unwrap();
    assert!(matches!(server.build(), Err(Error::InvalidOperation(_))));
}

#[test]
fn common_model_carries_identity() {
    let mut config = ServerConfig {
        register_count: 256,
        ..ServerConfig::default()
    };
    config.identity.manufacturer = "Acme".into();
    config.identity.serial_number = "SN-42".into();
    config.identity.device_address = 7;
    let server = SunSpecServer::new(config).unwrap();

    let common = server.common_model().unwrap();
    assert_eq!(common.get("Mn").unwrap(), PointValue::Text("Acme".into()));
    assert_eq!(common.get("SN").unwrap(), PointValue::Text("SN-42".into()));
    assert_eq!(common.get("Md").unwrap(), PointValue::Absent);
    assert_eq!(common.get("DA").unwrap(), PointValue::Integer(7));

    server.initialise();
    server.build().unwrap();
    assert!(server.common_model().is_some());
}

#[test]
fn write_reaches_only_the_owning_model() {
    let server = server();
    server.initialise();
    let (first, first_model) = RecordingBuilder::new(64_001, 6, false);
    let (second, second_model) = RecordingBuilder::new(64_002, 4, false);
    server.register_builder(first);
    server.register_builder(second);
    server.build().unwrap();
    // common 2..70, first 70..76, second 76..80, end marker at 80

    server.notify_registers_changed([70 + 1 + 3]).unwrap();
    assert_eq!(*first_model.seen.lock().unwrap(), vec![3]);
    assert!(second_model.seen.lock().unwrap().is_empty());

    server.notify_registers_changed([76 + 1, 76 + 1 + 2]).unwrap();
    assert_eq!(*second_model.seen.lock().unwrap(), vec![0, 2]);
    assert_eq!(first_model.seen.lock().unwrap().len(), 1);
}

#[test]
fn writes_outside_models_are_ignored() {
    let server = server();
    server.initialise();
    let (builder, model) = RecordingBuilder::new(64_001, 6, false);
    server.register_builder(builder);
    server.build().unwrap();

    server.notify_registers_changed([0, 1, 76, 77, 500]).unwrap();
    assert!(model.seen.lock().unwrap().is_empty());
}

#[test]
fn callback_errors_propagate() {
    let server = server();
    server.initialise();
    let (builder, model) = RecordingBuilder::new(64_001, 6, true);
    server.register_builder(builder);
    server.build().unwrap();

    let err = server.notify_registers_changed([72]).unwrap_err();
    assert!(matches!(err, Error::InvalidOperation(_)));
    assert_eq!(*model.seen.lock().unwrap(), vec![1]);
}

#[test]
fn peer_write_is_mapped_to_point() {
    let server = server();
    server.initialise();
    let battery = SchemaModelBuilder::new(Arc::new(battery_model())).with_value("SoC_SF", -1);
    let slot = battery.slot();
    server.register_builder(battery);
    server.build().unwrap();

    let model = slot.get().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    model.on_change(move |change| {
        sink.lock().unwrap().push(change.point.clone());
        Ok(())
    });

    // SoC is register 4 of the battery model at 70
    server.write_registers(74, &555u16.to_be_bytes()).unwrap();

    let changes = model.take_changes();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].point, "SoC");
    assert_eq!(changes[0].relative, 3);
    assert_eq!(changes[0].value, PointValue::Real(55.5));
    assert_eq!(*seen.lock().unwrap(), vec!["SoC".to_owned()]);
    assert!(model.take_changes().is_empty());
}

#[test]
fn server_side_set_updates_image() {
    let server = server();
    let common = server.common_model().unwrap();
    common.set("Md", "Inverter 9000").unwrap();
    assert_eq!(common.get("Md").unwrap(), PointValue::Text("Inverter 9000".into()));

    let err = common.set("Md", "x".repeat(40).as_str()).unwrap_err();
    assert!(matches!(err, Error::InvalidValue { .. }));
}

/// Builder reporting a fixed length regardless of what it wrote.
struct FixedLengthBuilder {
    id: u16,
    length: usize,
}

impl ModelBuilder for FixedLengthBuilder {
    fn build(&mut self, ctx: BuildContext<'_>) -> sunspec::Result<Option<BuiltModel>> {
        ctx.tail[0..2].copy_from_slice(&self.id.to_be_bytes());
        let (_, model) = RecordingBuilder::new(self.id, self.length, false);
        Ok(Some(BuiltModel {
            length: self.length,
            model,
        }))
    }
}

#[test]
fn builder_lengths_are_validated() {
    for length in [0, 1, 1024] {
        let server = server();
        server.initialise();
        server.register_builder(FixedLengthBuilder { id: 64_001, length });
        server.register_builder(FixedLengthBuilder { id: 64_002, length: 4 });

        let err = server.build().unwrap_err();
        assert!(matches!(err, Error::InvalidOperation(_)), "length {length}: {err}");
        assert_eq!(server.end_address(), None);
        assert!(server.models().iter().all(|(_, model)| model.id() != 64_002));
    }
}

/// Builder that consults the image while laying itself out.
struct ImageReadingBuilder {
    seen_registers: Arc<Mutex<Option<usize>>>,
}

impl ModelBuilder for ImageReadingBuilder {
    fn build(&mut self, ctx: BuildContext<'_>) -> sunspec::Result<Option<BuiltModel>> {
        *self.seen_registers.lock().unwrap() = Some(ctx.image.registers());
        let preamble = ctx.image.read_words(0, 2)?;
        ctx.tail[0..2].copy_from_slice(&64_010u16.to_be_bytes());
        ctx.tail[2..4].copy_from_slice(&2u16.to_be_bytes());
        ctx.tail[4..6].copy_from_slice(&preamble[0].to_be_bytes());
        ctx.tail[6..8].copy_from_slice(&preamble[1].to_be_bytes());
        let (_, model) = RecordingBuilder::new(64_010, 4, false);
        Ok(Some(BuiltModel { length: 4, model }))
    }
}

#[test]
fn builders_may_use_the_image_handle() {
    let server = server();
    server.initialise();
    let seen = Arc::new(Mutex::new(None));
    server.register_builder(ImageReadingBuilder {
        seen_registers: Arc::clone(&seen),
    });
    server.build().unwrap();

    assert_eq!(*seen.lock().unwrap(), Some(1024));
    assert_eq!(
        server.image().read_words(70, 6).unwrap(),
        vec![64_010, 2, 0x5375, 0x6e53, 0xFFFF, 0xFFFF]
    );
    assert_eq!(server.end_address(), Some(74));
}
