mod common;

use common::{
    END, MockDevice, PREAMBLE, Transaction, battery_block, common_block, image, schemas,
    string_block,
};
use sunspec::client::RawModel;
use sunspec::{ClientConfig, Error, Identification, PointValue, ScanState, SunSpecClient};

fn client(device: &MockDevice, config: ClientConfig) -> SunSpecClient<MockDevice> {
    SunSpecClient::new(device.clone(), config, schemas())
}

#[tokio::test]
async fn scan_finds_common_and_battery() {
    let common = common_block("Acme");
    let battery = battery_block(2500, -2, 800, -1, 2);
    let device = MockDevice::new(0, &image(&[&PREAMBLE, &common, &battery, &END]));
    let mut client = client(&device, ClientConfig::default());

    client.scan().await.unwrap();

    assert_eq!(client.state(), ScanState::Done);
    assert_eq!(client.models().len(), 2);
    let first = &client.models()[0];
    assert_eq!(first.id(), 1);
    assert_eq!(first.start_address(), 2);
    assert_eq!(first.length(), 68);
    assert_eq!(first.buffer().len(), 136);

    let battery = &client.models()[1];
    assert_eq!(battery.id(), 802);
    assert_eq!(battery.start_address(), 70);
    assert_eq!(battery.length(), 7);

    let common = client.common().unwrap();
    assert_eq!(common.value("Mn").unwrap(), PointValue::Text("Acme".into()));
    assert_eq!(common.value("Opt").unwrap(), PointValue::Absent);
    assert_eq!(common.value("DA").unwrap(), PointValue::Integer(1));
    assert_eq!(client.model_ids().collect::<Vec<_>>(), vec![1, 802]);
}

#[tokio::test]
async fn scaled_and_enum_values_decode() {
    let device = MockDevice::new(
        0,
        &image(&[
            &PREAMBLE,
            &common_block("Acme"),
            &battery_block(2500, -2, 800, -1, 2),
            &END,
        ]),
    );
    let mut client = client(&device, ClientConfig::default());
    client.scan().await.unwrap();

    let battery = client.models_by_id(802).next().unwrap();
    assert_eq!(battery.value("WHRtg").unwrap(), PointValue::Real(25.0));
    assert_eq!(battery.value("SoC").unwrap(), PointValue::Real(80.0));
    assert_eq!(battery.value("St").unwrap(), PointValue::Text("CONNECTED".into()));
    assert_eq!(battery.value("W_SF").unwrap(), PointValue::Integer(-2));

    let names: Vec<_> = battery.values().map(|v| v.name().to_owned()).collect();
    assert_eq!(names, ["ID", "L", "WHRtg", "W_SF", "SoC", "SoC_SF", "St"]);
    assert!(matches!(
        battery.value("Nope"),
        Err(Error::UnknownPoint { .. })
    ));
}

#[tokio::test]
async fn repeated_models_are_all_kept() {
    let device = MockDevice::new(
        0,
        &image(&[
            &PREAMBLE,
            &common_block("Acme"),
            &string_block(1, 400),
            &string_block(2, 410),
            &string_block(3, 420),
            &END,
        ]),
    );
    let mut client = client(&device, ClientConfig::default());
    client.scan().await.unwrap();

    assert_eq!(client.models().len(), 4);
    let strings: Vec<_> = client.models_by_id(805).collect();
    assert_eq!(strings.len(), 3);
    let starts: Vec<_> = strings.iter().map(|m| m.start_address()).collect();
    assert_eq!(starts, vec![70, 74, 78]);
    let volts: Vec<_> = strings.iter().map(|m| m.value("V").unwrap()).collect();
    assert_eq!(
        volts,
        vec![
            PointValue::Integer(400),
            PointValue::Integer(410),
            PointValue::Integer(420)
        ]
    );
}

#[tokio::test]
async fn proxies_parallel_bound_models() {
    let device = MockDevice::new(
        0,
        &image(&[
            &PREAMBLE,
            &common_block("Acme"),
            &string_block(1, 400),
            &END,
        ]),
    );
    let mut client = client(&device, ClientConfig::default());
    client.scan().await.unwrap();

    assert_eq!(client.proxies().len(), client.models().len());
    let proxy = &client.proxies()[1];
    assert_eq!(proxy.id(), 805);
    assert_eq!(proxy.length(), 4);
    let raw = proxy.as_any().downcast_ref::<RawModel>().unwrap();
    assert_eq!(raw.register(3), Some(400));
}

#[tokio::test]
async fn zero_model_id_is_skipped() {
    let device = MockDevice::new(
        0,
        &image(&[
            &PREAMBLE,
            &common_block("Acme"),
            &[0, 0],
            &string_block(1, 400),
            &END,
        ]),
    );
    let mut client = client(&device, ClientConfig::default());
    client.scan().await.unwrap();

    assert_eq!(client.models().len(), 2);
    assert_eq!(client.models()[1].start_address(), 72);
}

#[tokio::test]
async fn end_marker_with_zero_length_stops_scan() {
    let device = MockDevice::new(
        0,
        &image(&[&PREAMBLE, &common_block("Acme"), &[0xFFFF, 0]]),
    );
    let mut client = client(&device, ClientConfig::default());
    client.scan().await.unwrap();
    assert_eq!(client.models().len(), 1);
}

#[tokio::test]
async fn bad_preamble_fails_without_models() {
    let device = MockDevice::new(0, &image(&[&[0x4D42, 0x5553], &common_block("Acme"), &END]));
    let mut client = client(&device, ClientConfig::default());

    let err = client.scan().await.unwrap_err();
    assert!(err.is_device_identification());
    assert!(matches!(
        err,
        Error::DeviceIdentification(Identification::MissingPreamble { found }) if &found == b"MBUS"
    ));
    assert!(client.models().is_empty());
    assert!(client.proxies().is_empty());
    assert_eq!(client.state(), ScanState::Failed);
}

#[tokio::test]
async fn first_model_must_be_common() {
    let device = MockDevice::new(
        0,
        &image(&[&PREAMBLE, &string_block(1, 400), &END]),
    );
    let mut client = client(&device, ClientConfig::default());
    let err = client.scan().await.unwrap_err();
    assert!(matches!(
        err,
        Error::DeviceIdentification(Identification::MissingCommonModel { found: 805 })
    ));
}

#[tokio::test]
async fn unknown_model_is_fatal() {
    let device = MockDevice::new(
        0,
        &image(&[&PREAMBLE, &common_block("Acme"), &[64_999, 1, 0], &END]),
    );
    let mut client = client(&device, ClientConfig::default());
    let err = client.scan().await.unwrap_err();
    assert!(matches!(err, Error::SchemaNotFound { model_id: 64_999 }));
    assert!(client.models().is_empty());
}

#[tokio::test]
async fn failed_rescan_clears_previous_results() {
    let device = MockDevice::new(
        0,
        &image(&[&PREAMBLE, &common_block("Acme"), &END]),
    );
    let mut client = client(&device, ClientConfig::default());
    client.scan().await.unwrap();
    assert_eq!(client.models().len(), 1);

    device.set_register(0, 0);
    assert!(client.scan().await.is_err());
    assert!(client.models().is_empty());
    assert!(client.common().is_none());
}

#[tokio::test]
async fn base_address_and_page_width_are_honored() {
    let device = MockDevice::new(
        40_000,
        &image(&[&PREAMBLE, &common_block("Acme"), &END]),
    );
    let config = ClientConfig::default()
        .with_base_address(40_000)
        .with_page_width(10);
    let mut client = client(&device, config);
    client.scan().await.unwrap();

    assert_eq!(client.models()[0].start_address(), 40_002);
    let log = device.log();
    assert_eq!(log[0], Transaction::Read { start: 40_000, count: 4 });
    assert!(log.iter().all(|t| matches!(t, Transaction::Read { count, .. } if *count <= 10)));
    // preamble read, common header, 68-register common model in 7 pages, end header
    assert_eq!(log.len(), 1 + 1 + 7 + 1);
}

#[tokio::test]
async fn set_writes_then_mirrors_without_refresh() {
    let device = MockDevice::new(
        0,
        &image(&[
            &PREAMBLE,
            &common_block("Acme"),
            &battery_block(2500, -2, 800, -1, 2),
            &END,
        ]),
    );
    let mut client = client(&device, ClientConfig::default());
    client.scan().await.unwrap();
    device.clear_log();

    let battery = client.model_mut(802).unwrap();
    battery.set("SoC", 55.5).await.unwrap();

    assert_eq!(
        device.log(),
        vec![Transaction::Write {
            start: 74,
            words: vec![555]
        }]
    );
    assert_eq!(battery.value("SoC").unwrap(), PointValue::Real(55.5));
    assert_eq!(device.register(74), 555);
}

#[tokio::test]
async fn read_only_point_is_rejected_before_io() {
    let device = MockDevice::new(
        0,
        &image(&[
            &PREAMBLE,
            &common_block("Acme"),
            &battery_block(2500, -2, 800, -1, 2),
            &END,
        ]),
    );
    let mut client = client(&device, ClientConfig::default());
    client.scan().await.unwrap();
    device.clear_log();

    let battery = client.model_mut(802).unwrap();
    let err = battery.set("WHRtg", 30.0).await.unwrap_err();
    assert!(matches!(err, Error::InvalidOperation(_)));
    assert!(device.log().is_empty());
    assert_eq!(battery.value("WHRtg").unwrap(), PointValue::Real(25.0));
}

#[tokio::test]
async fn failed_write_leaves_mirror_untouched() {
    let device = MockDevice::new(
        0,
        &image(&[
            &PREAMBLE,
            &common_block("Acme"),
            &battery_block(2500, -2, 800, -1, 2),
            &END,
        ]),
    );
    let mut client = client(&device, ClientConfig::default());
    client.scan().await.unwrap();
    device.fail_writes(true);

    let battery = client.model_mut(802).unwrap();
    let err = battery.set("SoC", 10.0).await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    assert_eq!(battery.value("SoC").unwrap(), PointValue::Real(80.0));
}

#[tokio::test]
async fn refresh_observes_new_device_state() {
    let device = MockDevice::new(
        0,
        &image(&[
            &PREAMBLE,
            &common_block("Acme"),
            &battery_block(2500, -2, 800, -1, 2),
            &END,
        ]),
    );
    let mut client = client(&device, ClientConfig::default());
    client.scan().await.unwrap();

    device.set_register(76, 1);
    let battery = client.model_mut(802).unwrap();
    assert_eq!(battery.value("St").unwrap(), PointValue::Text("CONNECTED".into()));
    battery.refresh().await.unwrap();
    assert_eq!(battery.value("St").unwrap(), PointValue::Text("DISCONNECTED".into()));
}
