#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use sunspec::protocol::PointType;
use sunspec::schema::{Group, Model, Point, Symbol};
use sunspec::{RegisterTransport, SchemaRegistry, TransportError};

/// One recorded register transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    Read { start: u16, count: u16 },
    Write { start: u16, words: Vec<u16> },
}

#[derive(Debug)]
struct DeviceState {
    registers: Vec<u16>,
    log: Vec<Transaction>,
    fail_writes: bool,
}

/// Scripted register device; clones share state.
#[derive(Debug, Clone)]
pub struct MockDevice {
    state: Arc<Mutex<DeviceState>>,
}

impl MockDevice {
    /// Device with `words` placed at `base`, every other register zero
    pub fn new(base: u16, words: &[u16]) -> Self {
        let mut registers = vec![0u16; 0x1_0000];
        let base = usize::from(base);
        registers[base..base + words.len()].copy_from_slice(words);
        Self {
            state: Arc::new(Mutex::new(DeviceState {
                registers,
                log: Vec::new(),
                fail_writes: false,
            })),
        }
    }

    pub fn log(&self) -> Vec<Transaction> {
        self.state.lock().unwrap().log.clone()
    }

    pub fn clear_log(&self) {
        self.state.lock().unwrap().log.clear();
    }

    pub fn register(&self, address: u16) -> u16 {
        self.state.lock().unwrap().registers[usize::from(address)]
    }

    pub fn set_register(&self, address: u16, value: u16) {
        self.state.lock().unwrap().registers[usize::from(address)] = value;
    }

    pub fn fail_writes(&self, fail: bool) {
        self.state.lock().unwrap().fail_writes = fail;
    }
}

impl RegisterTransport for MockDevice {
    async fn read_holding_registers(
        &mut self,
        _unit: u8,
        start: u16,
        count: u16,
    ) -> Result<Vec<u8>, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.log.push(Transaction::Read { start, count });
        let from = usize::from(start);
        let to = from + usize::from(count);
        if to > state.registers.len() {
            return Err(TransportError::Exception { code: 0x02 });
        }
        Ok(state.registers[from..to]
            .iter()
            .flat_map(|r| r.to_be_bytes())
            .collect())
    }

    async fn write_registers(
        &mut self,
        _unit: u8,
        start: u16,
        bytes: &[u8],
    ) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        let words: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        state.log.push(Transaction::Write {
            start,
            words: words.clone(),
        });
        if state.fail_writes {
            return Err(TransportError::Closed);
        }
        for (i, word) in words.into_iter().enumerate() {
            state.registers[usize::from(start) + i] = word;
        }
        Ok(())
    }
}

/// `"SunS"` as two registers
pub const PREAMBLE: [u16; 2] = [0x5375, 0x6e53];

/// Pack `text` into `registers` NUL-padded registers
pub fn text(value: &str, registers: usize) -> Vec<u16> {
    let mut bytes = value.as_bytes().to_vec();
    bytes.resize(registers * 2, 0);
    bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect()
}

/// Common model block (header included)
pub fn common_block(manufacturer: &str) -> Vec<u16> {
    let mut words = vec![1, 66];
    words.extend(text(manufacturer, 16));
    words.extend(text("Simulator", 16));
    words.extend(text("", 8));
    words.extend(text("1.0", 8));
    words.extend(text("SN-0001", 16));
    words.push(1);
    words.push(0x8000);
    words
}

/// Small battery model: rating scaled by `W_SF`, writable `SoC` scaled by
/// `SoC_SF`, and a state enum
pub fn battery_model() -> Model {
    Model::new(
        802,
        Group::new(
            "battery",
            vec![
                Point::new("ID", PointType::UInt16, 1).mandatory(),
                Point::new("L", PointType::UInt16, 1).mandatory(),
                Point::new("WHRtg", PointType::UInt16, 1).with_scale_factor("W_SF"),
                Point::new("W_SF", PointType::SunSsf, 1),
                Point::new("SoC", PointType::UInt16, 1)
                    .with_scale_factor("SoC_SF")
                    .read_write(),
                Point::new("SoC_SF", PointType::SunSsf, 1),
                Point::new("St", PointType::Enum16, 1).with_symbols([
                    Symbol::new("DISCONNECTED", 1),
                    Symbol::new("CONNECTED", 2),
                ]),
            ],
        ),
    )
}

/// Battery model block (header included)
pub fn battery_block(wh_raw: u16, w_sf: i16, soc_raw: u16, soc_sf: i16, state: u16) -> Vec<u16> {
    vec![
        802,
        5,
        wh_raw,
        w_sf as u16,
        soc_raw,
        soc_sf as u16,
        state,
    ]
}

/// Small string model, repeated once per string on real devices
pub fn string_model() -> Model {
    Model::new(
        805,
        Group::new(
            "string",
            vec![
                Point::new("ID", PointType::UInt16, 1),
                Point::new("L", PointType::UInt16, 1),
                Point::new("Idx", PointType::UInt16, 1),
                Point::new("V", PointType::Int16, 1),
            ],
        ),
    )
}

pub fn string_block(index: u16, volts: i16) -> Vec<u16> {
    vec![805, 2, index, volts as u16]
}

pub const END: [u16; 2] = [0xFFFF, 0xFFFF];

pub fn schemas() -> SchemaRegistry {
    [battery_model(), string_model()].into_iter().collect()
}

pub fn image(blocks: &[&[u16]]) -> Vec<u16> {
    blocks.iter().flat_map(|b| b.iter().copied()).collect()
}
