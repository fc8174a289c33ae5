//! Shared register image

use std::sync::{Arc, Mutex, MutexGuard};

use crate::protocol::{Error, Result};

/// Contiguous holding-register map served to peers.
///
/// Cloning yields another handle to the same registers.
#[derive(Debug, Clone)]
pub struct RegisterImage {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl RegisterImage {
    /// Image of `registers` zeroed registers
    #[must_use]
    pub fn new(registers: usize) -> Self {
        Self {
            bytes: Arc::new(Mutex::new(vec![0u8; registers * 2])),
        }
    }

    /// Number of registers
    #[must_use]
    pub fn registers(&self) -> usize {
        self.lock().len() / 2
    }

    /// Copy `count` registers starting at `start`
    pub fn read(&self, start: u16, count: usize) -> Result<Vec<u8>> {
        let bytes = self.lock();
        let range = byte_range(&bytes, start, count)?;
        Ok(bytes[range].to_vec())
    }

    /// Copy `count` registers starting at `start` as words
    pub fn read_words(&self, start: u16, count: usize) -> Result<Vec<u16>> {
        Ok(self
            .read(start, count)?
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect())
    }

    /// Overwrite registers starting at `start`; `bytes` must hold whole
    /// registers
    pub fn write(&self, start: u16, bytes: &[u8]) -> Result<()> {
        if bytes.len() % 2 != 0 {
            return Err(Error::InvalidOperation(format!(
                "cannot write {} bytes, registers are 2 bytes wide",
                bytes.len()
            )));
        }
        let mut image = self.lock();
        let range = byte_range(&image, start, bytes.len() / 2)?;
        image[range].copy_from_slice(bytes);
        Ok(())
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.bytes.lock().expect("register image lock poisoned")
    }
}

fn byte_range(bytes: &[u8], start: u16, count: usize) -> Result<std::ops::Range<usize>> {
    let from = usize::from(start) * 2;
    let to = from + count * 2;
    if to > bytes.len() {
        return Err(Error::AddressOutOfRange {
            start: u32::from(start),
            count: u32::try_from(count).unwrap_or(u32::MAX),
        });
    }
    Ok(from..to)
}
