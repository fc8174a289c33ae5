//! Client configuration

use crate::protocol::MAX_REGISTERS_PER_TRANSACTION;
use crate::transport::RegisterPager;

/// Scanner configuration options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ClientConfig {
    /// Modbus unit identifier of the device.
    pub unit_id: u8,
    /// Register address of the `"SunS"` preamble; every scan address is
    /// relative to it. Real devices commonly use 40000.
    pub base_address: u16,
    /// Registers per transaction, clamped to `1..=125`.
    pub page_width: u16,
}

impl ClientConfig {
    /// Config for `unit_id` with default addressing
    #[must_use]
    pub fn for_unit(unit_id: u8) -> Self {
        Self {
            unit_id,
            ..Self::default()
        }
    }

    /// Set the base address
    #[must_use]
    pub const fn with_base_address(mut self, base_address: u16) -> Self {
        self.base_address = base_address;
        self
    }

    /// Set the page width
    #[must_use]
    pub const fn with_page_width(mut self, page_width: u16) -> Self {
        self.page_width = page_width;
        self
    }

    /// Pager honoring `page_width`
    #[must_use]
    pub fn pager(&self) -> RegisterPager {
        RegisterPager::new(self.page_width)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            unit_id: 1,
            base_address: 0,
            page_width: MAX_REGISTERS_PER_TRANSACTION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.unit_id, 1);
        assert_eq!(config.base_address, 0);
        assert_eq!(config.pager().width(), 125);
        assert_eq!(ClientConfig::for_unit(3).with_page_width(900).pager().width(), 125);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_partial_json() {
        let config: ClientConfig = serde_json::from_str(r#"{"base_address":40000}"#).unwrap();
        assert_eq!(config.base_address, 40000);
        assert_eq!(config.unit_id, 1);
    }
}
