//! Server configuration

/// Strings and address published in the common model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct DeviceIdentity {
    /// Manufacturer (`Mn`, 32 characters)
    pub manufacturer: String,
    /// Model (`Md`, 32 characters)
    pub model: String,
    /// Options (`Opt`, 16 characters)
    pub options: String,
    /// Version (`Vr`, 16 characters)
    pub version: String,
    /// Serial number (`SN`, 32 characters)
    pub serial_number: String,
    /// Modbus device address (`DA`)
    pub device_address: u16,
}

/// Server configuration options.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ServerConfig {
    /// Modbus unit identifier answered by the server.
    pub unit_id: u8,
    /// Size of the register image.
    pub register_count: usize,
    /// Common model contents.
    pub identity: DeviceIdentity,
}

impl ServerConfig {
    /// Set the published identity
    #[must_use]
    pub fn with_identity(mut self, identity: DeviceIdentity) -> Self {
        self.identity = identity;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            unit_id: 1,
            register_count: 65_535,
            identity: DeviceIdentity {
                device_address: 1,
                ..DeviceIdentity::default()
            },
        }
    }
}
