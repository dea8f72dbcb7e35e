//! Network identities: devices, ports, connect points, VLAN segment ids

use crate::error::SrError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque switch identifier (e.g. `of:0000000000000001`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Create a device id from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for DeviceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Switch port number
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PortNumber(u32);

impl PortNumber {
    /// Create a port number
    pub const fn new(port: u32) -> Self {
        Self(port)
    }

    /// The raw port value
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PortNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A (device, port) pair where a link or host terminates
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectPoint {
    /// Terminating device
    pub device: DeviceId,
    /// Terminating port on that device
    pub port: PortNumber,
}

impl ConnectPoint {
    /// Create a connect point
    pub fn new(device: impl Into<DeviceId>, port: u32) -> Self {
        Self {
            device: device.into(),
            port: PortNumber::new(port),
        }
    }
}

impl fmt::Display for ConnectPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.device, self.port)
    }
}

impl FromStr for ConnectPoint {
    type Err = SrError;

    /// Parse `device/port`; the device id may itself contain `/`,
    /// so the split happens at the last separator.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (device, port) = s
            .rsplit_once('/')
            .ok_or_else(|| SrError::InvalidConnectPoint(s.to_string()))?;
        let port: u32 = port
            .parse()
            .map_err(|_| SrError::InvalidConnectPoint(s.to_string()))?;
        if device.is_empty() {
            return Err(SrError::InvalidConnectPoint(s.to_string()));
        }
        Ok(Self::new(device, port))
    }
}

/// VLAN tag value identifying a segment (12 bits)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u16", into = "u16")]
pub struct VlanId(u16);

impl VlanId {
    /// Largest valid VLAN tag value
    pub const MAX: u16 = 4095;

    /// Create a validated VLAN id
    pub fn new(id: u16) -> Result<Self, SrError> {
        if id > Self::MAX {
            return Err(SrError::InvalidVlan(id));
        }
        Ok(Self(id))
    }

    /// The raw tag value
    pub const fn value(self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for VlanId {
    type Error = SrError;

    fn try_from(id: u16) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl From<VlanId> for u16 {
    fn from(id: VlanId) -> u16 {
        id.0
    }
}

impl fmt::Display for VlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
