//! Host inventory entries

use crate::error::SrError;
use crate::net::ConnectPoint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Ethernet MAC address
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddr([u8; 6]);

impl MacAddr {
    /// Create from raw octets
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    /// The raw octets
    pub const fn octets(self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            o[0], o[1], o[2], o[3], o[4], o[5]
        )
    }
}

impl FromStr for MacAddr {
    type Err = SrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut octets = [0u8; 6];
        let mut parts = s.split(':');
        for octet in octets.iter_mut() {
            let part = parts
                .next()
                .ok_or_else(|| SrError::InvalidMac(s.to_string()))?;
            *octet =
                u8::from_str_radix(part, 16).map_err(|_| SrError::InvalidMac(s.to_string()))?;
        }
        if parts.next().is_some() {
            return Err(SrError::InvalidMac(s.to_string()));
        }
        Ok(Self(octets))
    }
}

impl TryFrom<String> for MacAddr {
    type Error = SrError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MacAddr> for String {
    fn from(mac: MacAddr) -> String {
        mac.to_string()
    }
}

/// End host as reported by the host-tracking collaborator
///
/// A host may carry several addresses and be multi-homed; the engine
/// derives delivery rules only for the (address, location) combinations
/// that fall inside the attachment device's configured subnet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    /// Host MAC address (identity)
    pub mac: MacAddr,
    /// IPv4 addresses bound to the host
    pub ips: BTreeSet<Ipv4Addr>,
    /// Attachment points
    pub locations: BTreeSet<ConnectPoint>,
}

impl Host {
    /// Create a host with no addresses or locations
    pub fn new(mac: MacAddr) -> Self {
        Self {
            mac,
            ips: BTreeSet::new(),
            locations: BTreeSet::new(),
        }
    }

    /// Add an address
    pub fn with_ip(mut self, ip: Ipv4Addr) -> Self {
        self.ips.insert(ip);
        self
    }

    /// Add an attachment point
    pub fn with_location(mut self, location: ConnectPoint) -> Self {
        self.locations.insert(location);
        self
    }
}
