//! Per-switch segment routing configuration

use crate::net::{DeviceId, VlanId};
use ipnetwork::Ipv4Network;
use serde::{Deserialize, Serialize};

/// Administrator-declared configuration for one switch
///
/// A switch with a configuration becomes the root of the segment named
/// by `segment`; if `subnet` is set, hosts inside that prefix are
/// reachable through this switch. Switches without a configuration are
/// unmanaged transit devices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentConfig {
    /// Switch this configuration applies to
    pub device: DeviceId,
    /// Segment id, carried on the wire as a VLAN tag
    pub segment: VlanId,
    /// Locally attached subnet, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet: Option<Ipv4Network>,
}

impl SegmentConfig {
    /// Create a configuration without a subnet
    pub fn new(device: impl Into<DeviceId>, segment: VlanId) -> Self {
        Self {
            device: device.into(),
            segment,
            subnet: None,
        }
    }

    /// Attach a subnet
    pub fn with_subnet(mut self, subnet: Ipv4Network) -> Self {
        self.subnet = Some(subnet);
        self
    }
}
