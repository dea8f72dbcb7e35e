//! Collaborator facades
//!
//! Abstract contracts over the external control-plane services the
//! engine consumes. Every query returns a snapshot value; none of them
//! streams or blocks.

use sr_common::{DeviceId, Host, SegmentConfig};
use sr_topology::TopologyGraph;

/// Segment routing configuration registry
pub trait ConfigRegistry: Send + Sync {
    /// Current configuration of a device, if any
    fn config(&self, device: &DeviceId) -> Option<SegmentConfig>;
}

/// Switch inventory
pub trait DeviceInventory: Send + Sync {
    /// All known switches
    fn switches(&self) -> Vec<DeviceId>;

    /// Whether a device is a recognized switch
    fn is_switch(&self, device: &DeviceId) -> bool;
}

/// Topology discovery facade
pub trait TopologyService: Send + Sync {
    /// Snapshot of the current device/link graph
    fn current_graph(&self) -> TopologyGraph;
}

/// Host tracking facade
pub trait HostService: Send + Sync {
    /// All currently known hosts
    fn hosts(&self) -> Vec<Host>;

    /// Hosts with an attachment point on the given device
    fn hosts_attached_to(&self, device: &DeviceId) -> Vec<Host>;
}
