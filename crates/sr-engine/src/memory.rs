//! In-memory collaborator backing
//!
//! One value implementing all four facade traits, used by the engine
//! tests and the snapshot inspector. Mutators change the underlying
//! network; queries hand out snapshots, matching the contract the real
//! collaborators provide.

use crate::services::{ConfigRegistry, DeviceInventory, HostService, TopologyService};
use parking_lot::RwLock;
use sr_common::{ConnectPoint, DeviceId, Host, MacAddr, SegmentConfig};
use sr_topology::TopologyGraph;
use std::collections::{BTreeMap, BTreeSet};

/// In-memory network inventory
#[derive(Debug, Default)]
pub struct MemoryNetwork {
    configs: RwLock<BTreeMap<DeviceId, SegmentConfig>>,
    switches: RwLock<BTreeSet<DeviceId>>,
    graph: RwLock<TopologyGraph>,
    hosts: RwLock<BTreeMap<MacAddr, Host>>,
}

impl MemoryNetwork {
    /// Create an empty network
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a switch with no links
    pub fn add_switch(&self, device: impl Into<DeviceId>) {
        let device = device.into();
        self.switches.write().insert(device.clone());
        self.graph.write().add_device(device);
    }

    /// Cable two switches together (both link directions)
    pub fn connect(&self, a: ConnectPoint, b: ConnectPoint) {
        let mut switches = self.switches.write();
        switches.insert(a.device.clone());
        switches.insert(b.device.clone());
        self.graph.write().add_duplex(a, b);
    }

    /// Install or replace a device's segment configuration, returning
    /// the previous one
    pub fn set_config(&self, config: SegmentConfig) -> Option<SegmentConfig> {
        self.configs.write().insert(config.device.clone(), config)
    }

    /// Drop a device's segment configuration
    pub fn remove_config(&self, device: &DeviceId) -> Option<SegmentConfig> {
        self.configs.write().remove(device)
    }

    /// Track a host, returning any previous snapshot for the same MAC
    pub fn add_host(&self, host: Host) -> Option<Host> {
        self.hosts.write().insert(host.mac, host)
    }

    /// Forget a host
    pub fn remove_host(&self, mac: &MacAddr) -> Option<Host> {
        self.hosts.write().remove(mac)
    }
}

impl ConfigRegistry for MemoryNetwork {
    fn config(&self, device: &DeviceId) -> Option<SegmentConfig> {
        self.configs.read().get(device).cloned()
    }
}

impl DeviceInventory for MemoryNetwork {
    fn switches(&self) -> Vec<DeviceId> {
        self.switches.read().iter().cloned().collect()
    }

    fn is_switch(&self, device: &DeviceId) -> bool {
        self.switches.read().contains(device)
    }
}

impl TopologyService for MemoryNetwork {
    fn current_graph(&self) -> TopologyGraph {
        self.graph.read().clone()
    }
}

impl HostService for MemoryNetwork {
    fn hosts(&self) -> Vec<Host> {
        self.hosts.read().values().cloned().collect()
    }

    fn hosts_attached_to(&self, device: &DeviceId) -> Vec<Host> {
        self.hosts
            .read()
            .values()
            .filter(|h| h.locations.iter().any(|l| &l.device == device))
            .cloned()
            .collect()
    }
}
