//! Topology graph snapshot

use serde::{Deserialize, Serialize};
use sr_common::{ConnectPoint, DeviceId};
use std::collections::BTreeSet;
use std::fmt;

/// Directed infrastructure link between two connect points
///
/// Physical cables appear as two links, one per direction; the graph
/// treats each direction independently.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Link {
    /// Source endpoint
    pub src: ConnectPoint,
    /// Destination endpoint
    pub dst: ConnectPoint,
}

impl Link {
    /// Create a directed link
    pub fn new(src: ConnectPoint, dst: ConnectPoint) -> Self {
        Self { src, dst }
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.src, self.dst)
    }
}

/// Immutable snapshot of the device/link graph
///
/// Built once per query from the topology collaborator and handed to
/// consumers by value; mutations never flow back into topology state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopologyGraph {
    devices: BTreeSet<DeviceId>,
    links: Vec<Link>,
}

impl TopologyGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex with no links
    pub fn add_device(&mut self, device: DeviceId) {
        self.devices.insert(device);
    }

    /// Add a directed link, inserting both endpoint devices
    pub fn add_link(&mut self, link: Link) {
        self.devices.insert(link.src.device.clone());
        self.devices.insert(link.dst.device.clone());
        self.links.push(link);
    }

    /// Add a bidirectional link pair between two connect points
    pub fn add_duplex(&mut self, a: ConnectPoint, b: ConnectPoint) {
        self.add_link(Link::new(a.clone(), b.clone()));
        self.add_link(Link::new(b, a));
    }

    /// Whether the graph knows this device
    pub fn contains(&self, device: &DeviceId) -> bool {
        self.devices.contains(device)
    }

    /// All devices in the snapshot
    pub fn devices(&self) -> impl Iterator<Item = &DeviceId> {
        self.devices.iter()
    }

    /// All directed links in the snapshot
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Incoming edges of a vertex: links whose destination side is `device`
    pub fn edges_to<'a>(&'a self, device: &'a DeviceId) -> impl Iterator<Item = &'a Link> {
        self.links.iter().filter(move |l| &l.dst.device == device)
    }

    /// Number of devices
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Number of directed links
    pub fn link_count(&self) -> usize {
        self.links.len()
    }
}
