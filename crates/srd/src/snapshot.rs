//! Declared network snapshot

use ipnetwork::Ipv4Network;
use serde::{Deserialize, Serialize};
use sr_common::{ConnectPoint, Host, MacAddr, Result, SegmentConfig, SrError, VlanId};
use sr_engine::MemoryNetwork;
use std::net::Ipv4Addr;

/// Input file for the inspector: devices with optional segment
/// configuration, cabling, and attached hosts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    /// Switches, with optional segment configuration
    pub devices: Vec<DeviceEntry>,
    /// Cables; each entry creates both link directions
    #[serde(default)]
    pub links: Vec<LinkEntry>,
    /// Attached hosts
    #[serde(default)]
    pub hosts: Vec<HostEntry>,
}

/// One switch declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceEntry {
    /// Device id
    pub id: String,
    /// Segment id, if the switch is configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<u16>,
    /// Locally attached subnet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet: Option<Ipv4Network>,
}

/// One cable, endpoints as `device/port`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkEntry {
    /// One end
    pub src: String,
    /// Other end
    pub dst: String,
}

/// One host declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostEntry {
    /// MAC address
    pub mac: String,
    /// IPv4 addresses
    pub ips: Vec<Ipv4Addr>,
    /// Attachment point as `device/port`
    pub location: String,
}

impl NetworkSnapshot {
    /// Load a snapshot from a JSON file
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| SrError::Config(e.to_string()))
    }

    /// Materialize the declared network as in-memory collaborators
    pub fn into_network(self) -> Result<MemoryNetwork> {
        let net = MemoryNetwork::new();
        for device in &self.devices {
            net.add_switch(device.id.as_str());
        }
        for link in &self.links {
            let src: ConnectPoint = link.src.parse()?;
            let dst: ConnectPoint = link.dst.parse()?;
            net.connect(src, dst);
        }
        for device in self.devices {
            if let Some(segment) = device.segment {
                let mut config = SegmentConfig::new(device.id.as_str(), VlanId::new(segment)?);
                if let Some(subnet) = device.subnet {
                    config = config.with_subnet(subnet);
                }
                net.set_config(config);
            }
        }
        for host in self.hosts {
            let mac: MacAddr = host.mac.parse()?;
            let location: ConnectPoint = host.location.parse()?;
            let mut entry = Host::new(mac).with_location(location);
            for ip in host.ips {
                entry = entry.with_ip(ip);
            }
            net.add_host(entry);
        }
        Ok(net)
    }
}

impl Default for NetworkSnapshot {
    /// Built-in demo network: three switches in a line, segments on
    /// both ends, one host behind s3.
    fn default() -> Self {
        Self {
            devices: vec![
                DeviceEntry {
                    id: "s1".into(),
                    segment: Some(1),
                    subnet: Some("10.0.1.0/24".parse().expect("valid prefix")),
                },
                DeviceEntry {
                    id: "s2".into(),
                    segment: None,
                    subnet: None,
                },
                DeviceEntry {
                    id: "s3".into(),
                    segment: Some(3),
                    subnet: Some("10.0.3.0/24".parse().expect("valid prefix")),
                },
            ],
            links: vec![
                LinkEntry {
                    src: "s1/2".into(),
                    dst: "s2/1".into(),
                },
                LinkEntry {
                    src: "s2/2".into(),
                    dst: "s3/1".into(),
                },
            ],
            hosts: vec![HostEntry {
                mac: "aa:00:00:00:03:09".into(),
                ips: vec![Ipv4Addr::new(10, 0, 3, 9)],
                location: "s3/4".into(),
            }],
        }
    }
}
