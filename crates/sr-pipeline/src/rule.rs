//! Match/action rule model

use ipnetwork::Ipv4Network;
use serde::{Deserialize, Serialize};
use sr_common::{DeviceId, PortNumber, VlanId};
use std::fmt;

/// Pipeline table a rule is installed into
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TableId {
    /// Stage 0: classify and tag
    Classifier,
    /// Stage 1: segment-tree forwarding
    Segment,
    /// Stage 2: host delivery
    Host,
}

impl TableId {
    /// Numeric table id on the switch
    pub const fn id(self) -> u8 {
        match self {
            TableId::Classifier => 0,
            TableId::Segment => 1,
            TableId::Host => 2,
        }
    }
}

/// Fixed per-class priorities
///
/// All classifier rules share a 2000 base; within the stage the class
/// offsets order them destination > local > nonlocal > catch-all.
pub mod priority {
    /// Common base for every rule class
    pub const BASE: u16 = 2000;
    /// Stage 0: tag matches this device's own segment
    pub const DESTINATION: u16 = BASE + 15;
    /// Stage 0: untagged, destination in the local subnet
    pub const LOCAL: u16 = BASE + 10;
    /// Stage 0: untagged, destination in a remote subnet
    pub const NONLOCAL: u16 = BASE + 5;
    /// Stage 0: any tagged packet still in flight
    pub const CATCH_ALL: u16 = BASE;
    /// Stage 1: segment-tree forwarding
    pub const SEGMENT: u16 = BASE;
    /// Stage 2: host delivery
    pub const HOST: u16 = BASE;
}

/// VLAN tag criterion
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum VlanMatch {
    /// Packet must be untagged
    Untagged,
    /// Packet must carry some tag, any value
    Any,
    /// Packet must carry exactly this tag
    Tag(VlanId),
}

/// Traffic selector: the match side of a rule
#[derive(
    Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Selector {
    /// VLAN tag criterion, if any
    pub vlan: Option<VlanMatch>,
    /// Match IPv4 ethertype
    pub ipv4: bool,
    /// Destination prefix criterion (a /32 for host rules)
    pub ip_dst: Option<Ipv4Network>,
}

impl Selector {
    /// Selector matching a VLAN criterion only
    pub fn vlan(vlan: VlanMatch) -> Self {
        Self {
            vlan: Some(vlan),
            ..Self::default()
        }
    }

    /// Selector matching untagged IPv4 traffic toward a prefix
    pub fn untagged_ipv4(dst: Ipv4Network) -> Self {
        Self {
            vlan: Some(VlanMatch::Untagged),
            ipv4: true,
            ip_dst: Some(dst),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        match self.vlan {
            Some(VlanMatch::Untagged) => parts.push("vlan=none".into()),
            Some(VlanMatch::Any) => parts.push("vlan=any".into()),
            Some(VlanMatch::Tag(id)) => parts.push(format!("vlan={id}")),
            None => {}
        }
        if self.ipv4 {
            parts.push("eth=ipv4".into());
        }
        if let Some(dst) = self.ip_dst {
            parts.push(format!("ip_dst={dst}"));
        }
        if parts.is_empty() {
            f.write_str("*")
        } else {
            f.write_str(&parts.join(", "))
        }
    }
}

/// Single packet treatment step
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Push a VLAN header carrying this tag
    PushVlan(VlanId),
    /// Strip the outer VLAN header
    PopVlan,
    /// Emit the packet on a port
    Output(PortNumber),
    /// Continue matching in another table
    Goto(TableId),
}

/// Ordered treatment applied on match
#[derive(
    Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Treatment {
    /// Steps applied in order
    pub actions: Vec<Action>,
}

impl Treatment {
    /// Build a treatment from steps
    pub fn of(actions: impl Into<Vec<Action>>) -> Self {
        Self {
            actions: actions.into(),
        }
    }
}

impl fmt::Display for Treatment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, action) in self.actions.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match action {
                Action::PushVlan(id) => write!(f, "push_vlan({id})")?,
                Action::PopVlan => f.write_str("pop_vlan")?,
                Action::Output(port) => write!(f, "output({port})")?,
                Action::Goto(table) => write!(f, "goto({})", table.id())?,
            }
        }
        Ok(())
    }
}

/// Rule lifetime
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Lifetime {
    /// Installed until explicitly removed
    Permanent,
    /// Expires after this many seconds
    Temporary(u32),
}

/// Identity of the application owning a set of rules
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppId(String);

impl AppId {
    /// Create an application id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Declarative match/action rule, the unit exchanged with the rule store
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlowRule {
    /// Switch the rule is installed on
    pub device: DeviceId,
    /// Pipeline table
    pub table: TableId,
    /// Priority within the table
    pub priority: u16,
    /// Match side
    pub selector: Selector,
    /// Action side
    pub treatment: Treatment,
    /// Owning application
    pub app: AppId,
    /// Lifetime
    pub lifetime: Lifetime,
}

impl FlowRule {
    /// Store deduplication key: (app, device, table, priority, selector)
    ///
    /// Reapplying a rule with the same key replaces the previous entry,
    /// so apply/remove are idempotent per key. Priority is part of the
    /// key: a device's local and nonlocal rules for its own subnet share
    /// a selector and coexist at different priorities.
    pub fn key(&self) -> RuleKey {
        RuleKey {
            app: self.app.clone(),
            device: self.device.clone(),
            table: self.table,
            priority: self.priority,
            selector: self.selector.clone(),
        }
    }
}

impl fmt::Display for FlowRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} t{} p{}] {} => {}",
            self.device,
            self.table.id(),
            self.priority,
            self.selector,
            self.treatment
        )
    }
}

/// Deduplication key for installed rules
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleKey {
    /// Owning application
    pub app: AppId,
    /// Switch
    pub device: DeviceId,
    /// Pipeline table
    pub table: TableId,
    /// Priority within the table
    pub priority: u16,
    /// Match side
    pub selector: Selector,
}
