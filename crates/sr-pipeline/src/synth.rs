//! Pipeline rule synthesizer
//!
//! Pure derivation of concrete rules from segment/subnet state and a
//! shortest-path tree. Nothing here talks to a store; the engine owns
//! the apply/remove sequencing.

use crate::rule::{
    priority, Action, AppId, FlowRule, Lifetime, Selector, TableId, Treatment, VlanMatch,
};
use ipnetwork::Ipv4Network;
use sr_common::{ConnectPoint, DeviceId, VlanId};
use sr_topology::Link;
use std::net::Ipv4Addr;

/// Builds the rules for all three pipeline stages on behalf of one
/// owning application
#[derive(Debug, Clone)]
pub struct RuleSynthesizer {
    app: AppId,
}

impl RuleSynthesizer {
    /// Create a synthesizer owned by `app`
    pub fn new(app: AppId) -> Self {
        Self { app }
    }

    /// Owning application id
    pub fn app(&self) -> &AppId {
        &self.app
    }

    fn rule(
        &self,
        device: DeviceId,
        table: TableId,
        priority: u16,
        selector: Selector,
        treatment: Treatment,
    ) -> FlowRule {
        FlowRule {
            device,
            table,
            priority,
            selector,
            treatment,
            app: self.app.clone(),
            lifetime: Lifetime::Permanent,
        }
    }

    /// Stage 0 destination rule: the tag names this device's own
    /// segment, so strip it and deliver locally.
    pub fn destination_rule(&self, device: &DeviceId, segment: VlanId) -> FlowRule {
        self.rule(
            device.clone(),
            TableId::Classifier,
            priority::DESTINATION,
            Selector::vlan(VlanMatch::Tag(segment)),
            Treatment::of([Action::PopVlan, Action::Goto(TableId::Host)]),
        )
    }

    /// Stage 0 local-subnet rule: untagged traffic for a destination
    /// already attached here skips segment traversal.
    pub fn local_subnet_rule(&self, device: &DeviceId, subnet: Ipv4Network) -> FlowRule {
        self.rule(
            device.clone(),
            TableId::Classifier,
            priority::LOCAL,
            Selector::untagged_ipv4(subnet),
            Treatment::of([Action::Goto(TableId::Host)]),
        )
    }

    /// Stage 0 nonlocal rule: untagged traffic for a remote subnet gets
    /// tagged with the owning segment and sent toward its root.
    pub fn nonlocal_subnet_rule(
        &self,
        device: &DeviceId,
        subnet: Ipv4Network,
        segment: VlanId,
    ) -> FlowRule {
        self.rule(
            device.clone(),
            TableId::Classifier,
            priority::NONLOCAL,
            Selector::untagged_ipv4(subnet),
            Treatment::of([Action::PushVlan(segment), Action::Goto(TableId::Segment)]),
        )
    }

    /// Stage 0 catch-all: any tagged packet still in flight toward some
    /// other segment's root.
    pub fn catch_all_rule(&self, device: &DeviceId) -> FlowRule {
        self.rule(
            device.clone(),
            TableId::Classifier,
            priority::CATCH_ALL,
            Selector::vlan(VlanMatch::Any),
            Treatment::of([Action::Goto(TableId::Segment)]),
        )
    }

    /// Stage 1 hop rule on the tree link's source device: tagged
    /// traffic for `segment` leaves out the port facing the root.
    pub fn segment_hop_rule(&self, link: &Link, segment: VlanId) -> FlowRule {
        self.rule(
            link.src.device.clone(),
            TableId::Segment,
            priority::SEGMENT,
            Selector::vlan(VlanMatch::Tag(segment)),
            Treatment::of([Action::Output(link.src.port)]),
        )
    }

    /// Stage 1 rules for an entire shortest-path tree
    pub fn tree_rules(&self, tree: &[Link], segment: VlanId) -> Vec<FlowRule> {
        tree.iter()
            .map(|link| self.segment_hop_rule(link, segment))
            .collect()
    }

    /// Stage 2 host delivery rule: exact destination address out the
    /// host's attachment port.
    pub fn host_rule(&self, location: &ConnectPoint, ip: Ipv4Addr) -> FlowRule {
        self.rule(
            location.device.clone(),
            TableId::Host,
            priority::HOST,
            Selector::untagged_ipv4(Ipv4Network::from(ip)),
            Treatment::of([Action::Output(location.port)]),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synth() -> RuleSynthesizer {
        RuleSynthesizer::new(AppId::new("opensr.test"))
    }

    fn vlan(id: u16) -> VlanId {
        VlanId::new(id).unwrap()
    }

    #[test]
    fn test_destination_rule_pops_and_delivers() {
        let rule = synth().destination_rule(&DeviceId::new("s1"), vlan(5));
        assert_eq!(rule.table, TableId::Classifier);
        assert_eq!(rule.priority, priority::DESTINATION);
        assert_eq!(rule.selector.vlan, Some(VlanMatch::Tag(vlan(5))));
        assert_eq!(
            rule.treatment.actions,
            vec![Action::PopVlan, Action::Goto(TableId::Host)]
        );
    }

    #[test]
    fn test_nonlocal_rule_tags_and_forwards() {
        let subnet: Ipv4Network = "10.0.1.0/24".parse().unwrap();
        let rule = synth().nonlocal_subnet_rule(&DeviceId::new("s2"), subnet, vlan(5));
        assert_eq!(rule.selector.vlan, Some(VlanMatch::Untagged));
        assert!(rule.selector.ipv4);
        assert_eq!(rule.selector.ip_dst, Some(subnet));
        assert_eq!(
            rule.treatment.actions,
            vec![
                Action::PushVlan(vlan(5)),
                Action::Goto(TableId::Segment)
            ]
        );
    }

    #[test]
    fn test_segment_hop_rule_lands_on_link_source() {
        let link = Link::new(ConnectPoint::new("s2", 1), ConnectPoint::new("s1", 2));
        let rule = synth().segment_hop_rule(&link, vlan(3));
        assert_eq!(rule.device, DeviceId::new("s2"));
        assert_eq!(rule.table, TableId::Segment);
        assert_eq!(
            rule.treatment.actions,
            vec![Action::Output(link.src.port)]
        );
    }

    #[test]
    fn test_host_rule_matches_exact_address() {
        let location = ConnectPoint::new("s3", 4);
        let rule = synth().host_rule(&location, "10.0.3.9".parse().unwrap());
        assert_eq!(rule.table, TableId::Host);
        let dst = rule.selector.ip_dst.unwrap();
        assert_eq!(dst.prefix(), 32);
        assert_eq!(dst.ip(), "10.0.3.9".parse::<Ipv4Addr>().unwrap());
    }
}
