//! End-to-end reconciliation scenarios on an in-memory network.

use ipnetwork::Ipv4Network;
use sr_common::{ConnectPoint, DeviceId, Host, MacAddr, SegmentConfig, VlanId};
use sr_engine::{ConfigEvent, HostEvent, MemoryNetwork, SegmentRoutingEngine};
use sr_pipeline::{Action, AppId, FlowRule, MemoryRuleStore, TableId, VlanMatch};
use std::sync::Arc;

fn vlan(id: u16) -> VlanId {
    VlanId::new(id).unwrap()
}

fn subnet(s: &str) -> Ipv4Network {
    s.parse().unwrap()
}

fn dev(s: &str) -> DeviceId {
    DeviceId::new(s)
}

fn mac(s: &str) -> MacAddr {
    s.parse().unwrap()
}

/// Three switches in a line: s1 p2 -- p1 s2 p2 -- p1 s3.
fn line3() -> Arc<MemoryNetwork> {
    let net = Arc::new(MemoryNetwork::new());
    net.connect(ConnectPoint::new("s1", 2), ConnectPoint::new("s2", 1));
    net.connect(ConnectPoint::new("s2", 2), ConnectPoint::new("s3", 1));
    net
}

fn engine_on(net: &Arc<MemoryNetwork>, store: &Arc<MemoryRuleStore>) -> SegmentRoutingEngine {
    SegmentRoutingEngine::new(
        AppId::new("org.opensr.app"),
        net.clone(),
        net.clone(),
        net.clone(),
        net.clone(),
        store.clone(),
    )
}

/// Install a config in the registry and replay the matching event.
fn configure(
    net: &MemoryNetwork,
    engine: &SegmentRoutingEngine,
    device: &str,
    segment: u16,
    prefix: Option<&str>,
) {
    let mut config = SegmentConfig::new(device, vlan(segment));
    if let Some(p) = prefix {
        config = config.with_subnet(subnet(p));
    }
    net.set_config(config.clone());
    engine.handle_config_event(ConfigEvent::Added {
        device: dev(device),
        config,
    });
}

fn output_port(rule: &FlowRule) -> Option<u32> {
    rule.treatment.actions.iter().find_map(|a| match a {
        Action::Output(p) => Some(p.value()),
        _ => None,
    })
}

fn pushes_tag(rule: &FlowRule, tag: u16) -> bool {
    rule.treatment
        .actions
        .contains(&Action::PushVlan(vlan(tag)))
}

fn mentions_segment(rule: &FlowRule, tag: u16) -> bool {
    rule.selector.vlan == Some(VlanMatch::Tag(vlan(tag))) || pushes_tag(rule, tag)
}

fn tag_rules(store: &MemoryRuleStore, device: &str, table: TableId, tag: u16) -> Vec<FlowRule> {
    store
        .table_rules(&dev(device), table)
        .into_iter()
        .filter(|r| r.selector.vlan == Some(VlanMatch::Tag(vlan(tag))))
        .collect()
}

#[test]
fn round_trip_config_add_and_remove() {
    let net = line3();
    let store = Arc::new(MemoryRuleStore::new());
    let engine = engine_on(&net, &store);
    engine.activate();

    configure(&net, &engine, "s1", 5, Some("10.0.1.0/24"));

    // Destination rule on s1: strip VLAN 5, deliver locally.
    let dest = tag_rules(&store, "s1", TableId::Classifier, 5);
    assert_eq!(dest.len(), 1);
    assert!(dest[0].treatment.actions.contains(&Action::PopVlan));

    // Every other switch tags 10.0.1.0/24 traffic with VLAN 5.
    for device in ["s2", "s3"] {
        let nonlocal: Vec<_> = store
            .table_rules(&dev(device), TableId::Classifier)
            .into_iter()
            .filter(|r| r.selector.ip_dst == Some(subnet("10.0.1.0/24")))
            .collect();
        assert_eq!(nonlocal.len(), 1, "expected one nonlocal rule on {device}");
        assert!(pushes_tag(&nonlocal[0], 5));
    }

    // Tree rules toward s1 on the other switches.
    assert_eq!(tag_rules(&store, "s2", TableId::Segment, 5).len(), 1);
    assert_eq!(tag_rules(&store, "s3", TableId::Segment, 5).len(), 1);

    let config = net.remove_config(&dev("s1")).unwrap();
    engine.handle_config_event(ConfigEvent::Removed {
        device: dev("s1"),
        config,
    });

    // Nothing referencing segment 5 or its subnet survives.
    for rule in store.rules() {
        assert!(!mentions_segment(&rule, 5), "stale rule: {rule}");
        assert_ne!(rule.selector.ip_dst, Some(subnet("10.0.1.0/24")));
    }
    assert!(engine.segment_table().is_empty());
    assert!(engine.subnet_table().is_empty());
}

#[test]
fn line_scenario_full_rebuild() {
    let net = line3();
    net.set_config(SegmentConfig::new("s1", vlan(1)).with_subnet(subnet("10.0.1.0/24")));
    net.set_config(SegmentConfig::new("s3", vlan(3)).with_subnet(subnet("10.0.3.0/24")));
    net.add_host(
        Host::new(mac("aa:00:00:00:03:09"))
            .with_ip("10.0.3.9".parse().unwrap())
            .with_location(ConnectPoint::new("s3", 4)),
    );

    let store = Arc::new(MemoryRuleStore::new());
    let engine = engine_on(&net, &store);
    engine.activate();

    // s2 forwards VLAN 1 toward s1 (its port 1) and VLAN 3 toward s3
    // (its port 2).
    let toward_s1 = tag_rules(&store, "s2", TableId::Segment, 1);
    assert_eq!(toward_s1.len(), 1);
    assert_eq!(output_port(&toward_s1[0]), Some(1));

    let toward_s3 = tag_rules(&store, "s2", TableId::Segment, 3);
    assert_eq!(toward_s3.len(), 1);
    assert_eq!(output_port(&toward_s3[0]), Some(2));

    // s1 tags traffic for s3's subnet with VLAN 3.
    let nonlocal: Vec<_> = store
        .table_rules(&dev("s1"), TableId::Classifier)
        .into_iter()
        .filter(|r| r.selector.ip_dst == Some(subnet("10.0.3.0/24")))
        .collect();
    assert_eq!(nonlocal.len(), 1);
    assert!(pushes_tag(&nonlocal[0], 3));

    // s3 delivers 10.0.3.9 out port 4.
    let delivery = store.table_rules(&dev("s3"), TableId::Host);
    assert_eq!(delivery.len(), 1);
    assert_eq!(delivery[0].selector.ip_dst, Some(subnet("10.0.3.9/32")));
    assert_eq!(output_port(&delivery[0]), Some(4));
}

#[test]
fn rebuild_twice_is_idempotent() {
    let net = line3();
    net.set_config(SegmentConfig::new("s1", vlan(1)).with_subnet(subnet("10.0.1.0/24")));
    net.set_config(SegmentConfig::new("s3", vlan(3)).with_subnet(subnet("10.0.3.0/24")));
    net.add_host(
        Host::new(mac("aa:00:00:00:03:09"))
            .with_ip("10.0.3.9".parse().unwrap())
            .with_location(ConnectPoint::new("s3", 4)),
    );

    let store = Arc::new(MemoryRuleStore::new());
    let engine = engine_on(&net, &store);
    engine.activate();

    let first = store.rules();
    engine.rebuild();
    assert_eq!(store.rules(), first);
}

#[test]
fn incremental_events_converge_to_rebuild() {
    let net = line3();
    let store = Arc::new(MemoryRuleStore::new());
    let engine = engine_on(&net, &store);
    engine.activate();

    configure(&net, &engine, "s1", 1, Some("10.0.1.0/24"));
    configure(&net, &engine, "s3", 3, Some("10.0.3.0/24"));

    let host = Host::new(mac("aa:00:00:00:03:09"))
        .with_ip("10.0.3.9".parse().unwrap())
        .with_location(ConnectPoint::new("s3", 4));
    net.add_host(host.clone());
    engine.handle_host_event(HostEvent::Added(host.clone()));

    // Renumber s1's segment, then give it a different subnet.
    let updated = SegmentConfig::new("s1", vlan(7)).with_subnet(subnet("10.0.1.0/24"));
    let previous = net.set_config(updated.clone()).unwrap();
    engine.handle_config_event(ConfigEvent::Updated {
        device: dev("s1"),
        config: updated.clone(),
        previous,
    });

    let resubnetted = SegmentConfig::new("s1", vlan(7)).with_subnet(subnet("10.0.9.0/24"));
    let previous = net.set_config(resubnetted.clone()).unwrap();
    engine.handle_config_event(ConfigEvent::Updated {
        device: dev("s1"),
        config: resubnetted,
        previous,
    });

    // Move the host one switch over.
    let moved = Host::new(mac("aa:00:00:00:03:09"))
        .with_ip("10.0.3.9".parse().unwrap())
        .with_location(ConnectPoint::new("s2", 3));
    net.add_host(moved.clone());
    engine.handle_host_event(HostEvent::Moved {
        host: moved,
        previous: host,
    });

    // A fresh engine rebuilt from the final snapshot must agree on
    // tables and on the full installed rule set.
    let fresh_store = Arc::new(MemoryRuleStore::new());
    let fresh = engine_on(&net, &fresh_store);
    fresh.activate();

    assert_eq!(engine.segment_table(), fresh.segment_table());
    assert_eq!(engine.subnet_table(), fresh.subnet_table());
    assert_eq!(store.rules(), fresh_store.rules());
}

#[test]
fn host_move_only_touches_delivery_rules() {
    let net = line3();
    net.set_config(SegmentConfig::new("s1", vlan(1)).with_subnet(subnet("10.0.1.0/24")));
    net.set_config(SegmentConfig::new("s2", vlan(2)).with_subnet(subnet("10.0.2.0/24")));
    net.set_config(SegmentConfig::new("s3", vlan(3)).with_subnet(subnet("10.0.3.0/24")));

    let at_s3 = Host::new(mac("aa:00:00:00:00:99"))
        .with_ip("10.0.2.9".parse().unwrap())
        .with_ip("10.0.3.9".parse().unwrap())
        .with_location(ConnectPoint::new("s3", 4));
    net.add_host(at_s3.clone());

    let store = Arc::new(MemoryRuleStore::new());
    let engine = engine_on(&net, &store);
    engine.activate();

    assert_eq!(store.table_rules(&dev("s3"), TableId::Host).len(), 1);

    let others_before: Vec<_> = store
        .rules()
        .into_iter()
        .filter(|r| r.table != TableId::Host)
        .collect();

    let at_s2 = Host::new(mac("aa:00:00:00:00:99"))
        .with_ip("10.0.2.9".parse().unwrap())
        .with_ip("10.0.3.9".parse().unwrap())
        .with_location(ConnectPoint::new("s2", 3));
    net.add_host(at_s2.clone());
    engine.handle_host_event(HostEvent::Moved {
        host: at_s2,
        previous: at_s3,
    });

    // Old delivery rule gone, new one present with the new port.
    assert!(store.table_rules(&dev("s3"), TableId::Host).is_empty());
    let delivery = store.table_rules(&dev("s2"), TableId::Host);
    assert_eq!(delivery.len(), 1);
    assert_eq!(delivery[0].selector.ip_dst, Some(subnet("10.0.2.9/32")));
    assert_eq!(output_port(&delivery[0]), Some(3));

    // Stage 0/1 state untouched.
    let others_after: Vec<_> = store
        .rules()
        .into_iter()
        .filter(|r| r.table != TableId::Host)
        .collect();
    assert_eq!(others_before, others_after);
}

#[test]
fn segment_renumber_replaces_old_tag_everywhere() {
    let net = line3();
    let store = Arc::new(MemoryRuleStore::new());
    let engine = engine_on(&net, &store);
    engine.activate();

    configure(&net, &engine, "s1", 1, Some("10.0.1.0/24"));
    configure(&net, &engine, "s3", 3, Some("10.0.3.0/24"));

    let seg3_before: Vec<_> = store
        .rules()
        .into_iter()
        .filter(|r| mentions_segment(r, 3))
        .collect();

    let updated = SegmentConfig::new("s1", vlan(7)).with_subnet(subnet("10.0.1.0/24"));
    let previous = net.set_config(updated.clone()).unwrap();
    engine.handle_config_event(ConfigEvent::Updated {
        device: dev("s1"),
        config: updated,
        previous,
    });

    // VLAN 1 is gone from every table on every switch.
    for rule in store.rules() {
        assert!(!mentions_segment(&rule, 1), "stale rule: {rule}");
    }

    // The new tag took its place: tree rules and the destination rule.
    assert_eq!(tag_rules(&store, "s2", TableId::Segment, 7).len(), 1);
    assert_eq!(tag_rules(&store, "s3", TableId::Segment, 7).len(), 1);
    assert_eq!(tag_rules(&store, "s1", TableId::Classifier, 7).len(), 1);

    // Fleet-wide nonlocal rules for s1's subnet now push VLAN 7.
    for device in ["s2", "s3"] {
        let nonlocal: Vec<_> = store
            .table_rules(&dev(device), TableId::Classifier)
            .into_iter()
            .filter(|r| r.selector.ip_dst == Some(subnet("10.0.1.0/24")))
            .collect();
        assert_eq!(nonlocal.len(), 1);
        assert!(pushes_tag(&nonlocal[0], 7));
    }

    // Segment 3 was never disturbed.
    let seg3_after: Vec<_> = store
        .rules()
        .into_iter()
        .filter(|r| mentions_segment(r, 3))
        .collect();
    assert_eq!(seg3_before, seg3_after);
}

#[test]
fn subnet_change_refreshes_nonlocal_and_delivery_rules() {
    let net = line3();
    net.set_config(SegmentConfig::new("s1", vlan(1)).with_subnet(subnet("10.0.1.0/24")));
    net.add_host(
        Host::new(mac("aa:00:00:00:01:05"))
            .with_ip("10.0.1.5".parse().unwrap())
            .with_location(ConnectPoint::new("s1", 3)),
    );

    let store = Arc::new(MemoryRuleStore::new());
    let engine = engine_on(&net, &store);
    engine.activate();
    assert_eq!(store.table_rules(&dev("s1"), TableId::Host).len(), 1);

    let updated = SegmentConfig::new("s1", vlan(1)).with_subnet(subnet("10.0.9.0/24"));
    let previous = net.set_config(updated.clone()).unwrap();
    engine.handle_config_event(ConfigEvent::Updated {
        device: dev("s1"),
        config: updated,
        previous,
    });

    // No rule references the old subnet; the nonlocal rules moved to
    // the new prefix, and the host (outside it) lost its delivery rule.
    for rule in store.rules() {
        assert_ne!(rule.selector.ip_dst, Some(subnet("10.0.1.0/24")));
        assert_ne!(rule.selector.ip_dst, Some(subnet("10.0.1.5/32")));
    }
    for device in ["s2", "s3"] {
        let nonlocal: Vec<_> = store
            .table_rules(&dev(device), TableId::Classifier)
            .into_iter()
            .filter(|r| r.selector.ip_dst == Some(subnet("10.0.9.0/24")))
            .collect();
        assert_eq!(nonlocal.len(), 1);
    }
    assert!(store.table_rules(&dev("s1"), TableId::Host).is_empty());
}

#[test]
fn non_switch_subject_is_ignored() {
    let net = line3();
    let store = Arc::new(MemoryRuleStore::new());
    let engine = engine_on(&net, &store);
    engine.activate();
    let before = store.rules();

    engine.handle_config_event(ConfigEvent::Added {
        device: dev("not-a-switch"),
        config: SegmentConfig::new("not-a-switch", vlan(9)),
    });

    assert_eq!(store.rules(), before);
    assert!(engine.segment_table().is_empty());
}

#[test]
fn duplicate_removal_is_skipped_not_fatal() {
    let net = line3();
    let store = Arc::new(MemoryRuleStore::new());
    let engine = engine_on(&net, &store);
    engine.activate();

    configure(&net, &engine, "s1", 5, Some("10.0.1.0/24"));
    let config = net.remove_config(&dev("s1")).unwrap();
    engine.handle_config_event(ConfigEvent::Removed {
        device: dev("s1"),
        config: config.clone(),
    });
    let after_first = store.rules();

    // Replaying the removal finds no table entries; it must log and
    // leave the installed state alone.
    engine.handle_config_event(ConfigEvent::Removed {
        device: dev("s1"),
        config,
    });
    assert_eq!(store.rules(), after_first);
}

#[test]
fn host_on_unconfigured_device_gets_no_rules() {
    let net = line3();
    let store = Arc::new(MemoryRuleStore::new());
    let engine = engine_on(&net, &store);
    engine.activate();

    let host = Host::new(mac("aa:00:00:00:00:01"))
        .with_ip("10.0.2.1".parse().unwrap())
        .with_location(ConnectPoint::new("s2", 5));
    net.add_host(host.clone());
    engine.handle_host_event(HostEvent::Added(host));

    assert!(store.table_rules(&dev("s2"), TableId::Host).is_empty());
}
