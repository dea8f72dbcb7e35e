//! Reconciliation engine
//!
//! Owns the segment and subnet tables and translates configuration and
//! host events into minimal rule deltas against the store. Every
//! handler computes its delta under the table lock, then issues the
//! idempotent apply/remove calls after the lock is released.

use crate::events::{ConfigEvent, HostEvent};
use crate::services::{ConfigRegistry, DeviceInventory, HostService, TopologyService};
use ipnetwork::Ipv4Network;
use parking_lot::Mutex;
use sr_common::{DeviceId, Host, SegmentConfig, VlanId};
use sr_pipeline::{AppId, FlowRule, RuleStore, RuleSynthesizer};
use sr_topology::spt;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One half of a computed delta
enum RuleOp {
    Apply(FlowRule),
    Remove(FlowRule),
}

/// Shared mutable state guarded by the engine lock
#[derive(Debug, Default)]
struct Tables {
    /// segment id -> owning switch
    segments: HashMap<VlanId, DeviceId>,
    /// subnet -> owning segment id
    subnets: HashMap<Ipv4Network, VlanId>,
}

/// The segment routing reconciliation engine
///
/// One instance per controlling application. Handlers are safe to call
/// from any thread; the internal lock serializes table access and delta
/// computation. For fully ordered processing of the collaborator event
/// streams, drive the engine through [`crate::actor::run`].
pub struct SegmentRoutingEngine {
    synth: RuleSynthesizer,
    configs: Arc<dyn ConfigRegistry>,
    inventory: Arc<dyn DeviceInventory>,
    topology: Arc<dyn TopologyService>,
    hosts: Arc<dyn HostService>,
    store: Arc<dyn RuleStore>,
    tables: Mutex<Tables>,
}

impl SegmentRoutingEngine {
    /// Create an engine bound to its collaborators and rule store
    pub fn new(
        app: AppId,
        configs: Arc<dyn ConfigRegistry>,
        inventory: Arc<dyn DeviceInventory>,
        topology: Arc<dyn TopologyService>,
        hosts: Arc<dyn HostService>,
        store: Arc<dyn RuleStore>,
    ) -> Self {
        Self {
            synth: RuleSynthesizer::new(app),
            configs,
            inventory,
            topology,
            hosts,
            store,
            tables: Mutex::new(Tables::default()),
        }
    }

    /// Start reconciliation: build tables and rules from scratch
    pub fn activate(&self) {
        info!(app = %self.synth.app(), "starting segment routing reconciliation");
        self.rebuild();
    }

    /// Stop reconciliation and release every owned rule
    pub fn deactivate(&self) {
        let mut tables = self.tables.lock();
        tables.segments.clear();
        tables.subnets.clear();
        self.store.remove_app(self.synth.app());
        info!(app = %self.synth.app(), "stopped; released all owned rules");
    }

    /// Full teardown and resynthesis from the current collaborator
    /// snapshots. Idempotent; safe to invoke at any time as the
    /// recovery path for drift between installed rules and the tables.
    pub fn rebuild(&self) {
        info!("full pipeline rebuild");
        let mut ops = Vec::new();
        {
            let mut tables = self.tables.lock();
            tables.segments.clear();
            tables.subnets.clear();
            self.store.remove_app(self.synth.app());

            let switches = self.inventory.switches();
            for device in &switches {
                if let Some(cfg) = self.configs.config(device) {
                    tables.segments.insert(cfg.segment, device.clone());
                    if let Some(subnet) = cfg.subnet {
                        tables.subnets.insert(subnet, cfg.segment);
                    }
                }
            }

            for device in &switches {
                // Transit switches keep a catch-all so tagged traffic
                // reaches the segment table even without a local config.
                ops.push(RuleOp::Apply(self.synth.catch_all_rule(device)));
                if let Some(cfg) = self.configs.config(device) {
                    ops.extend(
                        self.tree_rules(device, cfg.segment)
                            .into_iter()
                            .map(RuleOp::Apply),
                    );
                    ops.push(RuleOp::Apply(self.synth.destination_rule(device, cfg.segment)));
                    if let Some(subnet) = cfg.subnet {
                        ops.push(RuleOp::Apply(self.synth.local_subnet_rule(device, subnet)));
                    }
                }
            }

            for (subnet, segment) in &tables.subnets {
                ops.extend(
                    self.nonlocal_rules(*subnet, *segment)
                        .into_iter()
                        .map(RuleOp::Apply),
                );
            }

            for host in self.hosts.hosts() {
                ops.extend(self.host_rules(&host).into_iter().map(RuleOp::Apply));
            }
        }
        self.commit(ops);
    }

    /// React to a configuration registry event
    pub fn handle_config_event(&self, event: ConfigEvent) {
        let device = event.device().clone();
        if !self.inventory.is_switch(&device) {
            warn!(device = %device, "config event subject is not a switch; ignoring");
            return;
        }

        let mut ops = Vec::new();
        {
            let mut tables = self.tables.lock();
            match event {
                ConfigEvent::Added { config, .. } => {
                    info!(device = %device, segment = %config.segment, subnet = ?config.subnet,
                        "segment config added");
                    self.config_added(&mut tables, &config, &mut ops);
                }
                ConfigEvent::Updated { config, previous, .. } => {
                    info!(device = %device,
                        segment_old = %previous.segment, segment_new = %config.segment,
                        subnet_old = ?previous.subnet, subnet_new = ?config.subnet,
                        "segment config updated");
                    self.config_updated(&mut tables, &previous, &config, &mut ops);
                }
                ConfigEvent::Removed { config, .. } => {
                    info!(device = %device, segment = %config.segment, subnet = ?config.subnet,
                        "segment config removed");
                    self.config_removed(&mut tables, &config, &mut ops);
                }
            }
        }
        self.commit(ops);
    }

    /// React to a host tracking event
    pub fn handle_host_event(&self, event: HostEvent) {
        // Host deltas only read the config registry, but they still
        // serialize against config handling through the same lock.
        let guard = self.tables.lock();
        let mut ops = Vec::new();
        match event {
            HostEvent::Added(host) => {
                info!(host = %host.mac, ips = ?host.ips, "host added");
                ops.extend(self.host_rules(&host).into_iter().map(RuleOp::Apply));
            }
            HostEvent::Removed(host) => {
                info!(host = %host.mac, ips = ?host.ips, "host removed");
                ops.extend(self.host_rules(&host).into_iter().map(RuleOp::Remove));
            }
            HostEvent::Moved { host, previous } => {
                info!(host = %host.mac, from = ?previous.locations, to = ?host.locations,
                    "host moved");
                ops.extend(self.host_rules(&previous).into_iter().map(RuleOp::Remove));
                ops.extend(self.host_rules(&host).into_iter().map(RuleOp::Apply));
            }
        }
        drop(guard);
        self.commit(ops);
    }

    /// Snapshot of the segment table (segment id -> owning switch)
    pub fn segment_table(&self) -> HashMap<VlanId, DeviceId> {
        self.tables.lock().segments.clone()
    }

    /// Snapshot of the subnet table (subnet -> owning segment id)
    pub fn subnet_table(&self) -> HashMap<Ipv4Network, VlanId> {
        self.tables.lock().subnets.clone()
    }

    fn config_added(&self, tables: &mut Tables, config: &SegmentConfig, ops: &mut Vec<RuleOp>) {
        tables.segments.insert(config.segment, config.device.clone());

        ops.extend(
            self.tree_rules(&config.device, config.segment)
                .into_iter()
                .map(RuleOp::Apply),
        );
        ops.push(RuleOp::Apply(self.synth.catch_all_rule(&config.device)));
        ops.push(RuleOp::Apply(
            self.synth.destination_rule(&config.device, config.segment),
        ));

        if let Some(subnet) = config.subnet {
            tables.subnets.insert(subnet, config.segment);
            ops.push(RuleOp::Apply(
                self.synth.local_subnet_rule(&config.device, subnet),
            ));
            ops.extend(
                self.nonlocal_rules(subnet, config.segment)
                    .into_iter()
                    .map(RuleOp::Apply),
            );
            ops.extend(
                self.attached_host_rules(&config.device, subnet)
                    .into_iter()
                    .map(RuleOp::Apply),
            );
        }
    }

    fn config_removed(&self, tables: &mut Tables, config: &SegmentConfig, ops: &mut Vec<RuleOp>) {
        match tables.segments.get(&config.segment) {
            Some(owner) if *owner == config.device => {
                tables.segments.remove(&config.segment);
                ops.extend(
                    self.tree_rules(&config.device, config.segment)
                        .into_iter()
                        .map(RuleOp::Remove),
                );
                ops.push(RuleOp::Remove(
                    self.synth.destination_rule(&config.device, config.segment),
                ));
            }
            _ => {
                warn!(device = %config.device, segment = %config.segment,
                    "segment table entry missing during removal; skipping");
            }
        }
        // The catch-all stays installed: an unconfigured switch may
        // still carry transit traffic for other segments.

        if let Some(subnet) = config.subnet {
            match tables.subnets.remove(&subnet) {
                Some(segment) => {
                    ops.extend(
                        self.nonlocal_rules(subnet, segment)
                            .into_iter()
                            .map(RuleOp::Remove),
                    );
                    ops.push(RuleOp::Remove(
                        self.synth.local_subnet_rule(&config.device, subnet),
                    ));
                    ops.extend(
                        self.attached_host_rules(&config.device, subnet)
                            .into_iter()
                            .map(RuleOp::Remove),
                    );
                }
                None => {
                    warn!(device = %config.device, subnet = %subnet,
                        "subnet table entry missing during removal; skipping");
                }
            }
        }
    }

    fn config_updated(
        &self,
        tables: &mut Tables,
        previous: &SegmentConfig,
        config: &SegmentConfig,
        ops: &mut Vec<RuleOp>,
    ) {
        let device = &config.device;
        let segment_changed = previous.segment != config.segment;
        let subnet_changed = previous.subnet != config.subnet;

        if segment_changed {
            if tables.segments.remove(&previous.segment).is_none() {
                warn!(device = %device, segment = %previous.segment,
                    "previous segment missing from table during update");
            }
            ops.extend(
                self.tree_rules(device, previous.segment)
                    .into_iter()
                    .map(RuleOp::Remove),
            );
            ops.push(RuleOp::Remove(
                self.synth.destination_rule(device, previous.segment),
            ));

            tables.segments.insert(config.segment, device.clone());
            ops.extend(
                self.tree_rules(device, config.segment)
                    .into_iter()
                    .map(RuleOp::Apply),
            );
            ops.push(RuleOp::Apply(
                self.synth.destination_rule(device, config.segment),
            ));
        }

        if subnet_changed {
            if let Some(old) = previous.subnet {
                match tables.subnets.remove(&old) {
                    Some(old_segment) => {
                        ops.extend(
                            self.nonlocal_rules(old, old_segment)
                                .into_iter()
                                .map(RuleOp::Remove),
                        );
                        ops.push(RuleOp::Remove(self.synth.local_subnet_rule(device, old)));
                        ops.extend(
                            self.attached_host_rules(device, old)
                                .into_iter()
                                .map(RuleOp::Remove),
                        );
                    }
                    None => {
                        warn!(device = %device, subnet = %old,
                            "previous subnet missing from table during update");
                    }
                }
            }
            if let Some(new) = config.subnet {
                tables.subnets.insert(new, config.segment);
                ops.push(RuleOp::Apply(self.synth.local_subnet_rule(device, new)));
                ops.extend(
                    self.nonlocal_rules(new, config.segment)
                        .into_iter()
                        .map(RuleOp::Apply),
                );
                ops.extend(
                    self.attached_host_rules(device, new)
                        .into_iter()
                        .map(RuleOp::Apply),
                );
            }
        } else if segment_changed {
            // Subnet unchanged but its owning segment was renumbered:
            // the fleet-wide nonlocal rules must push the new tag.
            if let Some(subnet) = config.subnet {
                tables.subnets.insert(subnet, config.segment);
                ops.extend(
                    self.nonlocal_rules(subnet, config.segment)
                        .into_iter()
                        .map(RuleOp::Apply),
                );
            }
        }
    }

    /// Stage 1 rules for the shortest-path tree rooted at `root`
    fn tree_rules(&self, root: &DeviceId, segment: VlanId) -> Vec<FlowRule> {
        let graph = self.topology.current_graph();
        let tree = spt::build(&graph, root);
        if tree.is_empty() {
            debug!(root = %root, segment = %segment,
                "no path to segment root; no tree rules synthesized");
        }
        self.synth.tree_rules(&tree, segment)
    }

    /// Stage 0 nonlocal rules for one subnet on every known switch
    fn nonlocal_rules(&self, subnet: Ipv4Network, segment: VlanId) -> Vec<FlowRule> {
        self.inventory
            .switches()
            .iter()
            .map(|device| self.synth.nonlocal_subnet_rule(device, subnet, segment))
            .collect()
    }

    /// Stage 2 rules for hosts currently attached to `device` whose
    /// addresses fall inside `subnet`
    fn attached_host_rules(&self, device: &DeviceId, subnet: Ipv4Network) -> Vec<FlowRule> {
        let mut rules = Vec::new();
        for host in self.hosts.hosts_attached_to(device) {
            for location in host.locations.iter().filter(|l| &l.device == device) {
                for ip in &host.ips {
                    if subnet.contains(*ip) {
                        rules.push(self.synth.host_rule(location, *ip));
                    }
                }
            }
        }
        rules
    }

    /// Stage 2 rules for one host across all of its attachment points
    fn host_rules(&self, host: &Host) -> Vec<FlowRule> {
        let mut rules = Vec::new();
        for location in &host.locations {
            let Some(cfg) = self.configs.config(&location.device) else {
                debug!(device = %location.device, host = %host.mac,
                    "attachment device has no segment config; no delivery rule");
                continue;
            };
            let Some(subnet) = cfg.subnet else {
                continue;
            };
            for ip in &host.ips {
                if subnet.contains(*ip) {
                    rules.push(self.synth.host_rule(location, *ip));
                }
            }
        }
        rules
    }

    /// Issue an already computed delta; the store is idempotent, so
    /// this runs without the table lock.
    fn commit(&self, ops: Vec<RuleOp>) {
        for op in ops {
            match op {
                RuleOp::Apply(rule) => self.store.apply(rule),
                RuleOp::Remove(rule) => self.store.remove(&rule),
            }
        }
    }
}
