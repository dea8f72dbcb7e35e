//! Rule store facade

use crate::rule::{AppId, FlowRule, RuleKey, TableId};
use dashmap::DashMap;
use sr_common::DeviceId;
use tracing::debug;

/// Destination for synthesized rules
///
/// Implementations must be idempotent: applying an identical rule twice
/// is a no-op, removing an absent rule is a no-op. Entries are
/// deduplicated by [`FlowRule::key`] (app, device, table, priority,
/// selector).
pub trait RuleStore: Send + Sync {
    /// Install or replace a rule
    fn apply(&self, rule: FlowRule);
    /// Remove a rule if present
    fn remove(&self, rule: &FlowRule);
    /// Remove every rule owned by an application
    fn remove_app(&self, app: &AppId);
}

/// In-memory rule store used by tests and the snapshot inspector
#[derive(Debug, Default)]
pub struct MemoryRuleStore {
    rules: DashMap<RuleKey, FlowRule>,
}

impl MemoryRuleStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of installed rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether this exact rule (including treatment) is installed
    pub fn contains(&self, rule: &FlowRule) -> bool {
        self.rules
            .get(&rule.key())
            .map(|r| *r == *rule)
            .unwrap_or(false)
    }

    /// All installed rules, in key order
    pub fn rules(&self) -> Vec<FlowRule> {
        let mut rules: Vec<_> = self.rules.iter().map(|r| r.value().clone()).collect();
        rules.sort();
        rules
    }

    /// Installed rules on one device, in key order
    pub fn rules_for(&self, device: &DeviceId) -> Vec<FlowRule> {
        let mut rules: Vec<_> = self
            .rules
            .iter()
            .filter(|r| &r.value().device == device)
            .map(|r| r.value().clone())
            .collect();
        rules.sort();
        rules
    }

    /// Installed rules on one device and table
    pub fn table_rules(&self, device: &DeviceId, table: TableId) -> Vec<FlowRule> {
        self.rules_for(device)
            .into_iter()
            .filter(|r| r.table == table)
            .collect()
    }
}

impl RuleStore for MemoryRuleStore {
    fn apply(&self, rule: FlowRule) {
        debug!(rule = %rule, "apply");
        self.rules.insert(rule.key(), rule);
    }

    fn remove(&self, rule: &FlowRule) {
        debug!(rule = %rule, "remove");
        self.rules.remove(&rule.key());
    }

    fn remove_app(&self, app: &AppId) {
        let before = self.rules.len();
        self.rules.retain(|key, _| &key.app != app);
        debug!(app = %app, removed = before - self.rules.len(), "removed app rules");
    }
}
