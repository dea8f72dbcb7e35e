//! Reverse shortest-path-tree computation
//!
//! Breadth-first traversal from a root device over *incoming* edges:
//! each discovered link tells its source device which port leads back
//! toward the root in minimum hop count. Ties between equal-cost paths
//! fall to link enumeration order; callers must not depend on which
//! equal-cost link wins.

use crate::graph::{Link, TopologyGraph};
use sr_common::DeviceId;
use std::collections::{HashSet, VecDeque};
use tracing::debug;

/// Compute the shortest-path tree rooted at `root`
///
/// Returns one link per device that can reach the root, in discovery
/// order. The result is empty when the root is isolated or unknown to
/// the graph. Each vertex is enqueued at most once, so traversal
/// terminates on cyclic graphs.
pub fn build(graph: &TopologyGraph, root: &DeviceId) -> Vec<Link> {
    let mut queue: VecDeque<DeviceId> = VecDeque::new();
    let mut visited: HashSet<DeviceId> = HashSet::new();
    let mut tree: Vec<Link> = Vec::new();

    queue.push_back(root.clone());
    visited.insert(root.clone());

    while let Some(current) = queue.pop_front() {
        for link in graph.edges_to(&current) {
            let upstream = &link.src.device;
            if visited.contains(upstream) {
                continue;
            }
            visited.insert(upstream.clone());
            queue.push_back(upstream.clone());
            tree.push(link.clone());
        }
    }

    debug!(
        root = %root,
        reachable = visited.len(),
        links = tree.len(),
        "computed shortest-path tree"
    );
    tree
}
