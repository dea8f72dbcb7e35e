//! OpenSR Topology
//!
//! Immutable topology snapshots and per-root shortest-path-tree
//! computation. The reconciliation engine hands a snapshot of the
//! current graph to [`spt::build`] whenever a segment's forwarding tree
//! has to be (re)derived; topology state is never mutated from here.

pub mod graph;
pub mod spt;

pub use graph::{Link, TopologyGraph};
