//! OpenSR Engine
//!
//! The reconciliation engine for VLAN-based segment routing. It owns
//! the segment and subnet tables, listens to configuration / topology /
//! host events from the collaborator facades, and keeps the three-stage
//! pipeline on every switch consistent with the declared configuration.
//!
//! ## Event flow
//!
//! ```text
//! config events ──┐
//! host events ────┼──▶ mpsc ──▶ actor ──▶ SegmentRoutingEngine ──▶ RuleStore
//! rebuild ────────┘            (serialized)   (tables + deltas)
//! ```
//!
//! All table reads/mutations and delta computation happen under one
//! lock; the resulting apply/remove calls are issued afterwards, since
//! the store is idempotent.

pub mod actor;
pub mod engine;
pub mod events;
pub mod memory;
pub mod services;

pub use engine::SegmentRoutingEngine;
pub use events::{ConfigEvent, Event, HostEvent};
pub use memory::MemoryNetwork;
pub use services::{ConfigRegistry, DeviceInventory, HostService, TopologyService};
