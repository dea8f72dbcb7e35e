//! OpenSR snapshot inspector
//!
//! Loads a declared network snapshot, runs a full reconciliation
//! against an in-memory rule store, and prints the synthesized
//! three-stage pipeline per switch.

mod snapshot;

use snapshot::NetworkSnapshot;
use sr_engine::{DeviceInventory, SegmentRoutingEngine};
use sr_pipeline::{AppId, MemoryRuleStore};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("OpenSR inspector v{}", env!("CARGO_PKG_VERSION"));

    let path = std::env::var("SNAPSHOT_PATH").unwrap_or_else(|_| "network.json".into());
    let snapshot = NetworkSnapshot::load(&path).unwrap_or_else(|_| {
        tracing::warn!(path = %path, "snapshot not found, using built-in demo network");
        NetworkSnapshot::default()
    });

    let net = Arc::new(snapshot.into_network()?);
    let store = Arc::new(MemoryRuleStore::new());
    let engine = SegmentRoutingEngine::new(
        AppId::new("org.opensr.app"),
        net.clone(),
        net.clone(),
        net.clone(),
        net.clone(),
        store.clone(),
    );
    engine.activate();

    for device in net.switches() {
        println!("{device}:");
        for rule in store.rules_for(&device) {
            println!("  {rule}");
        }
    }
    println!("{} rules installed", store.len());

    engine.deactivate();
    Ok(())
}
