//! Serialized event loop
//!
//! The collaborator streams deliver concurrently; draining them through
//! one mpsc consumer gives the engine a total order over events without
//! contending on the table lock.

use crate::engine::SegmentRoutingEngine;
use crate::events::Event;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// Drain events until every sender is dropped
pub async fn run(engine: Arc<SegmentRoutingEngine>, mut events: mpsc::Receiver<Event>) {
    while let Some(event) = events.recv().await {
        match event {
            Event::Config(event) => engine.handle_config_event(event),
            Event::Host(event) => engine.handle_host_event(event),
            Event::Rebuild => engine.rebuild(),
        }
    }
    info!("event channel closed; reconciliation loop exiting");
}
