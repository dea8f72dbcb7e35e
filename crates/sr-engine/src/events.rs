//! Event variants delivered to the engine
//!
//! The three collaborator streams are modeled as sum types so the
//! handlers match exhaustively; a missed variant fails compilation
//! rather than silently dropping events.

use sr_common::{DeviceId, Host, SegmentConfig};

/// Configuration registry event
#[derive(Debug, Clone)]
pub enum ConfigEvent {
    /// A device gained a configuration
    Added {
        /// Subject device
        device: DeviceId,
        /// New configuration
        config: SegmentConfig,
    },
    /// A device's configuration changed
    Updated {
        /// Subject device
        device: DeviceId,
        /// New configuration
        config: SegmentConfig,
        /// Configuration before the change
        previous: SegmentConfig,
    },
    /// A device lost its configuration
    Removed {
        /// Subject device
        device: DeviceId,
        /// The configuration that was removed
        config: SegmentConfig,
    },
}

impl ConfigEvent {
    /// Subject device of the event
    pub fn device(&self) -> &DeviceId {
        match self {
            ConfigEvent::Added { device, .. }
            | ConfigEvent::Updated { device, .. }
            | ConfigEvent::Removed { device, .. } => device,
        }
    }
}

/// Host tracking event
///
/// Moves carry the full previous snapshot rather than a diff: the old
/// location's rules are removed wholesale and the new location's rules
/// installed wholesale.
#[derive(Debug, Clone)]
pub enum HostEvent {
    /// Host appeared
    Added(Host),
    /// Host disappeared
    Removed(Host),
    /// Host changed location or addresses
    Moved {
        /// Host after the move
        host: Host,
        /// Host before the move
        previous: Host,
    },
}

/// Union of everything the serialized actor loop consumes
#[derive(Debug, Clone)]
pub enum Event {
    /// Configuration registry event
    Config(ConfigEvent),
    /// Host tracking event
    Host(HostEvent),
    /// Unconditional recovery: full teardown and resynthesis
    Rebuild,
}
