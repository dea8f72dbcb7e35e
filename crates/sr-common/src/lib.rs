//! OpenSR Common - Shared types for the segment routing control plane
//!
//! This crate provides the value types shared by every OpenSR crate:
//! - Network identities (`DeviceId`, `PortNumber`, `ConnectPoint`)
//! - Segment identifiers (`VlanId`, 12-bit validated)
//! - Host inventory entries (`Host`, `MacAddr`)
//! - Per-switch segment configuration (`SegmentConfig`)
//! - Error handling (`SrError`, `Result`)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod host;
pub mod net;

pub use config::SegmentConfig;
pub use error::{Result, SrError};
pub use host::{Host, MacAddr};
pub use net::{ConnectPoint, DeviceId, PortNumber, VlanId};
