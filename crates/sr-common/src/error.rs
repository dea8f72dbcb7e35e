//! Error types for OpenSR

use thiserror::Error;

/// OpenSR error type
#[derive(Error, Debug)]
pub enum SrError {
    /// A table entry expected during removal was missing
    #[error("inconsistent state: {0}")]
    InconsistentState(String),

    /// A configuration event targeted a device that is not a switch
    #[error("not a switch: {0}")]
    NotASwitch(String),

    /// VLAN id outside the 12-bit range
    #[error("invalid VLAN id: {0}")]
    InvalidVlan(u16),

    /// Malformed MAC address string
    #[error("invalid MAC address: {0}")]
    InvalidMac(String),

    /// Malformed connect point string (expected `device/port`)
    #[error("invalid connect point: {0}")]
    InvalidConnectPoint(String),

    /// Snapshot or configuration error
    #[error("config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for OpenSR
pub type Result<T> = std::result::Result<T, SrError>;
