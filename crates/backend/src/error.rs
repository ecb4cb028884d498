//! Backend error types

use thiserror::Error;

/// Errors surfaced by a [`UsbBackend`](crate::UsbBackend) implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The backend could not be initialized (no USB subsystem access).
    #[error("backend initialization failed: {0}")]
    Init(String),

    /// Access denied, typically missing device-node permissions.
    #[error("access denied to USB subsystem or device")]
    Access,

    /// The device is gone, either unplugged or never present.
    #[error("device is not present")]
    NoDevice,

    /// Communication with the device failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// Any other backend failure.
    #[error("{0}")]
    Other(String),
}

/// Type alias for backend results
pub type Result<T> = std::result::Result<T, BackendError>;
