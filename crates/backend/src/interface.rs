//! Backend capability interface
//!
//! The registry core never talks to libusb directly; it consumes device
//! access through [`UsbBackend`] so the same discovery and lookup logic can
//! run against the in-memory mock in tests.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Backend log verbosity, in libusb's ordering.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// No backend messages
    #[default]
    None,
    /// Errors only
    Error,
    /// Errors and warnings
    Warning,
    /// Informational messages
    Info,
    /// Full debug output
    Debug,
}

/// A device seen during one enumeration pass.
///
/// Carries the bus topology identity plus the backend-native handle used
/// for later descriptor reads. The handle stays valid until the device is
/// unplugged; reads after that fail with
/// [`BackendError::NoDevice`](crate::BackendError::NoDevice).
#[derive(Debug, Clone)]
pub struct EnumeratedDevice<H> {
    /// Bus the device is attached to
    pub bus_number: u8,
    /// Device address on that bus
    pub address: u8,
    /// Backend-native device handle
    pub handle: H,
}

/// Device-access capability consumed by the registry core.
///
/// Implementations are cheap-clone shared handles: all clones refer to the
/// same underlying backend instance, mirroring how `rusb::Context` behaves.
pub trait UsbBackend: Clone + Send + Sync + Sized + 'static {
    /// Backend-native device handle, cheap to clone.
    type DeviceHandle: Clone + Send + Sync + 'static;

    /// Initialize the backend.
    ///
    /// Fails when the USB subsystem is unavailable; there are no side
    /// effects beyond backend initialization.
    fn init() -> Result<Self>;

    /// Adjust backend log verbosity. Applies to subsequent operations.
    fn set_log_level(&self, level: LogLevel);

    /// Enumerate all currently attached devices.
    fn enumerate(&self) -> Result<Vec<EnumeratedDevice<Self::DeviceHandle>>>;

    /// Read the raw device descriptor blob for an enumerated device.
    fn read_descriptor(&self, handle: &Self::DeviceHandle) -> Result<Vec<u8>>;
}
