//! USB device-access backend for usb-registry
//!
//! This crate defines the capability interface the registry core consumes
//! for device access: backend initialization, device enumeration, and raw
//! descriptor retrieval. Two implementations ship with it:
//!
//! - [`libusb::LibusbBackend`] — the production backend over libusb (rusb)
//! - [`mock::MockBackend`] — an in-memory backend for tests, with
//!   plug/unplug simulation and failure injection

pub mod error;
pub mod interface;
pub mod libusb;
pub mod mock;

pub use error::{BackendError, Result};
pub use interface::{EnumeratedDevice, LogLevel, UsbBackend};
pub use libusb::LibusbBackend;
