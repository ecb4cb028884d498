//! In-memory backend for tests
//!
//! `MockBackend` serves a configurable device topology. Devices can be
//! plugged and unplugged between enumerations to simulate coldplug churn,
//! and the next enumeration can be made to fail to exercise error paths.
//!
//! # Example
//!
//! ```
//! use backend::mock::MockBackend;
//! use backend::UsbBackend;
//!
//! let mock = MockBackend::new();
//! mock.plug(1, 4, 0x046d, 0xc52b);
//! assert_eq!(mock.enumerate().unwrap().len(), 1);
//!
//! mock.unplug(1, 4);
//! assert!(mock.enumerate().unwrap().is_empty());
//! ```

use std::sync::{Arc, Mutex};

use crate::error::{BackendError, Result};
use crate::interface::{EnumeratedDevice, LogLevel, UsbBackend};

/// Standard 18-byte device descriptor with the given vendor and product IDs.
///
/// Layout follows the USB 2.0 device descriptor: bLength, bDescriptorType,
/// bcdUSB 2.00, null class triple, 64-byte EP0, little-endian idVendor and
/// idProduct, bcdDevice 1.00, string indexes 1-3, one configuration.
pub fn device_descriptor_bytes(vendor_id: u16, product_id: u16) -> Vec<u8> {
    vec![
        0x12, // bLength
        0x01, // bDescriptorType (Device)
        0x00,
        0x02, // bcdUSB (2.00)
        0x00, // bDeviceClass
        0x00, // bDeviceSubClass
        0x00, // bDeviceProtocol
        0x40, // bMaxPacketSize0 (64 bytes)
        (vendor_id & 0xff) as u8,
        (vendor_id >> 8) as u8, // idVendor
        (product_id & 0xff) as u8,
        (product_id >> 8) as u8, // idProduct
        0x00,
        0x01, // bcdDevice (1.00)
        0x01, // iManufacturer
        0x02, // iProduct
        0x03, // iSerialNumber
        0x01, // bNumConfigurations
    ]
}

#[derive(Default)]
struct MockState {
    devices: Vec<MockDevice>,
    log_level: LogLevel,
    fail_next_enumerate: Option<BackendError>,
}

struct MockDevice {
    bus_number: u8,
    address: u8,
    descriptor: Vec<u8>,
}

/// Shared-state in-memory backend.
///
/// Clones share one topology, so a test can keep a handle for plugging and
/// unplugging while the registry holds its own clone.
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    /// Create an empty backend with no devices attached.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a device with a standard descriptor for (vendor, product).
    pub fn plug(&self, bus_number: u8, address: u8, vendor_id: u16, product_id: u16) {
        self.plug_with_descriptor(
            bus_number,
            address,
            device_descriptor_bytes(vendor_id, product_id),
        );
    }

    /// Attach a device serving an arbitrary descriptor blob.
    pub fn plug_with_descriptor(&self, bus_number: u8, address: u8, descriptor: Vec<u8>) {
        let mut state = self.state.lock().expect("mock state poisoned");
        state
            .devices
            .retain(|d| (d.bus_number, d.address) != (bus_number, address));
        state.devices.push(MockDevice {
            bus_number,
            address,
            descriptor,
        });
    }

    /// Detach a device. Returns false if no device was at (bus, address).
    pub fn unplug(&self, bus_number: u8, address: u8) -> bool {
        let mut state = self.state.lock().expect("mock state poisoned");
        let before = state.devices.len();
        state
            .devices
            .retain(|d| (d.bus_number, d.address) != (bus_number, address));
        state.devices.len() < before
    }

    /// Number of currently attached devices.
    pub fn device_count(&self) -> usize {
        self.state.lock().expect("mock state poisoned").devices.len()
    }

    /// The last log level set through the backend interface.
    pub fn log_level(&self) -> LogLevel {
        self.state.lock().expect("mock state poisoned").log_level
    }

    /// Make the next `enumerate` call fail with the given error.
    pub fn fail_next_enumerate(&self, error: BackendError) {
        self.state.lock().expect("mock state poisoned").fail_next_enumerate = Some(error);
    }
}

impl UsbBackend for MockBackend {
    type DeviceHandle = (u8, u8);

    fn init() -> Result<Self> {
        Ok(Self::new())
    }

    fn set_log_level(&self, level: LogLevel) {
        self.state.lock().expect("mock state poisoned").log_level = level;
    }

    fn enumerate(&self) -> Result<Vec<EnumeratedDevice<Self::DeviceHandle>>> {
        let mut state = self.state.lock().expect("mock state poisoned");
        if let Some(error) = state.fail_next_enumerate.take() {
            return Err(error);
        }
        Ok(state
            .devices
            .iter()
            .map(|d| EnumeratedDevice {
                bus_number: d.bus_number,
                address: d.address,
                handle: (d.bus_number, d.address),
            })
            .collect())
    }

    fn read_descriptor(&self, handle: &Self::DeviceHandle) -> Result<Vec<u8>> {
        let state = self.state.lock().expect("mock state poisoned");
        state
            .devices
            .iter()
            .find(|d| (d.bus_number, d.address) == *handle)
            .map(|d| d.descriptor.clone())
            .ok_or(BackendError::NoDevice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_bytes_layout() {
        let desc = device_descriptor_bytes(0x1234, 0x5678);

        assert_eq!(desc.len(), 18);
        assert_eq!(desc[0], 0x12); // bLength
        assert_eq!(desc[1], 0x01); // bDescriptorType
        assert_eq!(u16::from_le_bytes([desc[8], desc[9]]), 0x1234);
        assert_eq!(u16::from_le_bytes([desc[10], desc[11]]), 0x5678);
    }

    #[test]
    fn test_plug_replaces_same_identity() {
        let mock = MockBackend::new();
        mock.plug(1, 4, 0x1111, 0x2222);
        mock.plug(1, 4, 0x3333, 0x4444);

        assert_eq!(mock.device_count(), 1);
        let desc = mock.read_descriptor(&(1, 4)).unwrap();
        assert_eq!(u16::from_le_bytes([desc[8], desc[9]]), 0x3333);
    }

    #[test]
    fn test_unplugged_device_descriptor_fails() {
        let mock = MockBackend::new();
        mock.plug(1, 4, 0x1111, 0x2222);
        assert!(mock.unplug(1, 4));
        assert!(!mock.unplug(1, 4));

        assert_eq!(mock.read_descriptor(&(1, 4)), Err(BackendError::NoDevice));
    }

    #[test]
    fn test_fail_next_enumerate_is_one_shot() {
        let mock = MockBackend::new();
        mock.plug(2, 7, 0x1111, 0x2222);
        mock.fail_next_enumerate(BackendError::Io("bus reset".to_string()));

        assert!(mock.enumerate().is_err());
        assert_eq!(mock.enumerate().unwrap().len(), 1);
    }

    #[test]
    fn test_log_level_recorded() {
        let mock = MockBackend::new();
        assert_eq!(mock.log_level(), LogLevel::None);
        mock.set_log_level(LogLevel::Error);
        assert_eq!(mock.log_level(), LogLevel::Error);
    }
}
