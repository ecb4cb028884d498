//! libusb-backed implementation
//!
//! Wraps `rusb::Context` behind the [`UsbBackend`] interface. Descriptor
//! retrieval opens the device and issues a standard GET_DESCRIPTOR control
//! read so the registry receives the raw blob, not rusb's parsed form.

use std::time::Duration;

use rusb::UsbContext;
use tracing::{debug, warn};

use crate::error::{BackendError, Result};
use crate::interface::{EnumeratedDevice, LogLevel, UsbBackend};

/// bmRequestType for a device-to-host standard device request
const REQUEST_TYPE_DEVICE_IN: u8 = 0x80;
/// bRequest GET_DESCRIPTOR
const REQUEST_GET_DESCRIPTOR: u8 = 0x06;
/// wValue selecting the device descriptor (type 0x01, index 0)
const DESCRIPTOR_VALUE_DEVICE: u16 = 0x0100;
/// Standard device descriptor length in bytes
const DEVICE_DESCRIPTOR_LEN: usize = 18;
/// Timeout for descriptor control reads (5 seconds)
const DESCRIPTOR_TIMEOUT: Duration = Duration::from_secs(5);

/// Production backend over libusb (rusb).
///
/// `rusb::Context` is itself an Arc-backed shared handle, so cloning this
/// backend shares one libusb context.
#[derive(Clone)]
pub struct LibusbBackend {
    context: rusb::Context,
}

impl UsbBackend for LibusbBackend {
    type DeviceHandle = rusb::Device<rusb::Context>;

    fn init() -> Result<Self> {
        let context = rusb::Context::new().map_err(|e| BackendError::Init(e.to_string()))?;
        debug!("libusb context initialized");
        Ok(Self { context })
    }

    fn set_log_level(&self, level: LogLevel) {
        // rusb wants &mut self here, but the level applies to the shared
        // libusb context, so a clone targets the same context.
        let mut context = self.context.clone();
        context.set_log_level(map_log_level(level));
    }

    fn enumerate(&self) -> Result<Vec<EnumeratedDevice<Self::DeviceHandle>>> {
        let devices = self.context.devices().map_err(map_rusb_error)?;

        let mut found = Vec::new();
        for device in devices.iter() {
            found.push(EnumeratedDevice {
                bus_number: device.bus_number(),
                address: device.address(),
                handle: device,
            });
        }

        debug!("Enumerated {} devices", found.len());
        Ok(found)
    }

    fn read_descriptor(&self, handle: &Self::DeviceHandle) -> Result<Vec<u8>> {
        let opened = handle.open().map_err(|e| {
            warn!(
                "Failed to open device bus={} addr={}: {}",
                handle.bus_number(),
                handle.address(),
                e
            );
            map_rusb_error(e)
        })?;

        let mut buffer = vec![0u8; DEVICE_DESCRIPTOR_LEN];
        let len = opened
            .read_control(
                REQUEST_TYPE_DEVICE_IN,
                REQUEST_GET_DESCRIPTOR,
                DESCRIPTOR_VALUE_DEVICE,
                0,
                &mut buffer,
                DESCRIPTOR_TIMEOUT,
            )
            .map_err(map_rusb_error)?;
        buffer.truncate(len);

        debug!(
            "Read {} descriptor bytes from bus={} addr={}",
            buffer.len(),
            handle.bus_number(),
            handle.address()
        );
        Ok(buffer)
    }
}

/// Map our log level onto libusb verbosity
fn map_log_level(level: LogLevel) -> rusb::LogLevel {
    match level {
        LogLevel::None => rusb::LogLevel::None,
        LogLevel::Error => rusb::LogLevel::Error,
        LogLevel::Warning => rusb::LogLevel::Warning,
        LogLevel::Info => rusb::LogLevel::Info,
        LogLevel::Debug => rusb::LogLevel::Debug,
    }
}

/// Map rusb errors to backend errors
pub fn map_rusb_error(e: rusb::Error) -> BackendError {
    match e {
        rusb::Error::Access => BackendError::Access,
        rusb::Error::NoDevice | rusb::Error::NotFound => BackendError::NoDevice,
        rusb::Error::Io | rusb::Error::Pipe | rusb::Error::Timeout | rusb::Error::Overflow => {
            BackendError::Io(e.to_string())
        }
        other => BackendError::Other(other.to_string()),
    }
}
