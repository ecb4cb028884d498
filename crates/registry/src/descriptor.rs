//! Device descriptor parsing
//!
//! The backend hands over the raw 18-byte device descriptor blob; this
//! module decodes it into typed fields.

use crate::error::{Error, Result};

/// Standard device descriptor length in bytes.
pub const DEVICE_DESCRIPTOR_LEN: usize = 18;
/// bDescriptorType value identifying a device descriptor.
const DESCRIPTOR_TYPE_DEVICE: u8 = 0x01;

/// Parsed USB device descriptor.
///
/// String index fields are the raw descriptor indexes; 0 means the device
/// provides no string for that field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// USB specification release (BCD, e.g. 0x0200 for USB 2.0)
    pub bcd_usb: u16,
    /// Device class code
    pub class_code: u8,
    /// Device subclass code
    pub sub_class_code: u8,
    /// Device protocol code
    pub protocol_code: u8,
    /// Maximum packet size for endpoint 0
    pub max_packet_size_0: u8,
    /// USB vendor ID
    pub vendor_id: u16,
    /// USB product ID
    pub product_id: u16,
    /// Device release number (BCD)
    pub bcd_device: u16,
    /// Manufacturer string descriptor index
    pub manufacturer_string_index: u8,
    /// Product string descriptor index
    pub product_string_index: u8,
    /// Serial number string descriptor index
    pub serial_number_string_index: u8,
    /// Number of configurations
    pub num_configurations: u8,
}

impl DeviceDescriptor {
    /// Parse a raw descriptor blob.
    ///
    /// Rejects blobs that are truncated, claim a bLength below the standard
    /// size, or carry a descriptor type other than Device.
    pub fn parse(blob: &[u8]) -> Result<Self> {
        if blob.len() < DEVICE_DESCRIPTOR_LEN {
            return Err(Error::DescriptorUnavailable(format!(
                "descriptor truncated: {} bytes (expected {})",
                blob.len(),
                DEVICE_DESCRIPTOR_LEN
            )));
        }
        if (blob[0] as usize) < DEVICE_DESCRIPTOR_LEN {
            return Err(Error::DescriptorUnavailable(format!(
                "descriptor bLength {} below standard size",
                blob[0]
            )));
        }
        if blob[1] != DESCRIPTOR_TYPE_DEVICE {
            return Err(Error::DescriptorUnavailable(format!(
                "unexpected descriptor type {:#04x}",
                blob[1]
            )));
        }

        Ok(Self {
            bcd_usb: u16::from_le_bytes([blob[2], blob[3]]),
            class_code: blob[4],
            sub_class_code: blob[5],
            protocol_code: blob[6],
            max_packet_size_0: blob[7],
            vendor_id: u16::from_le_bytes([blob[8], blob[9]]),
            product_id: u16::from_le_bytes([blob[10], blob[11]]),
            bcd_device: u16::from_le_bytes([blob[12], blob[13]]),
            manufacturer_string_index: blob[14],
            product_string_index: blob[15],
            serial_number_string_index: blob[16],
            num_configurations: blob[17],
        })
    }
}

#[cfg(test)]
mod tests {
    use backend::mock::device_descriptor_bytes;

    use super::*;

    #[test]
    fn test_parse_standard_descriptor() {
        let blob = device_descriptor_bytes(0x1234, 0x5678);
        let desc = DeviceDescriptor::parse(&blob).unwrap();

        assert_eq!(desc.bcd_usb, 0x0200);
        assert_eq!(desc.class_code, 0x00);
        assert_eq!(desc.max_packet_size_0, 64);
        assert_eq!(desc.vendor_id, 0x1234);
        assert_eq!(desc.product_id, 0x5678);
        assert_eq!(desc.bcd_device, 0x0100);
        assert_eq!(desc.manufacturer_string_index, 1);
        assert_eq!(desc.product_string_index, 2);
        assert_eq!(desc.serial_number_string_index, 3);
        assert_eq!(desc.num_configurations, 1);
    }

    #[test]
    fn test_parse_truncated_blob() {
        let err = DeviceDescriptor::parse(&[0x12, 0x01, 0x00]).unwrap_err();
        assert!(matches!(err, Error::DescriptorUnavailable(_)));
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn test_parse_wrong_descriptor_type() {
        let mut blob = device_descriptor_bytes(0x1234, 0x5678);
        blob[1] = 0x02; // Configuration, not Device
        let err = DeviceDescriptor::parse(&blob).unwrap_err();
        assert!(err.to_string().contains("descriptor type"));
    }

    #[test]
    fn test_parse_undersized_blength() {
        let mut blob = device_descriptor_bytes(0x1234, 0x5678);
        blob[0] = 0x08;
        let err = DeviceDescriptor::parse(&blob).unwrap_err();
        assert!(err.to_string().contains("bLength"));
    }
}
