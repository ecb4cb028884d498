//! Registry error types

use std::fmt;

use backend::BackendError;
use thiserror::Error;

/// The identity a failed lookup was asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKey {
    /// Lookup by bus topology identity
    BusAddress { bus_number: u8, address: u8 },
    /// Lookup by vendor and product ID
    VidPid { vendor_id: u16, product_id: u16 },
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupKey::BusAddress {
                bus_number,
                address,
            } => write!(f, "bus {} address {}", bus_number, address),
            LookupKey::VidPid {
                vendor_id,
                product_id,
            } => write!(f, "ID {:04x}:{:04x}", vendor_id, product_id),
        }
    }
}

/// Errors returned by registry operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The backend could not be initialized. Fatal to context creation;
    /// not recoverable without environment changes.
    #[error("USB backend unavailable: {0}")]
    Init(#[source] BackendError),

    /// Device enumeration failed. The device list is left untouched.
    #[error("device enumeration failed: {0}")]
    Enumerate(#[source] BackendError),

    /// No device matched the lookup key. Always recoverable.
    #[error("no device found for {0}")]
    NoDevice(LookupKey),

    /// The descriptor could not be read or was malformed, typically because
    /// the device was removed mid-read. Often transient: re-enumerate via
    /// coldplug and retry.
    #[error("device descriptor unavailable: {0}")]
    DescriptorUnavailable(String),

    /// Configuration loading or validation failed.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Type alias for registry results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_key_display() {
        let key = LookupKey::BusAddress {
            bus_number: 3,
            address: 17,
        };
        assert_eq!(key.to_string(), "bus 3 address 17");

        let key = LookupKey::VidPid {
            vendor_id: 0x046d,
            product_id: 0xc52b,
        };
        assert_eq!(key.to_string(), "ID 046d:c52b");
    }

    #[test]
    fn test_error_display() {
        let err = Error::NoDevice(LookupKey::VidPid {
            vendor_id: 0xffff,
            product_id: 0xffff,
        });
        assert_eq!(err.to_string(), "no device found for ID ffff:ffff");
    }

    #[test]
    fn test_init_error_chains_source() {
        let err = Error::Init(BackendError::Init("no usb subsystem".to_string()));
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().contains("no usb subsystem"));
    }
}
