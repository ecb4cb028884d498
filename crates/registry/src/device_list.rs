//! Device list with coldplug merge and lookups
//!
//! The list is the registry of currently known devices. A coldplug pass
//! re-enumerates the backend and merges the result: identities already in
//! the list keep their Device object (and any cached descriptor), new
//! identities are added in enumeration order, vanished identities drop out.

use std::collections::HashMap;

use backend::UsbBackend;
use tracing::debug;

use crate::context::Context;
use crate::device::Device;
use crate::error::{Error, LookupKey, Result};

/// Ordered collection of the currently known devices.
///
/// Devices are uniquely identified within the list by (bus, address).
/// Construction is infallible and yields an empty list; the list only
/// reflects the backend after a [`coldplug`](DeviceList::coldplug).
pub struct DeviceList<B: UsbBackend> {
    context: Context<B>,
    devices: Vec<Device<B>>,
}

impl<B: UsbBackend> DeviceList<B> {
    /// Create an empty list bound to the context.
    pub fn new(context: &Context<B>) -> Self {
        Self {
            context: context.clone(),
            devices: Vec::new(),
        }
    }

    /// Re-enumerate attached devices and merge the result into the list.
    ///
    /// Identities already present keep their existing [`Device`] object, so
    /// cached descriptors survive the pass. Repeating a coldplug with an
    /// unchanged topology leaves length and identities unchanged. On
    /// enumeration failure the list is left untouched and
    /// [`Error::Enumerate`] is returned.
    pub fn coldplug(&mut self) -> Result<()> {
        let enumerated = self.context.backend().enumerate().map_err(Error::Enumerate)?;

        let mut existing: HashMap<(u8, u8), Device<B>> = self
            .devices
            .drain(..)
            .map(|d| ((d.bus_number(), d.address()), d))
            .collect();

        let mut merged = Vec::with_capacity(enumerated.len());
        for entry in enumerated {
            match existing.remove(&(entry.bus_number, entry.address)) {
                Some(device) => merged.push(device),
                None => merged.push(Device::new(self.context.clone(), entry)),
            }
        }

        debug!(
            "Coldplug merged {} devices ({} removed)",
            merged.len(),
            existing.len()
        );
        self.devices = merged;
        Ok(())
    }

    /// Snapshot of the current devices in list order.
    pub fn get_devices(&self) -> Vec<Device<B>> {
        self.devices.to_vec()
    }

    /// Number of devices currently in the list.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Look up a device by its bus topology identity.
    pub fn find_by_bus_address(&self, bus_number: u8, address: u8) -> Result<Device<B>> {
        self.devices
            .iter()
            .find(|d| d.bus_number() == bus_number && d.address() == address)
            .cloned()
            .ok_or(Error::NoDevice(LookupKey::BusAddress {
                bus_number,
                address,
            }))
    }

    /// First device in list order matching (vendor, product).
    ///
    /// Matches against cached descriptor values only: a device whose
    /// descriptor has not been fetched reports IDs (0, 0) and will not
    /// match a non-zero probe. Callers needing a unique match must
    /// disambiguate themselves.
    pub fn find_by_vid_pid(&self, vendor_id: u16, product_id: u16) -> Result<Device<B>> {
        self.devices
            .iter()
            .find(|d| d.vendor_id() == vendor_id && d.product_id() == product_id)
            .cloned()
            .ok_or(Error::NoDevice(LookupKey::VidPid {
                vendor_id,
                product_id,
            }))
    }
}

#[cfg(test)]
mod tests {
    use backend::BackendError;
    use backend::mock::MockBackend;

    use super::*;

    fn identities(list: &DeviceList<MockBackend>) -> Vec<(u8, u8)> {
        list.get_devices()
            .iter()
            .map(|d| (d.bus_number(), d.address()))
            .collect()
    }

    #[test]
    fn test_new_list_is_empty() {
        let context = Context::from_backend(MockBackend::new());
        let list = DeviceList::new(&context);

        assert!(list.is_empty());
        assert!(list.get_devices().is_empty());
    }

    #[test]
    fn test_coldplug_picks_up_devices_in_order() {
        let mock = MockBackend::new();
        mock.plug(1, 4, 0x046d, 0xc52b);
        mock.plug(2, 9, 0x0781, 0x5581);
        let context = Context::from_backend(mock);
        let mut list = DeviceList::new(&context);

        list.coldplug().unwrap();
        assert_eq!(identities(&list), vec![(1, 4), (2, 9)]);
    }

    #[test]
    fn test_coldplug_twice_does_not_duplicate() {
        let mock = MockBackend::new();
        mock.plug(1, 4, 0x046d, 0xc52b);
        mock.plug(2, 9, 0x0781, 0x5581);
        let context = Context::from_backend(mock);
        let mut list = DeviceList::new(&context);

        list.coldplug().unwrap();
        let before = identities(&list);
        list.coldplug().unwrap();

        assert_eq!(list.len(), 2);
        assert_eq!(identities(&list), before);
    }

    #[test]
    fn test_coldplug_preserves_descriptor_cache() {
        let mock = MockBackend::new();
        mock.plug(1, 4, 0x046d, 0xc52b);
        let context = Context::from_backend(mock.clone());
        let mut list = DeviceList::new(&context);

        list.coldplug().unwrap();
        list.get_devices()[0].get_descriptor().unwrap();

        // The same Device object must survive the merge: its vendor ID is
        // readable without another backend round-trip even after the
        // descriptor source is gone.
        mock.plug(2, 9, 0x0781, 0x5581);
        list.coldplug().unwrap();

        let device = list.find_by_bus_address(1, 4).unwrap();
        assert_eq!(device.vendor_id(), 0x046d);
    }

    #[test]
    fn test_coldplug_drops_removed_devices() {
        let mock = MockBackend::new();
        mock.plug(1, 4, 0x046d, 0xc52b);
        mock.plug(2, 9, 0x0781, 0x5581);
        let context = Context::from_backend(mock.clone());
        let mut list = DeviceList::new(&context);

        list.coldplug().unwrap();
        mock.unplug(1, 4);
        list.coldplug().unwrap();

        assert_eq!(identities(&list), vec![(2, 9)]);
        assert!(matches!(
            list.find_by_bus_address(1, 4),
            Err(Error::NoDevice(_))
        ));
    }

    #[test]
    fn test_failed_coldplug_leaves_list_untouched() {
        let mock = MockBackend::new();
        mock.plug(1, 4, 0x046d, 0xc52b);
        let context = Context::from_backend(mock.clone());
        let mut list = DeviceList::new(&context);

        list.coldplug().unwrap();
        mock.unplug(1, 4);
        mock.fail_next_enumerate(BackendError::Io("bus reset".to_string()));

        let err = list.coldplug().unwrap_err();
        assert!(matches!(err, Error::Enumerate(_)));
        assert_eq!(identities(&list), vec![(1, 4)]);
    }

    #[test]
    fn test_find_by_bus_address() {
        let mock = MockBackend::new();
        mock.plug(1, 4, 0x046d, 0xc52b);
        let context = Context::from_backend(mock);
        let mut list = DeviceList::new(&context);
        list.coldplug().unwrap();

        let device = list.find_by_bus_address(1, 4).unwrap();
        assert_eq!(device.bus_number(), 1);
        assert_eq!(device.address(), 4);

        let err = list.find_by_bus_address(3, 3).unwrap_err();
        assert_eq!(
            err.to_string(),
            "no device found for bus 3 address 3"
        );
    }

    #[test]
    fn test_find_by_vid_pid_matches_cached_values_only() {
        let mock = MockBackend::new();
        mock.plug(1, 4, 0x046d, 0xc52b);
        let context = Context::from_backend(mock);
        let mut list = DeviceList::new(&context);
        list.coldplug().unwrap();

        // Unfetched descriptor: IDs read as zero, so the probe misses.
        assert!(list.find_by_vid_pid(0x046d, 0xc52b).is_err());

        list.get_devices()[0].get_descriptor().unwrap();
        let device = list.find_by_vid_pid(0x046d, 0xc52b).unwrap();
        assert_eq!(device.address(), 4);
    }

    #[test]
    fn test_find_by_vid_pid_first_match_wins() {
        let mock = MockBackend::new();
        mock.plug(1, 4, 0x046d, 0xc52b);
        mock.plug(1, 5, 0x046d, 0xc52b);
        let context = Context::from_backend(mock);
        let mut list = DeviceList::new(&context);
        list.coldplug().unwrap();

        for device in list.get_devices() {
            device.get_descriptor().unwrap();
        }

        let device = list.find_by_vid_pid(0x046d, 0xc52b).unwrap();
        assert_eq!((device.bus_number(), device.address()), (1, 4));
    }

    #[test]
    fn test_find_by_vid_pid_no_match() {
        let mock = MockBackend::new();
        mock.plug(1, 4, 0x046d, 0xc52b);
        let context = Context::from_backend(mock);
        let mut list = DeviceList::new(&context);
        list.coldplug().unwrap();

        let err = list.find_by_vid_pid(0xffff, 0xffff).unwrap_err();
        assert!(matches!(
            err,
            Error::NoDevice(LookupKey::VidPid {
                vendor_id: 0xffff,
                product_id: 0xffff,
            })
        ));
    }
}
