//! Property tests for the coldplug merge

use backend::mock::MockBackend;
use proptest::prelude::*;
use registry::{Context, DeviceList};

fn identity_set() -> impl Strategy<Value = std::collections::HashSet<(u8, u8)>> {
    proptest::collection::hash_set((1u8..5, 1u8..32), 0..12)
}

proptest! {
    #[test]
    fn coldplug_is_idempotent(identities in identity_set()) {
        let mock = MockBackend::new();
        for (i, (bus_number, address)) in identities.iter().enumerate() {
            mock.plug(*bus_number, *address, 0x1000 + i as u16, 0x2000 + i as u16);
        }
        let context = Context::from_backend(mock);
        let mut list = DeviceList::new(&context);

        list.coldplug().unwrap();
        let first: Vec<(u8, u8)> = list
            .get_devices()
            .iter()
            .map(|d| (d.bus_number(), d.address()))
            .collect();

        list.coldplug().unwrap();
        let second: Vec<(u8, u8)> = list
            .get_devices()
            .iter()
            .map(|d| (d.bus_number(), d.address()))
            .collect();

        prop_assert_eq!(first.len(), identities.len());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn cached_descriptors_survive_recoldplug(identities in identity_set()) {
        let mock = MockBackend::new();
        for (i, (bus_number, address)) in identities.iter().enumerate() {
            mock.plug(*bus_number, *address, 0x1000 + i as u16, 0x2000 + i as u16);
        }
        let context = Context::from_backend(mock.clone());
        let mut list = DeviceList::new(&context);
        list.coldplug().unwrap();

        let mut cached = Vec::new();
        for device in list.get_devices() {
            device.get_descriptor().unwrap();
            cached.push(((device.bus_number(), device.address()), device.vendor_id()));
        }

        // Swap every descriptor behind the list's back; surviving Device
        // objects must keep serving their original cached values.
        for (bus_number, address) in &identities {
            mock.plug(*bus_number, *address, 0xdead, 0xbeef);
        }
        list.coldplug().unwrap();

        for ((bus_number, address), vendor_id) in cached {
            let device = list.find_by_bus_address(bus_number, address).unwrap();
            prop_assert_eq!(device.vendor_id(), vendor_id);
            prop_assert_ne!(device.vendor_id(), 0xdead);
        }
    }
}
