//! USB device registry
//!
//! Maintains the set of currently attached USB devices over a pluggable
//! [`backend`]: context ownership, coldplug enumeration with an
//! identity-preserving merge, lookup by bus address or vendor/product ID,
//! lazily cached device descriptors, and a topology monitor thread for
//! event-loop integration.
//!
//! # Example
//!
//! ```
//! use backend::mock::MockBackend;
//! use registry::{Context, DeviceList};
//!
//! let mock = MockBackend::new();
//! mock.plug(1, 4, 0x046d, 0xc52b);
//!
//! let context = Context::from_backend(mock);
//! let mut list = DeviceList::new(&context);
//! assert!(list.is_empty());
//!
//! list.coldplug()?;
//! let device = list.find_by_bus_address(1, 4)?;
//! assert_eq!(device.vendor_id(), 0); // descriptor not fetched yet
//!
//! device.get_descriptor()?;
//! assert_eq!(device.vendor_id(), 0x046d);
//! assert_eq!(device.product_id(), 0xc52b);
//! # Ok::<(), registry::Error>(())
//! ```
//!
//! Production code parameterizes over the libusb backend instead:
//! `Context::<backend::LibusbBackend>::new()?`.

pub mod config;
pub mod context;
pub mod descriptor;
pub mod device;
pub mod device_list;
pub mod error;
pub mod logging;
pub mod monitor;

pub use config::{LogSettings, MonitorSettings, RegistryConfig};
pub use context::Context;
pub use descriptor::DeviceDescriptor;
pub use device::Device;
pub use device_list::DeviceList;
pub use error::{Error, LookupKey, Result};
pub use logging::setup_logging;
pub use monitor::{MonitorHandle, TopologyEvent, TopologyTracker, spawn_monitor};
