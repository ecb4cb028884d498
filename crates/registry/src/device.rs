//! Device handles with lazily cached descriptors

use std::fmt;
use std::sync::{Arc, OnceLock};

use backend::{EnumeratedDevice, UsbBackend};
use tracing::debug;

use crate::context::Context;
use crate::descriptor::DeviceDescriptor;
use crate::error::{Error, Result};

/// Handle to a single enumerated USB device.
///
/// Cheap to clone; clones share the cached descriptor, so a descriptor
/// fetched through one handle is visible through all of them. A handle
/// stays usable after its device drops out of a list, but an uncached
/// descriptor read for an unplugged device fails with
/// [`Error::DescriptorUnavailable`].
pub struct Device<B: UsbBackend> {
    inner: Arc<DeviceInner<B>>,
}

struct DeviceInner<B: UsbBackend> {
    context: Context<B>,
    bus_number: u8,
    address: u8,
    handle: B::DeviceHandle,
    descriptor: OnceLock<DeviceDescriptor>,
}

impl<B: UsbBackend> Clone for Device<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: UsbBackend> Device<B> {
    pub(crate) fn new(context: Context<B>, enumerated: EnumeratedDevice<B::DeviceHandle>) -> Self {
        Self {
            inner: Arc::new(DeviceInner {
                context,
                bus_number: enumerated.bus_number,
                address: enumerated.address,
                handle: enumerated.handle,
                descriptor: OnceLock::new(),
            }),
        }
    }

    /// Bus the device is attached to.
    pub fn bus_number(&self) -> u8 {
        self.inner.bus_number
    }

    /// Device address on its bus.
    pub fn address(&self) -> u8 {
        self.inner.address
    }

    /// Vendor ID from the cached descriptor, or 0 when none has been
    /// fetched yet.
    pub fn vendor_id(&self) -> u16 {
        self.inner.descriptor.get().map_or(0, |d| d.vendor_id)
    }

    /// Product ID from the cached descriptor, or 0 when none has been
    /// fetched yet.
    pub fn product_id(&self) -> u16 {
        self.inner.descriptor.get().map_or(0, |d| d.product_id)
    }

    /// The cached descriptor, if one has been fetched.
    pub fn descriptor(&self) -> Option<&DeviceDescriptor> {
        self.inner.descriptor.get()
    }

    /// Fetch and cache the device descriptor.
    ///
    /// The first successful call populates the cache; later calls return
    /// the cached descriptor without touching the backend, so repeated
    /// fetches cannot fail and cannot change already-populated fields.
    pub fn get_descriptor(&self) -> Result<&DeviceDescriptor> {
        if let Some(descriptor) = self.inner.descriptor.get() {
            return Ok(descriptor);
        }

        let blob = self
            .inner
            .context
            .backend()
            .read_descriptor(&self.inner.handle)
            .map_err(|e| Error::DescriptorUnavailable(e.to_string()))?;
        let parsed = DeviceDescriptor::parse(&blob)?;

        debug!(
            "Fetched descriptor for bus={} addr={}: {:04x}:{:04x}",
            self.bus_number(),
            self.address(),
            parsed.vendor_id,
            parsed.product_id
        );
        Ok(self.inner.descriptor.get_or_init(|| parsed))
    }
}

impl<B: UsbBackend> fmt::Debug for Device<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("bus_number", &self.bus_number())
            .field("address", &self.address())
            .field("vendor_id", &self.vendor_id())
            .field("product_id", &self.product_id())
            .finish()
    }
}
