use log::{debug, warn};

use crate::{
    Catalog, DeviceProfile, SharedProfile,
    transport::{UsbBus, UsbDevice},
};

/// Identity of an enumerated device
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub vendor_id: u16,
    pub product_id: u16,
    pub manufacturer: String,
    pub product: String,
    pub bus_id: String,
    pub address: u8,
}

impl DeviceDescriptor {
    /// Human readable `bus:device` location
    pub fn location(&self) -> String {
        format!("{}:{:03}", self.bus_id, self.address)
    }
}

/// Device that matched a catalog entry
pub struct MatchedDevice<D> {
    pub device: D,
    pub descriptor: DeviceDescriptor,
    pub profile: DeviceProfile,
}

/// Enumerate the bus and return the first device known to `catalog`
///
/// Only devices from vendors listed in the catalog are opened. On a match
/// the shared profile is replaced by the matched one.
pub fn scan<B: UsbBus>(
    bus: &B,
    catalog: &Catalog,
    shared: &SharedProfile,
) -> Option<MatchedDevice<B::Device>> {
    let devices = match bus.devices(&catalog.vendor_ids()) {
        Ok(devices) => devices,
        Err(err) => {
            warn!("USB enumeration failed: {err}");
            return None;
        }
    };

    for device in devices {
        if !catalog.accepts_vendor(device.vendor_id()) {
            continue;
        }
        let strings = match device.read_strings() {
            Ok(strings) => strings,
            Err(err) => {
                debug!(
                    "skipping {}:{:03}, cannot read strings: {err}",
                    device.bus_id(),
                    device.address()
                );
                continue;
            }
        };
        debug!(
            "{}:{:03} [{:04X}:{:04X}] {} : {}",
            device.bus_id(),
            device.address(),
            device.vendor_id(),
            device.product_id(),
            strings.manufacturer,
            strings.product,
        );

        if let Some(profile) = catalog.lookup(
            device.vendor_id(),
            device.product_id(),
            &strings.manufacturer,
            &strings.product,
        ) {
            shared.set(profile);
            let descriptor = DeviceDescriptor {
                vendor_id: device.vendor_id(),
                product_id: device.product_id(),
                manufacturer: strings.manufacturer,
                product: strings.product,
                bus_id: device.bus_id(),
                address: device.address(),
            };
            return Some(MatchedDevice {
                device,
                descriptor,
                profile,
            });
        }
    }
    None
}
