use std::num::NonZeroU8;

use nusb::{self, MaybeFuture};

use crate::{DfuConnection, DfuError, interface::*};

/// USB device that may expose a DFU interface
///
/// Nothing is kept open: every query opens the device and closes it
/// again before returning.
pub struct DfuDevice {
    dev: nusb::DeviceInfo,
}

/// Manufacturer and product string descriptors
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeviceStrings {
    pub manufacturer: String,
    pub product: String,
}

impl DfuDevice {
    pub fn new(dev: nusb::DeviceInfo) -> Self {
        DfuDevice { dev }
    }

    pub fn device_info(&self) -> &nusb::DeviceInfo {
        &self.dev
    }

    pub fn bus_id(&self) -> &str {
        self.dev.bus_id()
    }

    pub fn device_address(&self) -> u8 {
        self.dev.device_address()
    }

    pub fn vendor_id(&self) -> u16 {
        self.dev.vendor_id()
    }

    pub fn product_id(&self) -> u16 {
        self.dev.product_id()
    }

    pub(crate) fn open(&self) -> Result<nusb::Device, DfuError> {
        Ok(self.dev.open().wait()?)
    }

    /// Read manufacturer and product strings from the device
    ///
    /// Missing descriptors read as empty strings.
    pub fn read_strings(&self) -> Result<DeviceStrings, DfuError> {
        let open_dev = self.open()?;
        let desc = open_dev.device_descriptor();
        let read = |index: Option<NonZeroU8>| {
            index
                .and_then(|idx| {
                    get_string_descriptor(&open_dev, idx, crate::DEFAULT_TIMEOUT)
                })
                .unwrap_or_default()
        };
        Ok(DeviceStrings {
            manufacturer: read(desc.manufacturer_string_index()),
            product: read(desc.product_string_index()),
        })
    }

    /// Every alternate setting of every interface of every configuration,
    /// in descriptor order
    pub fn alt_settings(&self) -> Result<Vec<DfuAltSetting>, DfuError> {
        let open_dev = self.open()?;
        Ok(open_dev
            .configurations()
            .flat_map(|configuration| {
                let config = configuration.configuration_value();
                configuration
                    .interface_alt_settings()
                    .map(move |alt_setting| {
                        DfuAltSetting::new(
                            config,
                            alt_setting.interface_number(),
                            alt_setting.alternate_setting(),
                            alt_setting.class(),
                            alt_setting.subclass(),
                        )
                    })
                    .collect::<Vec<_>>()
            })
            .collect())
    }

    /// Open the device and claim `interface`
    ///
    /// If claiming fails the freshly opened handle is dropped (closed)
    /// before returning.
    pub fn connect(&self, interface: u8) -> Result<DfuConnection, DfuError> {
        let dev = self.open()?;
        let interface = dev.claim_interface(interface).wait()?;
        Ok(DfuConnection::new(interface))
    }
}

/// List USB devices from the given vendors, ordered by bus then address
pub fn find_devices(vendor_ids: &[u16]) -> Result<Vec<DfuDevice>, DfuError> {
    let mut devices: Vec<nusb::DeviceInfo> = nusb::list_devices()
        .wait()?
        .filter(|dev| vendor_ids.contains(&dev.vendor_id()))
        .collect();
    devices.sort_by(|a, b| {
        (bus_key(a.bus_id()), a.device_address())
            .cmp(&(bus_key(b.bus_id()), b.device_address()))
    });
    Ok(devices.into_iter().map(DfuDevice::new).collect())
}

/// Sort key for a bus id: numeric ids by value, then anything else by text
fn bus_key(bus_id: &str) -> (Option<u32>, &str) {
    match bus_id.parse::<u32>() {
        Ok(number) => (Some(number), bus_id),
        Err(_) => (None, bus_id),
    }
}
