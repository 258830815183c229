//! USB access used by the device manager
//!
//! The manager only talks to hardware through these traits. [`NusbTransport`]
//! is the real implementation; tests plug in an in-memory bus.

use std::time::Duration;

use dfu::{DeviceStrings, DfuAltSetting, DfuConnection, DfuDevice, DfuError, DfuState};

/// Enumerates devices attached to the host
pub trait UsbBus {
    type Device: UsbDevice;

    /// Fresh view of the devices from `vendor_ids`, in bus then device order
    fn devices(&self, vendor_ids: &[u16]) -> Result<Vec<Self::Device>, DfuError>;
}

/// Enumerated device, not opened
pub trait UsbDevice {
    type Link: DfuLink;

    fn vendor_id(&self) -> u16;
    fn product_id(&self) -> u16;
    fn bus_id(&self) -> String;
    fn address(&self) -> u8;

    /// Open the device, read its descriptor strings and close it again
    fn read_strings(&self) -> Result<DeviceStrings, DfuError>;

    /// Configuration / interface / alternate setting tree, flattened in
    /// descriptor order
    fn alt_settings(&self) -> Result<Vec<DfuAltSetting>, DfuError>;

    /// Open a handle and claim `interface`
    ///
    /// Dropping the returned link releases the interface and closes the handle.
    fn claim(&self, interface: u8) -> Result<Self::Link, DfuError>;
}

/// DFU requests on a claimed interface
pub trait DfuLink {
    fn interface_number(&self) -> u8;
    fn get_state(&self) -> Result<DfuState, DfuError>;
    fn detach(&self, timeout: Duration) -> Result<(), DfuError>;
    fn make_idle(&self) -> Result<(), DfuError>;
    fn erase_page(&self, address: u32) -> Result<(), DfuError>;
    fn write_block(&self, address: u32, data: &[u8]) -> Result<(), DfuError>;
    fn manifest(&self) -> Result<(), DfuError>;
}

/// Host USB stack, through [`nusb`]
#[derive(Clone, Copy, Debug, Default)]
pub struct NusbTransport;

impl UsbBus for NusbTransport {
    type Device = DfuDevice;

    fn devices(&self, vendor_ids: &[u16]) -> Result<Vec<DfuDevice>, DfuError> {
        dfu::find_devices(vendor_ids)
    }
}

impl UsbDevice for DfuDevice {
    type Link = DfuConnection;

    fn vendor_id(&self) -> u16 {
        DfuDevice::vendor_id(self)
    }

    fn product_id(&self) -> u16 {
        DfuDevice::product_id(self)
    }

    fn bus_id(&self) -> String {
        DfuDevice::bus_id(self).to_owned()
    }

    fn address(&self) -> u8 {
        self.device_address()
    }

    fn read_strings(&self) -> Result<DeviceStrings, DfuError> {
        DfuDevice::read_strings(self)
    }

    fn alt_settings(&self) -> Result<Vec<DfuAltSetting>, DfuError> {
        DfuDevice::alt_settings(self)
    }

    fn claim(&self, interface: u8) -> Result<DfuConnection, DfuError> {
        self.connect(interface)
    }
}

impl DfuLink for DfuConnection {
    fn interface_number(&self) -> u8 {
        DfuConnection::interface_number(self)
    }

    fn get_state(&self) -> Result<DfuState, DfuError> {
        DfuConnection::get_state(self)
    }

    fn detach(&self, timeout: Duration) -> Result<(), DfuError> {
        DfuConnection::detach(self, timeout)
    }

    fn make_idle(&self) -> Result<(), DfuError> {
        DfuConnection::make_idle(self)
    }

    fn erase_page(&self, address: u32) -> Result<(), DfuError> {
        self.dfuse_page_erase(address)
    }

    fn write_block(&self, address: u32, data: &[u8]) -> Result<(), DfuError> {
        self.download(address, data)
    }

    fn manifest(&self) -> Result<(), DfuError> {
        DfuConnection::manifest(self)
    }
}
