//! In-memory USB bus recording every device operation

use std::{
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use dfu::{DeviceStrings, DfuAltSetting, DfuError, DfuState};

use crate::transport::{DfuLink, UsbBus, UsbDevice};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Op {
    List,
    ReadStrings(u8),
    Claim { address: u8, interface: u8 },
    GetState,
    Detach(Duration),
    MakeIdle,
    Erase(u32),
    Write { address: u32, len: usize },
    Manifest,
    Release(u8),
}

#[derive(Clone, Debug)]
pub(crate) struct MockDevice {
    pub vendor_id: u16,
    pub product_id: u16,
    pub manufacturer: String,
    pub product: String,
    pub bus_id: String,
    pub address: u8,
    pub alt_settings: Vec<DfuAltSetting>,
    pub state: Option<DfuState>,
    pub strings_fail: bool,
    pub claim_fails: bool,
    pub erase_fails_at: Option<u32>,
    pub write_fails_at: Option<u32>,
    pub erase_delay: Duration,
    pub manifest_fails: bool,
    bus: MockBus,
}

impl MockDevice {
    fn record(&self, op: Op) {
        self.bus.record(op);
    }
}

#[derive(Default)]
struct MockState {
    devices: Vec<MockDevice>,
    ops: Vec<Op>,
}

#[derive(Clone, Default)]
pub(crate) struct MockBus {
    inner: Arc<Mutex<MockState>>,
}

impl std::fmt::Debug for MockBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MockBus")
    }
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plug a Black Magic Probe sitting in its bootloader
    pub fn plug_bootloader(&self, bus_id: &str, address: u8) -> MockDevice {
        self.plug(self.bootloader(bus_id, address))
    }

    /// Black Magic Probe in its bootloader, not plugged yet
    pub fn bootloader(&self, bus_id: &str, address: u8) -> MockDevice {
        MockDevice {
            vendor_id: 0x1d50,
            product_id: 0x6017,
            manufacturer: "Black Sphere Technologies".into(),
            product: "Black Magic Probe (Upgrade)".into(),
            bus_id: bus_id.into(),
            address,
            alt_settings: vec![DfuAltSetting::new(1, 0, 0, 0xFE, 0x01)],
            state: Some(DfuState::DfuIdle),
            strings_fail: false,
            claim_fails: false,
            erase_fails_at: None,
            write_fails_at: None,
            erase_delay: Duration::ZERO,
            manifest_fails: false,
            bus: self.clone(),
        }
    }

    pub fn plug(&self, mut device: MockDevice) -> MockDevice {
        device.bus = self.clone();
        self.inner.lock().unwrap().devices.push(device.clone());
        device
    }

    pub fn update(&self, address: u8, f: impl FnOnce(&mut MockDevice)) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(dev) =
            inner.devices.iter_mut().find(|dev| dev.address == address)
        {
            f(dev);
        }
    }

    pub fn unplug_all(&self) {
        self.inner.lock().unwrap().devices.clear();
    }

    pub fn ops(&self) -> Vec<Op> {
        self.inner.lock().unwrap().ops.clone()
    }

    pub fn clear_ops(&self) {
        self.inner.lock().unwrap().ops.clear();
    }

    fn record(&self, op: Op) {
        self.inner.lock().unwrap().ops.push(op);
    }
}

impl UsbBus for MockBus {
    type Device = MockDevice;

    fn devices(
        &self,
        vendor_ids: &[u16],
    ) -> Result<Vec<MockDevice>, DfuError> {
        self.record(Op::List);
        Ok(self
            .inner
            .lock()
            .unwrap()
            .devices
            .iter()
            .filter(|dev| vendor_ids.contains(&dev.vendor_id))
            .cloned()
            .collect())
    }
}

impl UsbDevice for MockDevice {
    type Link = MockLink;

    fn vendor_id(&self) -> u16 {
        self.vendor_id
    }

    fn product_id(&self) -> u16 {
        self.product_id
    }

    fn bus_id(&self) -> String {
        self.bus_id.clone()
    }

    fn address(&self) -> u8 {
        self.address
    }

    fn read_strings(&self) -> Result<DeviceStrings, DfuError> {
        self.record(Op::ReadStrings(self.address));
        if self.strings_fail {
            return Err(DfuError::Timeout);
        }
        Ok(DeviceStrings {
            manufacturer: self.manufacturer.clone(),
            product: self.product.clone(),
        })
    }

    fn alt_settings(&self) -> Result<Vec<DfuAltSetting>, DfuError> {
        Ok(self.alt_settings.clone())
    }

    fn claim(&self, interface: u8) -> Result<MockLink, DfuError> {
        self.record(Op::Claim {
            address: self.address,
            interface,
        });
        if self.claim_fails {
            return Err(DfuError::Timeout);
        }
        Ok(MockLink {
            device: self.clone(),
            interface,
        })
    }
}

pub(crate) struct MockLink {
    device: MockDevice,
    interface: u8,
}

impl Drop for MockLink {
    fn drop(&mut self) {
        self.device.record(Op::Release(self.interface));
    }
}

impl DfuLink for MockLink {
    fn interface_number(&self) -> u8 {
        self.interface
    }

    fn get_state(&self) -> Result<DfuState, DfuError> {
        self.device.record(Op::GetState);
        self.device.state.ok_or(DfuError::Timeout)
    }

    fn detach(&self, timeout: Duration) -> Result<(), DfuError> {
        self.device.record(Op::Detach(timeout));
        Ok(())
    }

    fn make_idle(&self) -> Result<(), DfuError> {
        self.device.record(Op::MakeIdle);
        Ok(())
    }

    fn erase_page(&self, address: u32) -> Result<(), DfuError> {
        self.device.record(Op::Erase(address));
        thread::sleep(self.device.erase_delay);
        if self.device.erase_fails_at == Some(address) {
            return Err(DfuError::Status(0x0b));
        }
        Ok(())
    }

    fn write_block(&self, address: u32, data: &[u8]) -> Result<(), DfuError> {
        self.device.record(Op::Write {
            address,
            len: data.len(),
        });
        if self.device.write_fails_at == Some(address) {
            return Err(DfuError::Status(0x03));
        }
        Ok(())
    }

    fn manifest(&self) -> Result<(), DfuError> {
        self.device.record(Op::Manifest);
        if self.device.manifest_fails {
            return Err(DfuError::Status(0x0e));
        }
        Ok(())
    }
}
