use dfu::DfuState;
use log::debug;

use crate::{DeviceDescriptor, DeviceProfile, transport::DfuLink};

/// Claimed DFU interface of a matched device
///
/// Owns the device handle. Closing (or dropping) the connection releases
/// the interface and closes the handle.
pub struct Connection<L: DfuLink> {
    link: L,
    interface: u8,
    state: DfuState,
    descriptor: DeviceDescriptor,
    profile: DeviceProfile,
}

impl<L: DfuLink> Connection<L> {
    pub fn new(
        link: L,
        interface: u8,
        state: DfuState,
        descriptor: DeviceDescriptor,
        profile: DeviceProfile,
    ) -> Self {
        Self {
            link,
            interface,
            state,
            descriptor,
            profile,
        }
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn interface(&self) -> u8 {
        self.interface
    }

    /// Protocol state read right after claiming
    pub fn state(&self) -> DfuState {
        self.state
    }

    pub fn descriptor(&self) -> &DeviceDescriptor {
        &self.descriptor
    }

    pub fn profile(&self) -> DeviceProfile {
        self.profile
    }

    pub fn is_bootloader(&self) -> bool {
        !self.state.is_app_mode()
    }

    pub fn close(self) {
        debug!(
            "Releasing interface {} of {}",
            self.interface,
            self.descriptor.location()
        );
        drop(self.link);
    }
}
