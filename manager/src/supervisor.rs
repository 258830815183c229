use std::time::Duration;

use log::{debug, info, warn};

use crate::{
    Catalog, Connection, ManagerError, SharedProfile,
    claimer::claim,
    scanner::scan,
    transport::{DfuLink, UsbBus, UsbDevice},
};

/// Link type produced by the devices of bus `B`
pub type LinkOf<B> = <<B as UsbBus>::Device as UsbDevice>::Link;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    ConnectedAppMode,
    ConnectedBootloaderMode,
}

/// Owner of the (at most one) open connection
///
/// Every [`tick`](Supervisor::tick) starts from scratch: the previous
/// connection is closed, the bus rescanned and the interface claimed again.
pub struct Supervisor<B: UsbBus> {
    bus: B,
    catalog: Catalog,
    shared: SharedProfile,
    detach_timeout: Duration,
    state: LinkState,
    connection: Option<Connection<LinkOf<B>>>,
}

impl<B: UsbBus> Supervisor<B> {
    pub fn new(
        bus: B,
        catalog: Catalog,
        shared: SharedProfile,
        detach_timeout: Duration,
    ) -> Self {
        Self {
            bus,
            catalog,
            shared,
            detach_timeout,
            state: LinkState::Disconnected,
            connection: None,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn connection(&self) -> Option<&Connection<LinkOf<B>>> {
        self.connection.as_ref()
    }

    /// Close the current connection, if any
    pub fn release(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close();
        }
        self.state = LinkState::Disconnected;
    }

    /// Rescan and reconnect
    ///
    /// Returns the location of the device when a bootloader is ready to be
    /// flashed. Devices still running their application are asked to detach
    /// and reported as lost; the next tick is expected to find them in
    /// bootloader mode.
    pub fn tick(&mut self) -> Result<String, ManagerError> {
        debug!("Releasing interface...");
        self.release();

        debug!("Trying to find DFU devices...");
        let matched = scan(&self.bus, &self.catalog, &self.shared)
            .ok_or(ManagerError::DeviceNotFound)?;
        let (link, interface) =
            claim(&matched.device).ok_or(ManagerError::InterfaceClaimFailed)?;

        let state = match link.get_state() {
            Ok(state) if !state.is_app_mode() => state,
            result => {
                self.state = LinkState::ConnectedAppMode;
                if let Err(err) = &result {
                    debug!("cannot read DFU state: {err}");
                }
                warn!(
                    "Resetting device at {} in firmware upgrade mode...",
                    matched.descriptor.location()
                );
                if let Err(err) = link.detach(self.detach_timeout) {
                    // the device usually drops off the bus mid-request
                    debug!("detach: {err}");
                }
                drop(link);
                self.state = LinkState::Disconnected;
                return Err(ManagerError::DeviceInAppMode);
            }
        };

        let location = matched.descriptor.location();
        info!(
            "Found device at {location} ({:04x}:{:04x} {})",
            matched.descriptor.vendor_id,
            matched.descriptor.product_id,
            matched.descriptor.product
        );
        self.connection = Some(Connection::new(
            link,
            interface,
            state,
            matched.descriptor,
            matched.profile,
        ));
        self.state = LinkState::ConnectedBootloaderMode;
        Ok(location)
    }

    /// Hand the bootloader connection over to a flash job
    ///
    /// Only succeeds in [`LinkState::ConnectedBootloaderMode`]. The
    /// supervisor is disconnected afterwards.
    pub fn take_connection(&mut self) -> Option<Connection<LinkOf<B>>> {
        if self.state != LinkState::ConnectedBootloaderMode {
            return None;
        }
        self.state = LinkState::Disconnected;
        self.connection
            .take()
            .filter(|connection| connection.is_bootloader())
    }
}

impl<B: UsbBus> Drop for Supervisor<B> {
    fn drop(&mut self) {
        if self.connection.is_some() {
            debug!("Releasing interface on shutdown.");
            self.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use dfu::DfuState;

    use super::*;
    use crate::mock::{MockBus, Op};

    fn supervisor(bus: &MockBus) -> Supervisor<MockBus> {
        Supervisor::new(
            bus.clone(),
            Catalog::default(),
            SharedProfile::default(),
            Duration::from_millis(1000),
        )
    }

    #[test]
    fn test_bootloader_found() {
        let bus = MockBus::new();
        bus.plug_bootloader("3", 12);
        let mut sup = supervisor(&bus);

        assert_eq!(sup.tick().unwrap(), "3:012");
        assert_eq!(sup.state(), LinkState::ConnectedBootloaderMode);
        assert_eq!(
            bus.ops(),
            vec![
                Op::List,
                Op::ReadStrings(12),
                Op::Claim {
                    address: 12,
                    interface: 0
                },
                Op::GetState,
            ]
        );
        let connection = sup.connection().unwrap();
        assert_eq!(connection.state(), DfuState::DfuIdle);
        assert_eq!(connection.interface(), 0);
    }

    #[test]
    fn test_tick_releases_previous_connection_first() {
        let bus = MockBus::new();
        bus.plug_bootloader("3", 12);
        let mut sup = supervisor(&bus);
        sup.tick().unwrap();
        bus.clear_ops();

        sup.tick().unwrap();
        let ops = bus.ops();
        assert_eq!(ops[0], Op::Release(0));
        assert_eq!(ops[1], Op::List);
    }

    #[test]
    fn test_device_lost() {
        let bus = MockBus::new();
        bus.plug_bootloader("3", 12);
        let mut sup = supervisor(&bus);
        sup.tick().unwrap();

        bus.unplug_all();
        assert!(matches!(sup.tick(), Err(ManagerError::DeviceNotFound)));
        assert_eq!(sup.state(), LinkState::Disconnected);
        assert!(sup.connection().is_none());
        assert!(bus.ops().contains(&Op::Release(0)));
    }

    #[test]
    fn test_no_dfu_interface() {
        let bus = MockBus::new();
        let mut dev = bus.bootloader("3", 12);
        dev.alt_settings.clear();
        bus.plug(dev);
        let mut sup = supervisor(&bus);
        assert!(matches!(sup.tick(), Err(ManagerError::InterfaceClaimFailed)));
        assert_eq!(sup.state(), LinkState::Disconnected);
    }

    #[test]
    fn test_app_mode_is_detached() {
        let bus = MockBus::new();
        let mut dev = bus.bootloader("3", 12);
        dev.state = Some(DfuState::AppIdle);
        bus.plug(dev);
        let mut sup = supervisor(&bus);

        assert!(matches!(sup.tick(), Err(ManagerError::DeviceInAppMode)));
        assert_eq!(sup.state(), LinkState::Disconnected);
        assert!(sup.take_connection().is_none());
        let ops = bus.ops();
        assert_eq!(
            &ops[ops.len() - 3..],
            &[
                Op::GetState,
                Op::Detach(Duration::from_millis(1000)),
                Op::Release(0)
            ]
        );
        assert!(!ops.iter().any(|op| matches!(
            op,
            Op::MakeIdle | Op::Erase(_) | Op::Write { .. } | Op::Manifest
        )));
    }

    #[test]
    fn test_unreadable_state_is_detached() {
        let bus = MockBus::new();
        let mut dev = bus.bootloader("3", 12);
        dev.state = None;
        bus.plug(dev);
        let mut sup = supervisor(&bus);

        assert!(matches!(sup.tick(), Err(ManagerError::DeviceInAppMode)));
        assert!(bus.ops().contains(&Op::Detach(Duration::from_millis(1000))));
    }

    #[test]
    fn test_take_connection() {
        let bus = MockBus::new();
        let mut sup = supervisor(&bus);
        assert!(sup.take_connection().is_none());

        bus.plug_bootloader("3", 12);
        sup.tick().unwrap();
        let connection = sup.take_connection().unwrap();
        assert_eq!(sup.state(), LinkState::Disconnected);
        assert!(sup.take_connection().is_none());
        connection.close();
        assert_eq!(bus.ops().last(), Some(&Op::Release(0)));
    }

    #[test]
    fn test_release_on_drop() {
        let bus = MockBus::new();
        bus.plug_bootloader("3", 12);
        let mut sup = supervisor(&bus);
        sup.tick().unwrap();
        drop(sup);
        assert_eq!(bus.ops().last(), Some(&Op::Release(0)));
    }
}
