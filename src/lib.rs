//! Main crate
//!
//! C++ bindings for a desktop front end: the UI starts the device manager,
//! asks it to flash files and drains its notifications from its own event
//! loop with `poll_event`.

use std::sync::mpsc::{Receiver, TryRecvError};

use dfu_manager::{
    ManagerConfig, ManagerError, ManagerHandle, Notification, NusbTransport,
};

#[cxx::bridge]
mod ffi {

    enum EventKind {
        DeviceFound,
        DeviceLost,
        FlashProgress,
        FlashFinished,
        FlashFailed,
    }

    struct ManagerEvent {
        kind: EventKind,
        percent: u8,
        message: String,
    }

    extern "Rust" {
        type DeviceManager;

        fn start_device_manager() -> Result<Box<DeviceManager>>;

        fn find_device(&self) -> Result<()>;
        fn flash(&self, path: &str) -> Result<()>;
        fn flash_size(&self) -> u32;
        fn poll_event(&self, event: &mut ManagerEvent) -> bool;
    }
}

pub struct DeviceManager {
    handle: ManagerHandle,
    events: Receiver<Notification>,
}

fn start_device_manager() -> Result<Box<DeviceManager>, ManagerError> {
    // the host application may start more than one manager
    let _ = env_logger::try_init();
    let (handle, events) =
        ManagerHandle::spawn(NusbTransport, ManagerConfig::default())?;
    Ok(Box::new(DeviceManager { handle, events }))
}

impl DeviceManager {
    fn find_device(&self) -> Result<(), ManagerError> {
        self.handle.find_device()
    }

    /// Validation errors carry the message to show to the user
    fn flash(&self, path: &str) -> Result<(), ManagerError> {
        self.handle.flash(path)
    }

    fn flash_size(&self) -> u32 {
        self.handle.flash_size()
    }

    /// Take the next pending notification, without blocking
    fn poll_event(&self, event: &mut ffi::ManagerEvent) -> bool {
        match self.events.try_recv() {
            Ok(notification) => {
                fill_event(event, notification);
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                log::error!("device thread is gone");
                false
            }
        }
    }
}

fn fill_event(event: &mut ffi::ManagerEvent, notification: Notification) {
    event.percent = 0;
    event.message.clear();
    match notification {
        Notification::DeviceFound(location) => {
            event.kind = ffi::EventKind::DeviceFound;
            event.message = format!("Found device at {location}");
        }
        Notification::DeviceLost => {
            event.kind = ffi::EventKind::DeviceLost;
            event.message = "No device connected.".into();
        }
        Notification::FlashProgress(percent) => {
            event.kind = ffi::EventKind::FlashProgress;
            event.percent = percent;
        }
        Notification::FlashFinished(Ok(())) => {
            event.kind = ffi::EventKind::FlashFinished;
            event.percent = 100;
            event.message = "Done Flashing!".into();
        }
        Notification::FlashFinished(Err(err)) => {
            event.kind = ffi::EventKind::FlashFailed;
            event.message = err.to_string();
        }
    }
}
