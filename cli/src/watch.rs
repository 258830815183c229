use dfu_manager::{ManagerConfig, ManagerHandle, Notification, NusbTransport};
use log::debug;

use crate::CliError;

/// Print device notifications until interrupted
pub(crate) fn watch_devices(config: ManagerConfig) -> Result<(), CliError> {
    let (_manager, events) = ManagerHandle::spawn(NusbTransport, config)?;
    let mut connected = None;
    for event in events {
        if let Some(line) = status_change(&mut connected, event) {
            println!("{line}");
        }
    }
    Ok(())
}

/// Line to print for `event`, if it changes what is connected
fn status_change(
    connected: &mut Option<String>,
    event: Notification,
) -> Option<String> {
    debug!("{event:?}");
    match event {
        Notification::DeviceFound(location) => {
            if connected.as_ref() == Some(&location) {
                return None;
            }
            let line = format!("Found device at {location}");
            *connected = Some(location);
            Some(line)
        }
        Notification::DeviceLost => connected
            .take()
            .map(|_| "No device connected.".to_string()),
        Notification::FlashProgress(_) | Notification::FlashFinished(_) => {
            None
        }
    }
}
