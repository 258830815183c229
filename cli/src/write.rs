use std::{
    io::{self, Write},
    path::Path,
    time::{Duration, Instant},
};

use dfu_manager::{
    ManagerConfig, ManagerError, ManagerHandle, Notification, NusbTransport,
    validate_firmware,
};
use log::debug;

use crate::CliError;

pub(crate) fn flash_file(
    file: &Path,
    config: ManagerConfig,
    wait: Duration,
) -> Result<(), CliError> {
    // refuse bad files before touching any device
    let size = validate_firmware(file)?;

    let (manager, events) = ManagerHandle::spawn(NusbTransport, config)?;

    println!("Waiting for device...");
    let deadline = Instant::now() + wait;
    loop {
        let timeout = deadline.saturating_duration_since(Instant::now());
        let event = events.recv_timeout(timeout);
        debug!("{event:?}");
        match event {
            Ok(Notification::DeviceFound(location)) => {
                println!("Found device at {location}");
                break;
            }
            Ok(_) => {}
            Err(_) => return Err(CliError::NoDevice),
        }
    }

    println!(
        "Flashing {} ({size} bytes, {}K flash)",
        file.display(),
        manager.flash_size() / 1024
    );
    manager.flash(file)?;

    for event in events.iter() {
        debug!("{event:?}");
        match event {
            Notification::FlashProgress(percentage) => {
                print_progress(percentage);
            }
            Notification::FlashFinished(Ok(())) => {
                print_progress(100);
                println!();
                println!("Done Flashing!");
                return Ok(());
            }
            Notification::FlashFinished(Err(err)) => {
                println!(" ❌");
                return Err(CliError::FlashFailed(err));
            }
            Notification::DeviceFound(_) | Notification::DeviceLost => {}
        }
    }
    Err(CliError::Manager(ManagerError::ManagerStopped))
}

fn print_progress(percentage: u8) {
    let filled = (60 * percentage as usize) / 100;
    print!(
        "\r  Flashing {:3}% [{}]",
        percentage,
        "#".repeat(filled) + &" ".repeat(60 - filled)
    );
    let _ = io::stdout().flush();
}
