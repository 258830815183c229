//! Device manager for USB DFU bootloaders
//!
//! Finds a supported bootloader on the USB bus, keeps a connection to it
//! and installs firmware images with a page erase / block write / manifest
//! sequence.
//!
//! All device access happens on one thread, started with
//! [`ManagerHandle::spawn`]. The handle sends requests to it and a channel
//! carries [`Notification`]s back:
//!
//! ```no_run
//! use dfu_manager::{ManagerConfig, ManagerHandle, Notification, NusbTransport};
//!
//! let (manager, events) =
//!     ManagerHandle::spawn(NusbTransport, ManagerConfig::default())?;
//! for event in events {
//!     match event {
//!         Notification::DeviceFound(location) => {
//!             println!("Found device at {location}");
//!             manager.flash("blackmagic.bin")?;
//!         }
//!         Notification::FlashProgress(percent) => println!("{percent}%"),
//!         Notification::FlashFinished(result) => {
//!             println!("Done: {result:?}");
//!             break;
//!         }
//!         Notification::DeviceLost => println!("No device connected."),
//!     }
//! }
//! # Ok::<(), dfu_manager::ManagerError>(())
//! ```

mod catalog;
mod claimer;
mod config;
mod connection;
mod error;
mod flash;
mod profile;
mod scanner;
mod service;
mod supervisor;
pub mod transport;

#[cfg(test)]
mod mock;

// Re-exports
pub use catalog::{
    Catalog, CatalogEntry, DeviceProfile, OPENMOKO_VENDOR_ID, ST_VENDOR_ID,
};
pub use claimer::claim;
pub use config::{
    DEFAULT_DETACH_TIMEOUT, DEFAULT_SCAN_INTERVAL, LOAD_ADDRESS, ManagerConfig,
};
pub use connection::Connection;
pub use error::{FileProblem, ManagerError};
pub use flash::{FlashJob, flash, validate_firmware};
pub use profile::SharedProfile;
pub use scanner::{DeviceDescriptor, MatchedDevice, scan};
pub use service::{DeviceManager, ManagerHandle, Notification, Request};
pub use supervisor::{LinkOf, LinkState, Supervisor};
pub use transport::NusbTransport;
