//! USB Device Firmware Upgrade (DFU) primitives based on [`nusb`]
//!
//! Provides the DFU requests (with the STM32 "DfuSe" erase / set-address
//! extensions) needed to put a bootloader into a known state, erase and
//! write flash pages and manifest the new image, plus enumeration helpers
//! used to locate the DFU interface of a device.
//!
//! Useful references:
//! - DFU: [USB Device Firmware Upgrade Specification, Revision 1.1](https://www.usb.org/sites/default/files/DFU_1.1.pdf)
//! - DfuSe: [STMicroelectronics AN3156](https://www.st.com/resource/en/application_note/an3156-usb-dfu-protocol-used-in-the-stm32-bootloader-stmicroelectronics.pdf)
//!
//! # Example
//!
//! ```no_run
//! use dfu::find_devices;
//!
//! match find_devices(&[0x1d50]) {
//!     Ok(devices) => {
//!         for device in devices {
//!             println!("{}:{:03}", device.bus_id(), device.device_address());
//!         }
//!     }
//!     Err(e) => println!("Error: {e}"),
//! }
//! ```
//!
//! [`nusb`]: https://docs.rs/nusb

pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000u64);

mod connection;
mod device;
mod error;
mod interface;
mod state;

use std::time::Duration;

// Re-exports
pub use connection::{DfuConnection, DfuStatus};
pub use device::{DeviceStrings, DfuDevice, find_devices};
pub use error::DfuError;
pub use interface::DfuAltSetting;
pub use state::DfuState;
