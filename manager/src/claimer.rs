use log::{debug, warn};

use crate::transport::UsbDevice;

/// Find the first DFU alternate setting of `device` and claim its interface
///
/// Both the class (`0xFE`) and the DFU subclass (`0x01`) have to match.
/// Returns `None` if the device has no such interface or it cannot be
/// claimed.
pub fn claim<D: UsbDevice>(device: &D) -> Option<(D::Link, u8)> {
    let alt_settings = match device.alt_settings() {
        Ok(alt_settings) => alt_settings,
        Err(err) => {
            warn!("cannot read configuration descriptors: {err}");
            return None;
        }
    };

    let alt = alt_settings.iter().find(|alt| alt.is_dfu())?;
    debug!(
        "DFU interface {} (config {}, alt {})",
        alt.interface(),
        alt.config(),
        alt.alt_setting()
    );
    match device.claim(alt.interface()) {
        Ok(link) => Some((link, alt.interface())),
        Err(err) => {
            warn!("claiming interface {} failed: {err}", alt.interface());
            None
        }
    }
}
