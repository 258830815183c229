use std::time::Duration;

use crate::Catalog;

/// Flash address the first byte of the image is written to
pub const LOAD_ADDRESS: u32 = 0x0800_2000;

pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_millis(2000);
pub const DEFAULT_DETACH_TIMEOUT: Duration = Duration::from_millis(1000);

/// Device manager settings
#[derive(Clone, Debug)]
pub struct ManagerConfig {
    /// Time between two rescans while no flash job is running
    pub scan_interval: Duration,
    /// `wTimeout` sent with the detach request to devices in app mode
    pub detach_timeout: Duration,
    pub load_address: u32,
    pub catalog: Catalog,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            scan_interval: DEFAULT_SCAN_INTERVAL,
            detach_timeout: DEFAULT_DETACH_TIMEOUT,
            load_address: LOAD_ADDRESS,
            catalog: Catalog::default(),
        }
    }
}
