use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::DeviceProfile;

/// Profile of the last matched device, shared between the device thread
/// and whoever needs to know the flash size
///
/// The lock is only held while copying the value in or out.
#[derive(Clone, Debug, Default)]
pub struct SharedProfile {
    inner: Arc<Mutex<DeviceProfile>>,
}

impl SharedProfile {
    pub fn new(profile: DeviceProfile) -> Self {
        Self {
            inner: Arc::new(Mutex::new(profile)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DeviceProfile> {
        // the value is plain data, a panicking writer cannot leave it torn
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self) -> DeviceProfile {
        *self.lock()
    }

    pub fn set(&self, profile: DeviceProfile) {
        *self.lock() = profile;
    }

    pub fn flash_size(&self) -> u32 {
        self.lock().flash_size
    }

    pub fn block_size(&self) -> u32 {
        self.lock().block_size
    }
}
