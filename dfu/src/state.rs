use crate::DfuError;

/// DFU device state, as reported by `DFU_GETSTATE` / `DFU_GETSTATUS`
///
/// See section 6.1.2 of the DFU 1.1 specification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum DfuState {
    AppIdle = 0x00,
    AppDetach = 0x01,
    DfuIdle = 0x02,
    DownloadSync = 0x03,
    DownloadBusy = 0x04,
    DownloadIdle = 0x05,
    ManifestSync = 0x06,
    Manifest = 0x07,
    ManifestWaitReset = 0x08,
    UploadIdle = 0x09,
    Error = 0x0a,
}

impl DfuState {
    pub fn from_raw(raw: u8) -> Result<Self, DfuError> {
        Ok(match raw {
            0x00 => DfuState::AppIdle,
            0x01 => DfuState::AppDetach,
            0x02 => DfuState::DfuIdle,
            0x03 => DfuState::DownloadSync,
            0x04 => DfuState::DownloadBusy,
            0x05 => DfuState::DownloadIdle,
            0x06 => DfuState::ManifestSync,
            0x07 => DfuState::Manifest,
            0x08 => DfuState::ManifestWaitReset,
            0x09 => DfuState::UploadIdle,
            0x0a => DfuState::Error,
            other => return Err(DfuError::UnexpectedState(other)),
        })
    }

    /// Device is still running its application firmware
    pub fn is_app_mode(self) -> bool {
        matches!(self, DfuState::AppIdle | DfuState::AppDetach)
    }
}
