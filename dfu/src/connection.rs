use std::{
    thread,
    time::{Duration, Instant},
};

use log::{debug, trace};
use nusb::{
    MaybeFuture,
    transfer::{ControlIn, ControlOut, ControlType, Recipient},
};

use crate::DEFAULT_TIMEOUT;
use crate::error::*;
use crate::state::DfuState;

const DFU_CMD_DETACH: u8 = 0;
const DFU_CMD_DOWNLOAD: u8 = 1;
const DFU_CMD_GETSTATUS: u8 = 3;
const DFU_CMD_CLRSTATUS: u8 = 4;
const DFU_CMD_GETSTATE: u8 = 5;
const DFU_CMD_ABORT: u8 = 6;

const DFU_STATUS_LEN: u16 = 6;
const DFU_STATE_LEN: u16 = 1;

const DFUSE_CMD_ADDR: u8 = 0x21;
const DFUSE_CMD_ERASE: u8 = 0x41;

// DfuSe: wValue 2 and up address data blocks, 0 carries commands
const DFUSE_DATA_BLOCK: u16 = 2;

const MAKE_IDLE_ATTEMPTS: usize = 3;

/// Claimed DFU interface
///
/// The interface is released and the device handle closed when the
/// connection is dropped.
pub struct DfuConnection {
    interface: nusb::Interface,
}

#[derive(Clone, Debug)]
pub struct DfuStatus {
    status: u8,
    poll_timeout: u32,
    state: u8,
}

impl DfuStatus {
    fn from_raw(data: &[u8]) -> Result<Self, DfuError> {
        if data.len() < DFU_STATUS_LEN as usize {
            return Err(DfuError::ShortResponse(data.len()));
        }
        Ok(DfuStatus {
            status: data[0],
            poll_timeout: (data[3] as u32) << 16
                | (data[2] as u32) << 8
                | (data[1] as u32),
            state: data[4],
        })
    }

    pub fn status(&self) -> u8 {
        self.status
    }

    pub fn state(&self) -> Result<DfuState, DfuError> {
        DfuState::from_raw(self.state)
    }

    /// Minimum time the host should wait before the next `DFU_GETSTATUS`
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout as u64)
    }

    pub fn ok(&self) -> Result<(), DfuError> {
        self.ret(())
    }

    pub fn ret<T>(&self, t: T) -> Result<T, DfuError> {
        if self.status != 0 {
            Err(DfuError::from(self))
        } else {
            Ok(t)
        }
    }
}

impl From<&DfuStatus> for DfuError {
    fn from(st: &DfuStatus) -> Self {
        DfuError::Status(st.status)
    }
}

impl DfuConnection {
    pub(crate) fn new(interface: nusb::Interface) -> Self {
        DfuConnection { interface }
    }

    pub fn interface_number(&self) -> u8 {
        self.interface.interface_number()
    }

    pub fn get_status(&self) -> Result<DfuStatus, DfuError> {
        let data = self.dfu_cmd_in(DFU_CMD_GETSTATUS, 0, DFU_STATUS_LEN)?;
        DfuStatus::from_raw(&data)
    }

    pub fn get_state(&self) -> Result<DfuState, DfuError> {
        let data = self.dfu_cmd_in(DFU_CMD_GETSTATE, 0, DFU_STATE_LEN)?;
        match data.first() {
            Some(raw) => DfuState::from_raw(*raw),
            None => Err(DfuError::ShortResponse(0)),
        }
    }

    pub fn clear_status(&self) -> Result<(), DfuError> {
        self.dfu_cmd_out(DFU_CMD_CLRSTATUS, 0, &[])
    }

    pub fn abort(&self) -> Result<(), DfuError> {
        self.dfu_cmd_out(DFU_CMD_ABORT, 0, &[])
    }

    /// Ask a device running its application to re-enumerate in DFU mode
    ///
    /// `timeout` is passed to the device as `wTimeout`, the time it waits
    /// for the bus reset before reverting to normal operation.
    pub fn detach(&self, timeout: Duration) -> Result<(), DfuError> {
        let timeout_ms = timeout.as_millis().min(u16::MAX as u128) as u16;
        self.dfu_cmd_out(DFU_CMD_DETACH, timeout_ms, &[])
    }

    /// Bring the device back to `dfuIDLE`
    ///
    /// Pending downloads/uploads are aborted and error states cleared.
    pub fn make_idle(&self) -> Result<(), DfuError> {
        for _ in 0..MAKE_IDLE_ATTEMPTS {
            let st = self.get_status()?;
            match st.state()? {
                DfuState::DfuIdle => return Ok(()),
                DfuState::DownloadSync
                | DfuState::DownloadIdle
                | DfuState::ManifestSync
                | DfuState::UploadIdle
                | DfuState::DownloadBusy
                | DfuState::Manifest => {
                    debug!("aborting pending DFU operation");
                    self.abort()?;
                }
                DfuState::Error => {
                    debug!("clearing DFU error status {}", st.status());
                    self.clear_status()?;
                }
                state => {
                    return Err(DfuError::UnexpectedState(state as u8));
                }
            }
        }
        Err(DfuError::Timeout)
    }

    /// Write `data` at `addr`
    pub fn download(&self, addr: u32, data: &[u8]) -> Result<(), DfuError> {
        self.dfuse_set_address(addr)?;
        self.dfu_dnload(DFUSE_DATA_BLOCK, data)
    }

    /// Finish the download and let the device boot the new image
    ///
    /// Devices usually reset right away, so the final status request
    /// is allowed to fail.
    pub fn manifest(&self) -> Result<(), DfuError> {
        self.dfu_cmd_out(DFU_CMD_DOWNLOAD, 0, &[])?;
        if let Err(err) = self.get_status() {
            debug!("no status after manifest: {err}");
        }
        Ok(())
    }

    pub fn dfuse_page_erase(&self, addr: u32) -> Result<(), DfuError> {
        let erase_cmd: Vec<u8> = vec![
            DFUSE_CMD_ERASE,
            addr as u8,
            (addr >> 8) as u8,
            (addr >> 16) as u8,
            (addr >> 24) as u8,
        ];
        self.dfu_dnload(0, &erase_cmd)
    }

    pub fn dfuse_set_address(&self, addr: u32) -> Result<(), DfuError> {
        let addr_cmd: Vec<u8> = vec![
            DFUSE_CMD_ADDR,
            addr as u8,
            (addr >> 8) as u8,
            (addr >> 16) as u8,
            (addr >> 24) as u8,
        ];
        self.dfu_dnload(0, &addr_cmd)
    }

    fn dfu_dnload(
        &self,
        transaction: u16,
        data: &[u8],
    ) -> Result<(), DfuError> {
        self.dfu_cmd_out(DFU_CMD_DOWNLOAD, transaction, data)?;
        self.poll_until_idle()
    }

    fn poll_until_idle(&self) -> Result<(), DfuError> {
        let start = Instant::now();
        loop {
            let st = self.get_status()?;
            trace!("DFU status {} state {}", st.status, st.state);
            match st.state()? {
                DfuState::DownloadIdle => return st.ok(),
                DfuState::Error => return Err(DfuError::from(&st)),
                _ => {}
            }
            if start.elapsed() >= DEFAULT_TIMEOUT * 2 {
                return Err(DfuError::Timeout);
            }
            thread::sleep(st.poll_timeout());
        }
    }

    fn dfu_cmd_out(
        &self,
        req: u8,
        value: u16,
        data: &[u8],
    ) -> Result<(), DfuError> {
        let index = self.interface.interface_number() as u16;
        Ok(self
            .interface
            .control_out(
                ControlOut {
                    control_type: ControlType::Class,
                    recipient: Recipient::Interface,
                    request: req,
                    value,
                    index,
                    data,
                },
                DEFAULT_TIMEOUT,
            )
            .wait()?)
    }

    fn dfu_cmd_in(
        &self,
        req: u8,
        value: u16,
        length: u16,
    ) -> Result<Vec<u8>, DfuError> {
        let index = self.interface.interface_number() as u16;
        Ok(self
            .interface
            .control_in(
                ControlIn {
                    control_type: ControlType::Class,
                    recipient: Recipient::Interface,
                    request: req,
                    value,
                    index,
                    length,
                },
                DEFAULT_TIMEOUT,
            )
            .wait()?)
    }
}
