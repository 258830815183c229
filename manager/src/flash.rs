use std::{
    fs, io,
    path::{Path, PathBuf},
};

use log::{debug, info};

use crate::{FileProblem, ManagerError, transport::DfuLink};

/// Check that `path` names a non-empty regular file
///
/// Returns the file size.
pub fn validate_firmware(path: &Path) -> Result<u64, ManagerError> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(FileProblem::NotFound.into());
        }
        Err(err) => return Err(err.into()),
    };
    if !metadata.is_file() {
        return Err(FileProblem::NotAFile.into());
    }
    if metadata.len() == 0 {
        return Err(FileProblem::Empty.into());
    }
    Ok(metadata.len())
}

/// Firmware image being written block by block
///
/// `offset` is a multiple of the block size until the last (possibly
/// partial) block has been written, then it equals the image length.
#[derive(Debug)]
pub struct FlashJob {
    path: PathBuf,
    data: Vec<u8>,
    offset: usize,
    block_size: usize,
}

impl FlashJob {
    pub fn new(
        path: impl Into<PathBuf>,
        data: Vec<u8>,
        block_size: u32,
    ) -> Result<Self, ManagerError> {
        if data.is_empty() {
            return Err(FileProblem::Empty.into());
        }
        Ok(Self {
            path: path.into(),
            data,
            offset: 0,
            block_size: block_size.max(1) as usize,
        })
    }

    /// Validate and read the image at `path`
    pub fn load(path: &Path, block_size: u32) -> Result<Self, ManagerError> {
        validate_firmware(path)?;
        let data = fs::read(path)?;
        debug!("read {} bytes from {}", data.len(), path.display());
        Self::new(path, data, block_size)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn is_done(&self) -> bool {
        self.offset >= self.data.len()
    }

    /// Share of the image already written, rounded down
    pub fn percent(&self) -> u8 {
        (self.offset as u64 * 100 / self.data.len() as u64) as u8
    }

    fn block(&self) -> Option<&[u8]> {
        if self.is_done() {
            return None;
        }
        let end = (self.offset + self.block_size).min(self.data.len());
        Some(&self.data[self.offset..end])
    }

    fn advance(&mut self) {
        self.offset = (self.offset + self.block_size).min(self.data.len());
    }
}

/// Erase and write every block of `job` starting at `load_address`, then
/// manifest the image
///
/// `progress` is called with the job percentage before each block. The
/// first failing erase or write stops the job; nothing is manifested then.
pub fn flash<L: DfuLink>(
    link: &L,
    job: &mut FlashJob,
    load_address: u32,
    mut progress: impl FnMut(u8),
) -> Result<(), ManagerError> {
    info!(
        "Flashing {} ({} bytes, {} byte blocks) @ 0x{:08x}",
        job.path().display(),
        job.len(),
        job.block_size(),
        load_address
    );
    link.make_idle()?;

    while let Some(block) = job.block() {
        progress(job.percent());
        let address = load_address.wrapping_add(job.offset() as u32);
        link.erase_page(address)
            .map_err(|source| ManagerError::EraseFailed { address, source })?;
        link.write_block(address, block)
            .map_err(|source| ManagerError::WriteFailed { address, source })?;
        job.advance();
    }

    debug!("manifesting {} bytes", job.len());
    link.manifest().map_err(ManagerError::ManifestFailed)
}
