use std::{fmt::Display, io};

use dfu::DfuError;

/// Why a firmware file was refused before any device I/O
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileProblem {
    NotFound,
    NotAFile,
    Empty,
}

impl Display for FileProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileProblem::NotFound => {
                write!(f, "The file you selected does not exist!")
            }
            FileProblem::NotAFile => {
                write!(f, "The \"file\" you selected is not a file!")
            }
            FileProblem::Empty => write!(f, "The file is empty!"),
        }
    }
}

#[derive(Debug)]
pub enum ManagerError {
    Dfu(DfuError),
    Io(io::Error),
    DeviceNotFound,
    DeviceInAppMode,
    InterfaceClaimFailed,
    FileInvalid(FileProblem),
    EraseFailed { address: u32, source: DfuError },
    WriteFailed { address: u32, source: DfuError },
    ManifestFailed(DfuError),
    ManagerStopped,
}

impl std::error::Error for ManagerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ManagerError::Dfu(err)
            | ManagerError::EraseFailed { source: err, .. }
            | ManagerError::WriteFailed { source: err, .. }
            | ManagerError::ManifestFailed(err) => Some(err),
            ManagerError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl Display for ManagerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ManagerError::Dfu(err) => write!(f, "DFU error: {err}"),
            ManagerError::Io(err) => write!(f, "IO error: {err}"),
            ManagerError::DeviceNotFound => {
                write!(f, "No compatible device found")
            }
            ManagerError::DeviceInAppMode => {
                write!(f, "Device is running its application firmware")
            }
            ManagerError::InterfaceClaimFailed => {
                write!(f, "No claimable DFU interface")
            }
            ManagerError::FileInvalid(problem) => write!(f, "{problem}"),
            ManagerError::EraseFailed { address, source } => {
                write!(f, "Erasing page @ 0x{address:08x} failed: {source}")
            }
            ManagerError::WriteFailed { address, source } => {
                write!(f, "Writing block @ 0x{address:08x} failed: {source}")
            }
            ManagerError::ManifestFailed(err) => {
                write!(f, "Manifestation failed: {err}")
            }
            ManagerError::ManagerStopped => {
                write!(f, "Device manager is not running")
            }
        }
    }
}

impl From<DfuError> for ManagerError {
    fn from(value: DfuError) -> Self {
        ManagerError::Dfu(value)
    }
}

impl From<io::Error> for ManagerError {
    fn from(value: io::Error) -> Self {
        ManagerError::Io(value)
    }
}

impl From<FileProblem> for ManagerError {
    fn from(value: FileProblem) -> Self {
        ManagerError::FileInvalid(value)
    }
}
