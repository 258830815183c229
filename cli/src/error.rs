use std::{fmt::Display, io};

use dfu_manager::ManagerError;

pub enum CliError {
    IO(io::Error),
    Manager(ManagerError),
    NoDevice,
    FlashFailed(ManagerError),
}

impl From<io::Error> for CliError {
    fn from(value: io::Error) -> Self {
        CliError::IO(value)
    }
}

impl From<ManagerError> for CliError {
    fn from(value: ManagerError) -> Self {
        CliError::Manager(value)
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::IO(err) => write!(f, "IO error: {err}"),
            CliError::Manager(err) => write!(f, "{err}"),
            CliError::NoDevice => write!(f, "No device connected"),
            CliError::FlashFailed(err) => write!(f, "Flashing failed: {err}"),
        }
    }
}
