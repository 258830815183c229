use std::{num::NonZeroU8, time::Duration};

use nusb::{self, MaybeFuture};

pub(crate) const DFU_CLASS: u8 = 0xFE;
pub(crate) const DFU_SUBCLASS: u8 = 0x1;

/// Alternate setting as found while walking a device's
/// configuration / interface / alternate setting descriptors
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DfuAltSetting {
    config: u8,
    interface: u8,
    alt_setting: u8,
    class: u8,
    subclass: u8,
}

impl DfuAltSetting {
    pub fn new(
        config: u8,
        interface: u8,
        alt_setting: u8,
        class: u8,
        subclass: u8,
    ) -> Self {
        Self {
            config,
            interface,
            alt_setting,
            class,
            subclass,
        }
    }

    pub fn config(&self) -> u8 {
        self.config
    }
    pub fn interface(&self) -> u8 {
        self.interface
    }
    pub fn alt_setting(&self) -> u8 {
        self.alt_setting
    }
    pub fn class(&self) -> u8 {
        self.class
    }
    pub fn subclass(&self) -> u8 {
        self.subclass
    }

    /// Application specific class (`0xFE`), DFU subclass (`0x01`)
    pub fn is_dfu(&self) -> bool {
        self.class == DFU_CLASS && self.subclass == DFU_SUBCLASS
    }
}

pub(crate) fn get_string_descriptor(
    device: &nusb::Device,
    desc_index: NonZeroU8,
    timeout: Duration,
) -> Option<String> {
    let language: u16 = device
        .get_string_descriptor_supported_languages(timeout)
        .wait()
        .ok()?
        .next()
        .unwrap_or(nusb::descriptors::language_id::US_ENGLISH);

    device
        .get_string_descriptor(desc_index, language, timeout)
        .wait()
        .ok()
}
