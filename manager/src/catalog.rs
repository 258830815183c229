use nonempty::{NonEmpty, nonempty};

/// Vendors worth probing: ST Microelectronics and OpenMoko (Black Magic)
pub const ST_VENDOR_ID: u16 = 0x0483;
pub const OPENMOKO_VENDOR_ID: u16 = 0x1d50;

/// Flash geometry of a supported bootloader
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceProfile {
    /// Erase / write granularity in bytes
    pub block_size: u32,
    /// Size of the flash region in bytes
    pub flash_size: u32,
}

impl DeviceProfile {
    pub const SMALL: DeviceProfile = DeviceProfile {
        block_size: 1024,
        flash_size: 0x20000,
    };
    pub const LARGE: DeviceProfile = DeviceProfile {
        block_size: 2048,
        flash_size: 0x40000,
    };
}

impl Default for DeviceProfile {
    fn default() -> Self {
        DeviceProfile::SMALL
    }
}

/// Known bootloader identity
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogEntry {
    pub vendor_ids: NonEmpty<u16>,
    pub product_ids: NonEmpty<u16>,
    pub manufacturer: String,
    pub product: String,
    pub profile: DeviceProfile,
}

impl CatalogEntry {
    pub fn matches(
        &self,
        vendor_id: u16,
        product_id: u16,
        manufacturer: &str,
        product: &str,
    ) -> bool {
        self.vendor_ids.contains(&vendor_id)
            && self.product_ids.contains(&product_id)
            && self.manufacturer == manufacturer
            && self.product == product
    }
}

/// Table of supported bootloaders
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Profile of the first entry matching ids and strings exactly
    pub fn lookup(
        &self,
        vendor_id: u16,
        product_id: u16,
        manufacturer: &str,
        product: &str,
    ) -> Option<DeviceProfile> {
        self.entries
            .iter()
            .find(|entry| {
                entry.matches(vendor_id, product_id, manufacturer, product)
            })
            .map(|entry| entry.profile)
    }

    /// Vendor ids appearing in any entry, without duplicates
    pub fn vendor_ids(&self) -> Vec<u16> {
        let mut ids: Vec<u16> = self
            .entries
            .iter()
            .flat_map(|entry| entry.vendor_ids.iter().copied())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    pub fn accepts_vendor(&self, vendor_id: u16) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.vendor_ids.contains(&vendor_id))
    }
}

impl Default for Catalog {
    fn default() -> Self {
        let vendors = nonempty![ST_VENDOR_ID, OPENMOKO_VENDOR_ID];
        Catalog::new(vec![
            CatalogEntry {
                vendor_ids: vendors.clone(),
                product_ids: nonempty![0x5740, 0x6018],
                manufacturer: "Black Sphere Technologies".into(),
                product: "Black Magic Firmware Upgrade".into(),
                profile: DeviceProfile::SMALL,
            },
            CatalogEntry {
                vendor_ids: vendors.clone(),
                product_ids: nonempty![0xDF11, 0x6017],
                manufacturer: "Black Sphere Technologies".into(),
                product: "Black Magic Probe (Upgrade)".into(),
                profile: DeviceProfile::SMALL,
            },
            CatalogEntry {
                vendor_ids: vendors,
                product_ids: nonempty![0x600F],
                manufacturer: "Transition Robotics Inc.".into(),
                product: "Lisa/M (Upgrade) V1.0".into(),
                profile: DeviceProfile::LARGE,
            },
        ])
    }
}
