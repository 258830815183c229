use dfu_manager::{ManagerConfig, NusbTransport, SharedProfile, scan};

use crate::CliError;

pub(crate) fn list_devices(config: &ManagerConfig) -> Result<(), CliError> {
    let shared = SharedProfile::default();
    match scan(&NusbTransport, &config.catalog, &shared) {
        None => println!("No compatible device found"),
        Some(matched) => {
            let desc = &matched.descriptor;
            println!(
                "Bus {} Device {:03}: ID {:04x}:{:04x} {} / {}",
                desc.bus_id,
                desc.address,
                desc.vendor_id,
                desc.product_id,
                desc.manufacturer,
                desc.product,
            );
            println!(
                "  {} byte blocks, {}K flash",
                matched.profile.block_size,
                matched.profile.flash_size / 1024,
            );
        }
    }
    Ok(())
}
