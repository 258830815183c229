use std::{path::PathBuf, process::ExitCode, time::Duration};

use clap::{Args, Parser, Subcommand};
use clap_num::maybe_hex;

use dfu_manager::{
    DEFAULT_DETACH_TIMEOUT, DEFAULT_SCAN_INTERVAL, LOAD_ADDRESS, ManagerConfig,
};
use error::CliError;
use list::*;
use watch::*;
use write::*;

mod error;
mod list;
mod watch;
mod write;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    options: ManagerOptions,
}

#[derive(Args)]
struct ManagerOptions {
    /// rescan interval in milliseconds
    #[clap(long, global = true, default_value_t = DEFAULT_SCAN_INTERVAL.as_millis() as u64)]
    interval: u64,
    /// detach timeout in milliseconds for devices in application mode
    #[clap(long, global = true, default_value_t = DEFAULT_DETACH_TIMEOUT.as_millis() as u64)]
    detach_timeout: u64,
    /// firmware load address (ex: 0x08002000)
    #[clap(long, global = true, value_parser=maybe_hex::<u32>, default_value_t = LOAD_ADDRESS)]
    load_address: u32,
}

#[derive(Subcommand)]
enum Commands {
    /// show the connected bootloader, if any
    List,
    /// report devices as they come and go
    Watch,
    /// write a firmware image
    Flash {
        /// raw binary image
        file: PathBuf,
        /// seconds to wait for a bootloader to show up
        #[clap(short, long, default_value_t = 30)]
        wait: u64,
    },
}

impl Default for Commands {
    fn default() -> Self {
        Commands::List
    }
}

impl ManagerOptions {
    fn config(&self) -> ManagerConfig {
        ManagerConfig {
            scan_interval: Duration::from_millis(self.interval),
            detach_timeout: Duration::from_millis(self.detach_timeout),
            load_address: self.load_address,
            ..ManagerConfig::default()
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::init();

    let config = cli.options.config();
    if let Err(err) = match cli.command.unwrap_or_default() {
        Commands::List => list_devices(&config),
        Commands::Watch => watch_devices(config),
        Commands::Flash { file, wait } => {
            flash_file(&file, config, Duration::from_secs(wait))
        }
    } {
        eprintln!("Error: {err}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
