//! Device thread
//!
//! A single thread owns the [`Supervisor`] and therefore every device
//! handle. Requests reach it through a channel, results leave it as
//! [`Notification`]s on another one; neither side ever blocks on the other.

use std::{
    path::{Path, PathBuf},
    sync::mpsc::{self, Receiver, RecvTimeoutError, Sender},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use log::{debug, error, info};

use crate::{
    DeviceProfile, FlashJob, LinkState, ManagerConfig, ManagerError,
    SharedProfile, Supervisor, flash::flash, transport::UsbBus,
    validate_firmware,
};

/// Requests accepted by the device thread
#[derive(Debug)]
pub enum Request {
    /// Rescan right away
    FindDevice,
    /// Flash the image at the given path into the connected bootloader
    Flash(PathBuf),
    Shutdown,
}

/// Events emitted by the device thread
#[derive(Debug)]
pub enum Notification {
    /// A bootloader is connected, at the given `bus:device` location
    DeviceFound(String),
    DeviceLost,
    FlashProgress(u8),
    FlashFinished(Result<(), ManagerError>),
}

/// Periodic rescan deadline; stopped while a flash job runs
struct Ticker {
    interval: Duration,
    deadline: Option<Instant>,
}

impl Ticker {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    fn start(&mut self) {
        self.deadline = Some(Instant::now() + self.interval);
    }

    fn stop(&mut self) {
        self.deadline = None;
    }

    fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }
}

/// State owned by the device thread
pub struct DeviceManager<B: UsbBus> {
    supervisor: Supervisor<B>,
    load_address: u32,
    ticker: Ticker,
    notifications: Sender<Notification>,
}

impl<B: UsbBus> DeviceManager<B> {
    pub fn new(
        bus: B,
        config: ManagerConfig,
        shared: SharedProfile,
        notifications: Sender<Notification>,
    ) -> Self {
        Self {
            supervisor: Supervisor::new(
                bus,
                config.catalog,
                shared,
                config.detach_timeout,
            ),
            load_address: config.load_address,
            ticker: Ticker::new(config.scan_interval),
            notifications,
        }
    }

    pub fn state(&self) -> LinkState {
        self.supervisor.state()
    }

    fn notify(&self, notification: Notification) {
        // nobody listening is not an error for the device thread
        self.notifications.send(notification).ok();
    }

    /// One supervisor tick, reported as found / lost
    pub fn find_device(&mut self) {
        match self.supervisor.tick() {
            Ok(location) => self.notify(Notification::DeviceFound(location)),
            Err(err) => {
                debug!("no usable device: {err}");
                self.notify(Notification::DeviceLost);
            }
        }
    }

    /// Run a complete flash job with the periodic rescan suspended
    pub fn flash_file(&mut self, path: &Path) {
        self.ticker.stop();
        let result = self.run_job(path);
        match &result {
            Ok(()) => info!("Done flashing {}", path.display()),
            Err(err) => error!("Flashing {} failed: {err}", path.display()),
        }
        self.notify(Notification::FlashFinished(result));
        self.ticker.start();
    }

    fn run_job(&mut self, path: &Path) -> Result<(), ManagerError> {
        let block_size = match self.supervisor.connection() {
            Some(connection)
                if self.supervisor.state()
                    == LinkState::ConnectedBootloaderMode =>
            {
                connection.profile().block_size
            }
            _ => return Err(ManagerError::DeviceNotFound),
        };
        let mut job = match FlashJob::load(path, block_size) {
            Ok(job) => job,
            Err(err) => {
                self.supervisor.release();
                return Err(err);
            }
        };
        let connection = self
            .supervisor
            .take_connection()
            .ok_or(ManagerError::DeviceNotFound)?;

        let notifications = &self.notifications;
        let result =
            flash(connection.link(), &mut job, self.load_address, |percent| {
                notifications.send(Notification::FlashProgress(percent)).ok();
            });
        connection.close();
        result
    }

    /// Serve requests until shutdown or until every sender is gone
    pub fn run(mut self, requests: Receiver<Request>) {
        self.find_device();
        self.ticker.start();
        loop {
            let request = match self.ticker.remaining() {
                Some(timeout) => requests.recv_timeout(timeout),
                None => requests
                    .recv()
                    .map_err(|_| RecvTimeoutError::Disconnected),
            };
            match request {
                Ok(Request::FindDevice) | Err(RecvTimeoutError::Timeout) => {
                    self.find_device();
                    self.ticker.start();
                }
                Ok(Request::Flash(path)) => self.flash_file(&path),
                Ok(Request::Shutdown)
                | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        debug!("device thread stopping");
        self.supervisor.release();
    }
}

/// Request side of a running device thread
///
/// Dropping the handle stops the thread, after any flash job in progress
/// has finished.
pub struct ManagerHandle {
    requests: Sender<Request>,
    shared: SharedProfile,
    worker: Option<JoinHandle<()>>,
}

impl ManagerHandle {
    /// Start the device thread on `bus`
    pub fn spawn<B>(
        bus: B,
        config: ManagerConfig,
    ) -> Result<(Self, Receiver<Notification>), ManagerError>
    where
        B: UsbBus + Send + 'static,
    {
        let (request_tx, request_rx) = mpsc::channel();
        let (notify_tx, notify_rx) = mpsc::channel();
        let shared = SharedProfile::new(DeviceProfile::default());

        let worker = {
            let shared = shared.clone();
            thread::Builder::new().name("dfu-manager".into()).spawn(
                move || {
                    DeviceManager::new(bus, config, shared, notify_tx)
                        .run(request_rx)
                },
            )?
        };

        Ok((
            Self {
                requests: request_tx,
                shared,
                worker: Some(worker),
            },
            notify_rx,
        ))
    }

    fn send(&self, request: Request) -> Result<(), ManagerError> {
        self.requests
            .send(request)
            .map_err(|_| ManagerError::ManagerStopped)
    }

    pub fn find_device(&self) -> Result<(), ManagerError> {
        self.send(Request::FindDevice)
    }

    /// Queue a flash job
    ///
    /// The file is checked here, so an invalid path is reported right away
    /// and never reaches the device thread.
    pub fn flash(&self, path: impl AsRef<Path>) -> Result<(), ManagerError> {
        let path = path.as_ref();
        validate_firmware(path)?;
        self.send(Request::Flash(path.to_path_buf()))
    }

    pub fn flash_size(&self) -> u32 {
        self.shared.flash_size()
    }

    pub fn profile(&self) -> DeviceProfile {
        self.shared.get()
    }

    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            self.requests.send(Request::Shutdown).ok();
            if worker.join().is_err() {
                error!("device thread panicked");
            }
        }
    }
}

impl Drop for ManagerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
