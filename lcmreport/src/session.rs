//! Remote-shell sessions.
//!
//! [`RemoteShell`] and [`ShellSession`] are the seam between polling and the
//! SSH machinery: the poller only ever opens, sends and closes. [`SshShell`]
//! is the production implementation on top of [`GenericDriver`].
//! [`SessionHandle`] wraps any session with the per-device bookkeeping:
//! logging, turning open errors into a failure value, and removing the
//! transcript of a device that never produced any output.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use log::{info, warn};

use crate::channel::transcript;
use crate::config::DeviceDescriptor;
use crate::driver::{DriverBuilder, GenericDriver, Response};
use crate::error::Result;
use crate::platform::PlatformRegistry;
use crate::transport::HostKeyVerification;

/// Capability to open an interactive session to a device.
pub trait RemoteShell: Send + Sync {
    /// Session type produced by [`open`](Self::open).
    type Session: ShellSession;

    /// Connect and authenticate, writing the transcript to
    /// `device.session_log`.
    fn open(&self, device: &DeviceDescriptor)
    -> impl Future<Output = Result<Self::Session>> + Send;
}

/// One open interactive session.
pub trait ShellSession: Send {
    /// Send a command and wait for the device to finish answering.
    fn send(&mut self, command: &str) -> impl Future<Output = Result<Response>> + Send;

    /// Release the connection.
    fn close(self) -> impl Future<Output = Result<()>> + Send;
}

/// SSH-backed [`RemoteShell`].
#[derive(Debug, Clone)]
pub struct SshShell {
    registry: PlatformRegistry,
    timeout: Duration,
    host_key_verification: HostKeyVerification,
    known_hosts: Option<PathBuf>,
}

impl SshShell {
    pub fn new(registry: PlatformRegistry, timeout: Duration) -> Self {
        Self {
            registry,
            timeout,
            host_key_verification: HostKeyVerification::default(),
            known_hosts: None,
        }
    }

    /// Require hosts to be present in known_hosts.
    pub fn with_host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    /// Check host keys against this file instead of ~/.ssh/known_hosts.
    pub fn with_known_hosts(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts = Some(path.into());
        self
    }
}

impl RemoteShell for SshShell {
    type Session = GenericDriver;

    async fn open(&self, device: &DeviceDescriptor) -> Result<GenericDriver> {
        let mut builder = DriverBuilder::new(&device.host)
            .port(device.port)
            .username(&device.username)
            .password(device.password.clone())
            .platform(&device.device_type)
            .session_log(&device.session_log)
            .timeout(self.timeout)
            .host_key_verification(self.host_key_verification.clone());
        if let Some(path) = &self.known_hosts {
            builder = builder.known_hosts_path(path);
        }
        let mut driver = builder.build(&self.registry)?;

        driver.open().await?;
        Ok(driver)
    }
}

impl ShellSession for GenericDriver {
    async fn send(&mut self, command: &str) -> Result<Response> {
        self.send_command(command).await
    }

    async fn close(mut self) -> Result<()> {
        GenericDriver::close(&mut self).await
    }
}

/// Why a session could not be opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFailure {
    pub cause: String,
}

/// An open session bound to the device it was opened for.
pub struct SessionHandle<S> {
    device: String,
    host: String,
    session: S,
}

impl<S: ShellSession> SessionHandle<S> {
    /// Open a session to `device`.
    ///
    /// Never fails with an error: unreachable hosts, rejected logins and
    /// unsupported device types come back as a [`SessionFailure`], with an
    /// empty transcript removed from disk.
    pub async fn open<R>(shell: &R, device: &DeviceDescriptor) -> std::result::Result<Self, SessionFailure>
    where
        R: RemoteShell<Session = S>,
    {
        info!("{}", "*".repeat(60));
        info!("Starting connection to device: {} ({})", device.name, device.host);
        info!("{}", "*".repeat(60));

        match shell.open(device).await {
            Ok(session) => Ok(Self {
                device: device.name.clone(),
                host: device.host.clone(),
                session,
            }),
            Err(e) => {
                warn!(
                    "Failed to connect to device: {} ({}): {e}",
                    device.name, device.host
                );
                if let Err(cleanup) = transcript::remove_if_empty(&device.session_log).await {
                    warn!(
                        "Cannot remove transcript {}: {cleanup}",
                        device.session_log.display()
                    );
                }
                Err(SessionFailure {
                    cause: e.to_string(),
                })
            }
        }
    }

    /// Name of the device this session belongs to.
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Borrow the underlying session for sending commands.
    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    /// Close the session. Close errors are logged, not returned.
    pub async fn close(self) {
        match self.session.close().await {
            Ok(()) => info!(
                "Successfully closed connection to device: {} ({})",
                self.device, self.host
            ),
            Err(e) => warn!(
                "Error while closing connection to device: {} ({}): {e}",
                self.device, self.host
            ),
        }
    }
}
