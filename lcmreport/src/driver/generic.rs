//! Generic driver implementation that works with any platform definition.

use std::future::Future;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use bytes::Bytes;
use log::{debug, trace, warn};
use russh::client::Msg;
use russh::{Channel, ChannelMsg};

use super::response::Response;
use crate::channel::{PatternBuffer, Transcript};
use crate::error::{ChannelError, DriverError, Error, Result};
use crate::platform::PlatformDefinition;
use crate::transport::{SshConfig, SshTransport};

/// How long the channel must stay silent before a resync counts as done.
const RESYNC_QUIET: Duration = Duration::from_millis(250);

/// Byte stream of an interactive shell.
pub trait ShellChannel: Send {
    /// Write bytes to the shell.
    fn write(&mut self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Next chunk of output, or `None` once the shell is gone.
    fn read(&mut self) -> impl Future<Output = Option<Bytes>> + Send;

    /// Signal end of input.
    fn send_eof(&mut self) -> impl Future<Output = Result<()>> + Send;
}

impl ShellChannel for Channel<Msg> {
    async fn write(&mut self, data: &[u8]) -> Result<()> {
        self.data(data).await.map_err(ChannelError::Ssh)?;
        Ok(())
    }

    async fn read(&mut self) -> Option<Bytes> {
        loop {
            match self.wait().await {
                Some(ChannelMsg::Data { data }) => return Some(Bytes::copy_from_slice(&data)),
                Some(ChannelMsg::ExtendedData { data, .. }) => {
                    return Some(Bytes::copy_from_slice(&data));
                }
                Some(ChannelMsg::Eof | ChannelMsg::Close) | None => return None,
                Some(other) => trace!("ignoring channel message {other:?}"),
            }
        }
    }

    async fn send_eof(&mut self) -> Result<()> {
        self.eof().await.map_err(ChannelError::Ssh)?;
        Ok(())
    }
}

/// Generic driver that works with any platform definition.
///
/// This handles:
/// - SSH transport and PTY channel management
/// - Command execution with prompt detection
/// - Failure-marker detection in command output
/// - Session transcript writing
///
/// A command that times out leaves the shell mid-answer. The next command
/// first sends a bare return and discards everything up to the prompt, so
/// late output is never attributed to the wrong command.
pub struct GenericDriver<C = Channel<Msg>> {
    /// SSH configuration.
    ssh_config: SshConfig,

    /// Platform definition.
    platform: PlatformDefinition,

    /// SSH transport (None when disconnected).
    transport: Option<SshTransport>,

    /// Interactive shell channel (None when disconnected).
    channel: Option<C>,

    /// Output accumulated since the last prompt.
    buffer: PatternBuffer,

    /// Where the session transcript goes, if anywhere.
    session_log: Option<PathBuf>,

    /// Open transcript while connected.
    transcript: Option<Transcript>,

    /// Timeout for prompt waits.
    timeout: Duration,

    /// Set after a prompt timeout until the shell is back at a prompt.
    out_of_sync: bool,
}

impl GenericDriver {
    /// Create a new generic driver.
    pub fn new(
        ssh_config: SshConfig,
        platform: PlatformDefinition,
        session_log: Option<PathBuf>,
    ) -> Self {
        let timeout = ssh_config.timeout;
        Self {
            ssh_config,
            platform,
            transport: None,
            channel: None,
            buffer: PatternBuffer::default(),
            session_log,
            transcript: None,
            timeout,
            out_of_sync: false,
        }
    }

    /// Open the connection, wait for the first prompt and run the platform's
    /// on-open commands.
    ///
    /// The transcript file is created before connecting. On failure the
    /// connection is torn down again; the (possibly empty) transcript is left
    /// for the caller to clean up.
    pub async fn open(&mut self) -> Result<()> {
        if self.transport.is_some() {
            return Err(DriverError::AlreadyConnected.into());
        }

        if let Some(path) = self.session_log.clone() {
            self.transcript = Some(Transcript::open(path).await?);
        }

        if let Err(e) = self.establish().await {
            if let Err(close_err) = self.close().await {
                debug!("teardown after failed open: {close_err}");
            }
            self.transcript = None;
            return Err(e);
        }
        Ok(())
    }

    async fn establish(&mut self) -> Result<()> {
        let transport = SshTransport::connect(self.ssh_config.clone()).await?;
        let channel = transport.open_channel().await?;
        self.transport = Some(transport);
        self.channel = Some(channel);

        self.read_until_prompt().await?;

        for command in self.platform.on_open_commands.clone() {
            let response = self.send_command(&command).await?;
            if !response.is_success() {
                warn!(
                    "{}: on-open command '{}' rejected: {:?}",
                    self.ssh_config.host, command, response.failure_message
                );
            }
        }
        Ok(())
    }
}

impl<C: ShellChannel> GenericDriver<C> {
    /// Get a reference to the platform definition.
    pub fn platform(&self) -> &PlatformDefinition {
        &self.platform
    }

    /// Host this driver connects to.
    pub fn host(&self) -> &str {
        &self.ssh_config.host
    }

    /// Check if the driver is connected.
    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    /// Close the connection.
    pub async fn close(&mut self) -> Result<()> {
        if let Some(mut channel) = self.channel.take() {
            if let Err(e) = channel.send_eof().await {
                trace!("channel eof: {e}");
            }
        }

        self.buffer.clear();
        self.transcript = None;
        self.out_of_sync = false;

        if let Some(transport) = self.transport.take() {
            transport.close().await?;
        }
        Ok(())
    }

    /// Send a command and wait for the prompt.
    ///
    /// A response carrying one of the platform's failure markers is still
    /// `Ok`; inspect [`Response::is_success`].
    pub async fn send_command(&mut self, command: &str) -> Result<Response> {
        if self.out_of_sync {
            self.resync().await?;
        }

        let start = Instant::now();
        let line = format!("{command}\n");
        self.channel_mut()?.write(line.as_bytes()).await?;

        let data = match self.read_until_prompt().await {
            Ok(data) => data,
            Err(e) => {
                if matches!(e, Error::Channel(ChannelError::PatternTimeout(_))) {
                    warn!(
                        "{}: '{}' timed out, shell will be resynchronised",
                        self.ssh_config.host, command
                    );
                    self.buffer.clear();
                    self.out_of_sync = true;
                }
                return Err(e);
            }
        };
        let elapsed = start.elapsed();

        let raw = String::from_utf8_lossy(&data);
        let result = self.platform.normalize_output(&raw, command);
        let failure = self.platform.detect_failure(&result);

        debug!(
            "{}: '{}' completed in {:?}",
            self.ssh_config.host, command, elapsed
        );

        let response = Response::new(command, result, elapsed);
        Ok(match failure {
            Some(marker) => response.with_failure(marker),
            None => response,
        })
    }

    /// Bring the shell back to a fresh prompt after a timed-out command.
    ///
    /// Sends a bare return, waits for a prompt, then keeps discarding output
    /// until the channel has been quiet for [`RESYNC_QUIET`]: the late answer
    /// and the answer to the return each end in a prompt.
    async fn resync(&mut self) -> Result<()> {
        debug!("{}: resynchronising shell", self.ssh_config.host);
        self.channel_mut()?.write(b"\n").await?;
        self.read_until_prompt().await?;

        loop {
            let channel = self.channel_mut()?;
            match tokio::time::timeout(RESYNC_QUIET, channel.read()).await {
                Err(_) => break,
                Ok(Some(data)) => self.ingest(&data).await?,
                Ok(None) => return Err(ChannelError::Closed.into()),
            }
        }

        self.buffer.clear();
        self.out_of_sync = false;
        Ok(())
    }

    /// Read until the prompt appears at the end of the buffer.
    async fn read_until_prompt(&mut self) -> Result<Bytes> {
        let deadline = tokio::time::Instant::now() + self.timeout;
        let timeout = self.timeout;

        loop {
            if self.buffer.tail_contains(&self.platform.prompt_pattern) {
                return Ok(self.buffer.take());
            }

            let channel = self.channel_mut()?;
            let data = tokio::time::timeout_at(deadline, channel.read())
                .await
                .map_err(|_| ChannelError::PatternTimeout(timeout))?
                .ok_or(ChannelError::Closed)?;
            self.ingest(&data).await?;
        }
    }

    fn channel_mut(&mut self) -> Result<&mut C> {
        Ok(self.channel.as_mut().ok_or(DriverError::NotConnected)?)
    }

    async fn ingest(&mut self, data: &[u8]) -> Result<()> {
        let appended = self.buffer.extend(data);
        trace!("read {} bytes", appended.len());
        if let Some(transcript) = self.transcript.as_mut() {
            transcript.record(appended).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use secrecy::SecretString;

    use super::*;
    use crate::platform::vendors::cisco;
    use crate::transport::HostKeyVerification;

    /// What the fake shell emits after a write.
    enum Emit {
        Data(&'static str),
        /// Nothing more until the next write.
        Stall,
    }

    /// Shell that answers each write with a scripted list of emits. Output
    /// not yet delivered when a stall is hit comes out after the next write.
    struct FakeChannel {
        script: VecDeque<Vec<Emit>>,
        pending: VecDeque<Emit>,
        written: Arc<Mutex<Vec<String>>>,
    }

    impl FakeChannel {
        fn new(script: Vec<Vec<Emit>>) -> (Self, Arc<Mutex<Vec<String>>>) {
            let written = Arc::new(Mutex::new(Vec::new()));
            let channel = Self {
                script: script.into(),
                pending: VecDeque::new(),
                written: written.clone(),
            };
            (channel, written)
        }
    }

    impl ShellChannel for FakeChannel {
        async fn write(&mut self, data: &[u8]) -> Result<()> {
            self.written
                .lock()
                .unwrap()
                .push(String::from_utf8_lossy(data).into_owned());
            if let Some(emits) = self.script.pop_front() {
                self.pending.extend(emits);
            }
            Ok(())
        }

        async fn read(&mut self) -> Option<Bytes> {
            match self.pending.pop_front() {
                Some(Emit::Data(text)) => Some(Bytes::from_static(text.as_bytes())),
                Some(Emit::Stall) | None => std::future::pending().await,
            }
        }

        async fn send_eof(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn driver(channel: FakeChannel, timeout: Duration) -> GenericDriver<FakeChannel> {
        let platform = cisco::iosxe().unwrap();
        GenericDriver {
            ssh_config: SshConfig {
                host: "192.0.2.10".into(),
                port: 22,
                username: "admin".into(),
                password: SecretString::from("secret".to_string()),
                timeout,
                terminal_width: platform.terminal_width,
                terminal_height: platform.terminal_height,
                host_key_verification: HostKeyVerification::Disabled,
                known_hosts_path: None,
            },
            platform,
            transport: None,
            channel: Some(channel),
            buffer: PatternBuffer::default(),
            session_log: None,
            transcript: None,
            timeout,
            out_of_sync: false,
        }
    }

    #[tokio::test]
    async fn test_send_command_normalizes_output() {
        let (channel, _) = FakeChannel::new(vec![vec![
            Emit::Data("show clock\r\n"),
            Emit::Data("*10:01:02.123 UTC Mon Oct 5 2026\r\nsw1#"),
        ]]);
        let mut driver = driver(channel, Duration::from_secs(1));

        let response = driver.send_command("show clock").await.unwrap();
        assert!(response.is_success());
        assert_eq!(response.result, "*10:01:02.123 UTC Mon Oct 5 2026");
    }

    #[tokio::test]
    async fn test_failure_marker_detected() {
        let (channel, _) = FakeChannel::new(vec![vec![Emit::Data(
            "show swtich\r\n% Invalid input detected at '^' marker.\r\nsw1#",
        )]]);
        let mut driver = driver(channel, Duration::from_secs(1));

        let response = driver.send_command("show swtich").await.unwrap();
        assert_eq!(
            response.failure_message.as_deref(),
            Some("% Invalid input detected")
        );
    }

    #[tokio::test]
    async fn test_late_output_does_not_shift_next_command() {
        let (channel, written) = FakeChannel::new(vec![
            vec![
                Emit::Data("show version\r\nCisco IOS XE Software, Version 17.9.4a\r\n"),
                Emit::Stall,
                Emit::Data("sw1 uptime is 3 weeks\r\nsw1#"),
            ],
            vec![Emit::Data("\r\nsw1#")],
            vec![Emit::Data("show switch\r\n*1 Active 00a3.d1e5.2b00\r\nsw1#")],
        ]);
        let mut driver = driver(channel, Duration::from_millis(100));

        let err = driver.send_command("show version").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Channel(ChannelError::PatternTimeout(_))
        ));

        let response = driver.send_command("show switch").await.unwrap();
        assert_eq!(response.result, "*1 Active 00a3.d1e5.2b00");
        assert_eq!(
            *written.lock().unwrap(),
            ["show version\n", "\n", "show switch\n"]
        );
    }

    #[tokio::test]
    async fn test_failed_resync_keeps_driver_out_of_sync() {
        let (channel, written) = FakeChannel::new(vec![
            vec![Emit::Data("show version\r\n"), Emit::Stall],
            vec![Emit::Stall],
            vec![Emit::Data("\r\nsw1#")],
            vec![Emit::Data("show switch\r\n*1 Active 00a3.d1e5.2b00\r\nsw1#")],
        ]);
        let mut driver = driver(channel, Duration::from_millis(100));

        assert!(driver.send_command("show version").await.is_err());
        assert!(driver.send_command("show switch").await.is_err());
        let response = driver.send_command("show switch").await.unwrap();

        assert_eq!(response.result, "*1 Active 00a3.d1e5.2b00");
        assert_eq!(
            *written.lock().unwrap(),
            ["show version\n", "\n", "\n", "show switch\n"]
        );
    }

    #[tokio::test]
    async fn test_closed_channel() {
        let (channel, _) = FakeChannel::new(vec![]);
        let mut driver = driver(channel, Duration::from_secs(1));
        driver.close().await.unwrap();

        let err = driver.send_command("show version").await.unwrap_err();
        assert!(matches!(err, Error::Driver(DriverError::NotConnected)));
    }
}
