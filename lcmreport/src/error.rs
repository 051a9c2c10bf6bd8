//! Error types for lcmreport.
//!
//! Failures that belong to a single device or a single command are never
//! surfaced through these types past the poller; they are recorded as
//! [`CommandResult`](crate::poller::CommandResult) and
//! [`DeviceOutcome`](crate::poller::DeviceOutcome) values instead.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Main error type for lcmreport operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Driver-level errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Platform/device-type errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Inventory, schema and environment errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Spreadsheet report errors
    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    /// Notification delivery errors
    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// Host key is not present in known_hosts and strict checking is on
    #[error("Host key for {host}:{port} is not in known_hosts")]
    HostKeyUnknown { host: String, port: u16 },

    /// Host key differs from the one in known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// known_hosts could not be read
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Connection was closed unexpectedly
    #[error("Connection disconnected")]
    Disconnected,

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Channel layer errors (prompt matching, transcript).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Prompt was not seen within the timeout
    #[error("Pattern not found within {0:?}")]
    PatternTimeout(std::time::Duration),

    /// Channel closed unexpectedly
    #[error("Channel closed")]
    Closed,

    /// SSH protocol error on the channel
    #[error("Channel SSH error: {0}")]
    Ssh(russh::Error),

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Session transcript could not be written
    #[error("Transcript {path}: {source}")]
    Transcript {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Driver layer errors.
#[derive(Error, Debug)]
pub enum DriverError {
    /// Driver not connected
    #[error("Driver not connected - call open() first")]
    NotConnected,

    /// Driver already connected
    #[error("Driver already connected")]
    AlreadyConnected,

    /// Invalid configuration in the driver builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Platform/device-type definition errors.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Device type has no registered platform
    #[error("Unsupported device type '{name}'")]
    UnknownPlatform { name: String },

    /// Platform name registered twice
    #[error("Platform '{name}' is already registered")]
    AlreadyRegistered { name: String },

    /// Invalid platform definition
    #[error("Invalid platform definition: {message}")]
    InvalidDefinition { message: String },
}

/// Configuration errors. All of these are fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Configuration file is not valid YAML or has the wrong shape
    #[error("Malformed {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The device group key is absent from the inventory
    #[error("Inventory has no device group '{group}'")]
    MissingGroup { group: String },

    /// A device listed in the group has no entry
    #[error("Device '{name}' is listed in group '{group}' but has no entry")]
    MissingDevice { name: String, group: String },

    /// A device entry could not be decoded
    #[error("Device '{name}' has an invalid entry: {source}")]
    InvalidDevice {
        name: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// Fact schema does not hold together
    #[error("Invalid report schema '{schema}': {message}")]
    InvalidSchema { schema: String, message: String },

    /// Built-in schema name not recognised
    #[error("Unknown built-in schema '{0}'")]
    UnknownSchema(String),

    /// Required environment variable not set
    #[error("Environment variable {0} is not set")]
    MissingEnv(&'static str),

    /// Environment variable has an unusable value
    #[error("Environment variable {name} is invalid: {message}")]
    InvalidEnv { name: &'static str, message: String },

    /// Interactive prompt failed
    #[error("Prompt failed: {0}")]
    Prompt(#[from] io::Error),
}

/// Spreadsheet report errors.
#[derive(Error, Debug)]
pub enum ReportError {
    /// Report file could not be read back
    #[error("Cannot read report {path}: {message}")]
    Read { path: PathBuf, message: String },

    /// Report file could not be written
    #[error("Cannot write report {path}: {message}")]
    Write { path: PathBuf, message: String },

    /// The report has no sheet with this title
    #[error("Report has no sheet '{0}'")]
    MissingSheet(String),

    /// A row does not match its sheet's header
    #[error("Row for sheet '{sheet}' has {actual} cells, header has {expected}")]
    RowShape {
        sheet: String,
        expected: usize,
        actual: usize,
    },

    /// Sheet creation rejected by the workbook
    #[error("Cannot create sheet '{sheet}': {message}")]
    Sheet { sheet: String, message: String },

    /// Filesystem error around the report file
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Notification delivery errors.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Sender or receiver address is malformed
    #[error("Invalid address '{address}': {message}")]
    Address { address: String, message: String },

    /// Attachment could not be read
    #[error("Cannot attach {path}: {source}")]
    Attachment {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Message could not be assembled
    #[error("Cannot build message: {0}")]
    Message(String),

    /// SMTP transport or authentication failure
    #[error("SMTP error: {0}")]
    Smtp(String),
}

/// Result type alias using lcmreport's Error.
pub type Result<T> = std::result::Result<T, Error>;
