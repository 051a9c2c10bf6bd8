//! Results of polling one device.

use indexmap::IndexMap;

use crate::parse::ParsedOutput;

/// Why a command produced no structured data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    /// The device answered but the answer could not be structured
    /// (device error text, missing template, nothing matched).
    Unparseable(String),

    /// Sending the command or reading the answer failed.
    Transport(String),
}

impl std::fmt::Display for FailureCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unparseable(cause) => write!(f, "unparseable output: {cause}"),
            Self::Transport(cause) => write!(f, "transport failure: {cause}"),
        }
    }
}

/// A failed command and its cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFailure {
    pub command: String,
    pub cause: FailureCause,
}

/// Outcome of running one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Success(ParsedOutput),
    Failure(CommandFailure),
}

impl CommandResult {
    pub fn failure(command: &str, cause: FailureCause) -> Self {
        Self::Failure(CommandFailure {
            command: command.to_string(),
            cause,
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Parsed output, if the command succeeded.
    pub fn output(&self) -> Option<&ParsedOutput> {
        match self {
            Self::Success(output) => Some(output),
            Self::Failure(_) => None,
        }
    }
}

/// Whether the session to the device was ever opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Connection {
    Connected,
    Failed { cause: String },
}

/// Everything learned from one device during the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceOutcome {
    pub device: String,
    pub host: String,
    pub device_type: String,
    pub connection: Connection,
    /// One entry per command, in the order the commands ran.
    pub results: IndexMap<String, CommandResult>,
}

impl DeviceOutcome {
    /// Outcome of a device whose session never opened.
    pub fn unreachable(
        device: impl Into<String>,
        host: impl Into<String>,
        device_type: impl Into<String>,
        cause: impl Into<String>,
    ) -> Self {
        Self {
            device: device.into(),
            host: host.into(),
            device_type: device_type.into(),
            connection: Connection::Failed {
                cause: cause.into(),
            },
            results: IndexMap::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection == Connection::Connected
    }

    /// True iff the session opened and every command succeeded.
    pub fn fully_ok(&self) -> bool {
        self.is_connected() && self.results.values().all(CommandResult::is_success)
    }

    /// Parsed output of `command`, if it ran and succeeded.
    pub fn output(&self, command: &str) -> Option<&ParsedOutput> {
        self.results.get(command).and_then(CommandResult::output)
    }

    /// Commands that failed, in run order.
    pub fn failures(&self) -> impl Iterator<Item = &CommandFailure> {
        self.results.values().filter_map(|result| match result {
            CommandResult::Failure(failure) => Some(failure),
            CommandResult::Success(_) => None,
        })
    }
}
